//! Askama templates for the web frontend.

use askama::Template;
use chrono::{DateTime, Utc};

use crate::config::AppConfig;
use crate::domain::{
    Amenity, BodyType, City, Review, Ride, TimeBucket, User, format_clock, format_duration,
    format_long_date, place_image,
};
use crate::search::{FilterState, MAX_SEATS, ResultsState, SearchQuery, SortOption};
use crate::session::Session;

use super::forms::{FormError, OfferSeatForm};
use super::notice::Notice;

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Home page with search form and popular routes.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub form: SearchFormView,
    pub popular: Vec<PopularRouteView>,
}

/// Search page: form, filter sidebar and results.
#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub form: SearchFormView,
    /// `None` when the query was invalid and nothing was fetched.
    pub sidebar: Option<SidebarView>,
    pub results: ResultsView,
}

/// Popular routes page.
#[derive(Template)]
#[template(path = "popular.html")]
pub struct PopularTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub routes: Vec<PopularRouteView>,
    pub error: Option<String>,
}

/// Ride detail page.
#[derive(Template)]
#[template(path = "ride.html")]
pub struct RideTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub error: Option<String>,
    pub ride: RideDetailView,
    pub actions: RideActions,
}

/// Publish or edit a ride.
#[derive(Template)]
#[template(path = "offer_seat.html")]
pub struct OfferSeatTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub form: OfferFormView,
}

/// The signed-in user's published or booked rides.
#[derive(Template)]
#[template(path = "my_rides.html")]
pub struct MyRidesTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub title: String,
    pub empty_message: String,
    /// `true` for published rides (delete/edit), `false` for bookings (cancel).
    pub published: bool,
    pub rides: Vec<RideCardView>,
    /// Rides that could not be loaded.
    pub missing: usize,
}

/// The signed-in user's profile.
#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub profile: ProfileView,
    pub name: String,
    pub bio: String,
    pub errors: Vec<String>,
    pub picture_error: Option<String>,
}

/// Public driver profile with reviews.
#[derive(Template)]
#[template(path = "driver.html")]
pub struct DriverTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub driver: DriverView,
    pub reviews: Vec<ReviewView>,
}

/// Sign in and register forms.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub login_email: String,
    pub login_errors: Vec<String>,
    pub register_name: String,
    pub register_email: String,
    pub register_errors: Vec<String>,
}

/// Admin user list.
#[derive(Template)]
#[template(path = "admin_users.html")]
pub struct AdminUsersTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub q: String,
    pub users: Vec<AdminUserView>,
    pub total: usize,
}

/// Admin ride list.
#[derive(Template)]
#[template(path = "admin_rides.html")]
pub struct AdminRidesTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub rides: Vec<RideCardView>,
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub nav: NavView,
    pub notice: Option<NoticeView>,
    pub title: String,
    pub message: String,
}

// ============================================================================
// Fragment Templates (AJAX responses, no base.html)
// ============================================================================

/// Search results fragment.
#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate {
    pub results: ResultsView,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// Header navigation state.
#[derive(Debug, Clone, Default)]
pub struct NavView {
    pub signed_in: bool,
    pub is_admin: bool,
    pub user_name: String,
    pub user_initial: String,
}

impl NavView {
    pub fn from_session(session: &Session) -> Self {
        match &session.user {
            Some(user) => Self {
                signed_in: true,
                is_admin: user.is_admin,
                user_name: user.name.clone(),
                user_initial: initial(&user.name),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoticeView {
    pub message: String,
    pub warning: bool,
}

impl NoticeView {
    pub fn from_notice(notice: Notice) -> Self {
        Self {
            message: notice.message().to_string(),
            warning: notice.is_warning(),
        }
    }

    pub fn maybe(notice: Option<Notice>) -> Option<Self> {
        notice.map(Self::from_notice)
    }
}

/// An `<option>` in a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A checkbox or radio button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceView {
    pub name: String,
    pub value: String,
    pub label: String,
    pub badge: String,
    pub checked: bool,
}

fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// City options with `selected` marked. A non-city value is kept as an
/// extra first option so a free-text search still shows what was typed.
fn city_options(selected: &str) -> Vec<OptionView> {
    let chosen = City::find(selected);
    let mut options: Vec<OptionView> = City::ALL
        .into_iter()
        .map(|c| OptionView {
            value: c.name().to_string(),
            label: c.name().to_string(),
            selected: chosen == Some(c),
        })
        .collect();

    if chosen.is_none() && !selected.trim().is_empty() {
        options.insert(
            0,
            OptionView {
                value: selected.trim().to_string(),
                label: selected.trim().to_string(),
                selected: true,
            },
        );
    }
    options
}

/// Filled and empty stars, e.g. `★★★★☆`.
fn star_string(stars: u8) -> String {
    (1..=5).map(|i| if i <= stars { '★' } else { '☆' }).collect()
}

fn member_since(created_at: Option<DateTime<Utc>>) -> String {
    created_at
        .map(|t| t.format("%B %Y").to_string())
        .unwrap_or_default()
}

/// The ride search form.
#[derive(Debug, Clone)]
pub struct SearchFormView {
    pub from_options: Vec<OptionView>,
    pub to_options: Vec<OptionView>,
    pub seat_options: Vec<OptionView>,
    pub date: String,
    pub error: Option<String>,
}

impl SearchFormView {
    pub fn new(from: &str, to: &str, seat: u8, date: &str) -> Self {
        Self {
            from_options: city_options(from),
            to_options: city_options(to),
            seat_options: (1..=MAX_SEATS)
                .map(|n| OptionView {
                    value: n.to_string(),
                    label: if n == 1 {
                        "1 passenger".to_string()
                    } else {
                        format!("{n} passengers")
                    },
                    selected: n == seat,
                })
                .collect(),
            date: date.to_string(),
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self::new("", "", 1, "")
    }

    pub fn from_query(query: &SearchQuery) -> Self {
        let date = query
            .date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        Self::new(query.from(), query.to(), query.seat(), &date)
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Filter sidebar. Submitting it keeps the query in hidden fields.
#[derive(Debug, Clone)]
pub struct SidebarView {
    pub hidden: Vec<(String, String)>,
    pub sort_options: Vec<ChoiceView>,
    pub no_sort: bool,
    pub buckets: Vec<ChoiceView>,
    pub amenities: Vec<ChoiceView>,
    pub clear_href: String,
}

impl SidebarView {
    pub fn new(query: &SearchQuery, filters: &FilterState) -> Self {
        let sort_options = SortOption::ALL
            .into_iter()
            .map(|s| ChoiceView {
                name: "sort".to_string(),
                value: s.key().to_string(),
                label: s.label().to_string(),
                badge: String::new(),
                checked: filters.sort == Some(s),
            })
            .collect();

        let buckets = TimeBucket::ALL
            .into_iter()
            .map(|b| ChoiceView {
                name: format!("dep_{}", b.key()),
                value: "on".to_string(),
                label: b.label().to_string(),
                badge: String::new(),
                checked: filters.has_bucket(b),
            })
            .collect();

        let amenities = Amenity::ALL
            .into_iter()
            .map(|a| ChoiceView {
                name: a.key().to_string(),
                value: "on".to_string(),
                label: a.title().to_string(),
                badge: a.badge().to_string(),
                checked: filters.has_amenity(a),
            })
            .collect();

        Self {
            hidden: query
                .to_params()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            sort_options,
            no_sort: filters.sort.is_none(),
            buckets,
            amenities,
            clear_href: format!("/search?{}&sort=", query.to_query_string()),
        }
    }
}

/// The results area.
#[derive(Debug, Clone)]
pub struct ResultsView {
    /// `loading`, `failed`, `empty`, `listings` or `invalid`.
    pub kind: &'static str,
    pub message: String,
    pub rides: Vec<RideCardView>,
}

impl ResultsView {
    pub fn from_state(state: &ResultsState, config: &AppConfig) -> Self {
        match state {
            ResultsState::Loading => Self {
                kind: "loading",
                message: "Searching for rides...".to_string(),
                rides: Vec::new(),
            },
            ResultsState::Failed { message } => Self {
                kind: "failed",
                message: message.clone(),
                rides: Vec::new(),
            },
            ResultsState::Empty => Self {
                kind: "empty",
                message: "No rides match your search.".to_string(),
                rides: Vec::new(),
            },
            ResultsState::Listings(listings) => Self {
                kind: "listings",
                message: String::new(),
                rides: listings
                    .iter()
                    .map(|l| RideCardView::from_ride(&l.ride, l.bookable, config))
                    .collect(),
            },
        }
    }

    /// Nothing was fetched because the query was invalid.
    pub fn invalid() -> Self {
        Self {
            kind: "invalid",
            message: "Choose where you are leaving from and going to.".to_string(),
            rides: Vec::new(),
        }
    }

    pub fn count_label(&self) -> String {
        match self.rides.len() {
            1 => "1 ride available".to_string(),
            n => format!("{n} rides available"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeView {
    pub badge: String,
    pub title: String,
}

/// A ride in a list.
#[derive(Debug, Clone)]
pub struct RideCardView {
    pub id: String,
    /// Link target; `None` renders the card disabled.
    pub href: Option<String>,
    pub date_label: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub origin: String,
    pub destination: String,
    pub price: String,
    pub seats: u32,
    pub bookable: bool,
    pub passengers: usize,
    pub driver_name: String,
    pub driver_initial: String,
    pub driver_picture: Option<String>,
    pub driver_bio: String,
    pub stars: u8,
    pub star_string: String,
    pub badges: Vec<BadgeView>,
    pub vehicle: String,
    pub vehicle_image: Option<String>,
}

impl RideCardView {
    /// `linked` controls whether the card links to the ride page.
    pub fn from_ride(ride: &Ride, linked: bool, config: &AppConfig) -> Self {
        let driver = ride.creator.as_ref();
        let driver_name = driver.map(|d| d.name.clone()).unwrap_or_default();
        let stars = driver.map(|d| d.stars).unwrap_or(0);

        Self {
            id: ride.id.to_string(),
            href: linked.then(|| format!("/ride/{}", ride.id)),
            date_label: format_long_date(&ride.start_time),
            departure: format_clock(&ride.start_time),
            arrival: format_clock(&ride.end_time),
            duration: format_duration(ride.duration()),
            origin: ride.origin.name.clone(),
            destination: ride.destination.name.clone(),
            price: ride.price.to_string(),
            seats: ride.available_seats,
            bookable: ride.is_bookable(),
            passengers: ride.passengers.len(),
            driver_initial: initial(&driver_name),
            driver_name,
            driver_picture: driver
                .and_then(|d| d.profile_picture.as_deref())
                .map(|p| config.asset(p)),
            driver_bio: driver.and_then(|d| d.bio.clone()).unwrap_or_default(),
            stars,
            star_string: star_string(stars),
            badges: ride
                .amenities
                .present()
                .map(|a| BadgeView {
                    badge: a.badge().to_string(),
                    title: a.title().to_string(),
                })
                .collect(),
            vehicle: ride.vehicle.display_name(),
            vehicle_image: ride.vehicle.body.map(BodyType::image_path),
        }
    }
}

/// A popular route tile.
#[derive(Debug, Clone)]
pub struct PopularRouteView {
    pub origin: String,
    pub destination: String,
    pub image: String,
    pub href: String,
    pub price: String,
    pub date_label: String,
}

impl PopularRouteView {
    pub fn from_ride(ride: &Ride) -> Self {
        let search = SearchQuery::new(&ride.origin.name, &ride.destination.name, 1, None)
            .map(|q| format!("/search?{}", q.to_query_string()))
            .unwrap_or_else(|_| "/search".to_string());

        Self {
            origin: ride.origin.name.clone(),
            destination: ride.destination.name.clone(),
            image: place_image(&ride.destination.name),
            href: search,
            price: ride.price.to_string(),
            date_label: format_long_date(&ride.start_time),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AmenityView {
    pub badge: String,
    pub title: String,
    pub present: bool,
}

/// Everything the ride page shows.
#[derive(Debug, Clone)]
pub struct RideDetailView {
    pub card: RideCardView,
    pub origin_image: String,
    pub destination_image: String,
    pub amenities: Vec<AmenityView>,
    pub body_label: String,
    pub vehicle_number: String,
    pub driver_href: Option<String>,
    pub driver_rides: usize,
    pub status: String,
}

impl RideDetailView {
    pub fn from_ride(ride: &Ride, config: &AppConfig) -> Self {
        Self {
            card: RideCardView::from_ride(ride, true, config),
            origin_image: place_image(&ride.origin.name),
            destination_image: place_image(&ride.destination.name),
            amenities: Amenity::ALL
                .into_iter()
                .map(|a| AmenityView {
                    badge: a.badge().to_string(),
                    title: a.title().to_string(),
                    present: ride.amenities.has(a),
                })
                .collect(),
            body_label: ride
                .vehicle
                .body
                .map(|b| b.label().to_string())
                .unwrap_or_default(),
            vehicle_number: ride.vehicle.vehicle_number.clone().unwrap_or_default(),
            driver_href: ride.creator_id().map(|id| format!("/driver/{id}")),
            driver_rides: ride.creator.as_ref().map_or(0, |c| c.rides_published),
            status: ride.status.clone().unwrap_or_default(),
        }
    }
}

/// What the viewer may do on a ride page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RideActions {
    pub signed_in: bool,
    pub can_book: bool,
    /// Why the book button is disabled, when it is.
    pub book_blocked: Option<String>,
    pub can_cancel: bool,
    pub can_review: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl RideActions {
    pub fn for_viewer(ride: &Ride, session: &Session) -> Self {
        let Some(user) = session.user.as_ref() else {
            return Self {
                book_blocked: (!ride.is_bookable()).then(|| "No seats available".to_string()),
                ..Self::default()
            };
        };

        let own = ride.is_created_by(&user.id);
        let booked = ride.has_passenger(&user.id);
        let book_blocked = if own {
            Some("This is your ride".to_string())
        } else if booked {
            Some("You have booked this ride".to_string())
        } else if !ride.is_bookable() {
            Some("No seats available".to_string())
        } else {
            None
        };

        Self {
            signed_in: true,
            can_book: book_blocked.is_none(),
            book_blocked,
            can_cancel: booked,
            can_review: booked && ride.creator.is_some(),
            can_edit: own,
            can_delete: own || user.is_admin,
        }
    }
}

/// The publish/edit form with its option lists.
#[derive(Debug, Clone)]
pub struct OfferFormView {
    pub title: String,
    pub action: String,
    pub submit_label: String,
    pub form: OfferSeatForm,
    pub origin_options: Vec<OptionView>,
    pub destination_options: Vec<OptionView>,
    pub body_options: Vec<OptionView>,
    pub amenities: Vec<ChoiceView>,
    pub errors: Vec<String>,
}

impl OfferFormView {
    pub fn publish(form: OfferSeatForm, errors: &[FormError]) -> Self {
        Self::new(
            "Offer a seat",
            "/offer-seat".to_string(),
            "Publish ride",
            form,
            errors,
        )
    }

    pub fn edit(id: &str, form: OfferSeatForm, errors: &[FormError]) -> Self {
        Self::new(
            "Edit your ride",
            format!("/ride/{id}/edit"),
            "Save changes",
            form,
            errors,
        )
    }

    fn new(
        title: &str,
        action: String,
        submit_label: &str,
        form: OfferSeatForm,
        errors: &[FormError],
    ) -> Self {
        let body_options = BodyType::ALL
            .into_iter()
            .map(|b| OptionView {
                value: b.value().to_string(),
                label: b.label().to_string(),
                selected: form.body_type == b.value(),
            })
            .collect();

        let amenities = Amenity::ALL
            .into_iter()
            .map(|a| ChoiceView {
                name: a.key().to_string(),
                value: "on".to_string(),
                label: a.title().to_string(),
                badge: a.badge().to_string(),
                checked: form.amenities.has(a),
            })
            .collect();

        Self {
            title: title.to_string(),
            action,
            submit_label: submit_label.to_string(),
            origin_options: city_options(&form.origin),
            destination_options: city_options(&form.destination),
            body_options,
            amenities,
            errors: errors.iter().map(ToString::to_string).collect(),
            form,
        }
    }
}

/// The signed-in user's own profile.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub id: String,
    pub name: String,
    pub initial: String,
    pub email: String,
    pub bio: String,
    pub picture: Option<String>,
    pub age: Option<u32>,
    pub phone: String,
    pub member_since: String,
    pub rides_created: usize,
    pub rides_joined: usize,
}

impl ProfileView {
    pub fn from_user(user: &User, config: &AppConfig) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            initial: initial(&user.name),
            email: user.email.clone().unwrap_or_default(),
            bio: user.profile.bio.clone().unwrap_or_default(),
            picture: user.profile_picture.as_deref().map(|p| config.asset(p)),
            age: user.profile.age,
            phone: user.profile.phone_number.clone().unwrap_or_default(),
            member_since: member_since(user.created_at),
            rides_created: user.rides_created.len(),
            rides_joined: user.rides_joined.len(),
        }
    }
}

/// A driver's public profile.
#[derive(Debug, Clone)]
pub struct DriverView {
    pub name: String,
    pub initial: String,
    pub picture: Option<String>,
    pub bio: String,
    pub star_string: String,
    pub score: String,
    pub review_count: usize,
    pub rides_published: usize,
    pub member_since: String,
}

impl DriverView {
    pub fn new(user: &User, score: f64, stars: u8, review_count: usize, config: &AppConfig) -> Self {
        Self {
            name: user.name.clone(),
            initial: initial(&user.name),
            picture: user.profile_picture.as_deref().map(|p| config.asset(p)),
            bio: user.profile.bio.clone().unwrap_or_default(),
            star_string: star_string(stars),
            score: format!("{score:.1}"),
            review_count,
            rides_published: user.rides_created.len(),
            member_since: member_since(user.created_at),
        }
    }
}

/// One review on a driver page.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub author: String,
    pub author_href: String,
    pub initial: String,
    pub picture: Option<String>,
    pub rate: u8,
    pub star_string: String,
    pub comment: String,
    pub date: String,
}

impl ReviewView {
    /// `author` is the reviewer's account, when it could be loaded.
    pub fn new(review: &Review, author: Option<&User>, config: &AppConfig) -> Self {
        let name = author
            .map(|u| u.name.clone())
            .unwrap_or_else(|| "Former user".to_string());

        Self {
            author_href: format!("/driver/{}", review.owner),
            initial: initial(&name),
            picture: author
                .and_then(|u| u.profile_picture.as_deref())
                .map(|p| config.asset(p)),
            author: name,
            rate: review.rate.get(),
            star_string: star_string(review.rate.get()),
            comment: review.comment.clone().unwrap_or_default(),
            date: review
                .date
                .map(|d| d.format("%B %-d, %Y").to_string())
                .unwrap_or_default(),
        }
    }
}

/// A row in the admin user list.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub id: String,
    pub name: String,
    pub initial: String,
    pub email: String,
    pub picture: Option<String>,
    pub is_admin: bool,
    pub is_banned: bool,
    pub is_self: bool,
    pub member_since: String,
}

impl AdminUserView {
    pub fn from_user(user: &User, session: &Session, config: &AppConfig) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            initial: initial(&user.name),
            email: user.email.clone().unwrap_or_default(),
            picture: user.profile_picture.as_deref().map(|p| config.asset(p)),
            is_admin: user.is_admin,
            is_banned: user.is_banned,
            is_self: session.user_id() == Some(&user.id),
            member_since: member_since(user.created_at),
        }
    }
}
