//! HTTP router, shared handler plumbing and the search pages.

use std::collections::HashMap;
use std::convert::Infallible;

use askama::Template;
use axum::{
    Json, Router, async_trait,
    extract::{DefaultBodyLimit, FromRequestParts, Query, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::backend::{BackendError, Credentials};
use crate::domain::{Ride, RideId, UserId};
use crate::search::{FilterState, ResultsState, SearchQuery, SearchView};
use crate::session::{Session, SessionUser, clear_session_cookie};

use super::dto::*;
use super::forms::MAX_PICTURE_BYTES;
use super::notice::Notice;
use super::state::AppState;
use super::templates::*;
use super::{account, admin, rides};

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/search", get(search_page))
        .route("/search/results", get(search_results))
        .route("/popular", get(popular_page))
        .route("/ride/:id", get(rides::ride_page))
        .route("/ride/:id/join", post(rides::book_ride))
        .route("/ride/:id/leave", post(rides::cancel_booking))
        .route("/ride/:id/review", post(rides::submit_review))
        .route("/ride/:id/edit", get(rides::edit_page).post(rides::update_ride))
        .route("/ride/:id/delete", post(rides::delete_ride))
        .route("/offer-seat", get(rides::offer_page).post(rides::publish_ride))
        .route("/published-rides", get(rides::published_rides))
        .route("/booked-rides", get(rides::booked_rides))
        .route("/driver/:id", get(account::driver_page))
        .route("/profile", get(account::profile_page).post(account::update_profile))
        .route(
            "/profile/picture",
            post(account::upload_picture)
                .layer(DefaultBodyLimit::max(MAX_PICTURE_BYTES + 1024 * 1024)),
        )
        .route("/login", get(account::login_page).post(account::login))
        .route("/register", post(account::register))
        .route("/logout", post(account::logout))
        .route("/admin/users", get(admin::users_page))
        .route("/admin/users/:id/ban", post(admin::ban_user))
        .route("/admin/users/:id/unban", post(admin::unban_user))
        .route("/admin/rides", get(admin::rides_page))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Shared plumbing
// ============================================================================

/// The browser's session, resolved from the session cookie.
pub(super) struct Viewer {
    /// Session id, `None` for browsers without a live session.
    pub sid: Option<String>,
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let (sid, session) = state.sessions.resolve(&parts.headers).await;
        Ok(Self { sid, session })
    }
}

impl Viewer {
    pub fn nav(&self) -> NavView {
        NavView::from_session(&self.session)
    }

    /// The signed-in user and their backend credentials.
    pub fn require_user(&self) -> Result<(&SessionUser, &Credentials), AppError> {
        match (&self.session.user, &self.session.credentials) {
            (Some(user), Some(credentials)) => Ok((user, credentials)),
            (Some(_), None) => Err(AppError::SignInRequired { expired: true }),
            (None, _) => Err(AppError::SignInRequired { expired: false }),
        }
    }

    /// Credentials of a signed-in admin.
    pub fn require_admin(&self) -> Result<(&SessionUser, &Credentials), AppError> {
        let (user, credentials) = self.require_user()?;
        if !user.is_admin {
            return Err(AppError::Forbidden {
                message: "This page is for administrators only.".into(),
            });
        }
        Ok((user, credentials))
    }
}

/// Render a template to an HTML response.
pub(super) fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    template.render().map(Html).map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })
}

/// Check if request accepts HTML.
pub(super) fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

pub(super) fn parse_ride_id(raw: &str) -> Result<RideId, AppError> {
    RideId::parse(raw).map_err(|_| AppError::NotFound {
        message: "This ride does not exist.".into(),
    })
}

pub(super) fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    UserId::parse(raw).map_err(|_| AppError::NotFound {
        message: "This user does not exist.".into(),
    })
}

// ============================================================================
// Home and search
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Index page with search form and popular routes.
async fn index_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    let popular = match state.backend.backend().popular_rides().await {
        Ok(rides) => rides.iter().map(PopularRouteView::from_ride).collect(),
        Err(e) => {
            warn!(error = %e, "Failed to load popular rides for home page");
            Vec::new()
        }
    };

    render(&IndexTemplate {
        nav: viewer.nav(),
        notice: NoticeView::maybe(Notice::from_params(&params)),
        form: SearchFormView::empty(),
        popular,
    })
}

/// Popular routes page.
async fn popular_page(
    State(state): State<AppState>,
    viewer: Viewer,
) -> Result<Html<String>, AppError> {
    let (routes, error) = match state.backend.backend().popular_rides().await {
        Ok(rides) => (rides.iter().map(PopularRouteView::from_ride).collect(), None),
        Err(e) => {
            warn!(error = %e, "Failed to load popular rides");
            (Vec::new(), Some(e.user_message()))
        }
    };

    render(&PopularTemplate {
        nav: viewer.nav(),
        notice: None,
        routes,
        error,
    })
}

/// Search page: form, filter sidebar and results.
///
/// The query keys (`from`, `to`, `seat`, `date`) select what to fetch;
/// the remaining keys are filter and sort toggles applied to the fetched
/// candidates.
async fn search_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    let notice = NoticeView::maybe(Notice::from_params(&params));

    let query = match SearchQuery::from_params(&params) {
        Ok(query) => query,
        Err(e) => {
            let field = |key: &str| params.get(key).map(String::as_str).unwrap_or("");
            let seat = field("seat").trim().parse().unwrap_or(1);
            let mut form = SearchFormView::new(field("from"), field("to"), seat, field("date"));
            if params.contains_key("from") || params.contains_key("to") {
                form = form.with_error(e.to_string());
            }
            return render(&SearchTemplate {
                nav: viewer.nav(),
                notice,
                form,
                sidebar: None,
                results: ResultsView::invalid(),
            });
        }
    };

    let filters = FilterState::from_params(&params);
    let results = run_search(&state, &viewer, &query, &filters, SearchTrigger::Navigation).await;

    render(&SearchTemplate {
        nav: viewer.nav(),
        notice,
        form: SearchFormView::from_query(&query),
        sidebar: Some(SidebarView::new(&query, &filters)),
        results: ResultsView::from_state(&results, &state.config),
    })
}

/// Results only: an HTML fragment, or JSON for non-HTML clients.
async fn search_results(
    State(state): State<AppState>,
    viewer: Viewer,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, Response> {
    let html = accepts_html(&headers);

    let query = SearchQuery::from_params(&params).map_err(|e| {
        if html {
            let fragment = render(&ResultsTemplate {
                results: ResultsView::invalid(),
            });
            (StatusCode::BAD_REQUEST, fragment).into_response()
        } else {
            AppError::BadRequest {
                message: e.to_string(),
            }
            .into_json_response()
        }
    })?;

    let filters = FilterState::from_params(&params);
    let results = run_search(&state, &viewer, &query, &filters, SearchTrigger::Refine).await;

    if html {
        let fragment = render(&ResultsTemplate {
            results: ResultsView::from_state(&results, &state.config),
        })
        .map_err(IntoResponse::into_response)?;
        Ok(fragment.into_response())
    } else {
        Ok(Json(SearchResultsResponse::from_state(&results)).into_response())
    }
}

/// Fetch candidates for `query` through the cache.
///
/// Failures become the message shown in place of results.
async fn fetch_candidates(
    state: &AppState,
    query: &SearchQuery,
) -> Result<Vec<Ride>, String> {
    state
        .backend
        .find_rides(query)
        .await
        .map(|rides| Vec::clone(&rides))
        .map_err(|e| {
            warn!(?query, error = %e, "Ride search failed");
            e.user_message()
        })
}

/// What caused a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchTrigger {
    /// Loading the search page. Always fetches.
    Navigation,
    /// A filter or sort change on the open page.
    Refine,
}

/// Run a search against the browser's search view.
///
/// A filter or sort change re-projects the candidates the view already
/// holds for the same query, as long as they are younger than the cache
/// TTL. Otherwise a fetch is started; if a newer fetch begins before this
/// one settles, this result is not stored and is only used for this
/// response.
async fn run_search(
    state: &AppState,
    viewer: &Viewer,
    query: &SearchQuery,
    filters: &FilterState,
    trigger: SearchTrigger,
) -> ResultsState {
    let Some(sid) = viewer.sid.as_deref() else {
        let result = fetch_candidates(state, query).await;
        return SearchView::settled(query.clone(), result).render(filters, &viewer.session);
    };

    let view = state.search_views.get(sid).await;
    let ticket = {
        let mut view = view.lock().await;
        if trigger == SearchTrigger::Refine
            && view.has_fresh_results_for(query, state.config.cache_ttl)
        {
            debug!(?query, candidates = view.candidate_count(), "Re-projecting stored search");
            return view.render(filters, &viewer.session);
        }
        view.begin(query.clone())
    };

    let result = fetch_candidates(state, query).await;

    let mut view = view.lock().await;
    if view.commit(ticket, result.clone()) {
        view.render(filters, &viewer.session)
    } else {
        drop(view);
        SearchView::settled(query.clone(), result).render(filters, &viewer.session)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Forbidden { message: String },
    /// Not signed in, or the backend no longer accepts the session.
    SignInRequired { expired: bool },
    /// The backend failed or sent something unusable.
    BadGateway { message: String },
    Internal { message: String },
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::SignInRequired { .. } => StatusCode::UNAUTHORIZED,
            AppError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::BadRequest { message }
            | AppError::NotFound { message }
            | AppError::Forbidden { message }
            | AppError::BadGateway { message }
            | AppError::Internal { message } => message.clone(),
            AppError::SignInRequired { .. } => "Please sign in to continue.".into(),
        }
    }

    fn title(&self) -> &'static str {
        match self {
            AppError::BadRequest { .. } => "Something is not right",
            AppError::NotFound { .. } => "Not found",
            AppError::Forbidden { .. } => "Not allowed",
            AppError::SignInRequired { .. } => "Sign in required",
            AppError::BadGateway { .. } => "Service unavailable",
            AppError::Internal { .. } => "Something went wrong",
        }
    }

    fn log(&self) {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, message = %self.message(), "Request failed");
        } else {
            warn!(%status, message = %self.message(), "Request rejected");
        }
    }

    /// `{ "error": ... }` for non-HTML clients.
    pub fn into_json_response(self) -> Response {
        self.log();
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.message(),
        });
        (status, body).into_response()
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotFound => AppError::NotFound {
                message: "We could not find what you were looking for.".into(),
            },
            BackendError::Unauthorized => AppError::SignInRequired { expired: true },
            BackendError::Api { status, message } if (400..500).contains(&status) => {
                AppError::BadRequest { message }
            }
            other => AppError::BadGateway {
                message: other.user_message(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        if let AppError::SignInRequired { expired } = self {
            if expired {
                let target = Notice::SessionExpired.redirect_to("/login");
                return (
                    [(header::SET_COOKIE, clear_session_cookie())],
                    Redirect::to(&target),
                )
                    .into_response();
            }
            return Redirect::to("/login").into_response();
        }

        let status = self.status();
        let page = ErrorTemplate {
            nav: NavView::default(),
            notice: None,
            title: self.title().to_string(),
            message: self.message(),
        };

        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => (status, format!("{}: {}", self.message(), e)).into_response(),
        }
    }
}


#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{HeaderMap, Request, StatusCode, header};

    use super::test_support::*;
    use super::{AppError, accepts_html};
    use crate::backend::BackendError;

    #[tokio::test]
    async fn health_check() {
        let app = app();
        let response = send(&app, get("/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn home_lists_popular_routes() {
        let app = app();
        let response = send(&app, get("/?notice=signed_out", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Popular routes"));
        assert!(html.contains("Sfax"));
        assert!(html.contains("You have been signed out."));
    }

    #[tokio::test]
    async fn search_page_lists_and_filters() {
        let app = app();

        let html = body_text(send(&app, get("/search?from=Tunis&to=Sousse", None)).await).await;
        assert!(html.contains("/ride/ride-tn-ss-1"));
        assert!(html.contains("/ride/ride-tn-ss-4"));

        // Afternoon only.
        let html = body_text(
            send(
                &app,
                get("/search?from=Tunis&to=Sousse&dep_noon_to_six=on", None),
            )
            .await,
        )
        .await;
        assert!(html.contains("/ride/ride-tn-ss-2"));
        assert!(!html.contains("/ride/ride-tn-ss-1"));
    }

    #[tokio::test]
    async fn sold_out_ride_is_rendered_disabled() {
        let app = app();
        let html = body_text(send(&app, get("/search?from=Tunis&to=Sousse", None)).await).await;

        // ride-tn-ss-3 (22 TND) has no seats left.
        assert!(html.contains("22 TND"));
        assert!(html.contains(r#"<div class="ride-card disabled" aria-disabled="true">"#));
        assert!(html.contains(r#"<span class="seats full">Full</span>"#));
        assert!(!html.contains("/ride/ride-tn-ss-3"));
        assert!(html.contains(r#"<a class="ride-card" href="/ride/ride-tn-ss-2">"#));
    }

    #[tokio::test]
    async fn unreachable_backend_shows_error() {
        let app = unreachable_app();

        let response = send(&app, get("/search?from=Tunis&to=Sousse", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"data-state="failed""#));
        assert!(html.contains(r#"<p class="error">The ride service is unreachable."#));
        assert!(!html.contains("ride-card"));

        let json = get_json(&app, "/search/results?from=Tunis&to=Sousse", None).await;
        assert_eq!(json["state"], "failed");
        assert!(json["message"].is_string());
        assert!(json["rides"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn booking_refreshes_the_bookers_results() {
        let app = app();
        let cookie = sign_in(&app, "amira@rideshare.tn", "amira123").await;
        let uri = "/search/results?from=Tunis&to=Sousse";

        let before = get_json(&app, uri, Some(&cookie)).await;
        assert_eq!(ride_in(&before, "ride-tn-ss-2")["available_seats"], 1);
        assert_eq!(ride_in(&before, "ride-tn-ss-2")["bookable"], true);

        let response = send(&app, post_form("/ride/ride-tn-ss-2/join", "", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let after = get_json(&app, uri, Some(&cookie)).await;
        assert_eq!(ride_in(&after, "ride-tn-ss-2")["available_seats"], 0);
        assert_eq!(ride_in(&after, "ride-tn-ss-2")["bookable"], false);

        let response = send(&app, post_form("/ride/ride-tn-ss-2/leave", "", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let again = get_json(&app, uri, Some(&cookie)).await;
        assert_eq!(ride_in(&again, "ride-tn-ss-2")["available_seats"], 1);
    }

    #[tokio::test]
    async fn search_page_refetches_after_someone_else_books() {
        let app = app();
        let amira = sign_in(&app, "amira@rideshare.tn", "amira123").await;

        let before = get_json(&app, "/search/results?from=Tunis&to=Sousse", Some(&amira)).await;
        assert_eq!(ride_in(&before, "ride-tn-ss-2")["bookable"], true);

        let admin = sign_in(&app, "admin@rideshare.tn", "admin").await;
        let response = send(&app, post_form("/ride/ride-tn-ss-2/join", "", Some(&admin))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let html = body_text(
            send(&app, get("/search?from=Tunis&to=Sousse", Some(&amira))).await,
        )
        .await;
        assert!(!html.contains("/ride/ride-tn-ss-2"));
        assert!(html.contains("/ride/ride-tn-ss-4"));
    }

    #[tokio::test]
    async fn search_without_route_asks_for_one() {
        let app = app();
        let response = send(&app, get("/search", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Choose where you are leaving from"));
    }

    #[tokio::test]
    async fn results_json_sorted_by_price() {
        let app = app();
        let request = Request::get("/search/results?from=tunis&to=sousse&sort=price")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["state"], "listings");
        let prices: Vec<f64> = json["rides"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["price"].as_f64().unwrap())
            .collect();
        assert_eq!(prices, [12.0, 15.0, 18.0, 22.0]);
    }

    #[tokio::test]
    async fn results_hide_own_rides() {
        let app = app();
        let cookie = sign_in(&app, "amira@rideshare.tn", "amira123").await;

        let request = Request::get("/search/results?from=Tunis&to=Sousse")
            .header(header::COOKIE, &cookie)
            .body(Body::empty())
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&body_text(send(&app, request).await).await).unwrap();
        let ids: Vec<&str> = json["rides"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap())
            .collect();
        assert!(!ids.contains(&"ride-tn-ss-1"));
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn results_invalid_query() {
        let app = app();
        let request = Request::get("/search/results?from=Tunis")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(json["error"].is_string());

        let response = send(&app, get("/search/results?from=Tunis", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn no_match_shows_empty_state() {
        let app = app();
        let html = body_text(
            send(&app, get("/search/results?from=Kef&to=Tozeur", None)).await,
        )
        .await;
        assert!(html.contains("No rides match your search."));
    }

    #[test]
    fn error_display() {
        let err = AppError::from(BackendError::Api {
            status: 400,
            message: "No seats available".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "No seats available");

        let err = AppError::from(BackendError::Api {
            status: 503,
            message: "down".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = AppError::from(BackendError::Unauthorized);
        assert!(matches!(err, AppError::SignInRequired { expired: true }));
    }

    #[test]
    fn accepts_html_header() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_html(&headers));
        headers.insert(header::ACCEPT, "text/html,application/xhtml+xml".parse().unwrap());
        assert!(accepts_html(&headers));
    }
}
