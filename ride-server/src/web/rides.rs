//! Ride pages: detail, booking, publishing and the user's ride lists.

use std::collections::HashMap;

use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};

use crate::backend::BackendError;
use crate::domain::{NewReview, Ride, RideId};

use super::forms::{OfferSeatForm, ReviewForm};
use super::notice::Notice;
use super::routes::{AppError, Viewer, parse_ride_id, render};
use super::state::AppState;
use super::templates::*;

/// Where a delete may send the browser afterwards.
const DELETE_TARGETS: [&str; 2] = ["/published-rides", "/admin/rides"];

// ============================================================================
// Ride detail
// ============================================================================

async fn ride_template(
    state: &AppState,
    viewer: &Viewer,
    id: &RideId,
    notice: Option<Notice>,
    error: Option<String>,
) -> Result<RideTemplate, AppError> {
    let ride = state.backend.get_ride(id).await?;

    Ok(RideTemplate {
        nav: viewer.nav(),
        notice: NoticeView::maybe(notice),
        error,
        ride: RideDetailView::from_ride(&ride, &state.config),
        actions: RideActions::for_viewer(&ride, &viewer.session),
    })
}

/// Ride detail page.
pub(super) async fn ride_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    let id = parse_ride_id(&id)?;
    let page = ride_template(&state, &viewer, &id, Notice::from_params(&params), None).await?;
    render(&page)
}

/// Drop the viewer's stored search so the next one refetches seat counts.
async fn forget_search(state: &AppState, viewer: &Viewer) {
    if let Some(sid) = viewer.sid.as_deref() {
        state.search_views.remove(sid).await;
    }
}

/// Outcome of a ride action: redirect with `notice` on success, otherwise
/// show the ride page again with the backend's message.
async fn after_action(
    state: &AppState,
    viewer: &Viewer,
    id: &RideId,
    result: Result<(), BackendError>,
    notice: Notice,
) -> Result<Response, AppError> {
    match result {
        Ok(()) => Ok(Redirect::to(&notice.redirect_to(&format!("/ride/{id}"))).into_response()),
        Err(e) => {
            let err = AppError::from(e);
            if matches!(err, AppError::SignInRequired { .. } | AppError::NotFound { .. }) {
                return Err(err);
            }
            let status = err.status();
            let page = ride_template(state, viewer, id, None, Some(err.message())).await?;
            Ok((status, render(&page)?).into_response())
        }
    }
}

/// Book a seat.
pub(super) async fn book_ride(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_ride_id(&id)?;
    let (user, credentials) = viewer.require_user()?;

    let result = state.backend.join_ride(credentials, &id).await;
    if result.is_ok() {
        info!(ride = %id, user = %user.id, "Seat booked");
        forget_search(&state, &viewer).await;
    }
    after_action(&state, &viewer, &id, result, Notice::Booked).await
}

/// Cancel the viewer's booking.
pub(super) async fn cancel_booking(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_ride_id(&id)?;
    let (user, credentials) = viewer.require_user()?;

    let result = state.backend.leave_ride(credentials, &id).await;
    if result.is_ok() {
        info!(ride = %id, user = %user.id, "Booking cancelled");
        forget_search(&state, &viewer).await;
    }
    after_action(&state, &viewer, &id, result, Notice::BookingCancelled).await
}

/// Review the driver of a ride the viewer travelled on.
pub(super) async fn submit_review(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let id = parse_ride_id(&id)?;
    let (user, credentials) = viewer.require_user()?;

    let ride = state.backend.get_ride(&id).await?;
    if !ride.has_passenger(&user.id) {
        return Err(AppError::Forbidden {
            message: "Only passengers can review this ride's driver.".into(),
        });
    }
    let Some(driver) = ride.creator_id().cloned() else {
        return Err(AppError::BadRequest {
            message: "This ride has no driver to review.".into(),
        });
    };

    let form = match ReviewForm::parse(&params) {
        Ok(form) => form,
        Err(e) => {
            let page = ride_template(&state, &viewer, &id, None, Some(e.to_string())).await?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&page)?).into_response());
        }
    };

    let review = NewReview {
        ride: id.clone(),
        reviewed_user: driver.clone(),
        rate: form.rate,
        comment: form.comment,
    };

    match state.backend.backend().create_review(credentials, &review).await {
        Ok(()) => {
            info!(ride = %id, driver = %driver, rate = review.rate.get(), "Review submitted");
            let target = Notice::ReviewSubmitted.redirect_to(&format!("/driver/{driver}"));
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            if matches!(err, AppError::SignInRequired { .. }) {
                return Err(err);
            }
            let status = err.status();
            let page = ride_template(&state, &viewer, &id, None, Some(err.message())).await?;
            Ok((status, render(&page)?).into_response())
        }
    }
}

// ============================================================================
// Publishing
// ============================================================================

fn offer_page_response(
    viewer: &Viewer,
    view: OfferFormView,
    status: StatusCode,
) -> Result<Response, AppError> {
    let page = OfferSeatTemplate {
        nav: viewer.nav(),
        notice: None,
        form: view,
    };
    Ok((status, render(&page)?).into_response())
}

/// Blank publish form.
pub(super) async fn offer_page(viewer: Viewer) -> Result<Response, AppError> {
    viewer.require_user()?;
    offer_page_response(
        &viewer,
        OfferFormView::publish(OfferSeatForm::new(), &[]),
        StatusCode::OK,
    )
}

/// Publish a new ride.
pub(super) async fn publish_ride(
    State(state): State<AppState>,
    viewer: Viewer,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let (user, credentials) = viewer.require_user()?;
    let form = OfferSeatForm::from_params(&params);

    let draft = match form.validate(Utc::now()) {
        Ok(draft) => draft,
        Err(errors) => {
            let view = OfferFormView::publish(form, &errors);
            return offer_page_response(&viewer, view, StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    match state.backend.create_ride(credentials, &draft).await {
        Ok(id) => {
            info!(
                user = %user.id,
                ride = ?id,
                origin = %draft.origin,
                destination = %draft.destination,
                "Ride published"
            );
            forget_search(&state, &viewer).await;
            let target = match id {
                Some(id) => format!("/ride/{id}"),
                None => "/published-rides".to_string(),
            };
            Ok(Redirect::to(&Notice::RidePublished.redirect_to(&target)).into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            if matches!(err, AppError::SignInRequired { .. }) {
                return Err(err);
            }
            let mut view = OfferFormView::publish(form, &[]);
            view.errors.push(err.message());
            offer_page_response(&viewer, view, err.status())
        }
    }
}

/// Load a ride the viewer may edit.
async fn own_ride(state: &AppState, viewer: &Viewer, id: &RideId) -> Result<Ride, AppError> {
    let (user, _) = viewer.require_user()?;
    let ride = state.backend.get_ride(id).await?;
    if !ride.is_created_by(&user.id) {
        return Err(AppError::Forbidden {
            message: "Only the driver can edit this ride.".into(),
        });
    }
    Ok(ride.as_ref().clone())
}

/// Edit form prefilled from the ride.
pub(super) async fn edit_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_ride_id(&id)?;
    let ride = own_ride(&state, &viewer, &id).await?;
    let view = OfferFormView::edit(id.as_str(), OfferSeatForm::from_ride(&ride), &[]);
    offer_page_response(&viewer, view, StatusCode::OK)
}

/// Save changes to a ride.
pub(super) async fn update_ride(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let id = parse_ride_id(&id)?;
    own_ride(&state, &viewer, &id).await?;
    let (_, credentials) = viewer.require_user()?;

    let form = OfferSeatForm::from_params(&params);
    let draft = match form.validate(Utc::now()) {
        Ok(draft) => draft,
        Err(errors) => {
            let view = OfferFormView::edit(id.as_str(), form, &errors);
            return offer_page_response(&viewer, view, StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    match state.backend.update_ride(credentials, &id, &draft).await {
        Ok(()) => {
            info!(ride = %id, "Ride updated");
            forget_search(&state, &viewer).await;
            let target = Notice::RideUpdated.redirect_to(&format!("/ride/{id}"));
            Ok(Redirect::to(&target).into_response())
        }
        Err(e) => {
            let err = AppError::from(e);
            if matches!(err, AppError::SignInRequired { .. }) {
                return Err(err);
            }
            let mut view = OfferFormView::edit(id.as_str(), form, &[]);
            view.errors.push(err.message());
            offer_page_response(&viewer, view, err.status())
        }
    }
}

/// Delete a ride. The backend decides who may.
pub(super) async fn delete_ride(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Form(params): Form<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let id = parse_ride_id(&id)?;
    let (user, credentials) = viewer.require_user()?;

    state.backend.delete_ride(credentials, &id).await?;
    info!(ride = %id, user = %user.id, "Ride deleted");
    forget_search(&state, &viewer).await;

    let next = params
        .get("next")
        .map(String::as_str)
        .filter(|next| DELETE_TARGETS.contains(next))
        .unwrap_or(DELETE_TARGETS[0]);
    Ok(Redirect::to(&Notice::RideDeleted.redirect_to(next)))
}

// ============================================================================
// The viewer's rides
// ============================================================================

/// Fetch rides by id concurrently. Rides that fail to load are counted
/// and left out; the rest are ordered by departure.
pub(super) async fn load_rides(state: &AppState, ids: &[RideId]) -> (Vec<Ride>, usize) {
    let results = join_all(ids.iter().map(|id| state.backend.get_ride(id))).await;

    let mut rides = Vec::with_capacity(results.len());
    let mut missing = 0;
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(ride) => rides.push(ride.as_ref().clone()),
            Err(e) => {
                warn!(ride = %id, error = %e, "Failed to load ride");
                missing += 1;
            }
        }
    }
    rides.sort_by_key(|r| r.start_time);
    (rides, missing)
}

async fn my_rides(
    state: &AppState,
    viewer: &Viewer,
    published: bool,
    notice: Option<Notice>,
) -> Result<Html<String>, AppError> {
    let (session_user, _) = viewer.require_user()?;
    let user = state.backend.backend().get_user(&session_user.id).await?;

    let ids = if published {
        &user.rides_created
    } else {
        &user.rides_joined
    };
    let (rides, missing) = load_rides(state, ids).await;

    let (title, empty_message) = if published {
        ("Published rides", "You have not published any rides yet.")
    } else {
        ("Booked rides", "You have not booked any rides yet.")
    };

    render(&MyRidesTemplate {
        nav: viewer.nav(),
        notice: NoticeView::maybe(notice),
        title: title.to_string(),
        empty_message: empty_message.to_string(),
        published,
        rides: rides
            .iter()
            .map(|r| RideCardView::from_ride(r, true, &state.config))
            .collect(),
        missing,
    })
}

/// Rides the viewer published.
pub(super) async fn published_rides(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    my_rides(&state, &viewer, true, Notice::from_params(&params)).await
}

/// Rides the viewer booked.
pub(super) async fn booked_rides(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    my_rides(&state, &viewer, false, Notice::from_params(&params)).await
}
