//! Administration: user moderation and the full ride list.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use tracing::info;

use super::notice::Notice;
use super::routes::{AppError, Viewer, parse_user_id, render};
use super::state::AppState;
use super::templates::*;

/// All users, optionally narrowed by `q` (name or email).
pub(super) async fn users_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    let (_, credentials) = viewer.require_admin()?;
    let q = params.get("q").map(|q| q.trim().to_string()).unwrap_or_default();

    let users = state.backend.backend().list_users(credentials).await?;
    let total = users.len();
    let users = users
        .iter()
        .filter(|u| u.matches(&q))
        .map(|u| AdminUserView::from_user(u, &viewer.session, &state.config))
        .collect();

    render(&AdminUsersTemplate {
        nav: viewer.nav(),
        notice: NoticeView::maybe(Notice::from_params(&params)),
        q,
        users,
        total,
    })
}

async fn set_banned(
    state: &AppState,
    viewer: &Viewer,
    id: &str,
    banned: bool,
) -> Result<Redirect, AppError> {
    let (admin, credentials) = viewer.require_admin()?;
    let id = parse_user_id(id)?;
    if id == admin.id {
        return Err(AppError::BadRequest {
            message: "You cannot ban your own account.".into(),
        });
    }

    let backend = state.backend.backend();
    let notice = if banned {
        backend.ban_user(credentials, &id).await?;
        Notice::UserBanned
    } else {
        backend.unban_user(credentials, &id).await?;
        Notice::UserUnbanned
    };
    info!(admin = %admin.id, user = %id, banned, "User moderation");

    Ok(Redirect::to(&notice.redirect_to("/admin/users")))
}

pub(super) async fn ban_user(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    set_banned(&state, &viewer, &id, true).await
}

pub(super) async fn unban_user(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    set_banned(&state, &viewer, &id, false).await
}

/// Every ride, soonest first.
pub(super) async fn rides_page(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, AppError> {
    let (_, credentials) = viewer.require_admin()?;
    let mut rides = state.backend.backend().all_rides(credentials).await?;
    rides.sort_by_key(|r| r.start_time);

    render(&AdminRidesTemplate {
        nav: viewer.nav(),
        notice: NoticeView::maybe(Notice::from_params(&params)),
        rides: rides
            .iter()
            .map(|r| RideCardView::from_ride(r, true, &state.config))
            .collect(),
    })
}
