//! Web layer for the ride-sharing frontend.
//!
//! Server-rendered pages for searching, booking and publishing rides,
//! account management and moderation, plus a JSON search endpoint.

mod account;
mod admin;
mod dto;
mod forms;
mod notice;
mod rides;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use forms::*;
pub use notice::Notice;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
