//! REST backend access.
//!
//! The ride-sharing backend owns all persistent state: rides, users and
//! reviews. This module provides the typed HTTP client for it, the wire
//! types and their conversion into domain types, and an in-memory mock
//! that implements the same operations from JSON fixtures.
//!
//! Key characteristics of the backend:
//! - Authentication is cookie-based; the cookies are opaque to us and are
//!   replayed verbatim as [`Credentials`]
//! - Timestamps are ISO-8601 UTC strings
//! - Lists are converted per record, so one bad ride never fails a search

mod auth;
mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use auth::{AuthSession, Credentials};
pub use client::{BackendClient, BackendConfig};
pub use convert::ConversionError;
pub use error::BackendError;
pub use mock::MockBackend;

use crate::domain::{
    NewReview, Profile, ProfileUpdate, ReviewSummary, Ride, RideDraft, RideId, User, UserId,
};
use crate::search::SearchQuery;

/// The backend the server talks to: the real REST API or the mock.
#[derive(Debug, Clone)]
pub enum Backend {
    Http(BackendClient),
    Mock(MockBackend),
}

macro_rules! dispatch {
    ($self:ident, $method:ident($($arg:expr),*)) => {
        match $self {
            Backend::Http(client) => client.$method($($arg),*).await,
            Backend::Mock(mock) => mock.$method($($arg),*).await,
        }
    };
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Http(_) => "http",
            Backend::Mock(_) => "mock",
        }
    }

    pub async fn find_rides(&self, query: &SearchQuery) -> Result<Vec<Ride>, BackendError> {
        dispatch!(self, find_rides(query))
    }

    pub async fn get_ride(&self, id: &RideId) -> Result<Ride, BackendError> {
        dispatch!(self, get_ride(id))
    }

    pub async fn popular_rides(&self) -> Result<Vec<Ride>, BackendError> {
        dispatch!(self, popular_rides())
    }

    pub async fn all_rides(&self, credentials: &Credentials) -> Result<Vec<Ride>, BackendError> {
        dispatch!(self, all_rides(credentials))
    }

    pub async fn create_ride(
        &self,
        credentials: &Credentials,
        draft: &RideDraft,
    ) -> Result<Option<RideId>, BackendError> {
        dispatch!(self, create_ride(credentials, draft))
    }

    pub async fn update_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
        draft: &RideDraft,
    ) -> Result<(), BackendError> {
        dispatch!(self, update_ride(credentials, id, draft))
    }

    pub async fn delete_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
    ) -> Result<(), BackendError> {
        dispatch!(self, delete_ride(credentials, id))
    }

    pub async fn join_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
    ) -> Result<(), BackendError> {
        dispatch!(self, join_ride(credentials, id))
    }

    pub async fn leave_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
    ) -> Result<(), BackendError> {
        dispatch!(self, leave_ride(credentials, id))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        dispatch!(self, login(email, password))
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        dispatch!(self, register(name, email, password))
    }

    pub async fn logout(&self, credentials: &Credentials) -> Result<(), BackendError> {
        dispatch!(self, logout(credentials))
    }

    pub async fn get_user(&self, id: &UserId) -> Result<User, BackendError> {
        dispatch!(self, get_user(id))
    }

    pub async fn update_user(
        &self,
        credentials: &Credentials,
        id: &UserId,
        update: &ProfileUpdate,
        current: &Profile,
    ) -> Result<(), BackendError> {
        dispatch!(self, update_user(credentials, id, update, current))
    }

    pub async fn upload_image(
        &self,
        credentials: &Credentials,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        dispatch!(self, upload_image(credentials, file_name, content_type, bytes))
    }

    pub async fn list_users(&self, credentials: &Credentials) -> Result<Vec<User>, BackendError> {
        dispatch!(self, list_users(credentials))
    }

    pub async fn ban_user(&self, credentials: &Credentials, id: &UserId) -> Result<(), BackendError> {
        dispatch!(self, ban_user(credentials, id))
    }

    pub async fn unban_user(
        &self,
        credentials: &Credentials,
        id: &UserId,
    ) -> Result<(), BackendError> {
        dispatch!(self, unban_user(credentials, id))
    }

    pub async fn create_review(
        &self,
        credentials: &Credentials,
        review: &NewReview,
    ) -> Result<(), BackendError> {
        dispatch!(self, create_review(credentials, review))
    }

    pub async fn reviews_for(&self, id: &UserId) -> Result<ReviewSummary, BackendError> {
        dispatch!(self, reviews_for(id))
    }
}
