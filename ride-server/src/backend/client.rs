//! REST backend HTTP client.
//!
//! Provides async methods for every backend endpoint the frontend uses.
//! Handles cookie authentication, concurrency limiting, status mapping and
//! conversion to domain types.

use std::sync::Arc;

use reqwest::header::COOKIE;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::{NewReview, Profile, ProfileUpdate, Ride, RideDraft, RideId, ReviewSummary, User, UserId};
use crate::search::SearchQuery;

use super::auth::{AuthSession, Credentials};
use super::convert::{
    convert_reviews, convert_ride, convert_rides, convert_user, convert_users, profile_record,
    ride_body,
};
use super::error::BackendError;
use super::types::{
    CreatedRideResponse, ErrorBody, LoginBody, LoginResponse, RegisterBody, ReviewBody,
    ReviewsResponse, RideRecord, RidesResponse, UploadResponse, UserPatchBody, UserRecord,
    UsersResponse,
};

/// Default base URL for the backend API.
const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Longest response body excerpt kept in errors.
const BODY_EXCERPT: usize = 500;

/// Configuration for the backend client.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the API, e.g. `http://localhost:5000/api`
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 15,
        }
    }
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Backend API client.
///
/// Uses a semaphore to limit concurrent requests so a burst of page loads
/// cannot flood the backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
}

impl BackendClient {
    /// Create a new client with the given configuration.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> RequestBuilder {
        let mut request = self.http.request(method, self.url(path));
        if let Some(cookie) = credentials.and_then(Credentials::header_value) {
            request = request.header(COOKIE, cookie);
        }
        request
    }

    /// Send a request and map error statuses.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| BackendError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Backend response");

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Unauthorized),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Err(BackendError::RateLimited),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(BackendError::Api {
                    status: status.as_u16(),
                    message: error_message(&body),
                })
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| BackendError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(BODY_EXCERPT).collect()),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credentials: Option<&Credentials>,
    ) -> Result<T, BackendError> {
        let response = self
            .execute(self.request(Method::GET, path, credentials))
            .await?;
        Self::read_json(response).await
    }

    // ========================================================================
    // Rides
    // ========================================================================

    /// Rides matching a search. Records that fail validation are dropped.
    pub async fn find_rides(&self, query: &SearchQuery) -> Result<Vec<Ride>, BackendError> {
        let request = self
            .request(Method::GET, "rides/find", None)
            .query(&query.to_params());
        let response: RidesResponse = Self::read_json(self.execute(request).await?).await?;

        let rides = convert_rides(&response.rides);
        if rides.len() < response.rides.len() {
            warn!(
                query = ?query,
                received = response.rides.len(),
                kept = rides.len(),
                "Dropped invalid rides from search response"
            );
        }
        Ok(rides)
    }

    pub async fn get_ride(&self, id: &RideId) -> Result<Ride, BackendError> {
        let record: RideRecord = self.get_json(&format!("rides/{id}"), None).await?;
        Ok(convert_ride(&record)?)
    }

    pub async fn popular_rides(&self) -> Result<Vec<Ride>, BackendError> {
        let response: RidesResponse = self.get_json("rides/popular", None).await?;
        Ok(convert_rides(&response.rides))
    }

    /// Every ride (admin only).
    pub async fn all_rides(&self, credentials: &Credentials) -> Result<Vec<Ride>, BackendError> {
        let response: RidesResponse = self.get_json("rides/all", Some(credentials)).await?;
        Ok(convert_rides(&response.rides))
    }

    /// Publish a ride. Returns the new ride's id when the backend reports it.
    pub async fn create_ride(
        &self,
        credentials: &Credentials,
        draft: &RideDraft,
    ) -> Result<Option<RideId>, BackendError> {
        let request = self
            .request(Method::POST, "rides", Some(credentials))
            .json(&ride_body(draft));
        let response = self.execute(request).await?;

        let created = Self::read_json::<CreatedRideResponse>(response)
            .await
            .inspect_err(|e| debug!(error = %e, "Create ride response had no id"))
            .ok();
        Ok(created.and_then(|c| RideId::parse(c.id()).ok()))
    }

    pub async fn update_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
        draft: &RideDraft,
    ) -> Result<(), BackendError> {
        let request = self
            .request(Method::PATCH, &format!("rides/{id}"), Some(credentials))
            .json(&ride_body(draft));
        self.execute(request).await?;
        Ok(())
    }

    pub async fn delete_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
    ) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &format!("rides/{id}"), Some(credentials));
        self.execute(request).await?;
        Ok(())
    }

    /// Book a seat on a ride.
    pub async fn join_ride(&self, credentials: &Credentials, id: &RideId) -> Result<(), BackendError> {
        let request = self.request(Method::GET, &format!("rides/{id}/join"), Some(credentials));
        self.execute(request).await?;
        Ok(())
    }

    /// Cancel a booking.
    pub async fn leave_ride(&self, credentials: &Credentials, id: &RideId) -> Result<(), BackendError> {
        let request = self.request(Method::GET, &format!("rides/{id}/leave"), Some(credentials));
        self.execute(request).await?;
        Ok(())
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let request = self
            .request(Method::POST, "auth/login", None)
            .json(&LoginBody { email, password });
        let response = self.execute(request).await?;

        let credentials = Credentials::from_set_cookie(response.headers());
        if credentials.is_none() {
            warn!("Login response set no cookie; authenticated calls will fail");
        }

        let body: LoginResponse = Self::read_json(response).await?;
        let user = convert_user(&body.into_user())?;
        Ok(AuthSession { user, credentials })
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        let request = self
            .request(Method::POST, "auth/register", None)
            .json(&RegisterBody {
                name,
                email,
                password,
            });
        self.execute(request).await?;
        Ok(())
    }

    pub async fn logout(&self, credentials: &Credentials) -> Result<(), BackendError> {
        let request = self.request(Method::POST, "auth/logout", Some(credentials));
        self.execute(request).await?;
        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_user(&self, id: &UserId) -> Result<User, BackendError> {
        let record: UserRecord = self.get_json(&format!("users/{id}"), None).await?;
        Ok(convert_user(&record)?)
    }

    /// Apply a profile update. `current` supplies the profile fields this
    /// update does not touch.
    pub async fn update_user(
        &self,
        credentials: &Credentials,
        id: &UserId,
        update: &ProfileUpdate,
        current: &Profile,
    ) -> Result<(), BackendError> {
        let body = UserPatchBody {
            name: update.name.clone(),
            profile: update
                .bio
                .as_deref()
                .map(|bio| profile_record(current, Some(bio))),
            profile_picture: update.profile_picture.clone(),
        };
        let request = self
            .request(Method::PATCH, &format!("users/{id}"), Some(credentials))
            .json(&body);
        self.execute(request).await?;
        Ok(())
    }

    /// Upload an image; returns the stored file name.
    pub async fn upload_image(
        &self,
        credentials: &Credentials,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let request = self
            .request(Method::POST, "uploads", Some(credentials))
            .multipart(form);
        let response: UploadResponse = Self::read_json(self.execute(request).await?).await?;
        Ok(response.filename)
    }

    /// Every user (admin only).
    pub async fn list_users(&self, credentials: &Credentials) -> Result<Vec<User>, BackendError> {
        let response: UsersResponse = self.get_json("users", Some(credentials)).await?;
        Ok(convert_users(&response.into_items()))
    }

    pub async fn ban_user(&self, credentials: &Credentials, id: &UserId) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &format!("admin/ban/{id}"), Some(credentials));
        self.execute(request).await?;
        Ok(())
    }

    pub async fn unban_user(
        &self,
        credentials: &Credentials,
        id: &UserId,
    ) -> Result<(), BackendError> {
        let request =
            self.request(Method::DELETE, &format!("admin/unban/{id}"), Some(credentials));
        self.execute(request).await?;
        Ok(())
    }

    // ========================================================================
    // Reviews
    // ========================================================================

    pub async fn create_review(
        &self,
        credentials: &Credentials,
        review: &NewReview,
    ) -> Result<(), BackendError> {
        let body = ReviewBody {
            ride_id: review.ride.as_str(),
            reviewed_user: review.reviewed_user.as_str(),
            rate: review.rate.get(),
            comment: review.comment.as_deref(),
        };
        let request = self
            .request(Method::POST, "reviews", Some(credentials))
            .json(&body);
        self.execute(request).await?;
        Ok(())
    }

    /// Reviews about a user and their average score.
    pub async fn reviews_for(&self, id: &UserId) -> Result<ReviewSummary, BackendError> {
        let response: ReviewsResponse = self.get_json(&format!("reviews/user/{id}"), None).await?;
        Ok(convert_reviews(response.score, &response.reviews))
    }
}

/// The backend's `message` field, or the raw body excerpt.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.chars().take(BODY_EXCERPT).collect())
}
