//! In-memory backend for running and testing without the REST API.
//!
//! Loads rides, users and reviews from JSON files and serves them as if
//! they were live API responses. Mutations (bookings, new rides, bans,
//! reviews) are applied in memory and lost on restart.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    DomainError, DriverSummary, NewReview, Place, Profile, ProfileUpdate, Review, ReviewId,
    ReviewSummary, Ride, RideDraft, RideId, User, UserId,
};
use crate::search::SearchQuery;

use super::auth::{AuthSession, Credentials};
use super::convert::{ConversionError, convert_review, convert_ride, convert_user};
use super::error::BackendError;
use super::types::{ReviewRecord, RideRecord, UserRecord};

/// Cookie name used for mock credentials.
const MOCK_COOKIE: &str = "mock_session";

/// How many rides the popular list holds.
const POPULAR_LIMIT: usize = 6;

#[derive(Debug, Default)]
struct MockData {
    rides: Vec<Ride>,
    users: Vec<User>,
    /// Lowercased email to password.
    passwords: HashMap<String, String>,
    /// Reviews keyed by the reviewed user.
    reviews: Vec<(UserId, Review)>,
}

/// Mock backend that serves data from JSON fixture files.
///
/// Expects `rides.json` and `users.json` in the fixture directory, each a
/// JSON array in the backend's wire format. User records may carry a
/// `password` field. `reviews.json` is optional; its records need a
/// `reviewedUser`.
#[derive(Debug, Clone)]
pub struct MockBackend {
    data: Arc<RwLock<MockData>>,
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn bad_request(message: &str) -> BackendError {
    BackendError::Api {
        status: 400,
        message: message.to_string(),
    }
}

fn read_array(dir: &Path, file: &str) -> Result<Option<Vec<serde_json::Value>>, BackendError> {
    let path = dir.join(file);
    if !path.is_file() {
        return Ok(None);
    }

    let json = std::fs::read_to_string(&path)
        .map_err(|e| BackendError::Fixture(format!("Failed to read {:?}: {}", path, e)))?;

    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| BackendError::Fixture(format!("Failed to parse {:?}: {}", path, e)))
}

fn fixture_error(file: &str, index: usize, e: impl std::fmt::Display) -> BackendError {
    BackendError::Fixture(format!("{file} record {index}: {e}"))
}

impl MockBackend {
    /// Load fixtures from a directory.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, BackendError> {
        let dir = data_dir.as_ref();
        let required = |file: &str| {
            read_array(dir, file)?
                .ok_or_else(|| BackendError::Fixture(format!("Missing {file} in {:?}", dir)))
        };

        let mut data = MockData::default();

        for (i, item) in required("users.json")?.iter().enumerate() {
            let record = UserRecord::deserialize(item).map_err(|e| fixture_error("users.json", i, e))?;
            let user = convert_user(&record).map_err(|e| fixture_error("users.json", i, e))?;

            if let (Some(email), Some(password)) =
                (&user.email, item.get("password").and_then(|p| p.as_str()))
            {
                data.passwords
                    .insert(email.to_lowercase(), password.to_string());
            }
            data.users.push(user);
        }

        for (i, item) in required("rides.json")?.iter().enumerate() {
            let record = RideRecord::deserialize(item).map_err(|e| fixture_error("rides.json", i, e))?;
            let ride = convert_ride(&record).map_err(|e| fixture_error("rides.json", i, e))?;
            data.rides.push(ride);
        }

        for (i, item) in read_array(dir, "reviews.json")?
            .unwrap_or_default()
            .iter()
            .enumerate()
        {
            let record =
                ReviewRecord::deserialize(item).map_err(|e| fixture_error("reviews.json", i, e))?;
            let reviewed = record
                .reviewed_user
                .as_ref()
                .ok_or_else(|| {
                    ConversionError::Malformed(format!("review {} has no reviewedUser", record.id))
                })
                .and_then(|r| UserId::parse(r.id()).map_err(|e| DomainError::from(e).into()))
                .map_err(|e| fixture_error("reviews.json", i, e))?;
            let review = convert_review(&record).map_err(|e| fixture_error("reviews.json", i, e))?;
            data.reviews.push((reviewed, review));
        }

        info!(
            dir = %dir.display(),
            rides = data.rides.len(),
            users = data.users.len(),
            reviews = data.reviews.len(),
            "Loaded mock backend fixtures"
        );

        Ok(Self {
            data: Arc::new(RwLock::new(data)),
        })
    }

    // ========================================================================
    // Rides
    // ========================================================================

    /// Case-insensitive route match on the given UTC date when one is set.
    ///
    /// Rides with too few free seats are left out, except sold-out rides,
    /// which are listed so the search page can show them as full.
    pub async fn find_rides(&self, query: &SearchQuery) -> Result<Vec<Ride>, BackendError> {
        let data = self.data.read().await;
        let from = query.from().to_lowercase();
        let to = query.to().to_lowercase();
        let rides = data
            .rides
            .iter()
            .filter(|r| r.origin.name.to_lowercase() == from)
            .filter(|r| r.destination.name.to_lowercase() == to)
            .filter(|r| r.available_seats == 0 || r.available_seats >= u32::from(query.seat()))
            .filter(|r| query.date().is_none_or(|d| r.start_time.date_naive() == d))
            .map(|r| data.present(r))
            .collect();
        Ok(rides)
    }

    pub async fn get_ride(&self, id: &RideId) -> Result<Ride, BackendError> {
        let data = self.data.read().await;
        data.ride(id).map(|r| data.present(r))
    }

    /// Rides with the most passengers first.
    pub async fn popular_rides(&self) -> Result<Vec<Ride>, BackendError> {
        let data = self.data.read().await;
        let mut rides: Vec<&Ride> = data.rides.iter().collect();
        rides.sort_by_key(|r| Reverse(r.passengers.len()));
        Ok(rides
            .into_iter()
            .take(POPULAR_LIMIT)
            .map(|r| data.present(r))
            .collect())
    }

    pub async fn all_rides(&self, credentials: &Credentials) -> Result<Vec<Ride>, BackendError> {
        let data = self.data.read().await;
        data.admin(credentials)?;
        Ok(data.rides.iter().map(|r| data.present(r)).collect())
    }

    pub async fn create_ride(
        &self,
        credentials: &Credentials,
        draft: &RideDraft,
    ) -> Result<Option<RideId>, BackendError> {
        let mut data = self.data.write().await;
        let user_id = data.authenticate(credentials)?.id.clone();
        let id = RideId::parse(&new_id()).map_err(DomainError::from).map_err(ConversionError::from)?;

        let mut ride = Ride {
            id: id.clone(),
            origin: Place::new(draft.origin.name()),
            destination: Place::new(draft.destination.name()),
            start_time: draft.start_time,
            end_time: draft.end_time,
            price: draft.price,
            available_seats: draft.seats,
            amenities: draft.amenities,
            vehicle: draft.vehicle.clone(),
            creator: None,
            passengers: Vec::new(),
            status: Some("pending".to_string()),
        };
        ride.creator = data.driver_summary(&user_id);

        data.rides.push(ride);
        if let Some(user) = data.user_mut(&user_id) {
            user.rides_created.push(id.clone());
        }
        debug!(ride = %id, creator = %user_id, "Mock ride created");
        Ok(Some(id))
    }

    pub async fn update_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
        draft: &RideDraft,
    ) -> Result<(), BackendError> {
        let mut data = self.data.write().await;
        let user = data.authenticate(credentials)?.clone();
        let ride = data.ride_mut(id)?;
        if !ride.is_created_by(&user.id) && !user.is_admin {
            return Err(BackendError::Unauthorized);
        }

        ride.origin = Place::new(draft.origin.name());
        ride.destination = Place::new(draft.destination.name());
        ride.start_time = draft.start_time;
        ride.end_time = draft.end_time;
        ride.price = draft.price;
        ride.available_seats = draft.seats;
        ride.amenities = draft.amenities;
        ride.vehicle = draft.vehicle.clone();
        Ok(())
    }

    /// Delete a ride. Only its creator or an admin may.
    pub async fn delete_ride(
        &self,
        credentials: &Credentials,
        id: &RideId,
    ) -> Result<(), BackendError> {
        let mut data = self.data.write().await;
        let user = data.authenticate(credentials)?.clone();
        let ride = data.ride(id)?;
        if !ride.is_created_by(&user.id) && !user.is_admin {
            return Err(BackendError::Unauthorized);
        }

        data.rides.retain(|r| &r.id != id);
        for user in &mut data.users {
            user.rides_created.retain(|r| r != id);
            user.rides_joined.retain(|r| r != id);
        }
        Ok(())
    }

    pub async fn join_ride(&self, credentials: &Credentials, id: &RideId) -> Result<(), BackendError> {
        let mut data = self.data.write().await;
        let user_id = data.authenticate(credentials)?.id.clone();
        let ride = data.ride_mut(id)?;

        if ride.is_created_by(&user_id) {
            return Err(bad_request("You cannot book your own ride"));
        }
        if ride.has_passenger(&user_id) {
            return Err(bad_request("You have already booked this ride"));
        }
        if !ride.is_bookable() {
            return Err(bad_request("No seats available"));
        }

        ride.available_seats -= 1;
        ride.passengers.push(user_id.clone());
        if let Some(user) = data.user_mut(&user_id) {
            user.rides_joined.push(id.clone());
        }
        Ok(())
    }

    pub async fn leave_ride(&self, credentials: &Credentials, id: &RideId) -> Result<(), BackendError> {
        let mut data = self.data.write().await;
        let user_id = data.authenticate(credentials)?.id.clone();
        let ride = data.ride_mut(id)?;

        if !ride.has_passenger(&user_id) {
            return Err(bad_request("You have not booked this ride"));
        }

        ride.passengers.retain(|p| p != &user_id);
        ride.available_seats += 1;
        if let Some(user) = data.user_mut(&user_id) {
            user.rides_joined.retain(|r| r != id);
        }
        Ok(())
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let data = self.data.read().await;
        let email = email.trim().to_lowercase();

        if data.passwords.get(&email).map(String::as_str) != Some(password) {
            return Err(BackendError::Unauthorized);
        }
        let user = data
            .users
            .iter()
            .find(|u| u.email.as_ref().is_some_and(|e| e.to_lowercase() == email))
            .ok_or(BackendError::Unauthorized)?;

        Ok(AuthSession {
            user: user.clone(),
            credentials: Some(Credentials::new(format!("{MOCK_COOKIE}={}", user.id))),
        })
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), BackendError> {
        let mut data = self.data.write().await;
        let key = email.trim().to_lowercase();
        if data.passwords.contains_key(&key) {
            return Err(BackendError::Api {
                status: 409,
                message: "Email already registered".to_string(),
            });
        }

        let id = UserId::parse(&new_id()).map_err(DomainError::from).map_err(ConversionError::from)?;
        data.users.push(User {
            id,
            name: name.trim().to_string(),
            email: Some(email.trim().to_string()),
            is_admin: false,
            is_banned: false,
            profile_picture: None,
            profile: Profile::default(),
            rides_created: Vec::new(),
            rides_joined: Vec::new(),
            created_at: Some(Utc::now()),
        });
        data.passwords.insert(key, password.to_string());
        Ok(())
    }

    pub async fn logout(&self, credentials: &Credentials) -> Result<(), BackendError> {
        let data = self.data.read().await;
        data.authenticate(credentials)?;
        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn get_user(&self, id: &UserId) -> Result<User, BackendError> {
        let data = self.data.read().await;
        data.users
            .iter()
            .find(|u| &u.id == id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    /// Users may only edit their own account.
    pub async fn update_user(
        &self,
        credentials: &Credentials,
        id: &UserId,
        update: &ProfileUpdate,
        _current: &Profile,
    ) -> Result<(), BackendError> {
        let mut data = self.data.write().await;
        if &data.authenticate(credentials)?.id != id {
            return Err(BackendError::Unauthorized);
        }
        let user = data.user_mut(id).ok_or(BackendError::NotFound)?;

        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(bio) = &update.bio {
            user.profile.bio = Some(bio.clone());
        }
        if let Some(picture) = &update.profile_picture {
            user.profile_picture = Some(picture.clone());
        }
        Ok(())
    }

    /// Accepts the upload and names it; the bytes are not kept.
    pub async fn upload_image(
        &self,
        credentials: &Credentials,
        file_name: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let data = self.data.read().await;
        data.authenticate(credentials)?;

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("img");
        let filename = format!("{}.{}", new_id(), extension.to_ascii_lowercase());
        debug!(%filename, size = bytes.len(), "Mock upload stored");
        Ok(filename)
    }

    pub async fn list_users(&self, credentials: &Credentials) -> Result<Vec<User>, BackendError> {
        let data = self.data.read().await;
        data.admin(credentials)?;
        Ok(data.users.clone())
    }

    pub async fn ban_user(&self, credentials: &Credentials, id: &UserId) -> Result<(), BackendError> {
        self.set_banned(credentials, id, true).await
    }

    pub async fn unban_user(
        &self,
        credentials: &Credentials,
        id: &UserId,
    ) -> Result<(), BackendError> {
        self.set_banned(credentials, id, false).await
    }

    async fn set_banned(
        &self,
        credentials: &Credentials,
        id: &UserId,
        banned: bool,
    ) -> Result<(), BackendError> {
        let mut data = self.data.write().await;
        data.admin(credentials)?;
        let user = data.user_mut(id).ok_or(BackendError::NotFound)?;
        user.is_banned = banned;
        Ok(())
    }

    // ========================================================================
    // Reviews
    // ========================================================================

    /// Only passengers of the ride may review, and only its driver.
    pub async fn create_review(
        &self,
        credentials: &Credentials,
        review: &NewReview,
    ) -> Result<(), BackendError> {
        let mut data = self.data.write().await;
        let owner = data.authenticate(credentials)?.id.clone();
        let ride = data.ride(&review.ride)?;

        if !ride.has_passenger(&owner) {
            return Err(BackendError::Api {
                status: 403,
                message: "Only passengers of this ride can review its driver".to_string(),
            });
        }
        if !ride.is_created_by(&review.reviewed_user) {
            return Err(bad_request("You can only review the driver of this ride"));
        }

        let id = ReviewId::parse(&new_id()).map_err(DomainError::from).map_err(ConversionError::from)?;
        data.reviews.push((
            review.reviewed_user.clone(),
            Review {
                id,
                owner,
                rate: review.rate,
                comment: review.comment.clone(),
                date: Some(Utc::now()),
            },
        ));
        Ok(())
    }

    pub async fn reviews_for(&self, id: &UserId) -> Result<ReviewSummary, BackendError> {
        let data = self.data.read().await;
        Ok(data.summary(id))
    }
}

impl MockData {
    fn ride(&self, id: &RideId) -> Result<&Ride, BackendError> {
        self.rides
            .iter()
            .find(|r| &r.id == id)
            .ok_or(BackendError::NotFound)
    }

    fn ride_mut(&mut self, id: &RideId) -> Result<&mut Ride, BackendError> {
        self.rides
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or(BackendError::NotFound)
    }

    fn user_mut(&mut self, id: &UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| &u.id == id)
    }

    /// The signed-in, non-banned user the credentials name.
    fn authenticate(&self, credentials: &Credentials) -> Result<&User, BackendError> {
        let id = credentials
            .as_str()
            .split("; ")
            .find_map(|pair| pair.strip_prefix(MOCK_COOKIE)?.strip_prefix('='))
            .ok_or(BackendError::Unauthorized)?;

        self.users
            .iter()
            .find(|u| u.id.as_str() == id && !u.is_banned)
            .ok_or(BackendError::Unauthorized)
    }

    fn admin(&self, credentials: &Credentials) -> Result<&User, BackendError> {
        let user = self.authenticate(credentials)?;
        if user.is_admin {
            Ok(user)
        } else {
            Err(BackendError::Unauthorized)
        }
    }

    fn summary(&self, id: &UserId) -> ReviewSummary {
        let reviews: Vec<Review> = self
            .reviews
            .iter()
            .filter(|(reviewed, _)| reviewed == id)
            .map(|(_, review)| review.clone())
            .collect();

        let score = if reviews.is_empty() {
            0.0
        } else {
            reviews.iter().map(|r| f64::from(r.rate.get())).sum::<f64>() / reviews.len() as f64
        };

        ReviewSummary { score, reviews }
    }

    fn driver_summary(&self, id: &UserId) -> Option<DriverSummary> {
        let user = self.users.iter().find(|u| &u.id == id)?;
        Some(DriverSummary {
            id: user.id.clone(),
            name: user.name.clone(),
            stars: self.summary(id).stars(),
            profile_picture: user.profile_picture.clone(),
            bio: user.profile.bio.clone(),
            rides_published: self.rides.iter().filter(|r| r.is_created_by(id)).count(),
        })
    }

    /// A ride with its creator populated from the current user table.
    fn present(&self, ride: &Ride) -> Ride {
        let mut ride = ride.clone();
        if let Some(summary) = ride.creator_id().and_then(|id| self.driver_summary(id)) {
            ride.creator = Some(summary);
        }
        ride
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Amenities, City, Price, Rating, VehicleDetails};
    use chrono::{Duration, NaiveDate, TimeZone};
    use tempfile::TempDir;

    const USERS: &str = r#"[
        {"_id": "admin1", "name": "Admin", "email": "admin@example.tn", "isAdmin": true, "password": "root"},
        {"_id": "amira", "name": "Amira", "email": "amira@example.tn", "password": "pw", "profile": {"bio": "Driver"}},
        {"_id": "karim", "name": "Karim", "email": "karim@example.tn", "password": "pw"},
        {"_id": "sami", "name": "Sami", "email": "sami@example.tn", "password": "pw", "isBanned": true}
    ]"#;

    const RIDES: &str = r#"[
        {"_id": "r1", "origin": {"place": "Tunis"}, "destination": {"place": "Sousse"},
         "startTime": "2025-06-01T07:30:00Z", "endTime": "2025-06-01T10:00:00Z",
         "price": 20, "availableSeats": 1, "creator": "amira", "passengers": ["karim"]},
        {"_id": "r2", "origin": {"place": "Tunis"}, "destination": {"place": "Sousse"},
         "startTime": "2025-06-02T14:00:00Z", "endTime": "2025-06-02T16:30:00Z",
         "price": 15, "availableSeats": 3, "creator": "amira"},
        {"_id": "r3", "origin": {"place": "Sfax"}, "destination": {"place": "Gabès"},
         "startTime": "2025-06-01T09:00:00Z", "endTime": "2025-06-01T11:00:00Z",
         "price": 18, "availableSeats": 0, "creator": "karim", "passengers": ["amira", "admin1"]}
    ]"#;

    const REVIEWS: &str = r#"[
        {"_id": "v1", "owner": "karim", "reviewedUser": "amira", "rate": 5, "comment": "Great"},
        {"_id": "v2", "owner": "admin1", "reviewedUser": "amira", "rate": 4}
    ]"#;

    fn fixtures() -> (TempDir, MockBackend) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("users.json"), USERS).unwrap();
        std::fs::write(dir.path().join("rides.json"), RIDES).unwrap();
        std::fs::write(dir.path().join("reviews.json"), REVIEWS).unwrap();
        let backend = MockBackend::load(dir.path()).unwrap();
        (dir, backend)
    }

    fn creds(user: &str) -> Credentials {
        Credentials::new(format!("{MOCK_COOKIE}={user}"))
    }

    fn ride_id(id: &str) -> RideId {
        RideId::parse(id).unwrap()
    }

    fn user_id(id: &str) -> UserId {
        UserId::parse(id).unwrap()
    }

    fn draft() -> RideDraft {
        let start = Utc.with_ymd_and_hms(2030, 3, 1, 8, 0, 0).unwrap();
        RideDraft {
            origin: City::Tunis,
            destination: City::Bizerte,
            start_time: start,
            end_time: start + Duration::hours(1),
            price: Price::new(9.0).unwrap(),
            seats: 2,
            amenities: Amenities::default(),
            vehicle: VehicleDetails::default(),
        }
    }

    #[tokio::test]
    async fn load_bundled_fixtures() {
        let backend = MockBackend::load("data/mock").unwrap();
        let popular = backend.popular_rides().await.unwrap();
        assert!(!popular.is_empty());
    }

    #[tokio::test]
    async fn missing_fixture_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("users.json"), "[]").unwrap();
        let err = MockBackend::load(dir.path()).unwrap_err();
        assert!(matches!(err, BackendError::Fixture(ref m) if m.contains("rides.json")));
    }

    #[tokio::test]
    async fn review_without_subject_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("users.json"), USERS).unwrap();
        std::fs::write(dir.path().join("rides.json"), "[]").unwrap();
        std::fs::write(
            dir.path().join("reviews.json"),
            r#"[{"_id": "v1", "owner": "karim", "rate": 5}]"#,
        )
        .unwrap();
        let err = MockBackend::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("reviewedUser"));
    }

    #[tokio::test]
    async fn find_matches_route_seats_and_date() {
        let (_dir, backend) = fixtures();

        let query = SearchQuery::new("tunis", "SOUSSE", 1, None).unwrap();
        let ids: Vec<_> = backend
            .find_rides(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, [ride_id("r1"), ride_id("r2")]);

        let query = SearchQuery::new("Tunis", "Sousse", 2, None).unwrap();
        assert_eq!(backend.find_rides(&query).await.unwrap().len(), 1);

        let date = NaiveDate::from_ymd_opt(2025, 6, 1);
        let query = SearchQuery::new("Tunis", "Sousse", 1, date).unwrap();
        let rides = backend.find_rides(&query).await.unwrap();
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].id, ride_id("r1"));
    }

    #[tokio::test]
    async fn rides_carry_populated_creator() {
        let (_dir, backend) = fixtures();
        let ride = backend.get_ride(&ride_id("r1")).await.unwrap();
        let creator = ride.creator.unwrap();
        assert_eq!(creator.name, "Amira");
        assert_eq!(creator.stars, 5);
        assert_eq!(creator.rides_published, 2);
        assert_eq!(creator.bio.as_deref(), Some("Driver"));

        let err = backend.get_ride(&ride_id("nope")).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound));
    }

    #[tokio::test]
    async fn popular_orders_by_passengers() {
        let (_dir, backend) = fixtures();
        let ids: Vec<_> = backend
            .popular_rides()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, [ride_id("r3"), ride_id("r1"), ride_id("r2")]);
    }

    #[tokio::test]
    async fn join_and_leave_track_seats() {
        let (_dir, backend) = fixtures();
        let admin = creds("admin1");
        let r2 = ride_id("r2");

        backend.join_ride(&admin, &r2).await.unwrap();
        let ride = backend.get_ride(&r2).await.unwrap();
        assert_eq!(ride.available_seats, 2);
        assert!(ride.has_passenger(&user_id("admin1")));

        let err = backend.join_ride(&admin, &r2).await.unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 400, .. }));

        backend.leave_ride(&admin, &r2).await.unwrap();
        let ride = backend.get_ride(&r2).await.unwrap();
        assert_eq!(ride.available_seats, 3);
        assert!(ride.passengers.is_empty());

        let err = backend.leave_ride(&admin, &r2).await.unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn cannot_join_own_or_full_ride() {
        let (_dir, backend) = fixtures();

        let err = backend.join_ride(&creds("amira"), &ride_id("r1")).await.unwrap_err();
        assert_eq!(err.user_message(), "You cannot book your own ride");

        let err = backend.join_ride(&creds("admin1"), &ride_id("r3")).await.unwrap_err();
        assert_eq!(err.user_message(), "You have already booked this ride");

        backend.register("Lina", "lina@example.tn", "pw").await.unwrap();
        let lina = backend.login("lina@example.tn", "pw").await.unwrap();
        let err = backend
            .join_ride(lina.credentials.as_ref().unwrap(), &ride_id("r3"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "No seats available");
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let (_dir, backend) = fixtures();
        let r2 = ride_id("r2");

        for bad in [Credentials::new("other=1"), creds("ghost"), creds("sami")] {
            let err = backend.join_ride(&bad, &r2).await.unwrap_err();
            assert!(matches!(err, BackendError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn login_and_register() {
        let (_dir, backend) = fixtures();

        let session = backend.login("Amira@Example.tn", "pw").await.unwrap();
        assert_eq!(session.user.name, "Amira");
        assert_eq!(session.credentials, Some(creds("amira")));

        let err = backend.login("amira@example.tn", "wrong").await.unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized));

        backend.register("Lina", "lina@example.tn", "secret").await.unwrap();
        let session = backend.login("lina@example.tn", "secret").await.unwrap();
        assert_eq!(session.user.name, "Lina");
        assert!(!session.user.is_admin);

        let err = backend
            .register("Lina", "LINA@example.tn", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 409, .. }));
    }

    #[tokio::test]
    async fn banned_user_login_reports_ban() {
        let (_dir, backend) = fixtures();
        let session = backend.login("sami@example.tn", "pw").await.unwrap();
        assert!(session.user.is_banned);
    }

    #[tokio::test]
    async fn create_update_delete_ride() {
        let (_dir, backend) = fixtures();
        let karim = creds("karim");

        let id = backend.create_ride(&karim, &draft()).await.unwrap().unwrap();
        let ride = backend.get_ride(&id).await.unwrap();
        assert_eq!(ride.destination.name, "Bizerte");
        assert_eq!(ride.creator_id(), Some(&user_id("karim")));
        assert_eq!(ride.status.as_deref(), Some("pending"));

        let user = backend.get_user(&user_id("karim")).await.unwrap();
        assert!(user.rides_created.contains(&id));

        let mut changed = draft();
        changed.seats = 4;
        let err = backend
            .update_ride(&creds("amira"), &id, &changed)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized));

        backend.update_ride(&karim, &id, &changed).await.unwrap();
        assert_eq!(backend.get_ride(&id).await.unwrap().available_seats, 4);

        // Admins may delete any ride.
        backend.delete_ride(&creds("admin1"), &id).await.unwrap();
        assert!(matches!(
            backend.get_ride(&id).await.unwrap_err(),
            BackendError::NotFound
        ));
        let user = backend.get_user(&user_id("karim")).await.unwrap();
        assert!(!user.rides_created.contains(&id));
    }

    #[tokio::test]
    async fn admin_operations_require_admin() {
        let (_dir, backend) = fixtures();
        let admin = creds("admin1");

        assert!(matches!(
            backend.list_users(&creds("karim")).await.unwrap_err(),
            BackendError::Unauthorized
        ));
        assert_eq!(backend.list_users(&admin).await.unwrap().len(), 4);
        assert_eq!(backend.all_rides(&admin).await.unwrap().len(), 3);

        backend.ban_user(&admin, &user_id("karim")).await.unwrap();
        assert!(backend.get_user(&user_id("karim")).await.unwrap().is_banned);
        backend.unban_user(&admin, &user_id("karim")).await.unwrap();
        assert!(!backend.get_user(&user_id("karim")).await.unwrap().is_banned);

        assert!(matches!(
            backend.ban_user(&admin, &user_id("ghost")).await.unwrap_err(),
            BackendError::NotFound
        ));
    }

    #[tokio::test]
    async fn profile_updates_own_account_only() {
        let (_dir, backend) = fixtures();
        let update = ProfileUpdate {
            bio: Some("Hello".into()),
            profile_picture: Some("me.png".into()),
            ..Default::default()
        };

        backend
            .update_user(&creds("karim"), &user_id("karim"), &update, &Profile::default())
            .await
            .unwrap();
        let user = backend.get_user(&user_id("karim")).await.unwrap();
        assert_eq!(user.profile.bio.as_deref(), Some("Hello"));
        assert_eq!(user.profile_picture.as_deref(), Some("me.png"));
        assert_eq!(user.name, "Karim");

        let err = backend
            .update_user(&creds("karim"), &user_id("amira"), &update, &Profile::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Unauthorized));
    }

    #[tokio::test]
    async fn upload_names_file() {
        let (_dir, backend) = fixtures();
        let name = backend
            .upload_image(&creds("karim"), "Me.PNG", "image/png", vec![1, 2, 3])
            .await
            .unwrap();
        assert!(name.ends_with(".png"));
    }

    #[tokio::test]
    async fn reviews_only_from_passengers() {
        let (_dir, backend) = fixtures();
        let review = |reviewed: &str| NewReview {
            ride: ride_id("r1"),
            reviewed_user: user_id(reviewed),
            rate: Rating::new(2).unwrap(),
            comment: None,
        };

        let err = backend
            .create_review(&creds("admin1"), &review("amira"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 403, .. }));

        let err = backend
            .create_review(&creds("karim"), &review("admin1"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Api { status: 400, .. }));

        backend
            .create_review(&creds("karim"), &review("amira"))
            .await
            .unwrap();
        let summary = backend.reviews_for(&user_id("amira")).await.unwrap();
        assert_eq!(summary.reviews.len(), 3);
        assert!((summary.score - 11.0 / 3.0).abs() < 1e-9);

        let empty = backend.reviews_for(&user_id("karim")).await.unwrap();
        assert_eq!(empty.score, 0.0);
        assert!(empty.reviews.is_empty());
    }
}
