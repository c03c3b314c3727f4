//! Domain types for the ride-sharing frontend.
//!
//! This module contains the validated model of rides, users and reviews.
//! All types enforce their invariants at construction time, so code that
//! receives these types can trust their validity.

mod amenity;
mod catalog;
mod error;
mod ids;
mod price;
mod review;
mod ride;
mod time;
mod time_bucket;
mod user;

pub use amenity::{Amenities, Amenity};
pub use catalog::{BodyType, City, place_image};
pub use error::DomainError;
pub use ids::{InvalidId, ReviewId, RideId, UserId};
pub use price::Price;
pub use review::{NewReview, Rating, Review, ReviewSummary};
pub use ride::{DriverSummary, Place, Ride, RideDraft, VehicleDetails};
pub use time::{format_clock, format_duration, format_long_date, parse_date, parse_timestamp};
pub use time_bucket::TimeBucket;
pub use user::{Profile, ProfileUpdate, User};

#[cfg(test)]
pub(crate) use ride::test_support;
