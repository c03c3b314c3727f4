//! Data transfer objects for JSON responses.

use serde::Serialize;

use crate::domain::{DriverSummary, Ride};
use crate::search::{ResultsKind, ResultsState};

/// Response from the search results endpoint.
#[derive(Debug, Serialize)]
pub struct SearchResultsResponse {
    /// `loading`, `failed`, `empty` or `listings`
    pub state: ResultsKind,

    /// Error text when `state` is `failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Visible rides, filtered and sorted
    pub rides: Vec<RideResult>,
}

impl SearchResultsResponse {
    pub fn from_state(state: &ResultsState) -> Self {
        let message = match state {
            ResultsState::Failed { message } => Some(message.clone()),
            _ => None,
        };

        Self {
            state: state.kind(),
            message,
            rides: state
                .listings()
                .iter()
                .map(|l| RideResult::from_ride(&l.ride))
                .collect(),
        }
    }
}

/// A ride in search results.
#[derive(Debug, Serialize)]
pub struct RideResult {
    pub id: String,

    /// Origin place name
    pub origin: String,

    /// Destination place name
    pub destination: String,

    /// Departure time (RFC 3339, UTC)
    pub start_time: String,

    /// Arrival time (RFC 3339, UTC)
    pub end_time: String,

    /// Price per seat in TND
    pub price: f64,

    pub available_seats: u32,

    /// Whether a seat can be booked
    pub bookable: bool,

    /// Wire keys of the amenities this ride offers
    pub amenities: Vec<&'static str>,

    /// Driver, when the backend populated it
    pub driver: Option<DriverResult>,

    /// "Marque Model"
    pub vehicle: String,
}

impl RideResult {
    pub fn from_ride(ride: &Ride) -> Self {
        Self {
            id: ride.id.to_string(),
            origin: ride.origin.name.clone(),
            destination: ride.destination.name.clone(),
            start_time: ride.start_time.to_rfc3339(),
            end_time: ride.end_time.to_rfc3339(),
            price: ride.price.value(),
            available_seats: ride.available_seats,
            bookable: ride.is_bookable(),
            amenities: ride.amenities.present().map(|a| a.key()).collect(),
            driver: ride.creator.as_ref().map(DriverResult::from_summary),
            vehicle: ride.vehicle.display_name(),
        }
    }
}

/// The driver of a ride.
#[derive(Debug, Serialize)]
pub struct DriverResult {
    pub id: String,
    pub name: String,

    /// Average rating 0-5
    pub stars: u8,
}

impl DriverResult {
    pub fn from_summary(driver: &DriverSummary) -> Self {
        Self {
            id: driver.id.to_string(),
            name: driver.name.clone(),
            stars: driver.stars,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Amenity;
    use crate::domain::test_support::ride_at;
    use crate::search::Listing;

    #[test]
    fn ride_result_fields() {
        let mut ride = ride_at("r1", 9, 15, 12.5, 3);
        ride.amenities.set(Amenity::HeavyLuggage, true);
        let result = RideResult::from_ride(&ride);

        assert_eq!(result.id, "r1");
        assert_eq!(result.start_time, "2025-06-01T09:15:00+00:00");
        assert_eq!(result.price, 12.5);
        assert!(result.bookable);
        assert_eq!(result.amenities, ["heavyLuggage"]);
        assert_eq!(result.driver.as_ref().map(|d| d.id.as_str()), Some("driver1"));
    }

    #[test]
    fn response_json_shape() {
        let state = ResultsState::Listings(vec![Listing::new(ride_at("r1", 9, 0, 10.0, 0))]);
        let json = serde_json::to_value(SearchResultsResponse::from_state(&state)).unwrap();

        assert_eq!(json["state"], "listings");
        assert!(json.get("message").is_none());
        assert_eq!(json["rides"][0]["bookable"], false);

        let failed = ResultsState::Failed {
            message: "backend down".into(),
        };
        let json = serde_json::to_value(SearchResultsResponse::from_state(&failed)).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["message"], "backend down");
        assert_eq!(json["rides"].as_array().map(Vec::len), Some(0));
    }
}
