//! Ride records.

use chrono::{DateTime, Duration, Timelike, Utc};

use super::{Amenities, BodyType, City, DomainError, Price, RideId, UserId};

/// A named place a ride starts or ends at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub name: String,
}

impl Place {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The car used for a ride.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleDetails {
    /// Body style, if the backend value is one we know.
    pub body: Option<BodyType>,
    pub marque: Option<String>,
    pub model: Option<String>,
    pub vehicle_number: Option<String>,
}

impl VehicleDetails {
    /// "Marque Model", or whichever half is known.
    pub fn display_name(&self) -> String {
        match (&self.marque, &self.model) {
            (Some(m), Some(model)) => format!("{} {}", m, model),
            (Some(m), None) => m.clone(),
            (None, Some(model)) => model.clone(),
            (None, None) => String::from("Unknown vehicle"),
        }
    }
}

/// The subset of the driver's profile embedded in a ride record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSummary {
    pub id: UserId,
    pub name: String,
    /// Average rating 0-5; 0 means "not rated yet".
    pub stars: u8,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub rides_published: usize,
}

/// A single origin→destination trip offer.
///
/// Owned by the backend and read-only to this server; mutations go through
/// the backend and the record is refetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    pub id: RideId,
    pub origin: Place,
    pub destination: Place,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Price,
    pub available_seats: u32,
    pub amenities: Amenities,
    pub vehicle: VehicleDetails,
    /// `None` when the backend did not populate the creator.
    pub creator: Option<DriverSummary>,
    pub passengers: Vec<UserId>,
    pub status: Option<String>,
}

impl Ride {
    /// Check the schedule is coherent.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.end_time < self.start_time {
            return Err(DomainError::EndBeforeStart);
        }
        Ok(())
    }

    /// Whether a passenger can book a seat right now.
    pub fn is_bookable(&self) -> bool {
        self.available_seats > 0
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Departure hour (0-23), UTC.
    pub fn departure_hour(&self) -> u32 {
        self.start_time.hour()
    }

    pub fn creator_id(&self) -> Option<&UserId> {
        self.creator.as_ref().map(|c| &c.id)
    }

    /// Whether `user` published this ride.
    pub fn is_created_by(&self, user: &UserId) -> bool {
        self.creator_id() == Some(user)
    }

    /// Whether `user` has a seat on this ride.
    pub fn has_passenger(&self, user: &UserId) -> bool {
        self.passengers.contains(user)
    }
}

/// A validated ride about to be published or updated.
#[derive(Debug, Clone, PartialEq)]
pub struct RideDraft {
    pub origin: City,
    pub destination: City,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Price,
    pub seats: u32,
    pub amenities: Amenities,
    pub vehicle: VehicleDetails,
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Ride builders shared by tests across the crate.

    use super::*;
    use chrono::TimeZone;

    pub fn ride_at(id: &str, hour: u32, min: u32, price: f64, seats: u32) -> Ride {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, hour, min, 0).unwrap();
        Ride {
            id: RideId::parse(id).unwrap(),
            origin: Place::new("Tunis"),
            destination: Place::new("Sousse"),
            start_time: start,
            end_time: start + Duration::minutes(150),
            price: Price::new(price).unwrap(),
            available_seats: seats,
            amenities: Amenities::default(),
            vehicle: VehicleDetails::default(),
            creator: Some(driver("driver1")),
            passengers: Vec::new(),
            status: None,
        }
    }

    pub fn driver(id: &str) -> DriverSummary {
        DriverSummary {
            id: UserId::parse(id).unwrap(),
            name: format!("Driver {id}"),
            stars: 4,
            profile_picture: None,
            bio: None,
            rides_published: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn bookable_iff_seats_remain() {
        assert!(ride_at("a", 8, 0, 10.0, 2).is_bookable());
        assert!(ride_at("a", 8, 0, 10.0, 1).is_bookable());
        assert!(!ride_at("a", 8, 0, 10.0, 0).is_bookable());
    }

    #[test]
    fn duration_and_hour() {
        let ride = ride_at("a", 7, 30, 10.0, 2);
        assert_eq!(ride.duration(), Duration::minutes(150));
        assert_eq!(ride.departure_hour(), 7);
    }

    #[test]
    fn creator_and_passengers() {
        let mut ride = ride_at("a", 7, 30, 10.0, 2);
        let driver = UserId::parse("driver1").unwrap();
        let other = UserId::parse("someone").unwrap();

        assert!(ride.is_created_by(&driver));
        assert!(!ride.is_created_by(&other));

        ride.passengers.push(other.clone());
        assert!(ride.has_passenger(&other));
        assert!(!ride.has_passenger(&driver));

        ride.creator = None;
        assert!(!ride.is_created_by(&driver));
    }

    #[test]
    fn validate_schedule() {
        let mut ride = ride_at("a", 7, 30, 10.0, 2);
        assert!(ride.validate().is_ok());

        ride.end_time = ride.start_time - Duration::minutes(1);
        assert_eq!(ride.validate(), Err(DomainError::EndBeforeStart));
    }

    #[test]
    fn vehicle_display_name() {
        let mut v = VehicleDetails::default();
        assert_eq!(v.display_name(), "Unknown vehicle");

        v.marque = Some("Peugeot".into());
        assert_eq!(v.display_name(), "Peugeot");

        v.model = Some("208".into());
        assert_eq!(v.display_name(), "Peugeot 208");
    }
}
