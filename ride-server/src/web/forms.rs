//! Form parsing and validation.
//!
//! Each form keeps the raw submitted strings so an invalid submission can
//! be re-rendered as typed, and validates into a domain value.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{
    Amenities, Amenity, BodyType, City, Price, ProfileUpdate, Rating, Ride, RideDraft,
    VehicleDetails, parse_timestamp,
};
use crate::search::MAX_SEATS;

/// Largest accepted profile picture.
pub const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

const MAX_NAME_LEN: usize = 60;
const MAX_BIO_LEN: usize = 300;
const MAX_COMMENT_LEN: usize = 500;
const MIN_PASSWORD_LEN: usize = 6;

/// A single validation failure, shown next to the form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Choose a departure city from the list")]
    UnknownOrigin,

    #[error("Choose a destination city from the list")]
    UnknownDestination,

    #[error("Departure and destination must be different")]
    SameCity,

    #[error("Seats must be a number between 1 and 10")]
    InvalidSeats,

    #[error("Price must be a number of at least 0 TND")]
    InvalidPrice,

    #[error("Enter a valid departure date and time")]
    InvalidStart,

    #[error("Departure must be in the future")]
    StartInPast,

    #[error("Enter a valid arrival date and time")]
    InvalidEnd,

    #[error("Arrival must be after departure")]
    EndBeforeStart,

    #[error("Choose a vehicle type from the list")]
    UnknownBodyType,

    #[error("Name is required")]
    MissingName,

    #[error("Name must be at most 60 characters")]
    NameTooLong,

    #[error("Bio must be at most 300 characters")]
    BioTooLong,

    #[error("Enter a valid email address")]
    InvalidEmail,

    #[error("Password is required")]
    MissingPassword,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Choose a picture to upload")]
    MissingFile,

    #[error("Only image files can be uploaded")]
    NotAnImage,

    #[error("Pictures must be at most 5 MB")]
    ImageTooLarge,

    #[error("Rate the driver from 1 to 5 stars")]
    InvalidRating,

    #[error("Comments must be at most 500 characters")]
    CommentTooLong,
}

fn field(params: &HashMap<String, String>, key: &str) -> String {
    params
        .get(key)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn is_checked(params: &HashMap<String, String>, key: &str) -> bool {
    params
        .get(key)
        .is_some_and(|v| matches!(v.trim(), "on" | "true" | "1"))
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn valid_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
}

/// Value for a `datetime-local` input (UTC).
fn datetime_input(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M").to_string()
}

// ============================================================================
// Ride offer
// ============================================================================

/// The publish/edit ride form as submitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OfferSeatForm {
    pub origin: String,
    pub destination: String,
    /// `datetime-local` value, taken as UTC.
    pub start: String,
    pub end: String,
    pub price: String,
    pub seats: String,
    pub body_type: String,
    pub marque: String,
    pub model: String,
    pub vehicle_number: String,
    pub amenities: Amenities,
}

impl OfferSeatForm {
    /// Blank form with one seat.
    pub fn new() -> Self {
        Self {
            seats: "1".to_string(),
            ..Self::default()
        }
    }

    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut amenities = Amenities::default();
        for amenity in Amenity::ALL {
            amenities.set(amenity, is_checked(params, amenity.key()));
        }

        Self {
            origin: field(params, "origin"),
            destination: field(params, "destination"),
            start: field(params, "start"),
            end: field(params, "end"),
            price: field(params, "price"),
            seats: field(params, "seats"),
            body_type: field(params, "body_type"),
            marque: field(params, "marque"),
            model: field(params, "model"),
            vehicle_number: field(params, "vehicle_number"),
            amenities,
        }
    }

    /// Prefill from an existing ride for editing.
    pub fn from_ride(ride: &Ride) -> Self {
        let city_name = |place: &str| {
            City::find(place)
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| place.to_string())
        };

        Self {
            origin: city_name(&ride.origin.name),
            destination: city_name(&ride.destination.name),
            start: datetime_input(&ride.start_time),
            end: datetime_input(&ride.end_time),
            price: ride.price.value().to_string(),
            seats: ride.available_seats.to_string(),
            body_type: ride
                .vehicle
                .body
                .map(|b| b.value().to_string())
                .unwrap_or_default(),
            marque: ride.vehicle.marque.clone().unwrap_or_default(),
            model: ride.vehicle.model.clone().unwrap_or_default(),
            vehicle_number: ride.vehicle.vehicle_number.clone().unwrap_or_default(),
            amenities: ride.amenities,
        }
    }

    /// Validate against the current time. Every failure is reported.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<RideDraft, Vec<FormError>> {
        let mut errors = Vec::new();

        let origin = City::find(&self.origin);
        let destination = City::find(&self.destination);
        if origin.is_none() {
            errors.push(FormError::UnknownOrigin);
        }
        if destination.is_none() {
            errors.push(FormError::UnknownDestination);
        }
        if origin.is_some() && origin == destination {
            errors.push(FormError::SameCity);
        }

        let seats = self
            .seats
            .parse::<u32>()
            .ok()
            .filter(|s| (1..=u32::from(MAX_SEATS)).contains(s));
        if seats.is_none() {
            errors.push(FormError::InvalidSeats);
        }

        let price = self
            .price
            .parse::<f64>()
            .ok()
            .and_then(|p| Price::new(p).ok());
        if price.is_none() {
            errors.push(FormError::InvalidPrice);
        }

        let start = parse_timestamp(&self.start).ok();
        match start {
            None => errors.push(FormError::InvalidStart),
            Some(t) if t <= now => errors.push(FormError::StartInPast),
            Some(_) => {}
        }

        let end = parse_timestamp(&self.end).ok();
        match (start, end) {
            (_, None) => errors.push(FormError::InvalidEnd),
            (Some(s), Some(e)) if e <= s => errors.push(FormError::EndBeforeStart),
            _ => {}
        }

        let body = if self.body_type.is_empty() {
            None
        } else {
            let body = BodyType::parse(&self.body_type);
            if body.is_none() {
                errors.push(FormError::UnknownBodyType);
            }
            body
        };

        match (origin, destination, seats, price, start, end) {
            (Some(origin), Some(destination), Some(seats), Some(price), Some(start), Some(end))
                if errors.is_empty() =>
            {
                Ok(RideDraft {
                    origin,
                    destination,
                    start_time: start,
                    end_time: end,
                    price,
                    seats,
                    amenities: self.amenities,
                    vehicle: VehicleDetails {
                        body,
                        marque: optional(&self.marque),
                        model: optional(&self.model),
                        vehicle_number: optional(&self.vehicle_number),
                    },
                })
            }
            _ => Err(errors),
        }
    }
}

// ============================================================================
// Account forms
// ============================================================================

/// Name and bio edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub bio: String,
}

impl ProfileForm {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            name: field(params, "name"),
            bio: field(params, "bio"),
        }
    }

    pub fn validate(&self) -> Result<ProfileUpdate, Vec<FormError>> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(FormError::MissingName);
        } else if self.name.chars().count() > MAX_NAME_LEN {
            errors.push(FormError::NameTooLong);
        }
        if self.bio.chars().count() > MAX_BIO_LEN {
            errors.push(FormError::BioTooLong);
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ProfileUpdate {
            name: Some(self.name.clone()),
            bio: Some(self.bio.clone()),
            profile_picture: None,
        })
    }
}

/// Check an uploaded profile picture.
pub fn validate_picture(content_type: Option<&str>, size: usize) -> Result<(), FormError> {
    if size == 0 {
        return Err(FormError::MissingFile);
    }
    if !content_type.is_some_and(|ct| ct.starts_with("image/")) {
        return Err(FormError::NotAnImage);
    }
    if size > MAX_PICTURE_BYTES {
        return Err(FormError::ImageTooLarge);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            email: field(params, "email"),
            // Passwords are taken as typed.
            password: params.get("password").cloned().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FormError>> {
        let mut errors = Vec::new();
        if !valid_email(&self.email) {
            errors.push(FormError::InvalidEmail);
        }
        if self.password.is_empty() {
            errors.push(FormError::MissingPassword);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        Self {
            name: field(params, "name"),
            email: field(params, "email"),
            password: params.get("password").cloned().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FormError>> {
        let mut errors = Vec::new();
        if self.name.is_empty() {
            errors.push(FormError::MissingName);
        } else if self.name.chars().count() > MAX_NAME_LEN {
            errors.push(FormError::NameTooLong);
        }
        if !valid_email(&self.email) {
            errors.push(FormError::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FormError::PasswordTooShort);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewForm {
    pub rate: Rating,
    pub comment: Option<String>,
}

impl ReviewForm {
    pub fn parse(params: &HashMap<String, String>) -> Result<Self, FormError> {
        let rate = field(params, "rate")
            .parse::<i64>()
            .ok()
            .and_then(|r| Rating::new(r).ok())
            .ok_or(FormError::InvalidRating)?;

        let comment = optional(&field(params, "comment"));
        if comment
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_COMMENT_LEN)
        {
            return Err(FormError::CommentTooLong);
        }

        Ok(Self { rate, comment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::ride_at;
    use chrono::TimeZone;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn offer() -> HashMap<String, String> {
        params(&[
            ("origin", "Tunis"),
            ("destination", "Béja"),
            ("start", "2030-01-02T08:00"),
            ("end", "2030-01-02T10:15"),
            ("price", "12.5"),
            ("seats", "3"),
            ("body_type", "suv"),
            ("model", " Tucson "),
            ("airConditioning", "on"),
        ])
    }

    #[test]
    fn valid_offer() {
        let draft = OfferSeatForm::from_params(&offer()).validate(now()).unwrap();
        assert_eq!(draft.origin, City::Tunis);
        assert_eq!(draft.destination, City::Beja);
        assert_eq!(
            draft.start_time,
            Utc.with_ymd_and_hms(2030, 1, 2, 8, 0, 0).unwrap()
        );
        assert_eq!(draft.seats, 3);
        assert_eq!(draft.price.value(), 12.5);
        assert_eq!(draft.vehicle.body, Some(BodyType::Suv));
        assert_eq!(draft.vehicle.model.as_deref(), Some("Tucson"));
        assert_eq!(draft.vehicle.marque, None);
        assert!(draft.amenities.has(Amenity::AirConditioning));
        assert!(!draft.amenities.has(Amenity::PetsAllowed));
    }

    #[test]
    fn same_city_rejected() {
        let mut p = offer();
        p.insert("destination".into(), "tunis".into());
        let errors = OfferSeatForm::from_params(&p).validate(now()).unwrap_err();
        assert_eq!(errors, [FormError::SameCity]);
    }

    #[test]
    fn every_failure_reported() {
        let p = params(&[
            ("origin", "Paris"),
            ("destination", "Sfax"),
            ("start", "2029-12-31T08:00"),
            ("end", "2029-12-31T07:00"),
            ("price", "-1"),
            ("seats", "11"),
            ("body_type", "tank"),
        ]);
        let errors = OfferSeatForm::from_params(&p).validate(now()).unwrap_err();
        assert_eq!(
            errors,
            [
                FormError::UnknownOrigin,
                FormError::InvalidSeats,
                FormError::InvalidPrice,
                FormError::StartInPast,
                FormError::EndBeforeStart,
                FormError::UnknownBodyType,
            ]
        );
    }

    #[test]
    fn unparseable_times() {
        let mut p = offer();
        p.insert("start".into(), "soon".into());
        p.insert("end".into(), "".into());
        let errors = OfferSeatForm::from_params(&p).validate(now()).unwrap_err();
        assert_eq!(errors, [FormError::InvalidStart, FormError::InvalidEnd]);
    }

    #[test]
    fn zero_price_allowed_zero_seats_not() {
        let mut p = offer();
        p.insert("price".into(), "0".into());
        assert!(OfferSeatForm::from_params(&p).validate(now()).is_ok());

        p.insert("seats".into(), "0".into());
        let errors = OfferSeatForm::from_params(&p).validate(now()).unwrap_err();
        assert_eq!(errors, [FormError::InvalidSeats]);
    }

    #[test]
    fn prefill_from_ride() {
        let ride = ride_at("r1", 7, 30, 20.0, 2);
        let form = OfferSeatForm::from_ride(&ride);
        assert_eq!(form.origin, "Tunis");
        assert_eq!(form.start, "2025-06-01T07:30");
        assert_eq!(form.end, "2025-06-01T10:00");
        assert_eq!(form.price, "20");
        assert_eq!(form.seats, "2");
    }

    #[test]
    fn profile_form() {
        let update = ProfileForm::from_params(&params(&[("name", " Amira "), ("bio", "")]))
            .validate()
            .unwrap();
        assert_eq!(update.name.as_deref(), Some("Amira"));
        assert_eq!(update.bio.as_deref(), Some(""));

        let long = "x".repeat(MAX_BIO_LEN + 1);
        let errors = ProfileForm::from_params(&params(&[("name", ""), ("bio", &long)]))
            .validate()
            .unwrap_err();
        assert_eq!(errors, [FormError::MissingName, FormError::BioTooLong]);
    }

    #[test]
    fn picture_checks() {
        assert_eq!(validate_picture(Some("image/png"), 1024), Ok(()));
        assert_eq!(
            validate_picture(Some("application/pdf"), 1024),
            Err(FormError::NotAnImage)
        );
        assert_eq!(validate_picture(None, 1024), Err(FormError::NotAnImage));
        assert_eq!(
            validate_picture(Some("image/jpeg"), MAX_PICTURE_BYTES + 1),
            Err(FormError::ImageTooLarge)
        );
        assert_eq!(
            validate_picture(Some("image/jpeg"), MAX_PICTURE_BYTES),
            Ok(())
        );
        assert_eq!(validate_picture(Some("image/png"), 0), Err(FormError::MissingFile));
    }

    #[test]
    fn auth_forms() {
        let login = LoginForm::from_params(&params(&[("email", "a@b.tn"), ("password", " pw ")]));
        assert_eq!(login.password, " pw ");
        assert!(login.validate().is_ok());

        let login = LoginForm::from_params(&params(&[("email", "nope")]));
        assert_eq!(
            login.validate().unwrap_err(),
            [FormError::InvalidEmail, FormError::MissingPassword]
        );

        let register = RegisterForm::from_params(&params(&[
            ("name", "Lina"),
            ("email", "lina@example.tn"),
            ("password", "12345"),
        ]));
        assert_eq!(register.validate().unwrap_err(), [FormError::PasswordTooShort]);
    }

    #[test]
    fn review_form() {
        let form = ReviewForm::parse(&params(&[("rate", "4"), ("comment", "  ")])).unwrap();
        assert_eq!(form.rate.get(), 4);
        assert_eq!(form.comment, None);

        assert_eq!(
            ReviewForm::parse(&params(&[("rate", "6")])),
            Err(FormError::InvalidRating)
        );
        assert_eq!(
            ReviewForm::parse(&params(&[])),
            Err(FormError::InvalidRating)
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(
            FormError::SameCity.to_string(),
            "Departure and destination must be different"
        );
        assert_eq!(
            FormError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
    }
}
