//! Conversion from backend DTOs to domain types.
//!
//! Lists are converted record by record: a record that fails validation is
//! logged and skipped rather than failing the whole response.

use serde::Deserialize;
use tracing::warn;

use crate::domain::{
    Amenities, BodyType, DomainError, DriverSummary, Place, Price, Profile, Rating, Review,
    ReviewId, ReviewSummary, Ride, RideDraft, RideId, User, UserId, VehicleDetails,
    parse_timestamp,
};

use super::types::{
    CreatorRef, IdRef, PlaceRecord, ProfileRecord, ReviewRecord, RideBody, RideRecord,
    UserRecord, VehicleRecord,
};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("invalid seat count: {0}")]
    InvalidSeats(i64),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Convert a ride record.
pub fn convert_ride(record: &RideRecord) -> Result<Ride, ConversionError> {
    let id = RideId::parse(&record.id).map_err(DomainError::from)?;
    let start_time = parse_timestamp(&record.start_time)?;
    let end_time = parse_timestamp(&record.end_time)?;
    let price = Price::new(record.price)?;

    let available_seats = u32::try_from(record.available_seats)
        .map_err(|_| ConversionError::InvalidSeats(record.available_seats))?;

    let amenities = Amenities {
        max_two_in_back: record.max_two_passengers_in_back_seats,
        heavy_luggage: record.heavy_luggage,
        smoking_allowed: record.smoking_allowed,
        pets_allowed: record.pets_allowed,
        air_conditioning: record.air_conditioning,
    };

    let vehicle = record
        .vehicle_details
        .as_ref()
        .map(convert_vehicle)
        .unwrap_or_default();

    let creator = record.creator.as_ref().map(convert_creator).transpose()?;

    let passengers = record
        .passengers
        .iter()
        .map(|p| UserId::parse(p.id()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(DomainError::from)?;

    let ride = Ride {
        id,
        origin: Place::new(record.origin.place.trim()),
        destination: Place::new(record.destination.place.trim()),
        start_time,
        end_time,
        price,
        available_seats,
        amenities,
        vehicle,
        creator,
        passengers,
        status: record.status.clone(),
    };
    ride.validate()?;

    Ok(ride)
}

/// Convert a `rides` list, dropping records that fail to decode or validate.
pub fn convert_rides(items: &[serde_json::Value]) -> Vec<Ride> {
    let mut rides = Vec::with_capacity(items.len());

    for item in items {
        let id = item.get("_id").and_then(|v| v.as_str()).unwrap_or("?");

        let record = match RideRecord::deserialize(item) {
            Ok(record) => record,
            Err(e) => {
                warn!(ride = id, error = %e, "Skipping undecodable ride");
                continue;
            }
        };

        match convert_ride(&record) {
            Ok(ride) => rides.push(ride),
            Err(e) => warn!(ride = id, error = %e, "Skipping invalid ride"),
        }
    }

    rides
}

fn convert_vehicle(record: &VehicleRecord) -> VehicleDetails {
    let non_empty = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    VehicleDetails {
        body: record.body_type.as_deref().and_then(BodyType::parse),
        marque: non_empty(&record.marque),
        model: non_empty(&record.model),
        vehicle_number: non_empty(&record.vehicle_number),
    }
}

fn convert_creator(creator: &CreatorRef) -> Result<DriverSummary, ConversionError> {
    match creator {
        CreatorRef::Id(id) => Ok(DriverSummary {
            id: UserId::parse(id).map_err(DomainError::from)?,
            name: String::new(),
            stars: 0,
            profile_picture: None,
            bio: None,
            rides_published: 0,
        }),
        CreatorRef::User(user) => Ok(DriverSummary {
            id: UserId::parse(&user.id).map_err(DomainError::from)?,
            name: user.name.clone(),
            stars: user
                .stars
                .filter(|s| s.is_finite())
                .map(|s| s.round().clamp(0.0, 5.0) as u8)
                .unwrap_or(0),
            profile_picture: user.profile_picture.clone(),
            bio: user.profile.bio.clone(),
            rides_published: user.rides_created.len(),
        }),
    }
}

fn parse_ride_refs(refs: &[IdRef]) -> Result<Vec<RideId>, ConversionError> {
    refs.iter()
        .map(|r| RideId::parse(r.id()).map_err(|e| ConversionError::from(DomainError::from(e))))
        .collect()
}

/// Convert a user record.
pub fn convert_user(record: &UserRecord) -> Result<User, ConversionError> {
    let id = UserId::parse(&record.id).map_err(DomainError::from)?;

    let created_at = record
        .created_at
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    Ok(User {
        id,
        name: record.name.clone(),
        email: record.email.clone(),
        is_admin: record.is_admin,
        is_banned: record.is_banned,
        profile_picture: record.profile_picture.clone(),
        profile: Profile {
            bio: record.profile.bio.clone(),
            age: record.profile.age,
            phone_number: record.profile.phone_number.clone(),
        },
        rides_created: parse_ride_refs(&record.rides_created)?,
        rides_joined: parse_ride_refs(&record.rides_joined)?,
        created_at,
    })
}

/// Convert a list of user records, dropping invalid ones.
pub fn convert_users(records: &[serde_json::Value]) -> Vec<User> {
    records
        .iter()
        .filter_map(|item| {
            let record = match UserRecord::deserialize(item) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable user");
                    return None;
                }
            };
            convert_user(&record)
                .inspect_err(|e| warn!(user = %record.id, error = %e, "Skipping invalid user"))
                .ok()
        })
        .collect()
}

/// Convert a review record.
pub fn convert_review(record: &ReviewRecord) -> Result<Review, ConversionError> {
    Ok(Review {
        id: ReviewId::parse(&record.id).map_err(DomainError::from)?,
        owner: UserId::parse(record.owner.id()).map_err(DomainError::from)?,
        rate: Rating::new(record.rate)?,
        comment: record
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        date: record.date.as_deref().map(parse_timestamp).transpose()?,
    })
}

/// Convert the reviews endpoint response, dropping invalid reviews.
pub fn convert_reviews(score: f64, items: &[serde_json::Value]) -> ReviewSummary {
    let reviews = items
        .iter()
        .filter_map(|item| {
            let record = match ReviewRecord::deserialize(item) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable review");
                    return None;
                }
            };
            convert_review(&record)
                .inspect_err(|e| warn!(review = %record.id, error = %e, "Skipping invalid review"))
                .ok()
        })
        .collect();

    ReviewSummary {
        score: if score.is_finite() { score.max(0.0) } else { 0.0 },
        reviews,
    }
}

/// Build the request body for publishing or updating a ride.
pub fn ride_body(draft: &RideDraft) -> RideBody {
    RideBody {
        origin: PlaceRecord {
            place: draft.origin.name().to_string(),
        },
        destination: PlaceRecord {
            place: draft.destination.name().to_string(),
        },
        start_time: draft.start_time.to_rfc3339(),
        end_time: draft.end_time.to_rfc3339(),
        price: draft.price.value(),
        available_seats: draft.seats,
        vehicle_details: VehicleRecord {
            body_type: draft.vehicle.body.map(|b| b.value().to_string()),
            marque: draft.vehicle.marque.clone(),
            model: draft.vehicle.model.clone(),
            vehicle_number: draft.vehicle.vehicle_number.clone(),
        },
        max_two_passengers_in_back_seats: draft.amenities.max_two_in_back,
        heavy_luggage: draft.amenities.heavy_luggage,
        smoking_allowed: draft.amenities.smoking_allowed,
        pets_allowed: draft.amenities.pets_allowed,
        air_conditioning: draft.amenities.air_conditioning,
        status: "pending",
    }
}

/// Profile part of a user patch: only the bio is editable here, the other
/// fields are carried over so the backend does not clear them.
pub fn profile_record(current: &Profile, bio: Option<&str>) -> ProfileRecord {
    ProfileRecord {
        bio: bio.map(str::to_string).or_else(|| current.bio.clone()),
        age: current.age,
        phone_number: current.phone_number.clone(),
    }
}
