//! Wire types for the REST backend.
//!
//! The backend speaks JSON with camelCase keys and Mongo-style `_id`
//! fields. References to other records arrive either as a bare id or as
//! the populated record, depending on the endpoint.

use serde::{Deserialize, Serialize};

/// A ride as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub origin: PlaceRecord,
    pub destination: PlaceRecord,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    #[serde(default)]
    pub available_seats: i64,

    #[serde(default, alias = "MaxUsersTwoInBack")]
    pub max_two_passengers_in_back_seats: bool,
    #[serde(default)]
    pub heavy_luggage: bool,
    #[serde(default)]
    pub smoking_allowed: bool,
    #[serde(default)]
    pub pets_allowed: bool,
    #[serde(default, alias = "AirConditioning")]
    pub air_conditioning: bool,

    #[serde(default)]
    pub vehicle_details: Option<VehicleRecord>,
    #[serde(default)]
    pub creator: Option<CreatorRef>,
    #[serde(default)]
    pub passengers: Vec<IdRef>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub place: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    #[serde(default, alias = "body", skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marque: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
}

/// A reference to another record: a bare id or the populated object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
    },
}

impl IdRef {
    pub fn id(&self) -> &str {
        match self {
            IdRef::Id(id) | IdRef::Populated { id } => id,
        }
    }
}

/// The creator of a ride: a bare id or the populated user.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreatorRef {
    Id(String),
    User(Box<UserRecord>),
}

/// A user as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub profile: ProfileRecord,
    #[serde(default)]
    pub rides_created: Vec<IdRef>,
    #[serde(default)]
    pub rides_joined: Vec<IdRef>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Average rating, only present on populated ride creators.
    #[serde(default)]
    pub stars: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// A review as sent by the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub owner: IdRef,
    #[serde(default)]
    pub reviewed_user: Option<IdRef>,
    pub rate: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub date: Option<String>,
}

/// `{ rides: [...] }`. Items stay untyped so one bad record cannot fail the
/// whole list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RidesResponse {
    #[serde(default)]
    pub rides: Vec<serde_json::Value>,
}

/// `GET reviews/user/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewsResponse {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub reviews: Vec<serde_json::Value>,
}

/// Login replies either wrap the user or are the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Wrapped {
        user: UserRecord,
        #[serde(default, rename = "isAdmin")]
        is_admin: Option<bool>,
    },
    Bare(UserRecord),
}

impl LoginResponse {
    pub fn into_user(self) -> UserRecord {
        match self {
            LoginResponse::Wrapped { mut user, is_admin } => {
                if let Some(is_admin) = is_admin {
                    user.is_admin = is_admin;
                }
                user
            }
            LoginResponse::Bare(user) => user,
        }
    }
}

/// `GET users` replies with a bare array or `{ users: [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UsersResponse {
    List(Vec<serde_json::Value>),
    Wrapped { users: Vec<serde_json::Value> },
}

impl UsersResponse {
    pub fn into_items(self) -> Vec<serde_json::Value> {
        match self {
            UsersResponse::List(items) | UsersResponse::Wrapped { users: items } => items,
        }
    }
}

/// `POST rides` replies with the new ride, bare or as `{ ride: {...} }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreatedRideResponse {
    Wrapped { ride: IdRef },
    Bare(IdRef),
}

impl CreatedRideResponse {
    pub fn id(&self) -> &str {
        match self {
            CreatedRideResponse::Wrapped { ride } | CreatedRideResponse::Bare(ride) => ride.id(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
}

/// Error bodies carry a human-readable `message`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: Option<String>,
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST rides` and `PATCH rides/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RideBody {
    pub origin: PlaceRecord,
    pub destination: PlaceRecord,
    pub start_time: String,
    pub end_time: String,
    pub price: f64,
    pub available_seats: u32,
    pub vehicle_details: VehicleRecord,
    pub max_two_passengers_in_back_seats: bool,
    pub heavy_luggage: bool,
    pub smoking_allowed: bool,
    pub pets_allowed: bool,
    pub air_conditioning: bool,
    pub status: &'static str,
}

/// Body of `PATCH users/{id}`; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatchBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody<'a> {
    pub ride_id: &'a str,
    pub reviewed_user: &'a str,
    pub rate: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}
