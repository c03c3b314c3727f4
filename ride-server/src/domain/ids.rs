//! Backend identifier types.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Maximum identifier length accepted from the backend.
const MAX_ID_LEN: usize = 64;

/// Error returned when parsing an invalid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

fn validate(kind: &'static str, s: &str) -> Result<(), InvalidId> {
    if s.is_empty() {
        return Err(InvalidId {
            kind,
            reason: "must not be empty",
        });
    }

    if s.len() > MAX_ID_LEN {
        return Err(InvalidId {
            kind,
            reason: "too long",
        });
    }

    if !s
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(InvalidId {
            kind,
            reason: "must be ASCII letters, digits, '-' or '_'",
        });
    }

    Ok(())
}

macro_rules! backend_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, rejecting anything unsafe to put in a URL path.
            pub fn parse(s: &str) -> Result<Self, InvalidId> {
                validate($kind, s)?;
                Ok(Self(s.to_string()))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

backend_id!(
    /// Identifier of a ride record.
    ///
    /// # Examples
    ///
    /// ```
    /// use ride_server::domain::RideId;
    ///
    /// let id = RideId::parse("65f1c2a9e4b0a1b2c3d4e5f6").unwrap();
    /// assert_eq!(id.as_str(), "65f1c2a9e4b0a1b2c3d4e5f6");
    ///
    /// assert!(RideId::parse("").is_err());
    /// assert!(RideId::parse("../users").is_err());
    /// ```
    RideId,
    "ride"
);

backend_id!(
    /// Identifier of a user account.
    UserId,
    "user"
);

backend_id!(
    /// Identifier of a review.
    ReviewId,
    "review"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_ids() {
        assert!(RideId::parse("65f1c2a9e4b0a1b2c3d4e5f6").is_ok());
        assert!(UserId::parse("user-1").is_ok());
        assert!(UserId::parse("user_1").is_ok());
        assert!(ReviewId::parse("r1").is_ok());
    }

    #[test]
    fn reject_path_characters() {
        assert!(RideId::parse("a/b").is_err());
        assert!(RideId::parse("..").is_err());
        assert!(RideId::parse("a b").is_err());
        assert!(RideId::parse("a?b=c").is_err());
        assert!(RideId::parse("é").is_err());
    }

    #[test]
    fn reject_empty_and_long() {
        assert!(UserId::parse("").is_err());
        assert!(UserId::parse(&"a".repeat(64)).is_ok());
        assert!(UserId::parse(&"a".repeat(65)).is_err());
    }

    #[test]
    fn error_names_kind() {
        let err = RideId::parse("").unwrap_err();
        assert_eq!(err.to_string(), "invalid ride id: must not be empty");

        let err = UserId::parse("a/b").unwrap_err();
        assert!(err.to_string().starts_with("invalid user id"));
    }

    #[test]
    fn serde_roundtrip_validates() {
        let id: RideId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");

        let bad: Result<RideId, _> = serde_json::from_str("\"a/b\"");
        assert!(bad.is_err());
    }
}
