//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from backend/IO errors.

use super::InvalidId;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Identifier failed validation
    #[error(transparent)]
    InvalidId(#[from] InvalidId),

    /// Price is negative or not a number
    #[error("invalid price: {0}")]
    InvalidPrice(f64),

    /// Rating outside 1-5
    #[error("invalid rating: {0} (must be 1-5)")]
    InvalidRating(i64),

    /// Timestamp could not be parsed
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A ride must end after it starts
    #[error("ride must end after it starts")]
    EndBeforeStart,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RideId;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidPrice(-3.0);
        assert_eq!(err.to_string(), "invalid price: -3");

        let err = DomainError::InvalidRating(7);
        assert_eq!(err.to_string(), "invalid rating: 7 (must be 1-5)");

        let err = DomainError::InvalidTimestamp("yesterday".into());
        assert_eq!(err.to_string(), "invalid timestamp: yesterday");

        let err = DomainError::EndBeforeStart;
        assert_eq!(err.to_string(), "ride must end after it starts");

        let err: DomainError = RideId::parse("").unwrap_err().into();
        assert_eq!(err.to_string(), "invalid ride id: must not be empty");
    }
}
