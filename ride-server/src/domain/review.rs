//! Driver reviews and ratings.

use std::fmt;

use chrono::{DateTime, Utc};

use super::{DomainError, ReviewId, RideId, UserId};

/// A star rating from 1 to 5.
///
/// # Examples
///
/// ```
/// use ride_server::domain::Rating;
///
/// assert_eq!(Rating::new(4).unwrap().get(), 4);
/// assert!(Rating::new(0).is_err());
/// assert!(Rating::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        match value {
            1..=5 => Ok(Self(value as u8)),
            _ => Err(DomainError::InvalidRating(value)),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

/// A review left by a passenger about a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    pub id: ReviewId,
    /// The user who wrote the review.
    pub owner: UserId,
    pub rate: Rating,
    pub comment: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// All reviews about one driver plus the backend's aggregate score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewSummary {
    /// Average rating, 0 when there are no reviews.
    pub score: f64,
    pub reviews: Vec<Review>,
}

impl ReviewSummary {
    /// Score rounded to whole stars for display (0-5).
    pub fn stars(&self) -> u8 {
        self.score.round().clamp(0.0, 5.0) as u8
    }
}

/// A review about to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub ride: RideId,
    pub reviewed_user: UserId,
    pub rate: Rating,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        for v in 1..=5 {
            assert_eq!(Rating::new(v).unwrap().get() as i64, v);
        }
        assert_eq!(Rating::new(0), Err(DomainError::InvalidRating(0)));
        assert_eq!(Rating::new(-1), Err(DomainError::InvalidRating(-1)));
        assert_eq!(Rating::new(6), Err(DomainError::InvalidRating(6)));
    }

    #[test]
    fn rating_display() {
        assert_eq!(Rating::new(3).unwrap().to_string(), "3/5");
    }

    #[test]
    fn summary_stars() {
        let mut s = ReviewSummary::default();
        assert_eq!(s.stars(), 0);

        s.score = 3.6;
        assert_eq!(s.stars(), 4);

        s.score = 9.0;
        assert_eq!(s.stars(), 5);
    }
}
