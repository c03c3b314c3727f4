//! Seat price type.

use std::cmp::Ordering;
use std::fmt;

use super::DomainError;

/// Price of one seat, in Tunisian dinars.
///
/// Always finite and non-negative, so prices have a total order.
///
/// # Examples
///
/// ```
/// use ride_server::domain::Price;
///
/// let p = Price::new(12.5).unwrap();
/// assert_eq!(p.to_string(), "12.5 TND");
/// assert_eq!(Price::new(30.0).unwrap().to_string(), "30 TND");
///
/// assert!(Price::new(-1.0).is_err());
/// assert!(Price::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price(f64);

impl Price {
    /// Create a price, rejecting negative or non-finite values.
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::InvalidPrice(value));
        }
        // Normalise -0.0 so Eq/Ord agree.
        Ok(Self(value + 0.0))
    }

    /// Returns the numeric value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TND", self.0)
    }
}
