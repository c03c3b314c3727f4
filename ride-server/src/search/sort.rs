//! Sort options for search results.

use std::cmp::Ordering;
use std::fmt;

use crate::domain::Ride;

/// How to order the filtered results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOption {
    /// Ascending by departure time.
    EarliestDeparture,
    /// Ascending by price.
    LowestPrice,
}

impl SortOption {
    pub const ALL: [SortOption; 2] = [SortOption::EarliestDeparture, SortOption::LowestPrice];

    /// Value used in the `sort` query parameter.
    pub fn key(self) -> &'static str {
        match self {
            SortOption::EarliestDeparture => "earliest",
            SortOption::LowestPrice => "price",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOption::EarliestDeparture => "Earliest departure",
            SortOption::LowestPrice => "Lowest price",
        }
    }

    /// Parse a `sort` value. Unknown values mean "no sort".
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    /// The comparator for this option.
    pub fn compare(self, a: &Ride, b: &Ride) -> Ordering {
        match self {
            SortOption::EarliestDeparture => a.start_time.cmp(&b.start_time),
            SortOption::LowestPrice => a.price.cmp(&b.price),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Order rides in place.
///
/// The sort is stable, so rides that compare equal keep their fetch order.
/// With no option the slice is left untouched.
pub fn sort_rides(rides: &mut [&Ride], sort: Option<SortOption>) {
    if let Some(sort) = sort {
        rides.sort_by(|a, b| sort.compare(a, b));
    }
}
