//! Departure time-of-day buckets.
//!
//! All hour extraction uses UTC. The backend stores timestamps in UTC and the
//! ride pages display UTC times, so bucketing on the same clock keeps the
//! filter consistent with what the user sees.

use std::fmt;
use std::ops::Range;

use chrono::{DateTime, Timelike, Utc};

/// A named range of departure hours.
///
/// The buckets are non-overlapping and together cover the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeBucket {
    BeforeEight,
    EightToNoon,
    NoonToSix,
    AfterSix,
}

impl TimeBucket {
    /// Every bucket, in order of the day.
    pub const ALL: [TimeBucket; 4] = [
        TimeBucket::BeforeEight,
        TimeBucket::EightToNoon,
        TimeBucket::NoonToSix,
        TimeBucket::AfterSix,
    ];

    /// Hour range `[start, end)` covered by this bucket.
    pub fn hours(self) -> Range<u32> {
        match self {
            TimeBucket::BeforeEight => 0..8,
            TimeBucket::EightToNoon => 8..12,
            TimeBucket::NoonToSix => 12..18,
            TimeBucket::AfterSix => 18..24,
        }
    }

    /// Key used in filter query strings.
    pub fn key(self) -> &'static str {
        match self {
            TimeBucket::BeforeEight => "before_eight",
            TimeBucket::EightToNoon => "eight_to_noon",
            TimeBucket::NoonToSix => "noon_to_six",
            TimeBucket::AfterSix => "after_six",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeBucket::BeforeEight => "Before 08:00",
            TimeBucket::EightToNoon => "08:00 - 12:00",
            TimeBucket::NoonToSix => "12:00 - 18:00",
            TimeBucket::AfterSix => "After 18:00",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.key() == key)
    }

    /// The bucket containing the given hour (0-23).
    pub fn for_hour(hour: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.hours().contains(&hour))
    }

    /// Whether a departure at `time` falls in this bucket.
    pub fn contains(self, time: &DateTime<Utc>) -> bool {
        self.hours().contains(&time.hour())
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
