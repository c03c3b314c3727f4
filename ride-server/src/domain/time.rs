//! Timestamp parsing and display.
//!
//! The backend sends ISO 8601 timestamps. Everything is kept and shown in
//! UTC; see [`super::TimeBucket`] for why.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use super::DomainError;

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (`2025-06-01T07:30:00.000Z`, `2025-06-01T09:30:00+02:00`)
/// and offset-less `YYYY-MM-DDTHH:MM[:SS]`, which is taken as UTC.
///
/// # Examples
///
/// ```
/// use ride_server::domain::parse_timestamp;
///
/// let t = parse_timestamp("2025-06-01T07:30:00.000Z").unwrap();
/// assert_eq!(t.to_rfc3339(), "2025-06-01T07:30:00+00:00");
///
/// let local = parse_timestamp("2025-06-01T09:30:00+02:00").unwrap();
/// assert_eq!(local, t);
///
/// assert!(parse_timestamp("tomorrow").is_err());
/// ```
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DomainError> {
    let s = s.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(DomainError::InvalidTimestamp(s.to_string()))
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::InvalidTimestamp(s.to_string()))
}

/// "HH:MM" in UTC.
pub fn format_clock(t: &DateTime<Utc>) -> String {
    t.format("%H:%M").to_string()
}

/// Long date, e.g. "Sunday, June 1".
pub fn format_long_date(t: &DateTime<Utc>) -> String {
    t.format("%A, %B %-d").to_string()
}

/// Compact duration, e.g. "2h 5m" or "45m".
pub fn format_duration(d: Duration) -> String {
    let total_mins = d.num_minutes().max(0);
    let hours = total_mins / 60;
    let mins = total_mins % 60;

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn parse_zulu() {
        let t = parse_timestamp("2025-06-01T07:30:00Z").unwrap();
        assert_eq!(t.hour(), 7);
        assert_eq!(t.minute(), 30);
    }

    #[test]
    fn parse_offset_converts_to_utc() {
        let t = parse_timestamp("2025-06-01T01:00:00+02:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 5, 31, 23, 0, 0).unwrap());
    }

    #[test]
    fn parse_naive_is_utc() {
        let t = parse_timestamp("2025-06-01T08:15").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 6, 1, 8, 15, 0).unwrap());

        let t = parse_timestamp("2025-06-01T08:15:30").unwrap();
        assert_eq!(t.second(), 30);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("2025-13-01T00:00:00Z").is_err());
        assert!(parse_timestamp("08:00").is_err());
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(
            parse_date("2025-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        assert!(parse_date("01/06/2025").is_err());
    }

    #[test]
    fn display_helpers() {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 7, 5, 0).unwrap();
        assert_eq!(format_clock(&t), "07:05");
        assert_eq!(format_long_date(&t), "Sunday, June 1");
    }

    #[test]
    fn duration_display() {
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::minutes(125)), "2h 5m");
        assert_eq!(format_duration(Duration::minutes(-5)), "0m");
    }
}
