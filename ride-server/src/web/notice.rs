//! One-shot confirmation messages carried across redirects.
//!
//! After a successful form post the handler redirects with `?notice=key`;
//! the target page shows the matching message once.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Booked,
    BookingCancelled,
    RidePublished,
    RideUpdated,
    RideDeleted,
    ReviewSubmitted,
    ProfileUpdated,
    PictureUpdated,
    SignedIn,
    SignedOut,
    Registered,
    UserBanned,
    UserUnbanned,
    SessionExpired,
}

impl Notice {
    pub const ALL: [Notice; 14] = [
        Notice::Booked,
        Notice::BookingCancelled,
        Notice::RidePublished,
        Notice::RideUpdated,
        Notice::RideDeleted,
        Notice::ReviewSubmitted,
        Notice::ProfileUpdated,
        Notice::PictureUpdated,
        Notice::SignedIn,
        Notice::SignedOut,
        Notice::Registered,
        Notice::UserBanned,
        Notice::UserUnbanned,
        Notice::SessionExpired,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Notice::Booked => "booked",
            Notice::BookingCancelled => "booking_cancelled",
            Notice::RidePublished => "ride_published",
            Notice::RideUpdated => "ride_updated",
            Notice::RideDeleted => "ride_deleted",
            Notice::ReviewSubmitted => "review_submitted",
            Notice::ProfileUpdated => "profile_updated",
            Notice::PictureUpdated => "picture_updated",
            Notice::SignedIn => "signed_in",
            Notice::SignedOut => "signed_out",
            Notice::Registered => "registered",
            Notice::UserBanned => "user_banned",
            Notice::UserUnbanned => "user_unbanned",
            Notice::SessionExpired => "session_expired",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::Booked => "Successfully booked the ride!",
            Notice::BookingCancelled => "Your booking was cancelled.",
            Notice::RidePublished => "Your ride has been published.",
            Notice::RideUpdated => "Your ride has been updated.",
            Notice::RideDeleted => "The ride was deleted.",
            Notice::ReviewSubmitted => "Thanks for your review!",
            Notice::ProfileUpdated => "Profile updated.",
            Notice::PictureUpdated => "Profile picture updated.",
            Notice::SignedIn => "Welcome back!",
            Notice::SignedOut => "You have been signed out.",
            Notice::Registered => "Your account has been created.",
            Notice::UserBanned => "The user has been banned.",
            Notice::UserUnbanned => "The user has been unbanned.",
            Notice::SessionExpired => "Your session has expired. Please sign in again.",
        }
    }

    /// Warnings are styled differently from confirmations.
    pub fn is_warning(self) -> bool {
        matches!(self, Notice::SessionExpired)
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.key() == key)
    }

    /// The notice named by a `notice` query parameter, if any.
    pub fn from_params(params: &HashMap<String, String>) -> Option<Self> {
        params.get("notice").and_then(|k| Self::parse(k.trim()))
    }

    /// `path` with this notice appended to its query string.
    pub fn redirect_to(self, path: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{path}{separator}notice={}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique_and_parse_back() {
        for notice in Notice::ALL {
            assert_eq!(Notice::parse(notice.key()), Some(notice));
        }
        assert_eq!(Notice::parse("bogus"), None);
    }

    #[test]
    fn redirect_paths() {
        assert_eq!(Notice::Booked.redirect_to("/ride/r1"), "/ride/r1?notice=booked");
        assert_eq!(
            Notice::UserBanned.redirect_to("/admin/users?q=am"),
            "/admin/users?q=am&notice=user_banned"
        );
    }

    #[test]
    fn from_query_params() {
        let params: HashMap<String, String> =
            [("notice".to_string(), "signed_out".to_string())].into();
        assert_eq!(Notice::from_params(&params), Some(Notice::SignedOut));
        assert_eq!(Notice::from_params(&HashMap::new()), None);
    }
}
