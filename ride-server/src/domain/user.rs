//! User accounts.

use chrono::{DateTime, Utc};

use super::{RideId, UserId};

/// Free-form profile details a user can edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub bio: Option<String>,
    pub age: Option<u32>,
    pub phone_number: Option<String>,
}

/// A user account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub is_admin: bool,
    pub is_banned: bool,
    pub profile_picture: Option<String>,
    pub profile: Profile,
    pub rides_created: Vec<RideId>,
    pub rides_joined: Vec<RideId>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// First letter of the name, for avatar fallbacks.
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('?')
    }

    /// Case-insensitive match on name or email, used by the admin user list.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term)
            || self
                .email
                .as_ref()
                .is_some_and(|e| e.to_lowercase().contains(&term))
    }
}

/// Changes to a user's account. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.bio.is_none() && self.profile_picture.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: Option<&str>) -> User {
        User {
            id: UserId::parse("u1").unwrap(),
            name: name.to_string(),
            email: email.map(str::to_string),
            is_admin: false,
            is_banned: false,
            profile_picture: None,
            profile: Profile::default(),
            rides_created: Vec::new(),
            rides_joined: Vec::new(),
            created_at: None,
        }
    }

    #[test]
    fn initial() {
        assert_eq!(user("amira", None).initial(), 'A');
        assert_eq!(user("", None).initial(), '?');
    }

    #[test]
    fn matches_name_or_email() {
        let u = user("Amira Ben Salah", Some("amira@example.tn"));
        assert!(u.matches("ben"));
        assert!(u.matches("EXAMPLE.TN"));
        assert!(u.matches(""));
        assert!(u.matches("   "));
        assert!(!u.matches("karim"));

        let no_email = user("Karim", None);
        assert!(!no_email.matches("example"));
    }
}
