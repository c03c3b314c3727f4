//! Backend authentication cookies.

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};

use crate::domain::User;

/// The backend's session cookie pairs, replayed as a `Cookie` header.
///
/// Opaque to this server. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    /// Collect the `name=value` pairs from every `Set-Cookie` header.
    ///
    /// Returns `None` when the response set no cookies.
    pub fn from_set_cookie(headers: &HeaderMap) -> Option<Self> {
        let pairs: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('=') && !pair.ends_with('='))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(Self(pairs.join("; ")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `Cookie` header value, or `None` if it has characters a header
    /// cannot carry.
    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials(..)")
    }
}

/// A successful login: who signed in and the cookie proving it.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub credentials: Option<Credentials>,
}
