//! Backend client error types.

use super::convert::ConversionError;

/// Errors from the REST backend or the mock standing in for it.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Request failed before a response arrived (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Backend answered with a non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The requested record does not exist
    #[error("not found")]
    NotFound,

    /// Missing, expired or insufficient credentials
    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited by backend")]
    RateLimited,

    /// A record decoded but failed validation
    #[error("invalid record: {0}")]
    Conversion(#[from] ConversionError),

    /// Mock fixture files could not be loaded
    #[error("fixture error: {0}")]
    Fixture(String),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_ref()
        .map(|b| format!(" (body: {b})"))
        .unwrap_or_default()
}

impl BackendError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Http(_) => "The ride service is unreachable. Please try again.".into(),
            BackendError::Api { message, .. } => message.clone(),
            BackendError::NotFound => "Not found.".into(),
            BackendError::Unauthorized => "Please sign in again.".into(),
            BackendError::RateLimited => "Too many requests. Please wait a moment.".into(),
            BackendError::Json { .. }
            | BackendError::Conversion(_)
            | BackendError::Fixture(_) => "The ride service sent an unexpected response.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = BackendError::NotFound;
        assert_eq!(err.to_string(), "not found");

        let err = BackendError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");

        let err = BackendError::Json {
            message: "expected string".into(),
            body: Some("{}".into()),
        };
        assert!(err.to_string().contains("JSON parse error"));
        assert!(err.to_string().contains("expected string"));
        assert!(err.to_string().contains("(body: {})"));

        let err = BackendError::Json {
            message: "eof".into(),
            body: None,
        };
        assert_eq!(err.to_string(), "JSON parse error: eof");
    }

    #[test]
    fn user_messages() {
        let err = BackendError::Api {
            status: 400,
            message: "No seats left".into(),
        };
        assert_eq!(err.user_message(), "No seats left");
        assert_eq!(
            BackendError::Unauthorized.user_message(),
            "Please sign in again."
        );
    }
}
