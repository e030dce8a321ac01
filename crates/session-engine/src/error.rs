//! Authentication and request error types.

use thiserror::Error;

/// Error type for session and request operations.
///
/// Expected "business" outcomes (wrong email, pending or used login links,
/// recognized 400 titles) are not errors; they are returned as typed result
/// values by the operations that produce them.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Required setup is missing for the requested operation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend returned a status/body combination with no defined transition
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Sign-out was rejected because no session is active server-side
    #[error("No active session")]
    NoSession,

    /// A header name or value could not be encoded
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = AuthError::Config("base URL is not configured".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: base URL is not configured"
        );
    }

    #[test]
    fn test_protocol_error_message() {
        let err = AuthError::Protocol("Verification token not found".to_string());
        assert_eq!(
            err.to_string(),
            "Protocol error: Verification token not found"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = AuthError::from(parse_err);
        assert!(matches!(err, AuthError::Json(_)));
    }
}
