//! API-level error types.

use reqwest::StatusCode;
use session_engine::AuthError;
use thiserror::Error;

/// Error type for the typed resource wrappers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Session, protocol, or transport error from the core
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The backend answered with a non-success status
    #[error("Unexpected API response: HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
