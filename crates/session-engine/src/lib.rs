//! Session core for the Cartolab backend client.
//!
//! This crate provides:
//! - Session state with access-token caching and expiry tracking
//! - Transparent token refresh around authenticated requests
//! - The single request primitive every resource wrapper builds on
//! - An observer hook for persisting rotating refresh tokens

mod error;
mod request;
mod session;

pub use error::{AuthError, AuthResult};
pub use request::RequestOptions;
pub use session::{AuthToken, RefreshTokenObserver, SessionConfig, SessionManager};
