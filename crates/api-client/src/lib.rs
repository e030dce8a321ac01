//! Typed client for the Cartolab backend.
//!
//! This crate provides:
//! - Client configuration with compile-time and environment defaults
//! - Typed wrappers over the backend's resource endpoints (providers,
//!   profiles, maps, projects, analytics)
//! - Re-exports of the session core and the passwordless login flow
//!
//! Every wrapper is a thin template over the session core's request
//! primitive; the auth header and retry contract lives there.

mod client;
mod config;
mod error;
mod types;

pub use client::ApiClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiResult};
pub use types::{
    AnalyticsEvent, MapRecord, NewMap, NewProject, Profile, Project, Provider, UsageSummary,
};

// The session core and login flow are part of the public surface.
pub use passwordless_login::{
    CancellationSignal, ConfirmOutcome, ConfirmRejection, InitiateOutcome, LoginMode,
    PasswordlessFlow, VerifyOutcome,
};
pub use session_engine::{
    AuthError, AuthResult, AuthToken, RefreshTokenObserver, RequestOptions, SessionConfig,
    SessionManager,
};
