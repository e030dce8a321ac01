//! Magic-link passwordless login for the Cartolab backend.
//!
//! This crate provides:
//! - Login initiation that yields a verification URL to poll
//! - The polling state machine driving that URL to a terminal outcome
//! - Cooperative cancellation for the polling loop
//! - The code-based confirmation path used by the hosted confirmation UI
//!
//! On a confirmed login the obtained token is fed straight into the
//! [`SessionManager`](session_engine::SessionManager), so subsequent
//! authenticated requests pick it up without further wiring.

mod cancel;
mod flow;
mod outcome;

pub use cancel::CancellationSignal;
pub use flow::{PasswordlessFlow, DEFAULT_POLLING_INTERVAL_SECS, DEFAULT_POLLING_TIMEOUT_SECS};
pub use outcome::{
    ConfirmOutcome, ConfirmRejection, InitiateOutcome, LoginMode, VerifyOutcome,
};
