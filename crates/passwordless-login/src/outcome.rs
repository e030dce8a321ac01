//! Typed outcomes of the passwordless protocol.
//!
//! Expected negative results (unknown email, pending or consumed links,
//! rejected codes) are values, not errors, so callers branch on them
//! without try/catch-style handling.

use chrono::{DateTime, Utc};
use session_engine::AuthToken;

/// Whether initiation targets an existing account or registers a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginMode {
    /// Log an existing account in.
    #[default]
    Login,
    /// Register a new account.
    Register,
}

impl LoginMode {
    /// Wire value of the `mode` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginMode::Login => "login",
            LoginMode::Register => "register",
        }
    }
}

/// Outcome of [`initiate`](crate::PasswordlessFlow::initiate).
#[derive(Debug, Clone, PartialEq)]
pub enum InitiateOutcome {
    /// The backend accepted the email and mailed a magic link.
    Accepted {
        /// Polling target encoding the one-time verification token.
        verify_url: String,
        /// When the verification token stops being honored.
        expires_at: DateTime<Utc>,
    },
    /// The backend declined, or answered something unexpected.
    Rejected {
        /// Server-supplied or diagnostic title.
        title: String,
        /// Optional server-supplied detail.
        detail: Option<String>,
    },
}

/// Terminal outcome of [`verify`](crate::PasswordlessFlow::verify).
///
/// `Confirmed` is the only outcome carrying a token; by the time it is
/// returned the token has already been accepted into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyOutcome {
    /// The magic link was visited and the login is live.
    Confirmed {
        /// The token now held by the session.
        token: AuthToken,
    },
    /// The verification token expired before it was visited.
    Expired,
    /// The verification token was already consumed.
    Used,
    /// The polling window elapsed without a terminal answer.
    PollingTimeout,
    /// The caller cancelled the polling loop.
    PollingCancelled,
}

/// Outcome of [`confirm`](crate::PasswordlessFlow::confirm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The code was accepted.
    Confirmed,
    /// The code was rejected; `code` classifies the server's title.
    Rejected {
        /// Why the backend rejected the code.
        code: ConfirmRejection,
        /// The server's verbatim title.
        title: String,
    },
}

/// Classification of a rejected confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmRejection {
    /// The code expired.
    Expired,
    /// The code was already consumed.
    Used,
    /// Anything else the backend rejects.
    Invalid,
}

/// Classify a confirmation failure from the server's title.
///
/// The backend signals the failure class only through the human-readable
/// title, so this is a case-insensitive substring match, evaluated in
/// priority order. Inherited wire contract; kept verbatim for parity with
/// the backend's test suite.
pub(crate) fn classify_confirm_title(title: &str) -> ConfirmRejection {
    let title = title.to_lowercase();
    if title.contains("expir") {
        ConfirmRejection::Expired
    } else if title.contains("already confirm") || title.contains("used") {
        ConfirmRejection::Used
    } else {
        ConfirmRejection::Invalid
    }
}
