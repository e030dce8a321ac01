//! Options for the authenticated-request primitive.

use reqwest::Method;
use serde_json::Value;

/// Per-call options for [`SessionManager::request`](crate::SessionManager::request).
///
/// Defaults to an authenticated GET with no extra headers and no body.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: Method,
    /// Caller-supplied headers. Override common headers; the bearer header
    /// always overrides these when the call authenticates.
    pub headers: Vec<(String, String)>,
    /// Optional JSON body, serialized on every attempt (including the retry).
    pub body: Option<Value>,
    /// Whether this call participates in the auth protocol. When false the
    /// request is issued bare: no refresh, no Authorization header.
    pub authenticate: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            authenticate: true,
        }
    }
}

impl RequestOptions {
    /// An authenticated GET.
    pub fn get() -> Self {
        Self::default()
    }

    /// An authenticated POST with a JSON body.
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    /// An authenticated DELETE with a JSON body.
    pub fn delete(body: Value) -> Self {
        Self {
            method: Method::DELETE,
            body: Some(body),
            ..Self::default()
        }
    }

    /// Opt this call out of the auth protocol.
    pub fn unauthenticated(mut self) -> Self {
        self.authenticate = false;
        self
    }

    /// Add a caller header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}
