//! Session state and the authenticated-request primitive.
//!
//! A `SessionManager` owns the current credentials (access token, expiry,
//! refresh token) and decides when a token is stale. Every call against the
//! backend goes through [`SessionManager::request`], which transparently
//! refreshes the access token and retries once after a rejected request.
//!
//! The session is single-writer: operations take `&mut self` and the state
//! is only ever mutated by the call currently awaiting a response. Callers
//! that need determinism must not issue concurrent logins against the same
//! manager; last writer wins.

use crate::error::{AuthError, AuthResult};
use crate::request::RequestOptions;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

/// Bearer credential as returned by the token and verification endpoints.
///
/// `expires_in` is relative seconds; the absolute expiry is computed at the
/// moment the token is accepted into the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Short-lived bearer credential authorizing API calls.
    pub access_token: String,
    /// Token scheme, `"Bearer"` in practice.
    pub token_type: String,
    /// Lifetime in seconds, relative to the moment the token was issued.
    pub expires_in: i64,
    /// Rotated long-lived credential, when the backend issues one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Callback invoked with `(base_url, refresh_token)` whenever the session
/// learns a rotated refresh token, and with `(base_url, None)` on logout.
///
/// Lets the host application persist rotating credentials without the core
/// knowing about storage.
pub type RefreshTokenObserver = Box<dyn Fn(Option<&str>, Option<&str>) + Send + Sync>;

/// Merge-style configuration for a [`SessionManager`].
///
/// Present fields overwrite session state; absent fields leave it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Backend origin, e.g. `https://api.cartolab.app`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Long-lived credential used to mint new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Static headers merged into every request at lowest precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_headers: Option<HashMap<String, String>>,
}

/// Mutable session state. At most one access token is held at a time; a new
/// login overwrites the previous one.
#[derive(Debug, Default)]
struct Session {
    base_url: Option<String>,
    access_token: Option<String>,
    access_token_expires_at: Option<DateTime<Utc>>,
    refresh_token: Option<String>,
    common_headers: HashMap<String, String>,
}

/// Holds credentials and issues authenticated requests against the backend.
pub struct SessionManager {
    http_client: Client,
    session: Session,
    refresh_observer: Option<RefreshTokenObserver>,
}

impl SessionManager {
    /// Create an unconfigured session manager.
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
            session: Session::default(),
            refresh_observer: None,
        }
    }

    /// Create a session manager and apply an initial configuration.
    pub fn with_config(config: SessionConfig) -> Self {
        let mut manager = Self::new();
        manager.configure(config);
        manager
    }

    /// Merge configuration into the session. Present fields overwrite;
    /// absent fields leave the current state untouched.
    pub fn configure(&mut self, config: SessionConfig) {
        if let Some(base_url) = config.base_url {
            self.session.base_url = Some(base_url);
        }
        if let Some(refresh_token) = config.refresh_token {
            self.session.refresh_token = Some(refresh_token);
        }
        if let Some(common_headers) = config.common_headers {
            self.session.common_headers = common_headers;
        }
    }

    /// Register the observer notified when the refresh token rotates or the
    /// session is logged out.
    pub fn set_refresh_token_observer(&mut self, observer: RefreshTokenObserver) {
        self.refresh_observer = Some(observer);
    }

    /// Backend origin, if configured.
    pub fn base_url(&self) -> Option<&str> {
        self.session.base_url.as_deref()
    }

    /// Current access token, if logged in.
    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token.as_deref()
    }

    /// Current refresh token, if known.
    pub fn refresh_token(&self) -> Option<&str> {
        self.session.refresh_token.as_deref()
    }

    /// Accept a token into the session and compute its absolute expiry.
    ///
    /// When the token carries a refresh token different from the one
    /// currently known, the refresh-token observer is notified with the new
    /// value before the session stores it.
    pub fn login(&mut self, token: AuthToken) {
        let rotated = match (&token.refresh_token, &self.session.refresh_token) {
            (Some(new), Some(old)) => new != old,
            (Some(_), None) => true,
            (None, _) => false,
        };

        self.session.access_token = Some(token.access_token);
        self.session.access_token_expires_at =
            Some(Utc::now() + Duration::seconds(token.expires_in));

        if let Some(new_refresh_token) = token.refresh_token {
            if rotated {
                if let Some(observer) = &self.refresh_observer {
                    observer(self.session.base_url.as_deref(), Some(&new_refresh_token));
                }
            }
            self.session.refresh_token = Some(new_refresh_token);
        }

        debug!(expires_in = token.expires_in, "Session updated with a new access token");
    }

    /// Clear all credentials and notify the refresh-token observer.
    pub fn logout(&mut self) {
        self.session.access_token = None;
        self.session.access_token_expires_at = None;
        self.session.refresh_token = None;

        if let Some(observer) = &self.refresh_observer {
            observer(self.session.base_url.as_deref(), None);
        }

        info!("Logged out");
    }

    /// True when there is no access token, or the stored expiry has passed.
    pub fn is_access_token_expired(&self) -> bool {
        if self.session.access_token.is_none() {
            return true;
        }
        match self.session.access_token_expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// The exchange is a soft operation: any response other than 201 yields
    /// `Ok(None)` and the caller stays unauthenticated. A successful
    /// exchange feeds the token through [`login`](Self::login) and returns
    /// it. `refresh_token` overrides the stored credential when given.
    pub async fn refresh_access_token(
        &mut self,
        refresh_token: Option<&str>,
    ) -> AuthResult<Option<AuthToken>> {
        let base_url = self
            .session
            .base_url
            .clone()
            .ok_or_else(|| AuthError::Config("base URL is not configured".to_string()))?;

        let url = Url::parse(&format!("{}/auth/token", base_url.trim_end_matches('/')))?;
        let cookie = format!(
            "user_session={}",
            refresh_token
                .or(self.session.refresh_token.as_deref())
                .unwrap_or_default()
        );

        debug!(url = %url, "Exchanging refresh token for a new access token");

        let response = self
            .http_client
            .post(url)
            .header(header::COOKIE, cookie)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            debug!(status = %response.status(), "Token endpoint returned no token");
            return Ok(None);
        }

        let token: AuthToken = response.json().await?;
        self.login(token.clone());
        info!("Access token refreshed");

        Ok(Some(token))
    }

    /// Issue a request against the backend.
    ///
    /// Authenticated calls (the default) refresh a stale token before the
    /// request, attach the bearer header at highest precedence, and perform
    /// exactly one refresh-and-retry cycle when the response is 401 or 403.
    /// Bare calls (`authenticate: false`) skip all of that and only merge
    /// the common headers. Transport failures propagate unchanged and are
    /// never retried here.
    ///
    /// `path` is joined to the configured base URL; absolute `http(s)://`
    /// URLs are used verbatim.
    pub async fn request(&mut self, path: &str, options: RequestOptions) -> AuthResult<Response> {
        if options.authenticate && self.is_access_token_expired() {
            // Best effort: a refresh that yields no token is ignored, the
            // request itself surfaces the failure through its status code.
            self.refresh_access_token(None).await?;
        }

        let url = self.request_url(path)?;
        let headers = self.build_headers(&options.headers, options.authenticate)?;
        let response = self
            .send(options.method.clone(), url.clone(), headers, options.body.as_ref())
            .await?;

        if !options.authenticate {
            return Ok(response);
        }

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!(status = %response.status(), "Access rejected, refreshing token and retrying once");
                self.refresh_access_token(None).await?;
                let headers = self.build_headers(&options.headers, true)?;
                self.send(options.method, url, headers, options.body.as_ref())
                    .await
            }
            _ => Ok(response),
        }
    }

    /// End the session server-side and clear local credentials.
    ///
    /// 204 logs the session out locally; 401/403 means no session was
    /// active; any other non-success status is a protocol error.
    pub async fn sign_out(&mut self, all_devices: bool) -> AuthResult<()> {
        let response = self
            .request(
                "/auth/signout",
                RequestOptions::delete(json!({ "all": all_devices })),
            )
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => {
                self.logout();
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::NoSession),
            status => Err(AuthError::Protocol(format!(
                "unexpected sign-out response: HTTP {status}"
            ))),
        }
    }

    fn request_url(&self, path: &str) -> AuthResult<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        let base_url = self
            .session
            .base_url
            .as_deref()
            .ok_or_else(|| AuthError::Config("base URL is not configured".to_string()))?;
        Ok(Url::parse(&format!(
            "{}{}",
            base_url.trim_end_matches('/'),
            path
        ))?)
    }

    /// Assemble headers with the precedence common < caller < bearer.
    fn build_headers(
        &self,
        caller_headers: &[(String, String)],
        authenticate: bool,
    ) -> AuthResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let common = self
            .session
            .common_headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()));
        let caller = caller_headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()));

        for (name, value) in common.chain(caller) {
            let name = HeaderName::try_from(name)
                .map_err(|e| AuthError::InvalidHeader(e.to_string()))?;
            let value = HeaderValue::try_from(value)
                .map_err(|e| AuthError::InvalidHeader(e.to_string()))?;
            headers.insert(name, value);
        }

        if authenticate {
            if let Some(access_token) = &self.session.access_token {
                let bearer = HeaderValue::try_from(format!("Bearer {access_token}"))
                    .map_err(|e| AuthError::InvalidHeader(e.to_string()))?;
                headers.insert(header::AUTHORIZATION, bearer);
            }
        }

        Ok(headers)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        url: Url,
        headers: HeaderMap,
        body: Option<&serde_json::Value>,
    ) -> AuthResult<Response> {
        let mut request = self.http_client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
