//! Protocol driver: initiate, poll-to-verify, and code confirmation.

use crate::cancel::CancellationSignal;
use crate::outcome::{
    classify_confirm_title, ConfirmOutcome, InitiateOutcome, LoginMode, VerifyOutcome,
};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use session_engine::{AuthError, AuthResult, AuthToken, RequestOptions, SessionManager};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Default polling window in seconds.
pub const DEFAULT_POLLING_TIMEOUT_SECS: u64 = 60;

/// Default delay between polls in seconds.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 1;

/// Success body of login initiation.
#[derive(Debug, Deserialize)]
struct InitiateBody {
    #[serde(default)]
    verify_url: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Problem body carried by domain-expected 400 responses.
#[derive(Debug, Deserialize)]
struct ApiProblem {
    title: String,
    #[serde(default)]
    detail: Option<String>,
}

/// Body of a 400 from the verification endpoint.
#[derive(Debug, Deserialize)]
struct PollBody {
    #[serde(default)]
    title: String,
    status: PollStatus,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum PollStatus {
    Pending,
    Used,
    Expired,
    #[serde(other)]
    Unrecognized,
}

/// Drives the magic-link login protocol against a session manager.
///
/// The flow itself is stateless between calls; polling configuration lives
/// here so one flow value can drive any number of logins. Polling is chosen
/// over server push because the verification endpoint is stateless and the
/// client cannot assume push connectivity (CLI contexts).
#[derive(Debug, Clone)]
pub struct PasswordlessFlow {
    polling_timeout: Duration,
    polling_interval: Duration,
}

impl PasswordlessFlow {
    /// A flow with the default polling window and interval.
    pub fn new() -> Self {
        Self {
            polling_timeout: Duration::from_secs(DEFAULT_POLLING_TIMEOUT_SECS),
            polling_interval: Duration::from_secs(DEFAULT_POLLING_INTERVAL_SECS),
        }
    }

    /// A flow with a custom polling window and interval.
    pub fn with_polling(polling_timeout: Duration, polling_interval: Duration) -> Self {
        Self {
            polling_timeout,
            polling_interval,
        }
    }

    /// Ask the backend to mail a magic link to `email`.
    ///
    /// Ordinary negative outcomes (unknown email, unexpected bodies,
    /// unexpected statuses) come back as [`InitiateOutcome::Rejected`];
    /// only transport failures are errors.
    pub async fn initiate(
        &self,
        session: &mut SessionManager,
        email: &str,
        mode: LoginMode,
    ) -> AuthResult<InitiateOutcome> {
        let path = format!("/auth/passwordless?mode={}", mode.as_str());
        debug!(mode = mode.as_str(), "Initiating passwordless login");

        let response = session
            .request(
                &path,
                RequestOptions::post(json!({ "email": email })).unauthenticated(),
            )
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let outcome = match status {
            StatusCode::OK => match serde_json::from_str::<InitiateBody>(&body) {
                Ok(InitiateBody {
                    verify_url: Some(verify_url),
                    expires_at: Some(expires_at),
                }) => {
                    info!("Magic link issued");
                    InitiateOutcome::Accepted {
                        verify_url,
                        expires_at,
                    }
                }
                Ok(_) => InitiateOutcome::Rejected {
                    title: "Unexpected API response".to_string(),
                    detail: None,
                },
                Err(e) => InitiateOutcome::Rejected {
                    title: format!("Unexpected API response: {e}"),
                    detail: None,
                },
            },
            StatusCode::BAD_REQUEST => match serde_json::from_str::<ApiProblem>(&body) {
                // The domain-expected rejection, e.g. an unrecognized email.
                Ok(problem) => InitiateOutcome::Rejected {
                    title: problem.title,
                    detail: problem.detail,
                },
                Err(e) => InitiateOutcome::Rejected {
                    title: format!("Unexpected API response: {e}"),
                    detail: None,
                },
            },
            status => InitiateOutcome::Rejected {
                title: format!("Unexpected API response: HTTP {status}"),
                detail: None,
            },
        };

        Ok(outcome)
    }

    /// Poll `verify_url` until the login reaches a terminal state.
    ///
    /// One unauthenticated GET per iteration. A confirmed login feeds the
    /// token into the session before returning. Cancellation is sampled
    /// right after each pending round trip, then the elapsed wall-clock
    /// time is checked against the polling window, then the loop sleeps one
    /// interval. A status outside the protocol terminates the whole call
    /// with a protocol error.
    pub async fn verify(
        &self,
        session: &mut SessionManager,
        verify_url: &str,
        cancellation: Option<&CancellationSignal>,
    ) -> AuthResult<VerifyOutcome> {
        let started = Instant::now();
        debug!(url = %verify_url, "Polling magic-link verification");

        loop {
            let response = session
                .request(verify_url, RequestOptions::get().unauthenticated())
                .await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    let token: AuthToken = response.json().await?;
                    session.login(token.clone());
                    info!("Passwordless login confirmed");
                    return Ok(VerifyOutcome::Confirmed { token });
                }
                StatusCode::BAD_REQUEST => {
                    let body = response.text().await?;
                    let poll: PollBody = serde_json::from_str(&body).map_err(|e| {
                        AuthError::Protocol(format!("unparseable verification response: {e}"))
                    })?;
                    match poll.status {
                        PollStatus::Pending => {}
                        PollStatus::Used => return Ok(VerifyOutcome::Used),
                        PollStatus::Expired => return Ok(VerifyOutcome::Expired),
                        PollStatus::Unrecognized => return Err(AuthError::Protocol(poll.title)),
                    }
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    let title = serde_json::from_str::<ApiProblem>(&body)
                        .map(|problem| problem.title)
                        .unwrap_or_else(|_| format!("HTTP {status}"));
                    return Err(AuthError::Protocol(title));
                }
            }

            // Still pending. Cancellation wins over the timeout check so a
            // cancelled call never reports a timeout.
            if let Some(signal) = cancellation {
                if signal.is_cancelled() {
                    signal.acknowledge();
                    info!("Magic-link polling cancelled");
                    return Ok(VerifyOutcome::PollingCancelled);
                }
            }
            if started.elapsed() >= self.polling_timeout {
                info!("Magic-link polling timed out");
                return Ok(VerifyOutcome::PollingTimeout);
            }
            sleep(self.polling_interval).await;
        }
    }

    /// Confirm a login with an emailed code instead of the magic link.
    ///
    /// Used by the hosted confirmation UI. The HTTP status is not part of
    /// this contract; the body's `status` field decides, and failures are
    /// classified from the server title.
    pub async fn confirm(
        &self,
        session: &mut SessionManager,
        email: &str,
        code: &str,
    ) -> AuthResult<ConfirmOutcome> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("email", email)
            .append_pair("code", code)
            .finish();
        let path = format!("/auth/passwordless/confirm?{query}");

        let response = session
            .request(
                &path,
                RequestOptions::get()
                    .unauthenticated()
                    .with_header("Accept", "application/json"),
            )
            .await?;
        let body = response.text().await?;

        let value: Value = serde_json::from_str(&body).map_err(|e| {
            AuthError::Protocol(format!("unparseable confirmation response: {e}"))
        })?;

        if value.get("status").and_then(Value::as_str) == Some("CONFIRMED") {
            info!("Passwordless login confirmed by code");
            return Ok(ConfirmOutcome::Confirmed);
        }

        let title = value
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(ConfirmOutcome::Rejected {
            code: classify_confirm_title(&title),
            title,
        })
    }
}

impl Default for PasswordlessFlow {
    fn default() -> Self {
        Self::new()
    }
}
