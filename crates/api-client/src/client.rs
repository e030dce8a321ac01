//! Typed wrappers over the backend's resource endpoints.

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::{
    AnalyticsEvent, MapRecord, NewMap, NewProject, Profile, Project, Provider, UsageSummary,
};
use serde::de::DeserializeOwned;
use session_engine::{AuthError, RequestOptions, SessionManager};
use tracing::warn;

/// Typed client over the Cartolab REST surface.
///
/// Owns the session manager; all wrappers are mechanical templates over its
/// request primitive and inherit the bearer-header and retry contract.
pub struct ApiClient {
    session: SessionManager,
}

impl ApiClient {
    /// Create a client from a configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            session: SessionManager::with_config(config.into()),
        }
    }

    /// Wrap an already configured session manager.
    pub fn from_session(session: SessionManager) -> Self {
        Self { session }
    }

    /// The underlying session manager.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Exclusive access to the underlying session manager, for login flows
    /// and observer registration.
    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    /// Issue a request and deserialize a successful JSON response.
    async fn fetch_json<T: DeserializeOwned>(
        &mut self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let response = self.session.request(path, options).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, path, "API request failed");
            return Err(ApiError::Status { status, body });
        }

        Ok(response.json().await.map_err(AuthError::from)?)
    }

    /// Issue a request and discard the successful response body.
    async fn fetch_unit(&mut self, path: &str, options: RequestOptions) -> ApiResult<()> {
        let response = self.session.request(path, options).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, path, "API request failed");
            return Err(ApiError::Status { status, body });
        }

        Ok(())
    }

    // Providers

    /// Fetch all providers available to the account.
    pub async fn list_providers(&mut self) -> ApiResult<Vec<Provider>> {
        self.fetch_json("/providers", RequestOptions::get()).await
    }

    /// Fetch a single provider.
    pub async fn get_provider(&mut self, id: &str) -> ApiResult<Provider> {
        self.fetch_json(&format!("/providers/{id}"), RequestOptions::get())
            .await
    }

    // Profiles

    /// Fetch all profiles on the account.
    pub async fn list_profiles(&mut self) -> ApiResult<Vec<Profile>> {
        self.fetch_json("/profiles", RequestOptions::get()).await
    }

    /// Fetch a single profile.
    pub async fn get_profile(&mut self, id: &str) -> ApiResult<Profile> {
        self.fetch_json(&format!("/profiles/{id}"), RequestOptions::get())
            .await
    }

    // Maps

    /// Fetch all maps owned by the account.
    pub async fn list_maps(&mut self) -> ApiResult<Vec<MapRecord>> {
        self.fetch_json("/maps", RequestOptions::get()).await
    }

    /// Fetch a single map.
    pub async fn get_map(&mut self, id: &str) -> ApiResult<MapRecord> {
        self.fetch_json(&format!("/maps/{id}"), RequestOptions::get())
            .await
    }

    /// Create a map.
    pub async fn create_map(&mut self, new_map: &NewMap) -> ApiResult<MapRecord> {
        let body = serde_json::to_value(new_map).map_err(AuthError::from)?;
        self.fetch_json("/maps", RequestOptions::post(body)).await
    }

    // Projects

    /// Fetch all projects on the account.
    pub async fn list_projects(&mut self) -> ApiResult<Vec<Project>> {
        self.fetch_json("/projects", RequestOptions::get()).await
    }

    /// Fetch a single project.
    pub async fn get_project(&mut self, id: &str) -> ApiResult<Project> {
        self.fetch_json(&format!("/projects/{id}"), RequestOptions::get())
            .await
    }

    /// Create a project.
    pub async fn create_project(&mut self, new_project: &NewProject) -> ApiResult<Project> {
        let body = serde_json::to_value(new_project).map_err(AuthError::from)?;
        self.fetch_json("/projects", RequestOptions::post(body)).await
    }

    // Analytics

    /// Record a client-side analytics event.
    pub async fn track_event(&mut self, event: &AnalyticsEvent) -> ApiResult<()> {
        let body = serde_json::to_value(event).map_err(AuthError::from)?;
        self.fetch_unit("/analytics/events", RequestOptions::post(body))
            .await
    }

    /// Fetch aggregated usage for the current billing period.
    pub async fn usage_summary(&mut self) -> ApiResult<UsageSummary> {
        self.fetch_json("/analytics/usage", RequestOptions::get())
            .await
    }

    // Session

    /// End the session server-side and clear local credentials.
    pub async fn sign_out(&mut self, all_devices: bool) -> ApiResult<()> {
        Ok(self.session.sign_out(all_devices).await?)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.session.base_url())
            .finish()
    }
}
