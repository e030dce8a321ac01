//! Client configuration.

use serde::{Deserialize, Serialize};
use session_engine::SessionConfig;
use std::collections::HashMap;

/// Default backend origin (can be overridden at compile time via the
/// CARTOLAB_BASE_URL env var).
pub const DEFAULT_BASE_URL: &str = match option_env!("CARTOLAB_BASE_URL") {
    Some(url) => url,
    None => "https://api.cartolab.app",
};

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend origin.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Long-lived credential to resume a session with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Static headers merged into every request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub common_headers: HashMap<String, String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_token: None,
            common_headers: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Create a config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Override fields from the runtime environment (CARTOLAB_BASE_URL,
    /// CARTOLAB_REFRESH_TOKEN). Empty values are ignored.
    pub fn load_from_env(&mut self) {
        if let Ok(base_url) = std::env::var("CARTOLAB_BASE_URL") {
            if !base_url.is_empty() {
                self.base_url = base_url;
            }
        }
        if let Ok(refresh_token) = std::env::var("CARTOLAB_REFRESH_TOKEN") {
            if !refresh_token.is_empty() {
                self.refresh_token = Some(refresh_token);
            }
        }
    }
}

impl From<ClientConfig> for SessionConfig {
    fn from(config: ClientConfig) -> Self {
        SessionConfig {
            base_url: Some(config.base_url),
            refresh_token: config.refresh_token,
            common_headers: if config.common_headers.is_empty() {
                None
            } else {
                Some(config.common_headers)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.refresh_token.is_none());
        assert!(config.common_headers.is_empty());
    }

    #[test]
    fn test_session_config_conversion() {
        let config = ClientConfig {
            base_url: "https://api.example.com".to_string(),
            refresh_token: Some("RT".to_string()),
            common_headers: HashMap::new(),
        };
        let session_config = SessionConfig::from(config);

        assert_eq!(
            session_config.base_url.as_deref(),
            Some("https://api.example.com")
        );
        assert_eq!(session_config.refresh_token.as_deref(), Some("RT"));
        assert!(session_config.common_headers.is_none());
    }

    #[test]
    fn test_deserializes_with_defaults() {
        let config: ClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
