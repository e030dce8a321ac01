//! Resource payload types.
//!
//! Minimal typed views of the backend's resource records. The wrappers only
//! guarantee the auth and retry contract of the core; fields the backend
//! adds over time are ignored on deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A basemap or data provider available to the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    /// Provider UUID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Provider kind (tiles, terrain, imagery).
    #[serde(default)]
    pub kind: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An account profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Profile UUID.
    pub id: String,
    /// Display name.
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A map owned by the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapRecord {
    /// Map UUID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning project, when the map is filed under one.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Style identifier.
    #[serde(default)]
    pub style: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a map.
#[derive(Debug, Clone, Serialize)]
pub struct NewMap {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

/// A project grouping maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project UUID.
    pub id: String,
    /// Display name.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a project.
#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub name: String,
}

/// A client-side analytics event.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    /// Event name, e.g. `map.opened`.
    pub name: String,
    /// Free-form event properties.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub properties: Value,
}

impl AnalyticsEvent {
    /// An event with no properties.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Value::Null,
        }
    }
}

/// Aggregated API usage for the current billing period.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageSummary {
    /// Requests served in the period.
    pub requests: u64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_tolerates_missing_kind() {
        let provider: Provider = serde_json::from_value(json!({
            "id": "p-1",
            "name": "Terrain",
            "created_at": "2024-05-01T00:00:00Z",
        }))
        .unwrap();
        assert!(provider.kind.is_none());
    }

    #[test]
    fn test_new_map_omits_absent_fields() {
        let body = serde_json::to_value(NewMap {
            name: "Field survey".to_string(),
            project_id: None,
            style: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "name": "Field survey" }));
    }

    #[test]
    fn test_event_without_properties_serializes_name_only() {
        let body = serde_json::to_value(AnalyticsEvent::named("map.opened")).unwrap();
        assert_eq!(body, json!({ "name": "map.opened" }));
    }
}
