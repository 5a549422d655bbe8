//! Wire and storage types for registered services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A service's current location and liveness as known to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub name: String,
    pub base_url: String,
    pub version: String,
    /// Endpoints the service declared when it registered.
    #[serde(rename = "endpoints")]
    pub declared_endpoints: Vec<String>,
    pub healthy: bool,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
}

impl ServiceRecord {
    /// The declared endpoint used for health checks, if the service named one.
    pub fn health_endpoint(&self) -> Option<&str> {
        self.declared_endpoints
            .iter()
            .map(String::as_str)
            .find(|e| e.trim_end_matches('/').ends_with("/health"))
    }
}

/// Announcement a service sends when it starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRegistration {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Periodic liveness announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    pub name: String,
    pub healthy: bool,
}
