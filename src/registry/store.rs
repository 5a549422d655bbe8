//! In-memory service directory.
//!
//! # Responsibilities
//! - Upsert service records on registration
//! - Resolve a service name to its record
//! - Track health flag and heartbeat per service
//! - Drive health checks for every registered service

use std::collections::BTreeMap;

use chrono::Utc;
use dashmap::DashMap;
use futures_util::future::join_all;
use thiserror::Error;
use url::Url;

use crate::health::check::{HealthChecker, CheckOutcome};
use crate::observability::metrics;
use crate::registry::record::{ServiceRecord, ServiceRegistration};

/// Errors returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("service '{0}' is not registered")]
    NotFound(String),

    #[error("service name must not be empty")]
    EmptyName,

    #[error("base URL '{0}' is not an absolute http(s) URL")]
    InvalidBaseUrl(String),
}

/// Directory of service name → current location and health.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: DashMap<String, ServiceRecord>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a service record.
    ///
    /// Re-registering a known name replaces its metadata, marks it healthy and
    /// keeps the original registration time.
    pub fn register(&self, registration: ServiceRegistration) -> Result<ServiceRecord, RegistryError> {
        let name = registration.name.trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let base_url = normalize_base_url(&registration.base_url)?;

        let now = Utc::now();
        let mut entry = self.services.entry(name.clone()).or_insert_with(|| ServiceRecord {
            name: name.clone(),
            base_url: base_url.clone(),
            version: registration.version.clone(),
            declared_endpoints: Vec::new(),
            healthy: true,
            registered_at: now,
            last_heartbeat_at: now,
        });
        let record = entry.value_mut();
        record.base_url = base_url;
        record.version = registration.version;
        record.declared_endpoints = registration.endpoints;
        record.healthy = true;
        record.last_heartbeat_at = now;
        let snapshot = record.clone();
        drop(entry);

        tracing::info!(
            service = %snapshot.name,
            base_url = %snapshot.base_url,
            version = %snapshot.version,
            "Service registered"
        );
        metrics::record_service_health(&snapshot.name, true);
        Ok(snapshot)
    }

    /// Look up a service by name. Health is not considered.
    pub fn discover(&self, name: &str) -> Result<ServiceRecord, RegistryError> {
        self.services
            .get(name)
            .map(|r| r.value().clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Set the health flag and heartbeat time. Unknown names are ignored.
    ///
    /// Returns whether a record was updated.
    pub fn update_health(&self, name: &str, healthy: bool) -> bool {
        match self.services.get_mut(name) {
            Some(mut record) => {
                if record.healthy != healthy {
                    tracing::info!(service = %name, healthy, "Service health changed");
                }
                record.healthy = healthy;
                record.last_heartbeat_at = Utc::now();
                metrics::record_service_health(name, healthy);
                true
            }
            None => {
                tracing::debug!(service = %name, "Ignoring health update for unknown service");
                false
            }
        }
    }

    /// Remove a service. Returns the removed record, if any.
    pub fn deregister(&self, name: &str) -> Option<ServiceRecord> {
        let removed = self.services.remove(name).map(|(_, record)| record);
        if removed.is_some() {
            tracing::info!(service = %name, "Service deregistered");
        }
        removed
    }

    /// Snapshot of every record, ordered by name.
    pub fn list_services(&self) -> BTreeMap<String, ServiceRecord> {
        self.services
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Check every registered service concurrently and refresh its health flag.
    ///
    /// A failing check only affects its own service.
    pub async fn perform_health_checks(&self, checker: &HealthChecker) -> BTreeMap<String, CheckOutcome> {
        let records: Vec<ServiceRecord> = self.list_services().into_values().collect();

        let checks = records.iter().map(|record| async move {
            let outcome = checker.check(record).await;
            (record.name.clone(), outcome)
        });

        let mut results = BTreeMap::new();
        for (name, outcome) in join_all(checks).await {
            if let CheckOutcome::Unhealthy(reason) = &outcome {
                tracing::warn!(service = %name, error = %reason, "Health check failed");
            }
            self.update_health(&name, outcome.is_healthy());
            results.insert(name, outcome);
        }
        results
    }
}

fn normalize_base_url(raw: &str) -> Result<String, RegistryError> {
    let url = Url::parse(raw.trim()).map_err(|_| RegistryError::InvalidBaseUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(RegistryError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(raw.trim().trim_end_matches('/').to_string())
}
