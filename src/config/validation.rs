//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (aggregation names, route prefixes)
//! - Validate value ranges (timeouts > 0, thresholds >= 1)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("route '{route}': path_prefix '{prefix}' must start with '/'")]
    RoutePrefix { route: String, prefix: String },

    #[error("route '{route}': service name is empty")]
    RouteService { route: String },

    #[error("route prefix '{0}' is declared more than once")]
    DuplicatePrefix(String),

    #[error("service '{name}': base_url '{url}' is not an absolute http(s) URL")]
    ServiceUrl { name: String, url: String },

    #[error("aggregation.{field} is empty")]
    Aggregation { field: &'static str },
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let positive = [
        ("listener.max_connections", config.listener.max_connections as u64),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("health_check.interval_secs", config.health_check.interval_secs),
        ("health_check.timeout_secs", config.health_check.timeout_secs),
        ("circuit_breaker.failure_threshold", config.circuit_breaker.failure_threshold as u64),
        ("circuit_breaker.open_duration_secs", config.circuit_breaker.open_duration_secs),
        ("security.max_body_size", config.security.max_body_size as u64),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }
    if config.rate_limit.enabled && config.rate_limit.requests_per_second == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.requests_per_second" });
    }

    let mut prefixes = HashSet::new();
    for route in &config.routes {
        if !route.path_prefix.starts_with('/') {
            errors.push(ValidationError::RoutePrefix {
                route: route.name.clone(),
                prefix: route.path_prefix.clone(),
            });
        }
        if route.service.trim().is_empty() {
            errors.push(ValidationError::RouteService { route: route.name.clone() });
        }
        let normalized = route.path_prefix.trim_end_matches('/').to_string();
        if !prefixes.insert(normalized.clone()) {
            errors.push(ValidationError::DuplicatePrefix(normalized));
        }
    }

    for service in &config.services {
        let valid = Url::parse(&service.base_url)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::ServiceUrl {
                name: service.name.clone(),
                url: service.base_url.clone(),
            });
        }
    }

    let aggregation = [
        ("user_service", &config.aggregation.user_service),
        ("list_service", &config.aggregation.list_service),
        ("item_service", &config.aggregation.item_service),
    ];
    for (field, value) in aggregation {
        if value.trim().is_empty() {
            errors.push(ValidationError::Aggregation { field });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
