//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Route definitions mapping external prefixes to services.
    pub routes: Vec<RouteConfig>,

    /// Services registered at startup, before any self-registration arrives.
    pub services: Vec<ServiceConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Circuit breaker policy.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Bearer token verification.
    pub auth: AuthConfig,

    /// Registry endpoint protection.
    pub registry: RegistryConfig,

    /// Backends used by the aggregation endpoints.
    pub aggregation: AggregationConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            routes: default_routes(),
            services: default_services(),
            health_check: HealthCheckConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            timeouts: TimeoutConfig::default(),
            auth: AuthConfig::default(),
            registry: RegistryConfig::default(),
            aggregation: AggregationConfig::default(),
            rate_limit: RateLimitConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum requests processed concurrently (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            tls: None,
            max_connections: 10_000,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Route configuration mapping an external prefix to a service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Externally visible path prefix (e.g. "/api/items").
    pub path_prefix: String,

    /// Registered service name to forward to.
    pub service: String,

    /// Backend path the prefix maps onto. Defaults to the prefix with its
    /// outer segment dropped ("/api/items" -> "/items").
    #[serde(default)]
    pub upstream_path: Option<String>,
}

impl RouteConfig {
    fn new(name: &str, path_prefix: &str, service: &str) -> Self {
        Self {
            name: name.to_string(),
            path_prefix: path_prefix.to_string(),
            service: service.to_string(),
            upstream_path: None,
        }
    }
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("auth", "/api/auth", "user-service"),
        RouteConfig::new("users", "/api/users", "user-service"),
        RouteConfig::new("items", "/api/items", "item-service"),
        RouteConfig::new("lists", "/api/lists", "list-service"),
    ]
}

/// A statically known service registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Unique service name.
    pub name: String,

    /// Base URL (e.g., "http://127.0.0.1:3002").
    pub base_url: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Endpoints the service declares (the health check path among them).
    #[serde(default)]
    pub endpoints: Vec<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_services() -> Vec<ServiceConfig> {
    [
        ("user-service", 3001),
        ("item-service", 3002),
        ("list-service", 3003),
    ]
    .into_iter()
    .map(|(name, port)| ServiceConfig {
        name: name.to_string(),
        base_url: format!("http://localhost:{}", port),
        version: default_version(),
        endpoints: vec!["/health".to_string()],
    })
    .collect()
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable periodic health checks.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Per-check timeout in seconds.
    pub timeout_secs: u64,

    /// Path checked when a service declares no health endpoint.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_secs: 5,
            path: "/health".to_string(),
        }
    }
}

/// Circuit breaker policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Seconds an open circuit rejects calls before resetting.
    pub open_duration_secs: u64,

    /// Count upstream 5xx responses as failures (transport errors always count).
    pub trip_on_server_error: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_duration_secs: 60,
            trip_on_server_error: false,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for an inbound request) in seconds.
    pub request_secs: u64,

    /// Time allowed for a single upstream round trip in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 30,
        }
    }
}

/// Bearer token verification settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer. Falls back to `JWT_SECRET`.
    pub jwt_secret: String,

    /// Expected `iss` claim, if the issuer sets one.
    pub issuer: Option<String>,
}

/// Registry endpoint protection.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// When set, register/heartbeat/deregister calls must carry `x-api-key`.
    pub api_key: Option<String>,
}

/// Services and paths used by the dashboard and search endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub user_service: String,
    pub list_service: String,
    pub item_service: String,
    pub profile_path: String,
    pub lists_path: String,
    pub catalog_path: String,
    pub search_path: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            user_service: "user-service".to_string(),
            list_service: "list-service".to_string(),
            item_service: "item-service".to_string(),
            profile_path: "/users/profile".to_string(),
            lists_path: "/lists".to_string(),
            catalog_path: "/items".to_string(),
            search_path: "/items/search".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests per second per client IP.
    pub requests_per_second: u32,

    /// Burst capacity.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: 100,
            burst_size: 50,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
