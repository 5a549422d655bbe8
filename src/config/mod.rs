//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, env overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared with subsystems at startup
//!
//! On file change (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → route table swapped atomically, seed services re-registered
//! ```

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AggregationConfig, AuthConfig, CircuitBreakerConfig, GatewayConfig, HealthCheckConfig,
    ListenerConfig, ObservabilityConfig, RateLimitConfig, RouteConfig, ServiceConfig,
    TimeoutConfig,
};
