//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Service startup / config seed
//!     → store.rs register (upsert, healthy = true)
//!
//! Heartbeat or health check
//!     → store.rs update_health (no-op for unknown names)
//!
//! Proxied request
//!     → store.rs discover (NotFound → 503 upstream of the network)
//! ```
//!
//! # Design Decisions
//! - One record per name; re-registration keeps `registered_at`
//! - Discovery ignores the health flag; the circuit breaker is the failure gate
//! - Owned instance shared through application state, never a global

pub mod record;
pub mod store;

pub use record::{Heartbeat, ServiceRecord, ServiceRegistration};
pub use store::{RegistryError, ServiceRegistry};
