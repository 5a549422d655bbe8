//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Proxied call to a service:
//!     → circuit_breaker.rs admit (open circuit → 503, no network)
//!     → forward with upstream timeout
//!     → circuit_breaker.rs record_success / record_failure
//! ```
//!
//! # Design Decisions
//! - One circuit per service name, created on first recorded outcome
//! - No retries; one failed call is one recorded failure
//! - Timeouts count as transport failures

pub mod circuit_breaker;

pub use circuit_breaker::{BreakerPolicy, CircuitBreakerRegistry, CircuitSnapshot, CircuitState};
