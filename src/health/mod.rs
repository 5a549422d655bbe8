//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (active.rs) or GET /health
//!     → registry perform_health_checks
//!     → check.rs (one bounded GET per service, concurrently)
//!     → registry update_health per result
//! ```
//!
//! # Design Decisions
//! - Each check is isolated; one failure never aborts the round
//! - Checks bypass the circuit breaker
//! - Health flags are informational; routing does not filter on them

pub mod active;
pub mod check;

pub use active::HealthMonitor;
pub use check::{HealthChecker, CheckOutcome};
