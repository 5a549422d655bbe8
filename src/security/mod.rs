//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → body limit and concurrency limit (tower layers, http/server.rs)
//!     → rate_limit.rs (per-IP token bucket, optional)
//!     → bearer verification on aggregate endpoints (auth/)
//!     → header sanitation before forwarding (proxy/headers.rs)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod rate_limit;

pub use rate_limit::{rate_limit_middleware, RateLimiter};
