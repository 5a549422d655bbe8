//! Reverse proxy subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyTarget (service, rewritten path)
//!     → headers.rs (drop host/content-length/hop-by-hop, add x-forwarded-for)
//!     → forward.rs (breaker gate → registry discover → send → record outcome)
//!     → UpstreamResponse relayed verbatim, or ForwardError synthesized
//! ```

pub mod forward;
pub mod headers;

pub use forward::{method_carries_body, ForwardError, ForwardRequest, Forwarder, UpstreamResponse};
