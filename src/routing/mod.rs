//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path + query
//!     → router.rs (longest-prefix lookup)
//!     → matcher.rs (segment-aware prefix match, path rewrite)
//!     → Return: ProxyTarget or NoMatch
//!
//! Route Compilation (startup and config reload):
//!     RouteConfig[]
//!     → Compile matchers
//!     → Sort by prefix length
//!     → Freeze as immutable RouteTable
//! ```

pub mod matcher;
pub mod router;

pub use router::{ProxyTarget, RouteTable};
