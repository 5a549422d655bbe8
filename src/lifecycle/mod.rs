//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → health monitor exits, server stops accepting and drains
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{wait_for, Shutdown};
pub use signals::wait_for_signal;
