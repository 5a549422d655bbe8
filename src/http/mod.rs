//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (assign or propagate request ID)
//!     → gateway handlers, or the proxy fallback
//!     → response.rs (JSON envelope for gateway-generated bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ApiResponse;
pub use server::{AppState, HttpServer};
