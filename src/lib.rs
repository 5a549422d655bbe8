//! API gateway library: service registry, health monitoring, circuit
//! breaking, reverse proxying and aggregation endpoints.

pub mod admin;
pub mod aggregate;
pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod registry;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
