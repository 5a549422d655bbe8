//! Network layer subsystem.
//!
//! The listener itself is a plain `tokio::net::TcpListener` handed to the
//! HTTP server; this module only holds the optional TLS setup.

pub mod tls;
