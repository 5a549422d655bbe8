//! Caller identity.
//!
//! Token issuance lives in the user service; the gateway only verifies.

pub mod jwt;
pub mod middleware;

pub use jwt::{AuthError, Claims, JwtVerifier, TokenVerifier};
pub use middleware::{require_auth, CallerContext};
