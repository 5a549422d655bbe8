//! Gateway introspection and registry API.
//!
//! - `GET  /health`              aggregate health of every registered service
//! - `GET  /registry`            all service records
//! - `GET  /registry/circuits`   circuit breaker states
//! - `POST /registry/register`   service announcement (api key, if configured)
//! - `POST /registry/heartbeat`  liveness announcement (api key, if configured)
//! - `DELETE /registry/{name}`   advisory removal (api key, if configured)

pub mod handlers;
pub mod auth;

use axum::{
    routing::{delete, get, post},
    Router,
    middleware,
};
use crate::http::server::AppState;
use self::handlers::*;
use self::auth::registry_key_middleware;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    let mutations = Router::new()
        .route("/registry/register", post(register_service))
        .route("/registry/heartbeat", post(heartbeat))
        .route("/registry/{name}", delete(deregister_service))
        .layer(middleware::from_fn_with_state(state, registry_key_middleware));

    Router::new()
        .route("/health", get(get_health))
        .route("/registry", get(get_registry))
        .route("/registry/circuits", get(get_circuits))
        .merge(mutations)
}
