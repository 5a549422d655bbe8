use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;

use crate::error::GatewayError;
use crate::http::response::ApiResponse;
use crate::http::server::AppState;
use crate::registry::{Heartbeat, ServiceRecord, ServiceRegistration};
use crate::resilience::CircuitSnapshot;

/// `GET /health`: check every registered service. Always 200.
pub async fn get_health(
    State(state): State<AppState>,
) -> ApiResponse<BTreeMap<String, Value>> {
    let outcomes = state.registry.perform_health_checks(&state.checker).await;
    let report: BTreeMap<String, Value> = outcomes
        .into_iter()
        .map(|(name, outcome)| (name, outcome.to_report()))
        .collect();
    ApiResponse::ok(report)
}

/// `GET /registry`
pub async fn get_registry(
    State(state): State<AppState>,
) -> ApiResponse<BTreeMap<String, ServiceRecord>> {
    ApiResponse::ok(state.registry.list_services())
}

/// `GET /registry/circuits`
pub async fn get_circuits(
    State(state): State<AppState>,
) -> ApiResponse<BTreeMap<String, CircuitSnapshot>> {
    ApiResponse::ok(state.breakers.snapshot())
}

/// `POST /registry/register`
pub async fn register_service(
    State(state): State<AppState>,
    payload: Result<Json<ServiceRegistration>, JsonRejection>,
) -> Result<ApiResponse<ServiceRecord>, GatewayError> {
    let Json(registration) = payload.map_err(invalid_body)?;
    state
        .registry
        .register(registration)
        .map(|record| ApiResponse::ok_with_message(record, "Service registered"))
        .map_err(|e| GatewayError::Validation(e.to_string()))
}

/// `POST /registry/heartbeat`. Heartbeats from unknown services are accepted
/// and ignored.
pub async fn heartbeat(
    State(state): State<AppState>,
    payload: Result<Json<Heartbeat>, JsonRejection>,
) -> Result<ApiResponse<bool>, GatewayError> {
    let Json(beat) = payload.map_err(invalid_body)?;
    let known = state.registry.update_health(&beat.name, beat.healthy);
    Ok(ApiResponse::ok(known))
}

/// `DELETE /registry/{name}`
pub async fn deregister_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResponse<bool> {
    let removed = state.registry.deregister(&name).is_some();
    ApiResponse::ok(removed)
}

/// Malformed or incomplete JSON bodies are client errors in the gateway envelope.
fn invalid_body(rejection: JsonRejection) -> GatewayError {
    GatewayError::Validation(rejection.body_text())
}
