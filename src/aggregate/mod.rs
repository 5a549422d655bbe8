//! Aggregation endpoints.
//!
//! # Data Flow
//! ```text
//! GET /api/dashboard or /api/search (bearer verified)
//!     → 2-3 concurrent calls through the forwarder (breaker + registry)
//!     → unwrap each backend envelope
//!     → derived view in a gateway envelope
//! ```
//!
//! # Design Decisions
//! - All or nothing: the first failing call aborts with 500
//! - The caller's authorization header is forwarded to every backend

pub mod dashboard;
pub mod search;

use std::time::Instant;

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::CallerContext;
use crate::error::GatewayError;
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::proxy::{ForwardRequest, Forwarder};

pub use dashboard::{dashboard, summarize, DashboardSummary};
pub use search::{filter_lists, search, SearchQuery};

/// Envelope returned by every backend service.
#[derive(Debug, Deserialize)]
struct BackendEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

/// Headers sent with each aggregate sub-call.
pub(crate) fn caller_headers(caller: &CallerContext, request_id: Option<&HeaderValue>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, caller.authorization.clone());
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(id) = request_id {
        headers.insert(X_REQUEST_ID, id.clone());
    }
    headers
}

/// GET `path` on `service` and return the envelope's `data`.
///
/// Any non-2xx status, `success: false` or undecodable body is an error.
pub(crate) async fn fetch_data(
    forwarder: &Forwarder,
    service: &str,
    path: String,
    headers: HeaderMap,
) -> Result<Value, GatewayError> {
    let response = forwarder
        .forward(ForwardRequest::get(service, path.clone(), headers))
        .await
        .map_err(|e| GatewayError::Aggregation(format!("{} {}: {}", service, path, e)))?;

    if !response.status.is_success() {
        return Err(GatewayError::Aggregation(format!(
            "{} {} returned {}",
            service, path, response.status
        )));
    }

    let body = response.into_bytes(forwarder.body_limit()).await.map_err(|e| {
        GatewayError::Aggregation(format!("{} {} body could not be read: {}", service, path, e))
    })?;
    let envelope: BackendEnvelope = serde_json::from_slice(&body).map_err(|e| {
        GatewayError::Aggregation(format!("{} {} sent an unreadable body: {}", service, path, e))
    })?;
    if !envelope.success {
        return Err(GatewayError::Aggregation(format!(
            "{} {} reported failure: {}",
            service,
            path,
            envelope.message.unwrap_or_default()
        )));
    }
    Ok(envelope.data)
}

/// Interpret a payload as an array.
pub(crate) fn expect_array(service: &str, data: Value) -> Result<Vec<Value>, GatewayError> {
    match data {
        Value::Array(values) => Ok(values),
        other => Err(GatewayError::Aggregation(format!(
            "{} returned {} where a list was expected",
            service,
            json_kind(&other)
        ))),
    }
}

/// Count an aggregate call in the request metrics under its endpoint name.
pub(crate) fn record_outcome<T>(endpoint: &str, result: &Result<T, GatewayError>, start: Instant) {
    let status = match result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status(),
    };
    metrics::record_request("GET", status.as_u16(), endpoint, start);
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
