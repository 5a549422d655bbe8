use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum::http::StatusCode;

use crate::http::response::ApiResponse;
use crate::http::server::AppState;

/// Header carrying the registry API key.
pub const X_API_KEY: &str = "x-api-key";

/// Guards registry mutations when `registry.api_key` is configured.
pub async fn registry_key_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.registry_api_key.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(X_API_KEY)
        .and_then(|h| h.to_str().ok());

    if provided == Some(expected) {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Rejected registry call with missing or wrong API key");
    (StatusCode::UNAUTHORIZED, ApiResponse::error("Invalid registry API key")).into_response()
}
