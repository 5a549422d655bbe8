//! Bearer authentication for the aggregation endpoints.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::jwt::{bearer_token, Claims};
use crate::error::GatewayError;
use crate::http::server::AppState;

/// Verified caller attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub claims: Claims,
    /// Original header, forwarded to backends on the caller's behalf.
    pub authorization: HeaderValue,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let authorization = req.headers().get(header::AUTHORIZATION).cloned();
    let token = match bearer_token(authorization.as_ref().and_then(|v| v.to_str().ok())) {
        Ok(token) => token,
        Err(e) => return GatewayError::Auth(e).into_response(),
    };

    let claims = match state.verifier.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return GatewayError::Auth(e).into_response();
        }
    };

    if let Some(authorization) = authorization {
        req.extensions_mut().insert(CallerContext { claims, authorization });
    }
    next.run(req).await
}
