//! Gateway error taxonomy and its mapping onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::http::response::ApiResponse;
use crate::proxy::ForwardError;

/// Errors the gateway reports on its own behalf.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or invalid bearer token.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A required request parameter is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Breaker open or service not registered; no backend was contacted.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// The call was attempted but no response came back.
    #[error("{0}")]
    Forwarding(String),

    /// One of the calls behind an aggregate endpoint failed.
    #[error("{0}")]
    Aggregation(String),

    #[error("no route for {0}")]
    RouteNotFound(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Auth(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Forwarding(_) | GatewayError::Aggregation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::RouteNotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<ForwardError> for GatewayError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::CircuitOpen(_) | ForwardError::ServiceNotFound(_) => {
                GatewayError::ServiceUnavailable(err.to_string())
            }
            ForwardError::Transport { .. }
            | ForwardError::Timeout { .. }
            | ForwardError::InvalidTarget { .. } => GatewayError::Forwarding(err.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self, "Request failed");
        }
        (status, ApiResponse::error(self.to_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(GatewayError::Auth(AuthError::MissingToken).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(GatewayError::Validation("q".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::from(ForwardError::CircuitOpen("list-service".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::from(ForwardError::ServiceNotFound("ghost".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::from(ForwardError::Timeout { service: "item-service".into(), secs: 30 }).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(GatewayError::RouteNotFound("/nope".into()).status(), StatusCode::NOT_FOUND);
    }
}
