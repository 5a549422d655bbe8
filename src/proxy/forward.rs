//! Upstream forwarding guarded by the circuit breaker.
//!
//! # Responsibilities
//! - Gate every call on the service's circuit
//! - Resolve the service's base URL through the registry
//! - Send the request and hand back the upstream response head with a streaming body
//! - Feed round-trip outcomes back into the circuit breaker

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Response, StatusCode};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::time;

use crate::registry::ServiceRegistry;
use crate::resilience::CircuitBreakerRegistry;

/// Why a call produced no upstream response.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("Service {0} is temporarily unavailable")]
    CircuitOpen(String),

    #[error("Service {0} is not registered")]
    ServiceNotFound(String),

    #[error("Failed to reach {service}: {reason}")]
    Transport { service: String, reason: String },

    #[error("{service} did not answer within {secs}s")]
    Timeout { service: String, secs: u64 },

    #[error("Invalid upstream target {url}: {reason}")]
    InvalidTarget { url: String, reason: String },
}

/// A call to be made against one service.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub service: String,
    pub method: Method,
    /// Backend path, including any query string.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ForwardRequest {
    /// A bodiless GET, as issued by the aggregation endpoints.
    pub fn get(service: impl Into<String>, path: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            service: service.into(),
            method: Method::GET,
            path: path.into(),
            headers,
            body: Bytes::new(),
        }
    }
}

/// An upstream answer, any status. The body streams from the backend.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl UpstreamResponse {
    /// Buffer the body, failing once it exceeds `limit` bytes.
    pub async fn into_bytes(self, limit: usize) -> Result<Bytes, axum::Error> {
        axum::body::to_bytes(self.body, limit).await
    }
}

impl fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Methods whose requests carry a body upstream.
pub fn method_carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Forwards calls to registered services.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    registry: Arc<ServiceRegistry>,
    breakers: Arc<CircuitBreakerRegistry>,
    timeout: Duration,
    max_body: usize,
    trip_on_server_error: bool,
}

impl Forwarder {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        breakers: Arc<CircuitBreakerRegistry>,
        timeout: Duration,
        max_body: usize,
        trip_on_server_error: bool,
    ) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        Self {
            client,
            registry,
            breakers,
            timeout,
            max_body,
            trip_on_server_error,
        }
    }

    /// Largest body callers should buffer from an upstream response.
    pub fn body_limit(&self) -> usize {
        self.max_body
    }

    /// Forward one call.
    ///
    /// Returns the upstream response whatever its status; an error means the
    /// call never produced a response. The outcome is recorded once the
    /// response head arrives, so body size never counts against the circuit.
    pub async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse, ForwardError> {
        let service = request.service.as_str();

        if !self.breakers.admit(service) {
            return Err(ForwardError::CircuitOpen(service.to_string()));
        }

        let record = self
            .registry
            .discover(service)
            .map_err(|_| ForwardError::ServiceNotFound(service.to_string()))?;

        let path = if request.path.starts_with('/') {
            request.path.clone()
        } else {
            format!("/{}", request.path)
        };
        let url = format!("{}{}", record.base_url.trim_end_matches('/'), path);

        let body = if method_carries_body(&request.method) {
            Body::from(request.body)
        } else {
            Body::empty()
        };

        let mut builder = Request::builder().method(request.method.clone()).uri(&url);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(request.headers);
        }
        let upstream_request = builder.body(body).map_err(|e| ForwardError::InvalidTarget {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(service = %service, method = %request.method, url = %url, "Forwarding request");

        match time::timeout(self.timeout, self.client.request(upstream_request)).await {
            Ok(Ok(response)) => {
                let response = self.into_upstream(response);
                if self.trip_on_server_error && response.status.is_server_error() {
                    self.breakers.record_failure(service);
                } else {
                    self.breakers.record_success(service);
                }
                Ok(response)
            }
            Ok(Err(e)) => {
                tracing::error!(service = %service, url = %url, error = %e, "Upstream error");
                self.breakers.record_failure(service);
                Err(ForwardError::Transport {
                    service: service.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                tracing::error!(service = %service, url = %url, "Upstream timed out");
                self.breakers.record_failure(service);
                Err(ForwardError::Timeout {
                    service: service.to_string(),
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }

    fn into_upstream(&self, response: Response<Incoming>) -> UpstreamResponse {
        let (parts, body) = response.into_parts();
        UpstreamResponse {
            status: parts.status,
            headers: parts.headers,
            body: Body::new(body),
        }
    }
}
