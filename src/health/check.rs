//! Single-service health checks.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::{Map, Value};
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::registry::ServiceRecord;

const MAX_CHECK_BODY: usize = 64 * 1024;

/// Result of probing one service.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The service answered 2xx; carries the fields it reported.
    Healthy(Map<String, Value>),
    /// The check failed, timed out or got a non-2xx answer.
    Unhealthy(String),
}

impl CheckOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, CheckOutcome::Healthy(_))
    }

    /// Render as `{status: "healthy", ...}` or `{status: "unhealthy", error}`.
    pub fn to_report(&self) -> Value {
        match self {
            CheckOutcome::Healthy(fields) => {
                let mut report = fields.clone();
                report.insert("status".to_string(), Value::from("healthy"));
                Value::Object(report)
            }
            CheckOutcome::Unhealthy(error) => serde_json::json!({
                "status": "unhealthy",
                "error": error,
            }),
        }
    }
}

/// Issues bounded-time GET checks against service health endpoints.
#[derive(Clone)]
pub struct HealthChecker {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
    default_path: String,
}

impl HealthChecker {
    pub fn new(config: &HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
            default_path: config.path.clone(),
        }
    }

    /// URL checked for a record: its declared health endpoint, else the default path.
    pub fn check_url(&self, record: &ServiceRecord) -> String {
        let path = record.health_endpoint().unwrap_or(self.default_path.as_str());
        format!(
            "{}/{}",
            record.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Check one service. Never fails; errors become `Unhealthy`.
    pub async fn check(&self, record: &ServiceRecord) -> CheckOutcome {
        match time::timeout(self.timeout, self.fetch(record)).await {
            Ok(outcome) => outcome,
            Err(_) => CheckOutcome::Unhealthy(format!(
                "health check timed out after {}s",
                self.timeout.as_secs()
            )),
        }
    }

    async fn fetch(&self, record: &ServiceRecord) -> CheckOutcome {
        let uri = self.check_url(record);
        let request = match Request::builder()
            .method("GET")
            .uri(&uri)
            .header(header::USER_AGENT, "service-gateway-health-check")
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => return CheckOutcome::Unhealthy(format!("invalid health URL {}: {}", uri, e)),
        };

        let response = match self.client.request(request).await {
            Ok(response) => response,
            Err(e) => return CheckOutcome::Unhealthy(format!("connection error: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return CheckOutcome::Unhealthy(format!("health endpoint returned {}", status));
        }

        let body = axum::body::to_bytes(Body::new(response.into_body()), MAX_CHECK_BODY)
            .await
            .unwrap_or_default();
        match serde_json::from_slice::<Value>(&body) {
            Ok(Value::Object(fields)) => CheckOutcome::Healthy(fields),
            _ => CheckOutcome::Healthy(Map::new()),
        }
    }
}
