//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, service
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_circuit_open` (gauge): 1=open, 0=closed, per service
//! - `gateway_circuit_rejections_total` (counter): calls short-circuited
//! - `gateway_service_health` (gauge): 1=healthy, 0=unhealthy
//! - `gateway_rate_limited_total` (counter): requests rejected with 429

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, service: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("service", service.to_string()),
    ];
    ::metrics::counter!("gateway_requests_total", &labels).increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_circuit_state(service: &str, open: bool) {
    ::metrics::gauge!("gateway_circuit_open", "service" => service.to_string())
        .set(if open { 1.0 } else { 0.0 });
}

pub fn record_circuit_rejection(service: &str) {
    ::metrics::counter!("gateway_circuit_rejections_total", "service" => service.to_string())
        .increment(1);
}

pub fn record_service_health(service: &str, healthy: bool) {
    ::metrics::gauge!("gateway_service_health", "service" => service.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_rate_limited(reason: &'static str) {
    ::metrics::counter!("gateway_rate_limited_total", "reason" => reason).increment(1);
}
