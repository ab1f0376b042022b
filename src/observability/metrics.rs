//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by outcome and status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency
//! - `gateway_rate_limited_total` (counter): rejected by the limiter
//! - `gateway_upstream_duration_seconds` (histogram): upstream call latency
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!("gateway_requests_total", "outcome" => outcome, "status" => status.to_string())
        .increment(1);
    histogram!("gateway_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(reason: &'static str) {
    counter!("gateway_rate_limited_total", "reason" => reason).increment(1);
}

pub fn record_upstream(outcome: &'static str, start: Instant) {
    histogram!("gateway_upstream_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}
