//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, rejections, submissions, replies)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by channel, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency by channel
//! - `gateway_rate_limited_total` (counter): requests refused for quota
//! - `gateway_submissions_total` (counter): broadcasts by status
//! - `gateway_reply_failures_total` (counter): undeliverable replies by channel
//! - `gateway_counter_failures_total` (counter): counter store errors by operation
//! - `gateway_chain_health` (gauge): 1=reachable, 0=unreachable
//!
//! # Design Decisions
//! - Low-overhead metric updates through the `metrics` facade
//! - Without an installed recorder every call is a no-op (tests, CLI)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(channel: &'static str, status: &'static str, start: Instant) {
    counter!("gateway_requests_total", "channel" => channel, "status" => status).increment(1);
    histogram!("gateway_request_duration_seconds", "channel" => channel)
        .record(start.elapsed().as_secs_f64());
}

/// Record a request refused for quota.
pub fn record_rate_limited() {
    counter!("gateway_rate_limited_total").increment(1);
}

/// Record a broadcast attempt.
pub fn record_submission(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("gateway_submissions_total", "status" => status).increment(1);
}

/// Record a reply that could not be delivered.
pub fn record_reply_failure(channel: &'static str) {
    counter!("gateway_reply_failures_total", "channel" => channel).increment(1);
}

/// Record a counter store error.
pub fn record_counter_failure(operation: &'static str) {
    counter!("gateway_counter_failures_total", "operation" => operation).increment(1);
}

/// Record chain reachability.
pub fn record_chain_health(healthy: bool) {
    gauge!("gateway_chain_health").set(if healthy { 1.0 } else { 0.0 });
}
