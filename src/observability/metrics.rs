//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registry_activations_total` (counter): activation outcomes by `outcome`
//! - `registry_evictions_total` (counter): handlers displaced by a stronger one
//! - `registry_failovers_total` (counter): failovers by `result`
//! - `registry_active_patterns` (gauge): patterns with a live registration
//! - `registry_requests_total` (counter): served requests by `status`
//! - `registry_request_duration_seconds` (histogram): dispatch latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op (unit tests, library use)
//! - Prometheus exposition is opt-in from the binary

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_activation(outcome: &'static str) {
    metrics::counter!("registry_activations_total", "outcome" => outcome).increment(1);
}

pub fn record_eviction() {
    metrics::counter!("registry_evictions_total").increment(1);
}

pub fn record_failover(result: &'static str) {
    metrics::counter!("registry_failovers_total", "result" => result).increment(1);
}

pub fn set_active_patterns(count: usize) {
    metrics::gauge!("registry_active_patterns").set(count as f64);
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("registry_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("registry_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
