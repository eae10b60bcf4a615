//! Metrics collection and exposition.
//!
//! # Metrics
//! - `webfinger_requests_total` (counter): lookups by outcome
//! - `webfinger_request_duration_seconds` (histogram): lookup latency
//! - `webfinger_config_reloads_total` (counter): reloads by result
//! - `webfinger_resources` (gauge): resources in the active snapshot
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

/// Record one lookup. `outcome` is a short label such as `document` or `not_found`.
pub fn record_request(outcome: &'static str, start: Instant) {
    counter!("webfinger_requests_total", "outcome" => outcome).increment(1);
    histogram!("webfinger_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("webfinger_config_reloads_total", "result" => result).increment(1);
}

pub fn record_resource_count(count: usize) {
    gauge!("webfinger_resources").set(count as f64);
}
