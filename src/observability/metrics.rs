//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_reloads_total` (counter): reload attempts by outcome
//! - `config_changes_total` (counter): changed leaf fields applied
//! - `config_callbacks_total` (counter): callback invocations by outcome

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter, serving `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_reload(outcome: &'static str) {
    metrics::counter!("config_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_changes(count: usize) {
    metrics::counter!("config_changes_total").increment(count as u64);
}

pub fn record_callback(outcome: &'static str) {
    metrics::counter!("config_callbacks_total", "outcome" => outcome).increment(1);
}
