//! Metrics collection and exposition.
//!
//! # Metrics
//! - `logger_records_total` (counter): records dispatched, by channel and level
//! - `logger_sink_errors_total` (counter): contained sink write failures, by sink
//! - `logger_rotations_total` (counter): segments opened by rotation, by sink
//! - `logger_notifications_total` (counter): notification outcomes
//!   (`sent`, `failed`, `abandoned`)
//! - `http_requests_total` (counter): requests served, by method and status
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op
//! - The Prometheus exporter is optional and off by default

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_log(channel: &str, level: &'static str) {
    counter!("logger_records_total", "channel" => channel.to_string(), "level" => level)
        .increment(1);
}

pub fn record_sink_error(sink: &str) {
    counter!("logger_sink_errors_total", "sink" => sink.to_string()).increment(1);
}

pub fn record_rotation(sink: &str) {
    counter!("logger_rotations_total", "sink" => sink.to_string()).increment(1);
}

pub fn record_notification(outcome: &'static str) {
    counter!("logger_notifications_total", "outcome" => outcome).increment(1);
}

pub fn record_request(method: &str, status: u16) {
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
