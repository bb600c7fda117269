//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sniffer_requests_total` (counter): dispatched requests by mode, status
//! - `sniffer_request_duration_seconds` (histogram): time to response headers by mode
//! - `sniffer_passthrough_total` (counter): requests handed downstream
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels stay low-cardinality: no paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a dispatched request.
pub fn record_dispatch(mode: &'static str, status: u16, started: Instant) {
    ::metrics::counter!(
        "sniffer_requests_total",
        "mode" => mode,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("sniffer_request_duration_seconds", "mode" => mode)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_passthrough() {
    ::metrics::counter!("sniffer_passthrough_total").increment(1);
}
