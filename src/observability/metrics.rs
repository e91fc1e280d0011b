//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): dispatched requests by method, status
//! - `dispatch_request_duration_seconds` (histogram): time spent in the chain
//! - `dispatch_engine_reloads_total` (counter): engine swaps by outcome
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; exporting is optional
//! - Labels stay low-cardinality: no paths, no route templates

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one dispatched request.
pub fn record_dispatch(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    ::metrics::counter!(
        "dispatch_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "dispatch_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an engine hot-swap attempt.
pub fn record_reload(outcome: &'static str) {
    ::metrics::counter!("dispatch_engine_reloads_total", "outcome" => outcome).increment(1);
}
