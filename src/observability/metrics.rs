//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pipeline_requests_total` (counter): inbound requests by stage, status
//! - `pipeline_request_duration_seconds` (histogram): inbound latency by stage
//! - `pipeline_hop_total` (counter): outbound hops by caller, callee, outcome
//! - `pipeline_hop_duration_seconds` (histogram): outbound hop latency

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::pipeline::Stage;

/// Install the Prometheus recorder and its scrape listener.
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed inbound request.
pub fn record_request(stage: Stage, status: u16, start: Instant) {
    counter!(
        "pipeline_requests_total",
        "stage" => stage.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("pipeline_request_duration_seconds", "stage" => stage.as_str())
        .record(start.elapsed().as_secs_f64());
}

/// Record an outbound hop from `from` to `to`.
pub fn record_hop(from: Stage, to: Stage, outcome: &'static str, start: Instant) {
    counter!(
        "pipeline_hop_total",
        "from" => from.as_str(),
        "to" => to.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "pipeline_hop_duration_seconds",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Middleware recording every request handled by `stage`.
pub async fn track_requests(stage: Stage, request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    record_request(stage, response.status().as_u16(), start);
    response
}
