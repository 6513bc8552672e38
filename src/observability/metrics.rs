//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hop_trace_requests_total` (counter): trace requests by outcome, status
//! - `hop_trace_request_duration_seconds` (histogram): end-to-end latency
//! - `hop_trace_downstream_calls_total` (counter): downstream calls by result
//! - `hop_trace_downstream_duration_seconds` (histogram): downstream latency
//! - `hop_trace_chain_length` (histogram): hops in each response
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished trace request.
pub fn record_trace(outcome: &'static str, status: u16, chain_length: usize, start: Instant) {
    metrics::counter!(
        "hop_trace_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("hop_trace_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
    metrics::histogram!("hop_trace_chain_length").record(chain_length as f64);
}

/// Record one downstream call attempt.
pub fn record_downstream_call(result: &'static str, start: Instant) {
    metrics::counter!("hop_trace_downstream_calls_total", "result" => result).increment(1);
    metrics::histogram!("hop_trace_downstream_duration_seconds", "result" => result)
        .record(start.elapsed().as_secs_f64());
}
