//! Metrics collection and exposition.
//!
//! # Metrics
//! - `devproxy_requests_total` (counter): requests by decision (`proxy`/`local`)
//! - `devproxy_proxy_errors_total` (counter): upstream failures by error code
//! - `devproxy_upstream_duration_seconds` (histogram): upstream latency by context
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(proxied: bool) {
    let decision = if proxied { "proxy" } else { "local" };
    counter!("devproxy_requests_total", "decision" => decision).increment(1);
}

pub fn record_proxy_error(code: &'static str) {
    counter!("devproxy_proxy_errors_total", "code" => code).increment(1);
}

pub fn record_upstream(context: &str, start: Instant) {
    histogram!("devproxy_upstream_duration_seconds", "context" => context.to_string())
        .record(start.elapsed().as_secs_f64());
}
