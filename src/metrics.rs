//! Prometheus metrics for gateway observability.
//!
//! Metrics are recorded through the `metrics` facade and are no-ops until
//! [`init_metrics`] installs the Prometheus exporter. The exporter runs its
//! own listener on `METRICS_PORT`, separate from the gateway port.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `gateway_requests_total` - Every response (labels: route, status), counted
//!   by `middleware::request_metrics`; `route` is `unrouted` for responses
//!   produced before routing (`OPTIONS` short-circuit, 413)
//! - `gateway_upstream_errors_total` - Upstream transport failures (label: kind)
//! - `gateway_target_fallbacks_total` - Selections replaced by the fallback target
//! - `gateway_forwarded_bytes_total` - Request body bytes sent upstream
//!
//! ## Histograms
//! - `gateway_upstream_duration_seconds` - Upstream exchange time (label: route)

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "gateway_requests_total";
    pub const UPSTREAM_ERRORS_TOTAL: &str = "gateway_upstream_errors_total";
    pub const TARGET_FALLBACKS_TOTAL: &str = "gateway_target_fallbacks_total";
    pub const FORWARDED_BYTES_TOTAL: &str = "gateway_forwarded_bytes_total";
    pub const UPSTREAM_DURATION_SECONDS: &str = "gateway_upstream_duration_seconds";
}

/// Initialize the Prometheus metrics exporter on `metrics_addr`.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::REQUESTS_TOTAL,
        "Total number of requests handled by the gateway"
    );
    describe_counter!(
        names::UPSTREAM_ERRORS_TOTAL,
        "Total number of failed upstream exchanges"
    );
    describe_counter!(
        names::TARGET_FALLBACKS_TOTAL,
        "Total number of selections that fell back to the default target"
    );
    describe_counter!(
        names::FORWARDED_BYTES_TOTAL,
        "Total request body bytes forwarded to backends"
    );
    describe_histogram!(
        names::UPSTREAM_DURATION_SECONDS,
        "Time from sending the upstream request to receiving its response head"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record a handled request and its final status.
pub fn record_request(route: &'static str, status: u16) {
    counter!(names::REQUESTS_TOTAL, "route" => route, "status" => status.to_string())
        .increment(1);
}

/// Record an upstream failure of the given kind (`connect`, `timeout`).
pub fn record_upstream_error(kind: &'static str) {
    counter!(names::UPSTREAM_ERRORS_TOTAL, "kind" => kind).increment(1);
}

/// Record a selection that was replaced by the fallback target.
pub fn record_target_fallback() {
    counter!(names::TARGET_FALLBACKS_TOTAL).increment(1);
}

/// Record request body bytes forwarded upstream.
pub fn record_forwarded_bytes(bytes: usize) {
    counter!(names::FORWARDED_BYTES_TOTAL).increment(bytes as u64);
}

/// Record the duration of one upstream exchange.
pub fn record_upstream_duration(route: &'static str, duration_secs: f64) {
    histogram!(names::UPSTREAM_DURATION_SECONDS, "route" => route).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Without an installed recorder these calls are no-ops; they must not panic.

    #[test]
    fn test_record_request() {
        record_request("prefix_proxy", 200);
        record_request("catch_all", 404);
    }

    #[test]
    fn test_record_upstream_error() {
        record_upstream_error("connect");
        record_upstream_error("timeout");
    }

    #[test]
    fn test_record_counters_and_histogram() {
        record_target_fallback();
        record_forwarded_bytes(1024);
        record_upstream_duration("direct_proxy", 0.05);
    }
}
