//! Metrics collection and exposition.
//!
//! # Metrics
//! - `credit_requests_total` (counter): requests by route, status
//! - `credit_request_duration_seconds` (histogram): latency by route
//! - `credit_rate_limited_total` (counter): limiter rejections
//! - `credit_auth_failures_total` (counter): by failure kind
//! - `credit_scores_total` (counter): computations by tier
//! - `credit_score_value` (histogram): scaled score distribution
//! - `credit_push_deliveries_total` (counter): events by delivered/dropped
//!
//! Recording without an installed exporter is a no-op.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on `addr`. Needs a running Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    let route = route.to_string();
    ::metrics::counter!(
        "credit_requests_total",
        "route" => route.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("credit_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    ::metrics::counter!("credit_rate_limited_total").increment(1);
}

pub fn record_auth_failure(kind: &'static str) {
    ::metrics::counter!("credit_auth_failures_total", "kind" => kind).increment(1);
}

pub fn record_score(tier: &'static str, scaled_score: u16) {
    ::metrics::counter!("credit_scores_total", "tier" => tier).increment(1);
    ::metrics::histogram!("credit_score_value").record(f64::from(scaled_score));
}

pub fn record_push(subscribers: usize) {
    let outcome = if subscribers > 0 { "delivered" } else { "dropped" };
    ::metrics::counter!("credit_push_deliveries_total", "outcome" => outcome).increment(1);
}
