//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, origin
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_origin_health` (gauge): 1=up, 0=down, per origin
//! - `proxy_failovers_total` (counter): responses served past tier 1
//! - `proxy_probe_cycles_total` (counter): completed probe cycles
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations behind the facade)
//! - Labels for origin id and status code
//! - Exporter listener is optional and config-gated

use std::net::SocketAddr;
use std::time::Instant;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed client request.
pub fn record_request(method: &str, status: u16, origin: &str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "origin" => origin.to_string()
    )
    .increment(1);
    histogram!(
        "proxy_request_duration_seconds",
        "origin" => origin.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an origin's probed health.
pub fn record_origin_health(origin: &str, up: bool) {
    gauge!("proxy_origin_health", "origin" => origin.to_string())
        .set(if up { 1.0 } else { 0.0 });
}

/// Record a response served by a tier other than tier 1.
pub fn record_failover(origin: &str, tier: u32) {
    counter!(
        "proxy_failovers_total",
        "origin" => origin.to_string(),
        "tier" => tier.to_string()
    )
    .increment(1);
}

/// Record a completed probe cycle.
pub fn record_probe_cycle() {
    counter!("proxy_probe_cycles_total").increment(1);
}
