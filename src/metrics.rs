//! Prometheus metrics for requests, cache lookups and upstream calls.
//!
//! Recording functions are no-ops until [`install`] sets the global
//! recorder, so library code and tests can call them freely.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::warn;

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the global Prometheus recorder once and return its handle.
///
/// Returns `None` if another recorder was already installed.
pub fn install() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        })
        .clone()
}

/// Count a finished inbound request.
pub fn record_request(endpoint: &'static str, status: u16) {
    counter!(
        "streamcache_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record the latency of an inbound request.
pub fn record_duration(endpoint: &'static str, start: Instant) {
    histogram!("streamcache_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

/// Count a cache lookup as hit or miss for a resource class.
pub fn record_cache_lookup(resource: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!(
        "streamcache_cache_lookups_total",
        "resource" => resource,
        "result" => result
    )
    .increment(1);
}

/// Count an upstream call and record its latency. `status` is `None` on
/// transport failure.
pub fn record_upstream(status: Option<u16>, start: Instant) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
    counter!("streamcache_upstream_requests_total", "status" => status).increment(1);
    histogram!("streamcache_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}
