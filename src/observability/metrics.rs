//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define registry metrics (route/endpoint counts, churn, prune volume)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `registry_routes_registered_total` (counter): register calls, labeled
//!   by whether the address was new
//! - `registry_routes_unregistered_total` (counter): unregister calls
//! - `registry_endpoints_pruned_total` (counter): endpoints evicted by the
//!   sweep
//! - `registry_uris` / `registry_endpoints` (gauges): current table size
//! - `mbus_messages_dropped_total` (counter): inbox overflow drops

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Helpers below are no-ops
/// until this has run, so tests never need an exporter.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route_registered(added: bool) {
    let kind = if added { "added" } else { "updated" };
    metrics::counter!("registry_routes_registered_total", "kind" => kind).increment(1);
}

pub fn record_route_unregistered(removed: bool) {
    let kind = if removed { "removed" } else { "unknown" };
    metrics::counter!("registry_routes_unregistered_total", "kind" => kind).increment(1);
}

pub fn record_routes_pruned(count: usize) {
    metrics::counter!("registry_endpoints_pruned_total").increment(count as u64);
}

pub fn update_route_counts(uris: usize, endpoints: usize) {
    metrics::gauge!("registry_uris").set(uris as f64);
    metrics::gauge!("registry_endpoints").set(endpoints as f64);
}

pub fn record_message_dropped(reason: &'static str) {
    metrics::counter!("mbus_messages_dropped_total", "reason" => reason).increment(1);
}
