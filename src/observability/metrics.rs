//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by routing decision
//! - `tenant_lookups_total` (counter): store lookups by outcome
//! - `tenant_lookup_duration_seconds` (histogram): store lookup latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count one routed request.
pub fn record_route_decision(decision: &'static str) {
    metrics::counter!("gateway_requests_total", "decision" => decision).increment(1);
}

/// Record a tenant store lookup (`found`, `missing` or `error`).
pub fn record_tenant_lookup(outcome: &'static str, start: Instant) {
    metrics::counter!("tenant_lookups_total", "outcome" => outcome).increment(1);
    metrics::histogram!("tenant_lookup_duration_seconds").record(start.elapsed().as_secs_f64());
}
