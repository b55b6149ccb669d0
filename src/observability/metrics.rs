//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_checkouts_total` (counter): checkouts by outcome and final stage
//! - `gateway_checkout_duration_seconds` (histogram): end-to-end checkout time
//! - `gateway_downstream_requests_total` (counter): calls by service and status
//! - `gateway_downstream_duration_seconds` (histogram): call latency by service
//! - `gateway_compensations_total` (counter): compensating actions by result
//! - `gateway_inventory_lock_wait_seconds` (histogram): time to acquire leases

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and start its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_checkout(outcome: &'static str, stage: &'static str, start: Instant) {
    counter!("gateway_checkouts_total", "outcome" => outcome, "stage" => stage).increment(1);
    histogram!("gateway_checkout_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_downstream_call(service: &'static str, status: &str, start: Instant) {
    counter!(
        "gateway_downstream_requests_total",
        "service" => service,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_downstream_duration_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_compensation(action: &'static str, ok: bool) {
    let result = if ok { "ok" } else { "failed" };
    counter!("gateway_compensations_total", "action" => action, "result" => result).increment(1);
}

pub fn record_lock_wait(waited: Duration) {
    histogram!("gateway_inventory_lock_wait_seconds").record(waited.as_secs_f64());
}
