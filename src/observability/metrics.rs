//! Metrics collection and exposition.
//!
//! # Metrics
//! - `launcher_initializers_total` (counter): initializer runs by name, outcome
//! - `launcher_service_exits_total` (counter): service task exits by name, outcome
//! - `launcher_running_services` (gauge): services whose tasks are alive
//! - `launcher_stop_failures_total` (counter): failed, panicked or timed-out stops by name, reason
//! - `storage_tables_initialized_total` (counter): repositories initialized by table
//!
//! # Design Decisions
//! - One Prometheus recorder per process, installed lazily
//! - A second install attempt (e.g. another bootstrap in tests) reuses the handle

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder (once) and return a handle for rendering.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if let Err(e) = metrics::set_global_recorder(recorder) {
                tracing::warn!(error = %e, "Metrics recorder already installed; /metrics output will be empty");
            }
            handle
        })
        .clone()
}

pub fn record_initializer(name: &str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    metrics::counter!(
        "launcher_initializers_total",
        "initializer" => name.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// `outcome` is one of `ok`, `cancelled`, `error`, `panic`.
pub fn record_service_exit(name: &str, outcome: &'static str) {
    metrics::counter!(
        "launcher_service_exits_total",
        "service" => name.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn set_running_services(count: usize) {
    metrics::gauge!("launcher_running_services").set(count as f64);
}

/// `reason` is `error`, `panic` or `timeout`.
pub fn record_stop_failure(name: &str, reason: &'static str) {
    metrics::counter!(
        "launcher_stop_failures_total",
        "service" => name.to_string(),
        "reason" => reason
    )
    .increment(1);
}

pub fn record_table_initialized(table: &str) {
    metrics::counter!(
        "storage_tables_initialized_total",
        "table" => table.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        let first = init_metrics();
        let second = init_metrics();
        record_table_initialized("users");

        assert!(first.render().contains("storage_tables_initialized_total"));
        assert!(second.render().contains("storage_tables_initialized_total"));
    }
}
