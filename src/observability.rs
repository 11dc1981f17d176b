use std::net::SocketAddr;

use crate::engine::{BookingError, BookingReceipt};

// ── Attempt metrics ─────────────────────────────────────────────

/// Counter: booking attempts finished. Labels: outcome.
pub const ATTEMPTS_TOTAL: &str = "roombook_attempts_total";

/// Histogram: attempt latency in seconds, validation to return.
pub const ATTEMPT_DURATION_SECONDS: &str = "roombook_attempt_duration_seconds";

/// Counter: reservation records written (before verification).
pub const RECORDS_WRITTEN_TOTAL: &str = "roombook_records_written_total";

// ── Rollback / contention ───────────────────────────────────────

/// Counter: keys passed to rollback.
pub const ROLLBACK_KEYS_TOTAL: &str = "roombook_rollback_keys_total";

/// Counter: rollback clears that failed and left a record behind.
pub const ROLLBACK_DELETE_FAILURES_TOTAL: &str = "roombook_rollback_delete_failures_total";

/// Gauge: current value of the contention counter.
pub const CONTENTION_COUNT: &str = "roombook_contention_count";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map an attempt result to a short label for metrics.
pub fn outcome_label(result: &Result<BookingReceipt, BookingError>) -> &'static str {
    match result {
        Ok(_) => "booked",
        Err(e) => e.label(),
    }
}
