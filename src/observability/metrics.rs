//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tracer_events_logged_total` (counter): events appended to any event log
//! - `tracer_reports_sent_total` (counter): reports accepted by the ingress
//! - `tracer_reports_failed_total` (counter): dropped reports by `reason`
//! - `tracer_orphaned_ends_total` (counter): end events without an open start
//! - `tracer_internal_errors_total` (counter): instrumentation faults absorbed
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are static strings to keep cardinality bounded

use std::net::SocketAddr;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with an HTTP scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_event_logged() {
    metrics::counter!("tracer_events_logged_total").increment(1);
}

pub fn record_report_sent() {
    metrics::counter!("tracer_reports_sent_total").increment(1);
}

/// `reason` is one of `serialization`, `transport`, `status`, `no_runtime`.
pub fn record_report_failed(reason: &'static str) {
    metrics::counter!("tracer_reports_failed_total", "reason" => reason).increment(1);
}

pub fn record_orphaned_ends(count: usize) {
    if count > 0 {
        metrics::counter!("tracer_orphaned_ends_total").increment(count as u64);
    }
}

pub fn record_internal_error() {
    metrics::counter!("tracer_internal_errors_total").increment(1);
}
