//! Per-query trace session.
//!
//! # Responsibilities
//! - Own the event log of one query execution
//! - Expose logging entry points for resolvers, hooks and application code
//! - Build, filter, serialize and hand off the report on submit

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::events::{Correlation, Event, EventData, EventId, EventLog};
use crate::observability::metrics;
use crate::report::{filter_and_map, serialize, Report, ReportBuilder};
use crate::tracer::TracerInner;

/// Event type of faults absorbed inside the instrumentation layer.
pub const INTERNAL_ERROR_EVENT: &str = "tracer.internal_error";

struct SessionState {
    log: Mutex<EventLog>,
    builder: ReportBuilder,
}

/// Trace session of one query. Clones share the same event log.
#[derive(Clone)]
pub struct QuerySession {
    state: Arc<SessionState>,
    tracer: Arc<TracerInner>,
}

impl QuerySession {
    pub(crate) fn new(tracer: Arc<TracerInner>) -> Self {
        let builder = ReportBuilder::new(tracer.config.app_key.clone(), Uuid::new_v4());
        Self {
            state: Arc::new(SessionState {
                log: Mutex::new(EventLog::new()),
                builder,
            }),
            tracer,
        }
    }

    pub fn query_id(&self) -> Uuid {
        self.state.builder.query_id()
    }

    /// Log a tick event with an optional JSON payload.
    pub fn log(&self, kind: &str, data: Option<Value>) -> EventId {
        self.with_log(|log| log.log(kind, data.map(EventData::Json), Correlation::Tick))
    }

    /// Log a tick event with any serializable payload.
    ///
    /// A payload that fails to serialize is still logged; the report it ends
    /// up in will be dropped at submit time.
    pub fn log_serialized<T: Serialize + ?Sized>(&self, kind: &str, data: &T) -> EventId {
        let data = EventData::from_serialize(data);
        self.with_log(|log| log.log(kind, Some(data), Correlation::Tick))
    }

    /// Log an engine event, pairing `*_START`/`*_END` tags by payload path.
    pub fn correlate(&self, tag: &str, payload: Option<Value>) -> EventId {
        self.with_log(|log| log.correlate(tag, payload))
    }

    pub(crate) fn resolver_event(
        &self,
        kind: &str,
        resolver_name: &str,
        data: Value,
        correlation: Correlation,
    ) -> EventId {
        self.with_log(|log| {
            log.log_resolver(kind, resolver_name, Some(EventData::Json(data)), correlation)
        })
    }

    /// Record a fault of the tracer itself. Never panics.
    pub(crate) fn internal_error(&self, context: &str, message: &str) {
        tracing::error!(query_id = %self.query_id(), context, message, "Tracer internal error");
        metrics::record_internal_error();

        let data = serde_json::json!({ "context": context, "message": message });
        let logged = panic::catch_unwind(AssertUnwindSafe(|| {
            self.with_log(|log| log.log(INTERNAL_ERROR_EVENT, Some(EventData::Json(data)), Correlation::Tick))
        }));
        if logged.is_err() {
            tracing::error!(query_id = %self.query_id(), "Failed to record tracer internal error");
        }
    }

    /// Snapshot of the events logged so far.
    pub fn events(&self) -> Vec<Event> {
        self.with_log(|log| log.events().to_vec())
    }

    /// Build the unfiltered report of everything logged so far.
    pub fn report(&self) -> Report {
        self.with_log(|log| self.state.builder.build(log))
    }

    /// Send the report if sending is enabled.
    ///
    /// Applies the configured filter then map, serializes and hands the bytes
    /// to the transport without waiting. Never fails: every problem is logged
    /// and counted instead. Returns the transport's task handle, if any.
    pub fn submit(&self) -> Option<JoinHandle<()>> {
        if !self.tracer.config.send_reports {
            tracing::trace!(query_id = %self.query_id(), "Report sending disabled");
            return None;
        }

        let prepared = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut report = self.report();
            report.events = filter_and_map(
                report.events,
                self.tracer.report_filter.as_deref(),
                self.tracer.report_map.as_deref(),
            );
            serialize(&report)
        }));

        let body = match prepared {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Dropping trace report");
                metrics::record_report_failed("serialization");
                return None;
            }
            Err(payload) => {
                self.internal_error("submit", &panic_message(payload.as_ref()));
                metrics::record_report_failed("internal");
                return None;
            }
        };

        tracing::debug!(query_id = %self.query_id(), bytes = body.len(), "Submitting trace report");
        self.tracer.transport.send(body)
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut EventLog) -> T) -> T {
        let mut log = self.state.log.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut log)
    }
}

impl std::fmt::Debug for QuerySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySession")
            .field("query_id", &self.query_id())
            .finish()
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
