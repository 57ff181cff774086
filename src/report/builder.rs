//! Report building, grouping, filtering and serialization.

use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::events::clock::{epoch_ms, monotonic_ms};
use crate::events::{Event, EventData, EventId, EventLog, EventType};
use crate::observability::metrics;
use crate::report::types::{Grouped, Interval, Report};

/// Version of the report format, also sent in the `user-agent` header.
pub const TRACER_API_VERSION: &str = "0.1.0";

/// A report could not be turned into bytes.
#[derive(Debug, Error)]
#[error("failed to serialize report for query {query_id}: {source}")]
pub struct SerializationError {
    pub query_id: Uuid,
    #[source]
    pub source: serde_json::Error,
}

/// Report header of one query; stamps its start times on creation.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    app_key: String,
    query_id: Uuid,
    start_time: u64,
    start_hr_time: f64,
}

impl ReportBuilder {
    pub fn new(app_key: impl Into<String>, query_id: Uuid) -> Self {
        Self {
            app_key: app_key.into(),
            query_id,
            start_time: epoch_ms(),
            start_hr_time: monotonic_ms(),
        }
    }

    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Snapshot the log. The log is left untouched.
    pub fn build(&self, log: &EventLog) -> Report {
        Report {
            app_key: self.app_key.clone(),
            tracer_api_version: TRACER_API_VERSION.to_string(),
            query_id: self.query_id,
            start_time: self.start_time,
            start_hr_time: self.start_hr_time,
            events: log.events().to_vec(),
        }
    }
}

/// Group a report's events into intervals in one pass over timestamp order.
///
/// Ticks become one-point intervals. A start opens an interval whose end is
/// first set to its start; the end event naming it by `start_event_id`
/// overwrites the end. Ends without an open interval are counted and dropped.
pub fn group(report: &Report) -> Grouped {
    let mut ordered: Vec<&Event> = report.events.iter().collect();
    ordered.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp).then(a.id.cmp(&b.id)));

    let mut grouped = Grouped::default();
    let mut open: HashMap<EventId, usize> = HashMap::new();

    for event in ordered {
        match event.event_type {
            EventType::Tick => {
                grouped.intervals.push(open_interval(report.query_id, event));
            }
            EventType::Start => {
                open.insert(event.id, grouped.intervals.len());
                grouped.intervals.push(open_interval(report.query_id, event));
            }
            EventType::End => {
                let slot = event.start_event_id.and_then(|id| open.remove(&id));
                match slot {
                    Some(index) => {
                        let interval = &mut grouped.intervals[index];
                        interval.end = event.timestamp;
                        interval.outcome = json_payload(event);
                    }
                    None => grouped.orphaned_ends += 1,
                }
            }
        }
    }

    if grouped.orphaned_ends > 0 {
        tracing::debug!(
            query_id = %report.query_id,
            orphaned_ends = grouped.orphaned_ends,
            "Discarded end events without an open interval"
        );
        metrics::record_orphaned_ends(grouped.orphaned_ends);
    }

    grouped
}

fn open_interval(query_id: Uuid, event: &Event) -> Interval {
    Interval {
        query_id,
        id: event.id,
        kind: event.kind.clone(),
        start: event.timestamp,
        end: event.timestamp,
        resolver_name: event.resolver_name.clone(),
        payload: json_payload(event),
        outcome: None,
    }
}

fn json_payload(event: &Event) -> Option<serde_json::Value> {
    event.data.as_ref().and_then(EventData::as_json).cloned()
}

/// Keep the items accepted by `filter`, then pass each through `map`.
///
/// Rejected items never reach `map`.
pub fn filter_and_map<T>(
    items: Vec<T>,
    filter: Option<&(dyn Fn(&T) -> bool + Send + Sync)>,
    map: Option<&(dyn Fn(T) -> T + Send + Sync)>,
) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| filter.map_or(true, |f| f(item)))
        .map(|item| match map {
            Some(m) => m(item),
            None => item,
        })
        .collect()
}

/// Serialize a report to JSON bytes.
pub fn serialize(report: &Report) -> Result<Vec<u8>, SerializationError> {
    serde_json::to_vec(report).map_err(|source| SerializationError {
        query_id: report.query_id,
        source,
    })
}
