//! Report and interval definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::events::{Event, EventId};

/// Immutable snapshot of one query's trace, as sent to the ingress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// 36-character application key.
    pub app_key: String,
    pub tracer_api_version: String,
    pub query_id: Uuid,
    /// Wall-clock start of the query, epoch milliseconds.
    pub start_time: u64,
    /// Monotonic start of the query, same clock as event timestamps.
    pub start_hr_time: f64,
    pub events: Vec<Event>,
}

/// Execution span of one start/end pair, or a degenerate span for a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub query_id: Uuid,
    /// Id of the event that opened the interval.
    pub id: EventId,
    #[serde(rename = "type")]
    pub kind: String,
    pub start: f64,
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Data of the closing end event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Value>,
}

impl Interval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Result of grouping a report's events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouped {
    pub intervals: Vec<Interval>,
    /// End events discarded because no open interval matched.
    pub orphaned_ends: usize,
}
