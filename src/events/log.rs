//! Per-query event log with start/end correlation.
//!
//! # Responsibilities
//! - Assign event ids and monotonic timestamps
//! - Append events in logging order
//! - Correlate `*.start` / `*.end` tags through a path-keyed index

use std::collections::HashMap;
use serde_json::Value;

use crate::events::clock::monotonic_ms;
use crate::events::types::{Correlation, Event, EventData, EventId};
use crate::observability::metrics;

/// Key of an open interval: tag without its start/end suffix, plus the
/// serialized field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CorrelationKey {
    tag: String,
    path: String,
}

/// Suffix classification of a correlation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagPhase {
    Start,
    End,
    Other,
}

/// Append-only recorder of the events of one query execution.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
    next_id: u64,
    open: HashMap<CorrelationKey, EventId>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its id. Never fails.
    pub fn log(
        &mut self,
        kind: impl Into<String>,
        data: Option<EventData>,
        correlation: Correlation,
    ) -> EventId {
        self.push(kind.into(), None, data, correlation)
    }

    /// Append an event attributed to a resolver.
    pub fn log_resolver(
        &mut self,
        kind: impl Into<String>,
        resolver_name: impl Into<String>,
        data: Option<EventData>,
        correlation: Correlation,
    ) -> EventId {
        self.push(kind.into(), Some(resolver_name.into()), data, correlation)
    }

    /// Log a tagged event emitted by an execution engine that does not
    /// correlate its own start and end notifications.
    ///
    /// Tags like `FIELD_RESOLVE_START` are normalized to `field.resolve.start`.
    /// Starts are indexed by tag and the payload's `path`; the matching end
    /// removes the entry and carries the start id. An end without a match,
    /// or any payload without a `path`, produces an end with no reference.
    pub fn correlate(&mut self, tag: &str, payload: Option<Value>) -> EventId {
        let tag = normalize_tag(tag);
        let (phase, base) = split_phase(&tag);
        let key = payload
            .as_ref()
            .and_then(|p| p.get("path"))
            .map(|path| CorrelationKey {
                tag: base.to_string(),
                path: path.to_string(),
            });
        let data = payload.map(EventData::Json);

        match phase {
            TagPhase::Start => {
                let id = self.push(tag.clone(), None, data, Correlation::Start);
                if let Some(key) = key {
                    if let Some(previous) = self.open.insert(key, id) {
                        tracing::debug!(tag = %tag, previous = %previous, "Correlation key reopened before end");
                    }
                }
                id
            }
            TagPhase::End => {
                let start = key.and_then(|key| self.open.remove(&key));
                if start.is_none() {
                    tracing::debug!(tag = %tag, "End event without matching start");
                }
                self.push(tag, None, data, Correlation::End(start))
            }
            TagPhase::Other => self.push(tag, None, data, Correlation::Tick),
        }
    }

    /// Events in logging order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of `correlate` starts still waiting for their end.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    fn push(
        &mut self,
        kind: String,
        resolver_name: Option<String>,
        data: Option<EventData>,
        correlation: Correlation,
    ) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;

        self.events.push(Event {
            id,
            timestamp: monotonic_ms(),
            kind,
            resolver_name,
            data,
            event_type: correlation.event_type(),
            start_event_id: correlation.start_event_id(),
        });
        metrics::record_event_logged();
        id
    }
}

/// Lowercase the tag and turn `_` separators into `.`.
fn normalize_tag(tag: &str) -> String {
    tag.to_lowercase().replace('_', ".")
}

fn split_phase(tag: &str) -> (TagPhase, &str) {
    if let Some(base) = tag.strip_suffix(".start") {
        (TagPhase::Start, base)
    } else if let Some(base) = tag.strip_suffix(".end") {
        (TagPhase::End, base)
    } else {
        (TagPhase::Other, tag)
    }
}
