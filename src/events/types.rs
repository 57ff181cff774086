//! Event types shared by the event log, the report pipeline and the wire.

use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Identifier of an event, unique within one event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl From<u64> for EventId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of an event when events are grouped into intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Single point in time.
    Tick,
    /// Opens an interval.
    Start,
    /// Closes the interval named by `start_event_id`.
    End,
}

/// How a newly logged event relates to other events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    Tick,
    Start,
    /// End of the interval opened by the given start, if it is known.
    End(Option<EventId>),
}

impl Correlation {
    pub fn event_type(&self) -> EventType {
        match self {
            Correlation::Tick => EventType::Tick,
            Correlation::Start => EventType::Start,
            Correlation::End(_) => EventType::End,
        }
    }

    pub fn start_event_id(&self) -> Option<EventId> {
        match self {
            Correlation::End(id) => *id,
            _ => None,
        }
    }
}

/// Payload attached to an event.
///
/// Conversion to JSON happens when the event is logged. A payload that cannot
/// be converted is kept as a marker so logging never fails; the failure only
/// surfaces when the report is serialized.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    Json(Value),
    Unserializable(String),
}

impl EventData {
    /// Convert any serializable payload.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => EventData::Json(value),
            Err(e) => EventData::Unserializable(e.to_string()),
        }
    }

    /// The JSON value, if the payload converted cleanly.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            EventData::Json(value) => Some(value),
            EventData::Unserializable(_) => None,
        }
    }

    /// Look up a top-level field of an object payload.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_json().and_then(|v| v.get(key))
    }
}

impl From<Value> for EventData {
    fn from(value: Value) -> Self {
        EventData::Json(value)
    }
}

impl Serialize for EventData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EventData::Json(value) => value.serialize(serializer),
            EventData::Unserializable(reason) => Err(S::Error::custom(format!(
                "event payload is not serializable: {}",
                reason
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for EventData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(EventData::Json)
    }
}

/// A single timestamped trace event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    /// Monotonic milliseconds, see [`crate::events::clock::monotonic_ms`].
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolver_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_event_id: Option<EventId>,
}
