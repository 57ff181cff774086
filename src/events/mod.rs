//! Event recording subsystem.
//!
//! # Data Flow
//! ```text
//! resolver wrapper / root hook / application code
//!     → log.rs (assign id, stamp monotonic time, correlate start/end)
//!     → types.rs (Event, EventData, wire shape)
//!     → handed to the report pipeline at submit time
//! ```
//!
//! # Design Decisions
//! - One log per query execution; never shared across queries
//! - Logging never fails; unserializable payloads are caught at report time
//! - End events reference their start by id (`startEventId`)

pub mod clock;
pub mod log;
pub mod types;

pub use log::EventLog;
pub use types::{Correlation, Event, EventData, EventId, EventType};
