//! Report pipeline.
//!
//! # Data Flow
//! ```text
//! EventLog (per query)
//!     → builder.rs build()          immutable Report snapshot
//!     → builder.rs filter_and_map() optional host filter, then map
//!     → builder.rs serialize()      JSON bytes or SerializationError
//!     → transport
//!
//! Diagnostics / collector side:
//!     Report → builder.rs group() → Intervals + orphaned end count
//! ```
//!
//! # Design Decisions
//! - Building never mutates the log
//! - Filter always runs before map
//! - Serialization failures are values, never panics

pub mod builder;
pub mod types;

pub use builder::{filter_and_map, group, serialize, ReportBuilder, SerializationError};
pub use types::{Grouped, Interval, Report};
