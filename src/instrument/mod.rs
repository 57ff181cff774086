//! Instrumentation subsystem.
//!
//! # Data Flow
//! ```text
//! schema setup:
//!     schema.rs walks every field → resolver.rs wraps each resolver
//!     schema.rs installs the operation hook
//!
//! per request:
//!     hook logs the operation (tick)
//!     wrapped resolvers log start/end pairs into the request's QuerySession
//! ```
//!
//! # Design Decisions
//! - Only resolver errors cross the wrapper, and they cross unchanged
//! - Faults of the bookkeeping itself become `tracer.internal_error` events
//! - Instrumentation state lives beside the schema, not on it

pub mod resolver;
pub mod schema;

use std::panic::{self, AssertUnwindSafe};

use crate::tracer::session::panic_message;
use crate::tracer::QuerySession;

pub use resolver::{instrument_resolver, RESOLVER_END_EVENT, RESOLVER_START_EVENT};
pub use schema::{SchemaInstrumenter, QUERY_EVENT};

/// Run tracer bookkeeping, turning a panic into an internal error event.
pub(crate) fn absorb<T>(session: &QuerySession, context: &str, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            session.internal_error(context, &panic_message(payload.as_ref()));
            None
        }
    }
}
