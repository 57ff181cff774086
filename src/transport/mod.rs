//! Report transport.
//!
//! # Data Flow
//! ```text
//! serialized report bytes
//!     → ReportTransport::send (returns immediately)
//!     → http.rs spawns one PUT onto the tokio runtime
//!     → outcome logged + counted, never returned to the query path
//! ```
//!
//! # Design Decisions
//! - At-most-once: no retries, no backoff, no queue
//! - Never blocks or fails the caller
//! - Trait seam so hosts can route reports elsewhere

pub mod http;

use tokio::task::JoinHandle;

pub use http::{HttpTransport, TransportError};

/// Destination for serialized reports.
pub trait ReportTransport: Send + Sync {
    /// Start delivering one report body without waiting for it.
    ///
    /// Implementations that spawn work may return its handle so a host that
    /// is about to exit can wait for the attempt; dropping it detaches.
    fn send(&self, body: Vec<u8>) -> Option<JoinHandle<()>>;
}
