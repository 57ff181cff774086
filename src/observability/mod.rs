//! Observability for the tracer itself.
//!
//! # Data Flow
//! ```text
//! events / report / transport / instrument produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via `metrics`)
//!
//! Consumers:
//!     → stdout subscriber installed by the binary
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Library code only emits; installing subscribers/recorders is the host's call
//! - Report delivery failures surface here and nowhere else

pub mod logging;
pub mod metrics;
