//! GraphQL resolver tracing library.
//!
//! Wraps the resolvers of a schema so every field execution is recorded as a
//! start/end pair, collects the events of one query into a report and ships
//! it to a remote ingress over HTTP.

pub mod config;
pub mod events;
pub mod instrument;
pub mod observability;
pub mod report;
pub mod schema;
pub mod tracer;
pub mod transport;

pub use config::TracerConfig;
pub use instrument::{instrument_resolver, SchemaInstrumenter};
pub use report::{Report, ReportBuilder};
pub use tracer::{QuerySession, Tracer, TracerOptions};
pub use transport::{HttpTransport, ReportTransport};
