//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → TRACER_* environment overrides
//!     → validation.rs (semantic checks)
//!     → TracerConfig (validated, immutable)
//!     → owned by the Tracer, shared via Arc with every query session
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a tracer is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ObservabilityConfig, TracerConfig, DEFAULT_INGRESS_URL};
pub use validation::{validate_config, ValidationError};
