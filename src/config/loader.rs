//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::TracerConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::transport::TransportError;

/// Error type for configuration loading and tracer construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Transport setup failed: {0}")]
    Transport(#[from] TransportError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, apply `TRACER_*` environment overrides and validate.
pub fn load_config(path: &Path) -> Result<TracerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: TracerConfig = toml::from_str(&content)?;
    let config = config.apply_env();

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
