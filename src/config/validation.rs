//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - App key shape, endpoint and proxy URLs, metrics address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TracerConfig → Result<(), Vec<ValidationError>>
//! - Runs before a tracer can be constructed

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::TracerConfig;

/// Required length of an application key.
pub const APP_KEY_LEN: usize = 36;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("app_key must be {expected} characters, got {actual}")]
    AppKeyLength { expected: usize, actual: usize },

    #[error("invalid ingress_url '{url}': {reason}")]
    IngressUrl { url: String, reason: String },

    #[error("invalid proxy '{url}': {reason}")]
    ProxyUrl { url: String, reason: String },

    #[error("invalid metrics_address '{address}'")]
    MetricsAddress { address: String },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &TracerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let key_len = config.app_key.chars().count();
    if key_len != APP_KEY_LEN {
        errors.push(ValidationError::AppKeyLength {
            expected: APP_KEY_LEN,
            actual: key_len,
        });
    }

    if let Err(reason) = parse_http_url(&config.ingress_url) {
        errors.push(ValidationError::IngressUrl {
            url: config.ingress_url.clone(),
            reason,
        });
    }

    if let Some(proxy) = &config.proxy {
        if let Err(reason) = parse_http_url(proxy) {
            errors.push(ValidationError::ProxyUrl {
                url: proxy.clone(),
                reason,
            });
        }
    }

    if let Some(address) = &config.observability.metrics_address {
        if address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress {
                address: address.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse a URL and require an http(s) scheme.
pub(crate) fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}
