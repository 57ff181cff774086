//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Ingress used when neither the config file nor the environment names one.
pub const DEFAULT_INGRESS_URL: &str = "https://nim-test-ingress.appspot.com";

/// Root configuration for the tracer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracerConfig {
    /// 36-character application key issued by the ingress.
    pub app_key: String,

    /// Send reports at all. When false no network call is ever made.
    pub send_reports: bool,

    /// Ingress endpoint receiving the reports.
    pub ingress_url: String,

    /// Optional forward proxy for report delivery.
    pub proxy: Option<String>,

    /// Observability settings for the tracer itself.
    pub observability: ObservabilityConfig,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            send_reports: true,
            ingress_url: default_ingress_url(|name| std::env::var(name).ok()),
            proxy: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl TracerConfig {
    /// Configuration with the given key and defaults everywhere else.
    pub fn with_app_key(app_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            ..Self::default()
        }
    }

    /// Apply `TRACER_*` environment overrides.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Recognized: `TRACER_APP_KEY`, `TRACER_INGRESS_URL`, `TRACER_PROXY`,
    /// `TRACER_SEND_REPORTS` (`false`/`0`/`no` disable sending).
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("TRACER_APP_KEY") {
            self.app_key = key;
        }
        if let Some(url) = lookup("TRACER_INGRESS_URL") {
            self.ingress_url = url;
        }
        if let Some(proxy) = lookup("TRACER_PROXY") {
            self.proxy = if proxy.is_empty() { None } else { Some(proxy) };
        }
        if let Some(flag) = lookup("TRACER_SEND_REPORTS") {
            self.send_reports = !matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "false" | "0" | "no" | "off"
            );
        }
        self
    }
}

/// `TRACER_INGRESS_URL` if set and non-empty, else the built-in ingress.
fn default_ingress_url(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup("TRACER_INGRESS_URL")
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_INGRESS_URL.to_string())
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prometheus scrape address; metrics stay unexported when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = TracerConfig::default();
        assert!(config.send_reports);
        if std::env::var("TRACER_INGRESS_URL").is_err() {
            assert_eq!(config.ingress_url, DEFAULT_INGRESS_URL);
        }
        assert!(config.proxy.is_none());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_default_ingress_follows_environment() {
        let from_env = default_ingress_url(|name| {
            (name == "TRACER_INGRESS_URL").then(|| "http://127.0.0.1:9/ingress".to_string())
        });
        assert_eq!(from_env, "http://127.0.0.1:9/ingress");
        assert_eq!(default_ingress_url(|_| None), DEFAULT_INGRESS_URL);
        assert_eq!(default_ingress_url(|_| Some(String::new())), DEFAULT_INGRESS_URL);
    }

    #[test]
    fn test_minimal_toml() {
        let config: TracerConfig =
            toml::from_str(r#"app_key = "0123456789abcdef0123456789abcdef0123""#).unwrap();
        assert_eq!(config.app_key.len(), 36);
        assert!(config.send_reports);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TRACER_INGRESS_URL", "http://localhost:9999"),
            ("TRACER_SEND_REPORTS", "false"),
            ("TRACER_PROXY", "http://proxy:3128"),
        ]
        .into_iter()
        .collect();
        let config = TracerConfig::with_app_key("k")
            .apply_env_from(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.app_key, "k");
        assert_eq!(config.ingress_url, "http://localhost:9999");
        assert!(!config.send_reports);
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:3128"));
    }
}
