//! Process-scoped tracer.
//!
//! # Data Flow
//! ```text
//! TracerOptions (config + filter/map fns + optional transport)
//!     → Tracer::new (validate once, build transport)
//!     → Tracer::instrument_schema (at schema setup)
//!     → Tracer::new_session (once per query)
//!         → QuerySession: log / correlate / report / submit
//! ```
//!
//! # Design Decisions
//! - Configuration is validated at construction and never mutated
//! - Sessions share the tracer's settings through `Arc`, never each other's state

pub mod session;

use std::sync::Arc;

use crate::config::validation::{parse_http_url, validate_config, ValidationError};
use crate::config::{ConfigError, TracerConfig};
use crate::events::Event;
use crate::instrument::SchemaInstrumenter;
use crate::schema::SchemaFields;
use crate::transport::{HttpTransport, ReportTransport};

pub use session::{QuerySession, INTERNAL_ERROR_EVENT};

/// Predicate deciding which events are reported.
pub type ReportFilterFn = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Transformation applied to every reported event, after filtering.
pub type ReportMapFn = Arc<dyn Fn(Event) -> Event + Send + Sync>;

/// Everything a tracer is built from.
#[derive(Clone)]
pub struct TracerOptions {
    config: TracerConfig,
    report_filter: Option<ReportFilterFn>,
    report_map: Option<ReportMapFn>,
    transport: Option<Arc<dyn ReportTransport>>,
}

impl TracerOptions {
    pub fn new(app_key: impl Into<String>) -> Self {
        Self::from_config(TracerConfig::with_app_key(app_key))
    }

    pub fn from_config(config: TracerConfig) -> Self {
        Self {
            config,
            report_filter: None,
            report_map: None,
            transport: None,
        }
    }

    pub fn send_reports(mut self, enabled: bool) -> Self {
        self.config.send_reports = enabled;
        self
    }

    pub fn ingress_url(mut self, url: impl Into<String>) -> Self {
        self.config.ingress_url = url.into();
        self
    }

    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy = Some(url.into());
        self
    }

    pub fn report_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.report_filter = Some(Arc::new(filter));
        self
    }

    pub fn report_map<F>(mut self, map: F) -> Self
    where
        F: Fn(Event) -> Event + Send + Sync + 'static,
    {
        self.report_map = Some(Arc::new(map));
        self
    }

    /// Deliver reports through `transport` instead of HTTP.
    pub fn transport(mut self, transport: Arc<dyn ReportTransport>) -> Self {
        self.transport = Some(transport);
        self
    }
}

pub(crate) struct TracerInner {
    pub(crate) config: TracerConfig,
    pub(crate) report_filter: Option<ReportFilterFn>,
    pub(crate) report_map: Option<ReportMapFn>,
    pub(crate) transport: Arc<dyn ReportTransport>,
    instrumenter: SchemaInstrumenter,
}

/// Factory of per-query sessions. Cheap to clone.
#[derive(Clone)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

impl Tracer {
    /// Validate the options and build the tracer.
    ///
    /// Fails on a malformed app key or endpoint before any query can run.
    pub fn new(options: TracerOptions) -> Result<Self, ConfigError> {
        let TracerOptions {
            config,
            report_filter,
            report_map,
            transport,
        } = options;

        validate_config(&config).map_err(ConfigError::Validation)?;

        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(http_transport(&config)?),
        };

        tracing::info!(
            ingress_url = %config.ingress_url,
            send_reports = config.send_reports,
            proxy = config.proxy.as_deref().unwrap_or("none"),
            "Tracer initialized"
        );

        Ok(Self {
            inner: Arc::new(TracerInner {
                config,
                report_filter,
                report_map,
                transport,
                instrumenter: SchemaInstrumenter::new(),
            }),
        })
    }

    /// Build a tracer from configuration alone.
    pub fn from_config(config: TracerConfig) -> Result<Self, ConfigError> {
        Self::new(TracerOptions::from_config(config))
    }

    /// Start tracing one query.
    pub fn new_session(&self) -> QuerySession {
        QuerySession::new(self.inner.clone())
    }

    /// Wrap every resolver of `schema` and install the operation hook.
    ///
    /// Returns false when this schema instance was already instrumented.
    pub fn instrument_schema<S: SchemaFields + ?Sized>(&self, schema: &mut S) -> bool {
        self.inner.instrumenter.instrument(schema)
    }

    pub fn config(&self) -> &TracerConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("ingress_url", &self.inner.config.ingress_url)
            .field("send_reports", &self.inner.config.send_reports)
            .field("has_filter", &self.inner.report_filter.is_some())
            .field("has_map", &self.inner.report_map.is_some())
            .finish()
    }
}

fn http_transport(config: &TracerConfig) -> Result<HttpTransport, ConfigError> {
    let ingress = parse_http_url(&config.ingress_url).map_err(|reason| {
        ConfigError::Validation(vec![ValidationError::IngressUrl {
            url: config.ingress_url.clone(),
            reason,
        }])
    })?;
    let proxy = match &config.proxy {
        Some(raw) => Some(parse_http_url(raw).map_err(|reason| {
            ConfigError::Validation(vec![ValidationError::ProxyUrl {
                url: raw.clone(),
                reason,
            }])
        })?),
        None => None,
    };
    Ok(HttpTransport::new(ingress, proxy.as_ref())?)
}
