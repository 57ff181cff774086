//! HTTP ingress transport.

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Proxy};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use url::{Host, Url};

use crate::observability::metrics;
use crate::report::builder::TRACER_API_VERSION;
use crate::transport::ReportTransport;

/// Errors that can occur while delivering a report.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Client construction or request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ingress answered with a non-success status.
    #[error("Ingress returned status {0}")]
    Status(u16),

    /// No tokio runtime to run the request on.
    #[error("No async runtime available to send report")]
    NoRuntime,
}

/// Sends reports with one PUT per report to the ingress.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    ingress_url: Url,
    user_agent: String,
}

impl HttpTransport {
    /// Create a transport for `ingress_url`, optionally through a forward proxy.
    ///
    /// Without an explicit proxy the system `HTTP(S)_PROXY` settings apply,
    /// except for a loopback ingress, which is always reached directly.
    pub fn new(ingress_url: Url, proxy: Option<&Url>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        builder = match proxy {
            Some(proxy_url) => builder.proxy(Proxy::all(proxy_url.as_str())?),
            None if is_loopback(&ingress_url) => builder.no_proxy(),
            None => builder,
        };

        Ok(Self {
            client: builder.build()?,
            ingress_url,
            user_agent: format!("apollo tracer v{}", TRACER_API_VERSION),
        })
    }

    pub fn ingress_url(&self) -> &Url {
        &self.ingress_url
    }

    /// Deliver one report and wait for the response.
    pub async fn put(&self, body: Vec<u8>) -> Result<(), TransportError> {
        let response = self
            .client
            .put(self.ingress_url.clone())
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(())
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

impl ReportTransport for HttpTransport {
    fn send(&self, body: Vec<u8>) -> Option<JoinHandle<()>> {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(error = %TransportError::NoRuntime, "Dropping trace report");
                metrics::record_report_failed("no_runtime");
                return None;
            }
        };

        let transport = self.clone();
        Some(handle.spawn(async move {
            match transport.put(body).await {
                Ok(()) => {
                    tracing::debug!(ingress = %transport.ingress_url, "Trace report delivered");
                    metrics::record_report_sent();
                }
                Err(TransportError::Status(status)) => {
                    tracing::warn!(ingress = %transport.ingress_url, status, "Ingress rejected trace report");
                    metrics::record_report_failed("status");
                }
                Err(e) => {
                    tracing::error!(ingress = %transport.ingress_url, error = %e, "Error trying to report to tracer backend");
                    metrics::record_report_failed("transport");
                }
            }
        }))
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("ingress_url", &self.ingress_url.as_str())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
