//! HTTP executor: one request per command against a driver server.
//!
//! Stateless between commands; a single [`HttpExecutor`] can serve any
//! number of independent sessions concurrently. Commands on one session are
//! serialized by the session itself.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{TransportRequest, TransportResponse, Verb};

use super::Executor;

// ============================================================================
// Constants
// ============================================================================

/// Default connect timeout for the underlying client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// HttpExecutor
// ============================================================================

/// Talks to a WebDriver server over JSON-over-HTTP.
///
/// # Example
///
/// ```no_run
/// use remote_webdriver::HttpExecutor;
///
/// # fn main() -> remote_webdriver::Result<()> {
/// let executor = HttpExecutor::builder()
///     .base_url("http://localhost:4444/wd/hub")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    /// Server base, without a trailing slash. Request paths append to it.
    base: String,
}

impl HttpExecutor {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> HttpExecutorBuilder {
        HttpExecutorBuilder::new()
    }

    /// Creates an executor for the given server base URL with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::builder().base_url(base_url).build()
    }

    /// Returns the server base URL.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let url = format!("{}{}", self.base, request.url);
        trace!(command = %request.command, verb = %request.verb, url = %url, "Dispatching");

        let mut builder = match request.verb {
            Verb::Get => self.client.get(&url),
            Verb::Post => self.client.post(&url),
            Verb::Delete => self.client.delete(&url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(format!("{}: {e}", request.command)))?;

        let http_status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("{}: reading body: {e}", request.command)))?;

        debug!(command = %request.command, http_status, "Response received");

        if body.is_empty() {
            Ok(TransportResponse::empty(http_status))
        } else {
            Ok(TransportResponse::new(http_status, body))
        }
    }
}

// ============================================================================
// HttpExecutorBuilder
// ============================================================================

/// Builder for [`HttpExecutor`].
#[derive(Debug, Default)]
pub struct HttpExecutorBuilder {
    base_url: Option<String>,
    connect_timeout: Option<Duration>,
}

impl HttpExecutorBuilder {
    /// Creates a builder with defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server base URL (e.g. `http://localhost:4444/wd/hub`).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the connect timeout. Defaults to 10s.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the executor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the base URL is missing, not parseable,
    /// or not http(s).
    pub fn build(self) -> Result<HttpExecutor> {
        let raw = self
            .base_url
            .ok_or_else(|| Error::config("base_url is required"))?;

        let parsed =
            Url::parse(&raw).map_err(|e| Error::config(format!("invalid base_url {raw:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base_url must be http or https, got {:?}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .connect_timeout(self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .build()
            .map_err(|e| Error::config(format!("http client: {e}")))?;

        Ok(HttpExecutor {
            client,
            base: raw.trim_end_matches('/').to_string(),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
