//! Reqwest-based HTTP client bound to one backend origin.

use std::sync::Arc;

use docqa_core::Gateway;
use reqwest::Client;
use reqwest::redirect::Policy;
use url::Url;

use super::ReqwestConfig;
use crate::error::{Error, Result};

/// Tracing target for reqwest client operations.
pub const TRACING_TARGET: &str = "docqa_reqwest::client";

/// Inner client that holds the HTTP client, configuration and origin.
struct ReqwestClientInner {
    http: Client,
    config: ReqwestConfig,
    base_url: Url,
}

/// Reqwest-based transport for the docqa backend.
///
/// The origin is resolved once at construction and never changes. Cloning is
/// cheap and shares the underlying connection pool.
///
/// # Examples
///
/// ```rust,ignore
/// use docqa_reqwest::{ReqwestClient, ReqwestConfig};
///
/// let client = ReqwestClient::new(ReqwestConfig::new("127.0.0.1", 8000))?;
/// let gateway = client.into_gateway();
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the backend origin is invalid or the
    /// HTTP client cannot be created.
    pub fn new(config: ReqwestConfig) -> docqa_core::Result<Self> {
        Self::build(config).map_err(Into::into)
    }

    fn build(config: ReqwestConfig) -> Result<Self> {
        let base_url = config.target().base_url()?;
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %base_url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .redirect(Policy::none())
            .build()?;

        let inner = ReqwestClientInner {
            http,
            config,
            base_url,
        };

        tracing::info!(
            target: TRACING_TARGET,
            base_url = %inner.base_url,
            "Reqwest client created successfully"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Gets the backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolves a relative backend path against the origin.
    pub(crate) fn url_for(&self, path: &str) -> Result<Url> {
        let url = self.inner.base_url.join(path.trim_start_matches('/'))?;
        if url.origin() != self.inner.base_url.origin() {
            return Err(Error::Config(format!(
                "Path '{path}' escapes the backend origin"
            )));
        }
        Ok(url)
    }

    /// Converts this client into a [`Gateway`].
    pub fn into_gateway(self) -> Gateway {
        Gateway::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ReqwestClient::new(ReqwestConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/");
        assert!(client.config().user_agent.is_none());
    }

    #[test]
    fn test_invalid_origin_is_configuration_error() {
        let error = ReqwestClient::new(ReqwestConfig::default().with_scheme("file")).unwrap_err();
        assert_eq!(error.kind, docqa_core::ErrorKind::Configuration);
    }

    #[test]
    fn test_url_for() {
        let client = ReqwestClient::new(ReqwestConfig::new("localhost", 5000)).unwrap();
        assert_eq!(
            client.url_for("insert_model").unwrap().as_str(),
            "http://localhost:5000/insert_model"
        );
        assert_eq!(
            client.url_for("/insert_model").unwrap().as_str(),
            "http://localhost:5000/insert_model"
        );
        assert!(client.url_for("http://elsewhere.example/steal").is_err());
    }
}
