//! Reqwest client configuration.

use std::net::Ipv6Addr;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::error::{Error, Result};

/// Default timeout for backend requests: 120 seconds.
///
/// Building pipelines and indexing documents are slow on the backend side.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the reqwest transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Backend URL scheme ("http" or "https")
    #[cfg_attr(
        feature = "config",
        arg(long = "backend-scheme", env = "BACKEND_SCHEME", default_value = "http")
    )]
    #[serde(default = "default_scheme")]
    pub backend_scheme: String,

    /// Backend host name or address
    #[cfg_attr(
        feature = "config",
        arg(long = "backend-host", env = "BACKEND_HOST", default_value = "127.0.0.1")
    )]
    #[serde(default = "default_host")]
    pub backend_host: String,

    /// Backend port
    #[cfg_attr(
        feature = "config",
        arg(long = "backend-port", env = "BACKEND_PORT", default_value = "8000")
    )]
    #[serde(default = "default_port")]
    pub backend_port: u16,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value = "120")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            backend_scheme: default_scheme(),
            backend_host: default_host(),
            backend_port: default_port(),
            http_timeout: default_timeout_secs(),
            user_agent: None,
        }
    }
}

impl ReqwestConfig {
    /// Create a new configuration for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            backend_host: host.into(),
            backend_port: port,
            ..Self::default()
        }
    }

    /// Returns the backend origin described by this configuration.
    pub fn target(&self) -> EndpointTarget {
        EndpointTarget {
            scheme: self.backend_scheme.clone(),
            host: self.backend_host.clone(),
            port: self.backend_port,
        }
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    fn default_user_agent() -> String {
        format!("docqa/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Set the scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.backend_scheme = scheme.into();
        self
    }

    /// Set the host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.backend_host = host.into();
        self
    }

    /// Set the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.backend_port = port;
        self
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Backend origin: scheme, host and port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointTarget {
    /// URL scheme, "http" or "https".
    pub scheme: String,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl EndpointTarget {
    /// Validates the target and returns its base URL, ending in a slash.
    pub fn base_url(&self) -> Result<Url> {
        if !matches!(self.scheme.as_str(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported backend scheme '{}', expected http or https",
                self.scheme
            )));
        }

        let host = self.parse_host()?;
        let mut url = Url::parse(&format!("{}://placeholder/", self.scheme))?;
        url.set_host(Some(&host.to_string()))?;
        url.set_port(Some(self.port)).map_err(|()| {
            Error::Config(format!("Backend port {} cannot be set on {url}", self.port))
        })?;

        Ok(url)
    }

    /// Parses the host on its own, so it can never spill into the port or path.
    fn parse_host(&self) -> Result<Host> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(Error::Config("Backend host must not be empty".to_string()));
        }

        if let Ok(addr) = host.parse::<Ipv6Addr>() {
            return Ok(Host::Ipv6(addr));
        }

        if host.contains(['/', '@', '#', '?', ':', '[', ']']) {
            return Err(Error::Config(format!(
                "Backend host '{host}' must be a bare host name or address"
            )));
        }

        Host::parse(host).map_err(|e| Error::Config(format!("Invalid backend host '{host}': {e}")))
    }
}
