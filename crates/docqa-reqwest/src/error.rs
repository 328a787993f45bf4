//! Internal error types for docqa-reqwest.

use thiserror::Error;

/// Result type alias for docqa-reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error type for docqa-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Backend URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    /// Configuration rejected.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<Error> for docqa_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_builder() {
                    docqa_core::Error::configuration()
                        .with_message(e.to_string())
                        .with_source(e)
                } else if e.is_timeout() {
                    docqa_core::Error::transport()
                        .with_message("Request timed out")
                        .with_source(e)
                } else if e.is_connect() {
                    docqa_core::Error::transport()
                        .with_message("Connection failed")
                        .with_source(e)
                } else {
                    docqa_core::Error::transport()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Url(e) => docqa_core::Error::configuration()
                .with_message(e.to_string())
                .with_source(e),
            Error::Config(message) => docqa_core::Error::configuration().with_message(message),
        }
    }
}
