//! Structured error handling for backend gateway operations.

use hipstr::HipStr;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while driving the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// No response was received (connection refused, timeout, DNS).
    Transport,
    /// A response was received but its status was not 200.
    Http,
    /// The response body did not match the requested shape.
    Decode,
    /// An operation was attempted before its prerequisites were met.
    Precondition,
    /// Caller-supplied input was rejected before any network call.
    Validation,
    /// The client itself is misconfigured (bad origin, bad scheme).
    Configuration,
    /// Unknown error occurred.
    #[default]
    Unknown,
}

impl ErrorKind {
    /// Returns `true` for the kinds reported to callers as "request failed".
    #[must_use]
    pub const fn is_request_failure(&self) -> bool {
        matches!(self, Self::Transport | Self::Http | Self::Decode)
    }

    /// Returns `true` for errors raised locally, before any round trip.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Precondition | Self::Validation | Self::Configuration
        )
    }
}

/// Structured error type with classification and context tracking.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<HipStr<'static>>,
    /// HTTP status code, for [`ErrorKind::Http`] errors.
    pub status: Option<u16>,
    /// HTTP reason phrase, for [`ErrorKind::Http`] errors.
    pub reason: Option<HipStr<'static>>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
    /// Additional context information.
    pub context: Option<HipStr<'static>>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            status: None,
            reason: None,
            source: None,
            context: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self::new(kind).with_source(source)
    }

    /// Creates a transport error.
    pub fn transport() -> Self {
        Self::new(ErrorKind::Transport)
    }

    /// Creates an HTTP error carrying the status code and reason phrase.
    pub fn http(status: u16, reason: impl Into<HipStr<'static>>) -> Self {
        let reason = reason.into();
        let message = format!("request failed with status {status} {reason}");

        Self {
            status: Some(status),
            reason: Some(reason),
            ..Self::new(ErrorKind::Http)
        }
        .with_message(message.trim_end().to_owned())
    }

    /// Creates a decode error.
    pub fn decode() -> Self {
        Self::new(ErrorKind::Decode)
    }

    /// Creates a precondition error.
    pub fn precondition() -> Self {
        Self::new(ErrorKind::Precondition)
    }

    /// Creates a validation error.
    pub fn validation() -> Self {
        Self::new(ErrorKind::Validation)
    }

    /// Creates a configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<HipStr<'static>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: impl Into<HipStr<'static>>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Returns the HTTP status code, if this error came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the HTTP reason phrase, if this error came from a response.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns `true` if this is one of the "request failed" kinds.
    #[must_use]
    pub const fn is_request_failure(&self) -> bool {
        self.kind.is_request_failure()
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::from_source(ErrorKind::Decode, error).with_message("Invalid JSON body")
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::from_source(ErrorKind::Decode, error).with_message("Invalid UTF-8 encoding")
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(error: std::str::Utf8Error) -> Self {
        Self::from_source(ErrorKind::Decode, error).with_message("Invalid UTF-8 encoding")
    }
}
