#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod endpoint;
mod envelope;
mod error;
mod gateway;
mod request;

pub use crate::endpoint::Endpoint;
pub use crate::envelope::{Envelope, STATUS_OK};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::gateway::Gateway;
pub use crate::request::{
    Document, EncodedRequest, Encoding, FILE_FIELD, Method, NAMED_PARAM_KEY, Payload, QUERY_KEY,
    RequestBody,
};

/// Tracing target for gateway operations.
pub const TRACING_TARGET: &str = "docqa_core::gateway";

/// Transport seam between the gateway and the network.
///
/// Implementations perform exactly one round trip per call and report any
/// failure to obtain a response as an [`ErrorKind::Transport`] error. Non-200
/// responses are returned as envelopes; the [`Gateway`] classifies them.
#[async_trait::async_trait]
pub trait BackendProvider: Send + Sync {
    /// Sends the encoded request and returns the raw response envelope.
    async fn send(&self, request: EncodedRequest) -> Result<Envelope>;
}
