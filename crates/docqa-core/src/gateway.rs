//! Backend gateway with observability.

use std::fmt;
use std::sync::Arc;

use jiff::Timestamp;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    BackendProvider, EncodedRequest, Endpoint, Envelope, Error, Payload, Result, TRACING_TARGET,
};

/// Backend gateway wrapping a [`BackendProvider`].
///
/// Every call yields either a successful (`200`) [`Envelope`] or an error:
/// transport failures, non-200 responses and undecodable bodies all surface
/// as "request failed" errors, never as normal results. There are no retries.
///
/// The provider is wrapped in `Arc` for cheap cloning.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<dyn BackendProvider>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a new gateway from a provider.
    pub fn new<P>(provider: P) -> Self
    where
        P: BackendProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Issues a GET for `path`.
    pub async fn get(&self, path: impl AsRef<str>) -> Result<Envelope> {
        self.execute(EncodedRequest::get(path)).await
    }

    /// Issues a GET for `path` and decodes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: impl AsRef<str>) -> Result<T> {
        let path = path.as_ref();
        let envelope = self.get(path).await?;
        envelope
            .json()
            .map_err(|e| e.with_context(format!("GET {path}")))
    }

    /// Issues a POST for `path` carrying `payload`.
    pub async fn post(&self, path: impl AsRef<str>, payload: Payload) -> Result<Envelope> {
        self.execute(EncodedRequest::post(path, payload)).await
    }

    /// Sends an already encoded request.
    ///
    /// A request to a known [`Endpoint`] with a method the backend does not
    /// accept on that path is rejected before it is sent.
    pub async fn execute(&self, request: EncodedRequest) -> Result<Envelope> {
        if let Ok(endpoint) = request.path.parse::<Endpoint>()
            && endpoint.method() != request.method
        {
            return Err(Error::validation()
                .with_message(format!(
                    "{endpoint} expects {}, not {}",
                    endpoint.method(),
                    request.method
                ))
                .with_context(format!("{} {}", request.method, request.path)));
        }

        let request_id = Uuid::now_v7();
        let started_at = Timestamp::now();
        let method = request.method;
        let path = request.path.clone();

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request_id,
            method = %method,
            path = %path,
            encoding = ?request.encoding(),
            "Sending backend request"
        );

        let result = self.inner.send(request).await;
        let elapsed = Timestamp::now().duration_since(started_at);

        match result {
            Ok(envelope) if !envelope.is_error() => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    request_id = %request_id,
                    path = %path,
                    status = envelope.status(),
                    body_len = envelope.body().len(),
                    elapsed_ms = elapsed.as_millis(),
                    "Backend request succeeded"
                );
                Ok(envelope)
            }
            Ok(envelope) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    request_id = %request_id,
                    path = %path,
                    status = envelope.status(),
                    reason = envelope.reason(),
                    elapsed_ms = elapsed.as_millis(),
                    "Backend request failed"
                );
                envelope
                    .into_result()
                    .map_err(|e| e.with_context(format!("{method} {path}")))
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    request_id = %request_id,
                    path = %path,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Backend request error"
                );
                Err(error.with_context(format!("{method} {path}")))
            }
        }
    }
}
