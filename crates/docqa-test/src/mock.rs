//! Scripted backend provider for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use docqa_core::{BackendProvider, EncodedRequest, Envelope, Error, Gateway, Result};
use serde_json::Value;

/// A scripted reply.
#[derive(Debug, Clone)]
enum Reply {
    Envelope(Envelope),
    Transport(String),
}

impl Reply {
    fn into_result(self) -> Result<Envelope> {
        match self {
            Self::Envelope(envelope) => Ok(envelope),
            Self::Transport(message) => Err(Error::transport().with_message(message)),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    /// One-shot replies, consumed in order before the sticky reply.
    queued: HashMap<String, VecDeque<Reply>>,
    /// Reply returned whenever the queue for a path is empty.
    sticky: HashMap<String, Reply>,
}

#[derive(Debug, Default)]
struct MockBackendInner {
    script: Mutex<Script>,
    requests: Mutex<Vec<EncodedRequest>>,
}

/// Mock backend provider.
///
/// Clones share the same script and request log, so a test can keep one
/// handle while the code under test owns the [`Gateway`].
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    inner: Arc<MockBackendInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockBackend {
    /// Creates a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a gateway backed by this mock.
    pub fn gateway(&self) -> Gateway {
        Gateway::new(self.clone())
    }

    /// Always answers `path` with `envelope`.
    #[must_use]
    pub fn with_response(self, path: impl Into<String>, envelope: Envelope) -> Self {
        self.respond(path, envelope);
        self
    }

    /// Always answers `path` with `200 OK` and the JSON `value`.
    #[must_use]
    pub fn with_json(self, path: impl Into<String>, value: Value) -> Self {
        self.respond(path, Envelope::ok_json(&value));
        self
    }

    /// Always answers `path` with `envelope`, replacing any sticky reply.
    pub fn respond(&self, path: impl Into<String>, envelope: Envelope) {
        lock(&self.inner.script)
            .sticky
            .insert(path.into(), Reply::Envelope(envelope));
    }

    /// Always answers `path` with `200 OK` and the JSON `value`.
    pub fn respond_json(&self, path: impl Into<String>, value: Value) {
        self.respond(path, Envelope::ok_json(&value));
    }

    /// Answers the next call to `path` with `envelope`.
    pub fn enqueue(&self, path: impl Into<String>, envelope: Envelope) {
        lock(&self.inner.script)
            .queued
            .entry(path.into())
            .or_default()
            .push_back(Reply::Envelope(envelope));
    }

    /// Fails every call to `path` with a transport error.
    pub fn fail_transport(&self, path: impl Into<String>) {
        lock(&self.inner.script)
            .sticky
            .insert(path.into(), Reply::Transport("Connection refused".to_owned()));
    }

    /// Returns every request received so far, in order.
    pub fn requests(&self) -> Vec<EncodedRequest> {
        lock(&self.inner.requests).clone()
    }

    /// Returns the requests received for `path`, in order.
    pub fn requests_to(&self, path: impl AsRef<str>) -> Vec<EncodedRequest> {
        let path = path.as_ref();
        lock(&self.inner.requests)
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        lock(&self.inner.requests).len()
    }

    fn reply_for(&self, path: &str) -> Reply {
        let mut script = lock(&self.inner.script);

        if let Some(reply) = script.queued.get_mut(path).and_then(VecDeque::pop_front) {
            return reply;
        }

        script
            .sticky
            .get(path)
            .cloned()
            .unwrap_or_else(|| Reply::Envelope(Envelope::new(404, "Not Found", "")))
    }
}

#[async_trait::async_trait]
impl BackendProvider for MockBackend {
    async fn send(&self, request: EncodedRequest) -> Result<Envelope> {
        let reply = self.reply_for(&request.path);
        lock(&self.inner.requests).push(request);
        reply.into_result()
    }
}

#[cfg(test)]
mod tests {
    use docqa_core::{ErrorKind, Payload};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_unscripted_path_is_not_found() {
        let mock = MockBackend::new();
        let error = mock.gateway().get("anything").await.unwrap_err();
        assert_eq!(error.status(), Some(404));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_queued_replies_precede_sticky() {
        let mock = MockBackend::new().with_json("get_llm_models", json!(["a"]));
        mock.enqueue("get_llm_models", Envelope::new(500, "Internal Server Error", ""));

        let gateway = mock.gateway();
        assert!(gateway.get("get_llm_models").await.is_err());

        let models: Vec<String> = gateway.get_json("get_llm_models").await.unwrap();
        assert_eq!(models, ["a"]);
    }

    #[tokio::test]
    async fn test_records_requests() {
        let mock = MockBackend::new().with_json("query_pipeline", json!("answer"));
        mock.gateway()
            .post("query_pipeline", Payload::query("why?"))
            .await
            .unwrap();

        let sent = mock.requests_to("query_pipeline");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].query_param("query"), Some("why?"));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let mock = MockBackend::new();
        mock.fail_transport("get_llm_models");
        let error = mock.gateway().get("get_llm_models").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Transport);
    }
}
