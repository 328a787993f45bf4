//! Pipeline orchestration.
//!
//! ```text
//! Empty --build_index--> IndexReady --build_query--> QueryReady
//!                                                         |
//!                               DocumentLoaded <--upload--+
//!                                 |      ^
//!                                 +------+ upload / ask
//! ```

mod prompt;
mod state;

use docqa_core::{Document, Endpoint, Error, Gateway, NAMED_PARAM_KEY, Payload, Result};
use jiff::Timestamp;
use serde_json::json;

pub use self::prompt::{
    DEFAULT_PROMPT_TEMPLATE, MARKDOWN_SUFFIX, normalize_answer, with_markdown_suffix,
};
pub use self::state::{PipelineStage, PipelineState};
use crate::{Ack, TRACING_TARGET_PIPELINE};

/// Drives the backend through pipeline construction, document ingestion and
/// querying.
///
/// Every operation checks its prerequisites before sending anything, so a
/// rejected call costs no round trip. State changes only after the backend
/// acknowledged the call.
#[derive(Debug)]
pub struct PipelineOrchestrator {
    gateway: Gateway,
    state: PipelineState,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator in the [`PipelineStage::Empty`] stage.
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            state: PipelineState::default(),
        }
    }

    /// Returns the current stage.
    pub fn current_stage(&self) -> PipelineStage {
        self.state.stage()
    }

    /// Returns the full pipeline state.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Returns the uploaded file names, in upload order.
    pub fn documents_uploaded(&self) -> &[String] {
        &self.state.documents_uploaded
    }

    /// Returns the normalized text of the last answer.
    pub fn last_response_text(&self) -> Option<&str> {
        self.state.last_response_text.as_deref()
    }

    /// Lists the models the backend offers for embeddings.
    pub async fn list_embedding_models(&self) -> Result<Vec<String>> {
        self.gateway.get_json(Endpoint::GetEmbeddingModels).await
    }

    /// Lists the models the backend offers as the LLM.
    pub async fn list_llm_models(&self) -> Result<Vec<String>> {
        self.gateway.get_json(Endpoint::GetLlmModels).await
    }

    /// Builds the index pipeline for `embedding_model`.
    ///
    /// Allowed from any stage. A rebuild discards the query pipeline and the
    /// uploaded documents. On failure the state returns to
    /// [`PipelineStage::Empty`].
    pub async fn build_index(&mut self, embedding_model: &str) -> Result<Ack> {
        require_name("embedding model", embedding_model)?;
        let from = self.current_stage();

        let payload = Payload::named(NAMED_PARAM_KEY, embedding_model);
        if let Err(error) = self
            .gateway
            .post(Endpoint::BuildIndexPipeline, payload)
            .await
        {
            self.state = PipelineState::default();
            tracing::warn!(
                target: TRACING_TARGET_PIPELINE,
                from = %from,
                error = %error,
                "Index pipeline build failed, pipeline reset"
            );
            return Err(error);
        }

        self.state = PipelineState {
            index_built: true,
            embedding_model: Some(embedding_model.to_owned()),
            ..PipelineState::default()
        };
        self.log_transition(from, "build_index");

        Ok(Ack::new(Endpoint::BuildIndexPipeline))
    }

    /// Builds the query pipeline.
    ///
    /// The edited template is sent with [`MARKDOWN_SUFFIX`] appended. Requires
    /// the index pipeline. On failure the query pipeline is marked unbuilt.
    pub async fn build_query(
        &mut self,
        llm_model: &str,
        embedding_model: &str,
        prompt_template: &str,
    ) -> Result<Ack> {
        let from = self.current_stage();
        if !self.state.index_built {
            return Err(precondition("Build the index pipeline first", "build_query"));
        }
        require_name("LLM model", llm_model)?;
        require_name("embedding model", embedding_model)?;

        if self.state.embedding_model.as_deref() != Some(embedding_model) {
            tracing::warn!(
                target: TRACING_TARGET_PIPELINE,
                index_embedding_model = ?self.state.embedding_model,
                query_embedding_model = embedding_model,
                "Query pipeline uses a different embedding model than the index pipeline"
            );
        }

        let payload = Payload::Json(json!({
            "llm_model_name": llm_model,
            "embedding_model_name": embedding_model,
            "prompt_template": with_markdown_suffix(prompt_template),
        }));
        if let Err(error) = self
            .gateway
            .post(Endpoint::BuildQueryPipeline, payload)
            .await
        {
            self.state.query_built = false;
            self.state.llm_model = None;
            return Err(error);
        }

        self.state.query_built = true;
        self.state.llm_model = Some(llm_model.to_owned());
        self.log_transition(from, "build_query");

        Ok(Ack::new(Endpoint::BuildQueryPipeline))
    }

    /// Builds the index pipeline, then the query pipeline.
    pub async fn build_pipeline(
        &mut self,
        embedding_model: &str,
        llm_model: &str,
        prompt_template: &str,
    ) -> Result<PipelineStage> {
        self.build_index(embedding_model).await?;
        self.build_query(llm_model, embedding_model, prompt_template)
            .await?;
        Ok(self.current_stage())
    }

    /// Indexes `document` on the backend.
    ///
    /// Requires both pipelines. Uploads accumulate.
    pub async fn upload_document(&mut self, document: Document) -> Result<Ack> {
        let from = self.current_stage();
        if !self.state.is_built() {
            return Err(precondition(
                "Please build the pipeline first",
                "upload_document",
            ));
        }
        require_name("document file name", &document.file_name)?;

        let file_name = document.file_name.clone();
        tracing::debug!(
            target: TRACING_TARGET_PIPELINE,
            file_name = %file_name,
            size = document.len(),
            "Uploading document"
        );

        self.gateway
            .post(Endpoint::RunIndexPipeline, Payload::file(document))
            .await?;

        self.state.documents_uploaded.push(file_name);
        self.log_transition(from, "upload_document");

        Ok(Ack::new(Endpoint::RunIndexPipeline))
    }

    /// Asks `query` against the uploaded documents and returns the answer as
    /// markdown.
    pub async fn ask(&mut self, query: &str) -> Result<String> {
        if self.current_stage() != PipelineStage::DocumentLoaded {
            return Err(precondition("Upload a document first", "ask"));
        }
        if query.trim().is_empty() {
            return Err(Error::validation().with_message("The question must not be empty"));
        }

        let started_at = Timestamp::now();
        let envelope = self
            .gateway
            .post(Endpoint::QueryPipeline, Payload::query(query))
            .await?;
        let answer = normalize_answer(&envelope.text()?);
        let elapsed = Timestamp::now().duration_since(started_at);

        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            elapsed_secs = format_args!("{:.2}", elapsed.as_secs_f64()),
            answer_len = answer.len(),
            "Query answered"
        );

        self.state.last_response_text = Some(answer.clone());
        Ok(answer)
    }

    fn log_transition(&self, from: PipelineStage, operation: &'static str) {
        tracing::info!(
            target: TRACING_TARGET_PIPELINE,
            operation,
            from = %from,
            to = %self.current_stage(),
            documents = self.state.documents_uploaded.len(),
            "Pipeline transition"
        );
    }
}

fn precondition(message: &'static str, operation: &'static str) -> Error {
    Error::precondition()
        .with_message(message)
        .with_context(operation)
}

fn require_name(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation().with_message(format!("The {what} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use docqa_core::{Encoding, Envelope, ErrorKind};
    use docqa_test::MockBackend;
    use serde_json::json;

    use super::*;

    fn backend() -> MockBackend {
        MockBackend::new()
            .with_json("build_index_pipeline", json!("ok"))
            .with_json("build_query_pipeline", json!("ok"))
            .with_json("run_index_pipeline", json!("ok"))
            .with_json("query_pipeline", json!("Answer\nsecond line"))
            .with_json("get_embedding_models", json!(["bge"]))
            .with_json("get_llm_models", json!(["llama"]))
    }

    fn pdf(name: &str) -> Document {
        Document::new(name, &b"%PDF-1.7"[..])
    }

    async fn loaded(mock: &MockBackend) -> PipelineOrchestrator {
        let mut pipeline = PipelineOrchestrator::new(mock.gateway());
        pipeline
            .build_pipeline("bge", "llama", DEFAULT_PROMPT_TEMPLATE)
            .await
            .unwrap();
        pipeline.upload_document(pdf("doc.pdf")).await.unwrap();
        pipeline
    }

    #[tokio::test]
    async fn test_full_sequence() {
        let mock = backend();
        let mut pipeline = PipelineOrchestrator::new(mock.gateway());
        assert_eq!(pipeline.current_stage(), PipelineStage::Empty);

        pipeline.build_index("bge").await.unwrap();
        assert_eq!(pipeline.current_stage(), PipelineStage::IndexReady);

        pipeline.build_query("llama", "bge", "T").await.unwrap();
        assert_eq!(pipeline.current_stage(), PipelineStage::QueryReady);

        pipeline.upload_document(pdf("doc.pdf")).await.unwrap();
        assert_eq!(pipeline.current_stage(), PipelineStage::DocumentLoaded);
        assert_eq!(pipeline.documents_uploaded(), ["doc.pdf"]);
    }

    #[tokio::test]
    async fn test_upload_before_pipeline_is_rejected_without_request() {
        let mock = backend();
        let mut pipeline = PipelineOrchestrator::new(mock.gateway());

        let error = pipeline.upload_document(pdf("doc.pdf")).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Precondition);
        assert_eq!(pipeline.current_stage(), PipelineStage::Empty);
        assert_eq!(mock.request_count(), 0);

        pipeline.build_index("bge").await.unwrap();
        let before = pipeline.state().clone();
        let error = pipeline.upload_document(pdf("doc.pdf")).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Precondition);
        assert_eq!(pipeline.state(), &before);
        assert!(mock.requests_to("run_index_pipeline").is_empty());
    }

    #[tokio::test]
    async fn test_build_query_requires_index() {
        let mock = backend();
        let mut pipeline = PipelineOrchestrator::new(mock.gateway());

        let error = pipeline.build_query("llama", "bge", "T").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Precondition);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_ask_requires_document() {
        let mock = backend();
        let mut pipeline = PipelineOrchestrator::new(mock.gateway());
        pipeline
            .build_pipeline("bge", "llama", "T")
            .await
            .unwrap();

        let error = pipeline.ask("why?").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Precondition);
        assert!(mock.requests_to("query_pipeline").is_empty());
    }

    #[tokio::test]
    async fn test_build_index_sends_named_param() {
        let mock = backend();
        let mut pipeline = PipelineOrchestrator::new(mock.gateway());
        pipeline.build_index("bge").await.unwrap();

        let sent = mock.requests_to("build_index_pipeline");
        assert_eq!(sent[0].encoding(), Some(Encoding::NamedParam));
        assert_eq!(sent[0].query_param(NAMED_PARAM_KEY), Some("bge"));
        assert_eq!(sent[0].query, [("embedding_model_name".to_owned(), "bge".to_owned())]);
        assert!(sent[0].json_body().is_none());
    }

    #[tokio::test]
    async fn test_build_index_failure_returns_to_empty() {
        let mock = backend();
        let mut pipeline = loaded(&mock).await;

        mock.respond(
            "build_index_pipeline",
            Envelope::new(500, "Internal Server Error", ""),
        );
        let error = pipeline.build_index("other").await.unwrap_err();

        assert!(error.is_request_failure());
        assert_eq!(pipeline.current_stage(), PipelineStage::Empty);
        assert_eq!(pipeline.state(), &PipelineState::default());
    }

    #[tokio::test]
    async fn test_rebuilding_index_discards_downstream_state() {
        let mock = backend();
        let mut pipeline = loaded(&mock).await;

        pipeline.build_index("bge").await.unwrap();
        assert_eq!(pipeline.current_stage(), PipelineStage::IndexReady);
        assert!(pipeline.documents_uploaded().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_template_suffix_is_byte_exact() {
        let mock = backend();
        let mut pipeline = PipelineOrchestrator::new(mock.gateway());
        let edited = "Answer as a pirate.";
        pipeline.build_pipeline("bge", "llama", edited).await.unwrap();

        let sent = mock.requests_to("build_query_pipeline");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].encoding(), Some(Encoding::JsonBody));
        assert_eq!(
            sent[0].json_body(),
            Some(&json!({
                "llm_model_name": "llama",
                "embedding_model_name": "bge",
                "prompt_template": "Answer as a pirate. Write the answer as markdown text.",
            }))
        );
    }

    #[tokio::test]
    async fn test_build_query_failure_marks_query_unbuilt() {
        let mock = backend().with_response(
            "build_query_pipeline",
            Envelope::new(422, "Unprocessable Entity", ""),
        );
        let mut pipeline = PipelineOrchestrator::new(mock.gateway());

        let error = pipeline
            .build_pipeline("bge", "llama", "T")
            .await
            .unwrap_err();
        assert_eq!(error.status(), Some(422));
        assert_eq!(pipeline.current_stage(), PipelineStage::IndexReady);
    }

    #[tokio::test]
    async fn test_uploads_accumulate() {
        let mock = backend();
        let mut pipeline = loaded(&mock).await;
        pipeline.upload_document(pdf("second.pdf")).await.unwrap();

        assert_eq!(pipeline.current_stage(), PipelineStage::DocumentLoaded);
        assert_eq!(pipeline.documents_uploaded(), ["doc.pdf", "second.pdf"]);

        let sent = mock.requests_to("run_index_pipeline");
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|r| r.encoding() == Some(Encoding::Multipart)));
    }

    #[tokio::test]
    async fn test_failed_upload_records_nothing() {
        let mock = backend();
        let mut pipeline = loaded(&mock).await;
        mock.enqueue("run_index_pipeline", Envelope::new(413, "Payload Too Large", ""));

        assert!(pipeline.upload_document(pdf("big.pdf")).await.is_err());
        assert_eq!(pipeline.documents_uploaded(), ["doc.pdf"]);
    }

    #[tokio::test]
    async fn test_ask_sends_query_string_and_normalizes() {
        let mock = backend();
        let mut pipeline = loaded(&mock).await;

        let answer = pipeline.ask("What is a columnar structure?").await.unwrap();
        assert_eq!(answer, "\"Answer  \nsecond line\"");
        assert_eq!(pipeline.last_response_text(), Some(answer.as_str()));
        assert_eq!(pipeline.current_stage(), PipelineStage::DocumentLoaded);

        let sent = mock.requests_to("query_pipeline");
        assert_eq!(sent[0].encoding(), Some(Encoding::QueryString));
        assert_eq!(
            sent[0].query_param("query"),
            Some("What is a columnar structure?")
        );
        assert!(sent[0].json_body().is_none());
    }

    #[tokio::test]
    async fn test_ask_failure_keeps_previous_answer() {
        let mock = backend();
        let mut pipeline = loaded(&mock).await;
        pipeline.ask("first").await.unwrap();

        mock.fail_transport("query_pipeline");
        let error = pipeline.ask("second").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Transport);
        assert_eq!(
            pipeline.last_response_text(),
            Some("\"Answer  \nsecond line\"")
        );
    }

    #[tokio::test]
    async fn test_blank_inputs_are_rejected_locally() {
        let mock = backend();
        let mut pipeline = PipelineOrchestrator::new(mock.gateway());
        assert_eq!(
            pipeline.build_index(" ").await.unwrap_err().kind,
            ErrorKind::Validation
        );

        let mut pipeline = loaded(&mock).await;
        let before = mock.request_count();
        assert_eq!(
            pipeline.ask("").await.unwrap_err().kind,
            ErrorKind::Validation
        );
        assert_eq!(mock.request_count(), before);
    }

    #[tokio::test]
    async fn test_model_lists() {
        let mock = backend();
        let pipeline = PipelineOrchestrator::new(mock.gateway());
        assert_eq!(pipeline.list_embedding_models().await.unwrap(), ["bge"]);
        assert_eq!(pipeline.list_llm_models().await.unwrap(), ["llama"]);
    }
}
