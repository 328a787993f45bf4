//! The per-user session context.

use std::collections::BTreeSet;

use docqa_core::{Gateway, Result};

use crate::models::{ModelConfig, ModelConfigManager};
use crate::pipeline::{PipelineOrchestrator, PipelineStage};
use crate::{Ack, TRACING_TARGET};

/// One user's session: the model configuration view and the pipeline state.
///
/// Sessions share nothing. Every mutating operation takes `&mut self`, so
/// calls within a session are serialized by the borrow checker.
#[derive(Debug)]
pub struct Session {
    models: ModelConfigManager,
    pipeline: PipelineOrchestrator,
}

impl Session {
    /// Starts a session against `gateway`, loading the model configuration.
    pub async fn start(gateway: Gateway) -> Result<Self> {
        let models = ModelConfigManager::load(gateway.clone()).await?;
        let pipeline = PipelineOrchestrator::new(gateway);

        tracing::info!(
            target: TRACING_TARGET,
            wrapper_kinds = models.list_wrapper_kinds().len(),
            configured_models = models.list_configured_models().len(),
            "Session started"
        );

        Ok(Self { models, pipeline })
    }

    /// Returns the model configuration manager.
    pub fn models(&self) -> &ModelConfigManager {
        &self.models
    }

    /// Returns the model configuration manager mutably.
    pub fn models_mut(&mut self) -> &mut ModelConfigManager {
        &mut self.models
    }

    /// Returns the pipeline orchestrator.
    pub fn pipeline(&self) -> &PipelineOrchestrator {
        &self.pipeline
    }

    /// Returns the pipeline orchestrator mutably.
    pub fn pipeline_mut(&mut self) -> &mut PipelineOrchestrator {
        &mut self.pipeline
    }

    /// Returns the current pipeline stage.
    pub fn stage(&self) -> PipelineStage {
        self.pipeline.current_stage()
    }

    /// Saves a model configuration.
    pub async fn save_configuration(&mut self, name: &str, config: &ModelConfig) -> Result<Ack> {
        self.models.save_configuration(name, config).await
    }

    /// Deletes model configurations.
    ///
    /// The pipeline keeps its stage even if it was built with a deleted
    /// model; the backend reports the problem on the next pipeline call.
    pub async fn delete_configurations(&mut self, names: &BTreeSet<String>) -> Result<Ack> {
        let ack = self.models.delete_configurations(names).await?;

        let state = self.pipeline.state();
        for name in names.iter().filter(|n| state.references_model(n)) {
            tracing::warn!(
                target: TRACING_TARGET,
                model_name = %name,
                stage = %self.stage(),
                "Deleted model is still referenced by the built pipeline"
            );
        }

        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use docqa_core::{Document, Envelope};
    use docqa_test::MockBackend;
    use serde_json::json;

    use super::*;
    use crate::pipeline::DEFAULT_PROMPT_TEMPLATE;

    fn backend() -> MockBackend {
        MockBackend::new()
            .with_json("get_all_model_wrapper", json!(["llama_cpp", "open_ai"]))
            .with_json("get_all_unmodified_models", json!(["bge", "llama"]))
            .with_json("delete_models", json!("ok"))
            .with_json("build_index_pipeline", json!("ok"))
            .with_json("build_query_pipeline", json!("ok"))
            .with_json("run_index_pipeline", json!("ok"))
    }

    #[tokio::test]
    async fn test_start_loads_models() {
        let mock = backend();
        let session = Session::start(mock.gateway()).await.unwrap();

        assert_eq!(session.stage(), PipelineStage::Empty);
        assert!(session.models().is_configured("bge"));
    }

    #[tokio::test]
    async fn test_start_fails_when_backend_is_down() {
        let mock = MockBackend::new();
        mock.fail_transport("get_all_model_wrapper");
        assert!(Session::start(mock.gateway()).await.is_err());
    }

    #[tokio::test]
    async fn test_deleting_pipeline_model_keeps_stage() {
        let mock = backend();
        let mut session = Session::start(mock.gateway()).await.unwrap();
        session
            .pipeline_mut()
            .build_pipeline("bge", "llama", DEFAULT_PROMPT_TEMPLATE)
            .await
            .unwrap();
        session
            .pipeline_mut()
            .upload_document(Document::new("doc.pdf", &b"pdf"[..]))
            .await
            .unwrap();

        mock.respond_json("get_all_unmodified_models", json!(["llama"]));
        let ack = session
            .delete_configurations(&BTreeSet::from(["bge".to_owned()]))
            .await
            .unwrap();

        assert!(ack.reload_view);
        assert!(!session.models().is_configured("bge"));
        assert_eq!(session.stage(), PipelineStage::DocumentLoaded);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let mock = backend();
        let mut first = Session::start(mock.gateway()).await.unwrap();
        let second = Session::start(mock.gateway()).await.unwrap();

        first.pipeline_mut().build_index("bge").await.unwrap();
        assert_eq!(first.stage(), PipelineStage::IndexReady);
        assert_eq!(second.stage(), PipelineStage::Empty);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_models() {
        let mock = backend().with_response(
            "delete_models",
            Envelope::new(500, "Internal Server Error", ""),
        );
        let mut session = Session::start(mock.gateway()).await.unwrap();

        let names = BTreeSet::from(["bge".to_owned()]);
        assert!(session.delete_configurations(&names).await.is_err());
        assert!(session.models().is_configured("bge"));
    }
}
