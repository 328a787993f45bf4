//! Pipeline state and the stage derived from it.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

/// Stage of the pipeline state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(AsRefStr, Display, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Nothing built yet.
    Empty,
    /// Index pipeline built.
    IndexReady,
    /// Index and query pipelines built, no documents uploaded.
    QueryReady,
    /// At least one document indexed; questions are accepted.
    DocumentLoaded,
}

/// Session-scoped pipeline state, mutated only by the orchestrator after
/// successful backend calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    /// Whether the index pipeline is built.
    pub index_built: bool,
    /// Whether the query pipeline is built.
    pub query_built: bool,
    /// Uploaded file names, in upload order.
    pub documents_uploaded: Vec<String>,
    /// Normalized text of the last answer.
    pub last_response_text: Option<String>,
    /// Embedding model the index pipeline was built with.
    pub embedding_model: Option<String>,
    /// LLM the query pipeline was built with.
    pub llm_model: Option<String>,
}

impl PipelineState {
    /// Derives the current stage.
    pub fn stage(&self) -> PipelineStage {
        match (self.index_built, self.query_built) {
            (false, _) => PipelineStage::Empty,
            (true, false) => PipelineStage::IndexReady,
            (true, true) if self.documents_uploaded.is_empty() => PipelineStage::QueryReady,
            (true, true) => PipelineStage::DocumentLoaded,
        }
    }

    /// Returns `true` if both pipelines are built.
    pub fn is_built(&self) -> bool {
        self.index_built && self.query_built
    }

    /// Returns `true` if the pipeline was built with `model` as embedding or LLM.
    pub fn references_model(&self, model: &str) -> bool {
        self.embedding_model.as_deref() == Some(model) || self.llm_model.as_deref() == Some(model)
    }
}
