#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod ack;
mod documents;
pub mod models;
pub mod pipeline;
mod session;

pub use crate::ack::Ack;
pub use crate::documents::read_document;
pub use crate::models::{ModelConfig, ModelConfigManager, ModelForm, WrapperKind};
pub use crate::pipeline::{PipelineOrchestrator, PipelineStage, PipelineState};
pub use crate::session::Session;

/// Tracing target for session-level events.
pub const TRACING_TARGET: &str = "docqa_session";

/// Tracing target for model configuration operations.
pub const TRACING_TARGET_MODELS: &str = "docqa_session::models";

/// Tracing target for pipeline operations.
pub const TRACING_TARGET_PIPELINE: &str = "docqa_session::pipeline";
