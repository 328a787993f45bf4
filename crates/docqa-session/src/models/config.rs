//! Wrapper-specific model configurations.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use docqa_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Upper bound on `n_ctx` for llama.cpp models.
pub const MAX_CONTEXT_TOKENS: u32 = 10_000;

/// GPU layers offloaded by llama.cpp models; `-1` offloads all of them.
const LLAMA_CPP_GPU_LAYERS: i32 = -1;

/// Threads used by llama.cpp models.
const LLAMA_CPP_THREADS: u32 = 3;

/// A named strategy for instantiating a model.
///
/// Kinds are reported by the backend as strings. Any kind containing
/// `transformers` shares the hub-model configuration schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WrapperKind {
    /// `llama_cpp`
    LlamaCpp,
    /// Any `transformers*` kind; holds the full kind name.
    Transformers(String),
    /// `open_ai`
    OpenAi,
    /// Any other kind reported by the backend.
    Other(String),
}

impl WrapperKind {
    /// Parses a backend kind name.
    pub fn parse(kind: &str) -> Self {
        match kind {
            "llama_cpp" => Self::LlamaCpp,
            "open_ai" => Self::OpenAi,
            other if other.contains("transformers") => Self::Transformers(other.to_owned()),
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the backend kind name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::LlamaCpp => "llama_cpp",
            Self::OpenAi => "open_ai",
            Self::Transformers(kind) | Self::Other(kind) => kind,
        }
    }
}

impl FromStr for WrapperKind {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for WrapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a hub-hosted model (llama.cpp or transformers) is fetched from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubSource {
    /// Hub access token.
    pub access_token: Option<String>,
    /// Repository ID.
    pub repo_id: Option<String>,
    /// File name inside the repository.
    pub file_name: Option<String>,
    /// CLIP model name, for multimodal models.
    pub clip_model_name: Option<String>,
}

/// A validated model configuration, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelConfig {
    /// llama.cpp model from the hub.
    LlamaCpp {
        /// Model source.
        hub: HubSource,
        /// Context length in tokens.
        n_ctx: Option<u32>,
    },
    /// transformers model from the hub.
    Transformers {
        /// Full wrapper kind name.
        kind: String,
        /// Model source.
        hub: HubSource,
    },
    /// OpenAI-hosted model.
    OpenAi {
        /// Remote model name.
        model_name: Option<String>,
        /// API key.
        openai_api_key: Option<String>,
    },
    /// Kind without a known schema; only the kind is sent.
    Other {
        /// Wrapper kind name.
        kind: String,
    },
}

impl ModelConfig {
    /// Returns the wrapper kind of this configuration.
    pub fn wrapper_kind(&self) -> WrapperKind {
        match self {
            Self::LlamaCpp { .. } => WrapperKind::LlamaCpp,
            Self::Transformers { kind, .. } => WrapperKind::Transformers(kind.clone()),
            Self::OpenAi { .. } => WrapperKind::OpenAi,
            Self::Other { kind } => WrapperKind::Other(kind.clone()),
        }
    }

    /// Renders the `config_dict` object the backend stores.
    pub fn to_config_dict(&self) -> Value {
        let kind = self.wrapper_kind();
        match self {
            Self::LlamaCpp { hub, n_ctx } => json!({
                "model_wrapper": kind.as_str(),
                "access_token": hub.access_token,
                "repo_id": hub.repo_id,
                "file_name": hub.file_name,
                "clip_model_name": hub.clip_model_name,
                "construct_params": {
                    "n_gpu_layers": LLAMA_CPP_GPU_LAYERS,
                    "n_threads": LLAMA_CPP_THREADS,
                    "n_ctx": n_ctx,
                },
            }),
            Self::Transformers { hub, .. } => json!({
                "model_wrapper": kind.as_str(),
                "access_token": hub.access_token,
                "repo_id": hub.repo_id,
                "file_name": hub.file_name,
                "clip_model_name": hub.clip_model_name,
                "construct_params": {},
            }),
            Self::OpenAi {
                model_name,
                openai_api_key,
            } => json!({
                "model_wrapper": kind.as_str(),
                "model_name": model_name,
                "openai_api_key": openai_api_key,
            }),
            Self::Other { .. } => json!({ "model_wrapper": kind.as_str() }),
        }
    }
}

/// Raw form input for a model configuration.
///
/// Fields that do not apply to the chosen wrapper kind are ignored by
/// [`ModelForm::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelForm {
    /// Wrapper kind name.
    pub model_wrapper: String,
    /// Hub-model fields.
    #[serde(flatten)]
    pub hub: HubSource,
    /// llama.cpp context length.
    pub n_ctx: Option<u32>,
    /// OpenAI model name.
    pub model_name: Option<String>,
    /// OpenAI API key.
    pub openai_api_key: Option<String>,
}

impl ModelForm {
    /// Creates an empty form for the given wrapper kind.
    pub fn new(model_wrapper: impl Into<String>) -> Self {
        Self {
            model_wrapper: model_wrapper.into(),
            ..Self::default()
        }
    }

    /// Set the hub access token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.hub.access_token = Some(token.into());
        self
    }

    /// Set the hub repository ID.
    #[must_use]
    pub fn with_repo_id(mut self, repo_id: impl Into<String>) -> Self {
        self.hub.repo_id = Some(repo_id.into());
        self
    }

    /// Set the file name inside the hub repository.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.hub.file_name = Some(file_name.into());
        self
    }

    /// Set the CLIP model name.
    #[must_use]
    pub fn with_clip_model_name(mut self, name: impl Into<String>) -> Self {
        self.hub.clip_model_name = Some(name.into());
        self
    }

    /// Set the llama.cpp context length.
    #[must_use]
    pub fn with_n_ctx(mut self, n_ctx: u32) -> Self {
        self.n_ctx = Some(n_ctx);
        self
    }

    /// Set the OpenAI model name.
    #[must_use]
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Set the OpenAI API key.
    #[must_use]
    pub fn with_openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Builds the configuration for the form's wrapper kind.
    ///
    /// Whether the kind is offered by the backend is checked by the manager,
    /// not here.
    pub fn build(self) -> Result<ModelConfig> {
        if self.model_wrapper.trim().is_empty() {
            return Err(Error::validation().with_message("A model wrapper kind is required"));
        }

        let config = match WrapperKind::parse(&self.model_wrapper) {
            WrapperKind::LlamaCpp => {
                if let Some(n_ctx) = self.n_ctx
                    && n_ctx > MAX_CONTEXT_TOKENS
                {
                    return Err(Error::validation().with_message(format!(
                        "Context tokens {n_ctx} exceed the maximum of {MAX_CONTEXT_TOKENS}"
                    )));
                }
                ModelConfig::LlamaCpp {
                    hub: self.hub,
                    n_ctx: self.n_ctx,
                }
            }
            WrapperKind::Transformers(kind) => ModelConfig::Transformers {
                kind,
                hub: self.hub,
            },
            WrapperKind::OpenAi => ModelConfig::OpenAi {
                model_name: self.model_name,
                openai_api_key: self.openai_api_key,
            },
            WrapperKind::Other(kind) => ModelConfig::Other { kind },
        };

        Ok(config)
    }
}
