//! Subcommands and their arguments.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use docqa_session::ModelForm;

/// Top-level subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage model configurations
    Models {
        #[command(subcommand)]
        command: ModelsCommand,
    },
    /// Inspect pipeline options
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },
    /// Build the pipeline, upload documents and ask a question
    Ask(AskArgs),
}

/// Model configuration subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ModelsCommand {
    /// List the wrapper kinds the backend can instantiate
    Kinds {
        /// Kind to list first
        #[arg(long)]
        default: Option<String>,
    },
    /// List configured models
    List,
    /// Save (create or update) a model configuration
    Save(SaveArgs),
    /// Delete model configurations
    Delete {
        /// Names of the configurations to delete
        #[arg(required = true)]
        names: Vec<String>,
    },
}

/// Pipeline subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum PipelineCommand {
    /// List embedding and LLM model names
    Models,
}

/// Arguments of `models save`.
#[derive(Debug, Clone, Args)]
pub struct SaveArgs {
    /// Configuration name
    pub name: String,

    /// Model wrapper kind, one of `models kinds`
    #[arg(long)]
    pub kind: String,

    /// Hub access token
    #[arg(long, env = "ENV_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Hub repository ID
    #[arg(long)]
    pub repo_id: Option<String>,

    /// File name inside the hub repository
    #[arg(long)]
    pub file_name: Option<String>,

    /// CLIP model name
    #[arg(long)]
    pub clip_model_name: Option<String>,

    /// llama.cpp context length
    #[arg(long)]
    pub n_ctx: Option<u32>,

    /// OpenAI model name
    #[arg(long)]
    pub model_name: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

impl SaveArgs {
    /// Converts the arguments into a model form.
    pub fn to_form(&self) -> ModelForm {
        let mut form = ModelForm::new(&self.kind);
        form.hub.access_token = self.access_token.clone();
        form.hub.repo_id = self.repo_id.clone();
        form.hub.file_name = self.file_name.clone();
        form.hub.clip_model_name = self.clip_model_name.clone();
        form.n_ctx = self.n_ctx;
        form.model_name = self.model_name.clone();
        form.openai_api_key = self.openai_api_key.clone();
        form
    }
}

/// Arguments of `ask`.
#[derive(Debug, Clone, Args)]
pub struct AskArgs {
    /// Embedding model for the index and query pipelines
    #[arg(long)]
    pub embedding_model: String,

    /// LLM for the query pipeline
    #[arg(long)]
    pub llm_model: String,

    /// Prompt template; the built-in template is used when omitted
    #[arg(long)]
    pub prompt_template: Option<String>,

    /// Document to upload, may be repeated
    #[arg(long = "document", required = true)]
    pub documents: Vec<PathBuf>,

    /// The question
    pub question: String,
}
