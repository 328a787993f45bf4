//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── client: ReqwestConfig   # Backend origin, timeout, user agent
//! └── command: Command
//!     ├── models kinds | list | save | delete
//!     ├── pipeline models
//!     └── ask
//! ```
//!
//! Every client option can also be provided through the environment.

mod command;

use clap::Parser;
use docqa_reqwest::ReqwestConfig;

pub use self::command::{AskArgs, Command, ModelsCommand, PipelineCommand, SaveArgs};
use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "docqa")]
#[command(about = "Document question answering against a docqa backend")]
#[command(version)]
pub struct Cli {
    /// Backend connection configuration.
    #[clap(flatten)]
    pub client: ReqwestConfig,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded first so clap's `env` lookups see its values.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}
}

/// Logs the backend connection configuration.
pub fn log_client_config(config: &ReqwestConfig) {
    tracing::info!(
        target: TRACING_TARGET_CONFIG,
        scheme = %config.backend_scheme,
        host = %config.backend_host,
        port = config.backend_port,
        timeout_secs = config.http_timeout,
        "backend configuration"
    );
}
