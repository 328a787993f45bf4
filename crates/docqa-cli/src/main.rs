#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod commands;
mod config;

use std::process;

use anyhow::Context;
use docqa_reqwest::ReqwestClient;
use docqa_session::Session;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Cli, log_client_config};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "docqa_cli::startup";
pub const TRACING_TARGET_CONFIG: &str = "docqa_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "docqa_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_COMMAND,
            error = %format!("{error:#}"),
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    init_tracing();
    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        dotenv = cfg!(feature = "dotenv"),
        "starting docqa"
    );
    log_client_config(&cli.client);

    let client = ReqwestClient::new(cli.client).context("invalid backend configuration")?;
    let base_url = client.base_url().clone();
    let session = Session::start(client.into_gateway())
        .await
        .with_context(|| format!("failed to start session against {base_url}"))?;

    commands::execute(session, cli.command).await
}

/// Initializes tracing with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
