//! Command execution against a session.

use std::collections::BTreeSet;

use anyhow::Context;
use docqa_session::pipeline::DEFAULT_PROMPT_TEMPLATE;
use docqa_session::{Session, read_document};

use crate::TRACING_TARGET_COMMAND;
use crate::config::{AskArgs, Command, ModelsCommand, PipelineCommand, SaveArgs};

/// Runs `command` and prints its result to stdout.
pub async fn execute(mut session: Session, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Models { command } => models(&mut session, command).await,
        Command::Pipeline {
            command: PipelineCommand::Models,
        } => pipeline_models(&session).await,
        Command::Ask(args) => ask(&mut session, args).await,
    }
}

async fn models(session: &mut Session, command: ModelsCommand) -> anyhow::Result<()> {
    match command {
        ModelsCommand::Kinds { default } => {
            let kinds = session.models_mut().reorder_with_default(default.as_deref());
            print_lines(kinds);
        }
        ModelsCommand::List => print_lines(session.models().list_configured_models()),
        ModelsCommand::Save(args) => save(session, &args).await?,
        ModelsCommand::Delete { names } => {
            let names: BTreeSet<String> = names.into_iter().collect();
            session
                .delete_configurations(&names)
                .await
                .context("failed to delete model configurations")?;
            print_lines(session.models().list_configured_models());
        }
    }

    Ok(())
}

async fn save(session: &mut Session, args: &SaveArgs) -> anyhow::Result<()> {
    let config = args.to_form().build().context("invalid model configuration")?;
    let updating = session.models().is_configured(&args.name);

    session
        .save_configuration(&args.name, &config)
        .await
        .with_context(|| format!("failed to save model configuration '{}'", args.name))?;

    let verb = if updating { "Updated" } else { "Saved" };
    println!("{verb} model configuration '{}'", args.name);
    Ok(())
}

async fn pipeline_models(session: &Session) -> anyhow::Result<()> {
    let pipeline = session.pipeline();
    let embedding = pipeline
        .list_embedding_models()
        .await
        .context("failed to list embedding models")?;
    let llm = pipeline
        .list_llm_models()
        .await
        .context("failed to list LLM models")?;

    println!("Embedding models:");
    print_lines(embedding.iter().map(|m| format!("  {m}")));
    println!("LLM models:");
    print_lines(llm.iter().map(|m| format!("  {m}")));
    Ok(())
}

async fn ask(session: &mut Session, args: AskArgs) -> anyhow::Result<()> {
    let template = args
        .prompt_template
        .as_deref()
        .unwrap_or(DEFAULT_PROMPT_TEMPLATE);
    let pipeline = session.pipeline_mut();

    let stage = pipeline
        .build_pipeline(&args.embedding_model, &args.llm_model, template)
        .await
        .context("failed to build the pipeline")?;
    tracing::info!(target: TRACING_TARGET_COMMAND, stage = %stage, "pipeline built");

    for path in &args.documents {
        let document = read_document(path).await?;
        pipeline
            .upload_document(document)
            .await
            .with_context(|| format!("failed to upload {}", path.display()))?;
    }

    let answer = pipeline
        .ask(&args.question)
        .await
        .context("failed to answer the question")?;
    println!("{answer}");
    Ok(())
}

fn print_lines<I>(lines: I)
where
    I: IntoIterator,
    I::Item: std::fmt::Display,
{
    for line in lines {
        println!("{line}");
    }
}
