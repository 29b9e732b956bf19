//! CLI command handlers.
//!
//! Handlers take an `&dyn Extractor` instead of building one, so every
//! command runs unchanged against the LLM backend or a test double.

pub mod evaluate;
pub mod extract;
pub mod format;
pub mod run;

use thiserror::Error;

use crate::cli::{Commands, LlmArgs};
use crate::pipeline::batch_extraction::{ConfigurationError, PipelineError};
use crate::pipeline::structuring::{LlmError, LlmExtractor};
use crate::table::TableError;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Model '{model}' is not available at {url}. Pull it with `ollama pull {model}`.")]
    ModelUnavailable { model: String, url: String },

    #[error("Evaluation failed for: {}", .0.join(", "))]
    EvaluationFailed(Vec<String>),
}

/// Run one parsed CLI command to completion.
pub async fn dispatch(command: Commands) -> Result<(), CommandError> {
    match command {
        Commands::Format(args) => {
            let extractor = build_extractor(&args.llm).await?;
            format::execute(&args, &extractor).await?;
        }
        Commands::Extract(args) => {
            let extractor = build_extractor(&args.llm).await?;
            extract::execute(&args, &extractor, extractor.model()).await?;
        }
        Commands::Evaluate(args) => {
            evaluate::execute(&args)?;
        }
        Commands::Run(args) => {
            let extractor = build_extractor(&args.llm).await?;
            run::execute(&args, &extractor, extractor.model()).await?;
        }
    }
    Ok(())
}

/// Build the LLM extractor and, unless skipped, check that Ollama serves
/// the requested model before any report is touched.
pub async fn build_extractor(args: &LlmArgs) -> Result<LlmExtractor, CommandError> {
    let settings = args.settings();
    settings.validate()?;
    let extractor = LlmExtractor::from_settings(&settings)?;

    if !args.skip_model_check {
        if !extractor.check_model().await? {
            return Err(CommandError::ModelUnavailable {
                model: settings.model,
                url: settings.base_url,
            });
        }
        tracing::info!(model = %settings.model, url = %settings.base_url, "Model available");
    }
    Ok(extractor)
}
