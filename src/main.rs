//! Command-line entry point.
//!
//! Usage: `reqsmith <repository-path>`. Reads `ANTHROPIC_API_KEY` from the
//! environment (a `.env` file is honored), analyzes the repository, and
//! writes `system_requirements_document.md` to the working directory.

use std::sync::Arc;

use miette::{Diagnostic, Result};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use reqsmith::analyzer::Analyzer;
use reqsmith::config::PipelineConfig;
use reqsmith::engine::AnthropicEngine;
use reqsmith::report::{DEFAULT_OUTPUT_FILE, DocumentGenerator};

#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("please provide the repository path as an argument")]
    #[diagnostic(
        code(reqsmith::cli::missing_repo_path),
        help("Usage: reqsmith <repository-path>")
    )]
    MissingRepoPath,
}

fn init_tracing() {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,reqsmith=info"))
        .expect("default tracing filter is valid");

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let repo_path = std::env::args().nth(1).ok_or(CliError::MissingRepoPath)?;

    let engine = Arc::new(AnthropicEngine::from_env()?);
    let analyzer = Analyzer::new(&repo_path, engine, PipelineConfig::default())?;

    info!("starting codebase analysis");
    let results = analyzer.analyze().await?;

    info!("generating system requirements document");
    DocumentGenerator::new()
        .write(&results, DEFAULT_OUTPUT_FILE)
        .await?;

    info!("analysis complete; see {DEFAULT_OUTPUT_FILE} for results");
    Ok(())
}
