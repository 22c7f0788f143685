//! The three-stage analysis pipeline: segment, dispatch, reduce.
//!
//! Ties the [`segmenter`](crate::segmenter), [`Dispatcher`] and
//! [`Aggregator`] together for one corpus and one task instruction.
//! Configuration is validated up front so a bad chunk budget fails before
//! any segmentation work happens.
//!
//! Outcome taxonomy, which callers must not conflate:
//! - empty corpus → [`Summary::NoContent`], zero engine calls;
//! - some calls failed → fewer partials, still a summary;
//! - every attempted call failed → [`PipelineError::AllCallsFailed`];
//! - the reduction call failed → [`PipelineError::Aggregation`].

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{info, instrument};

use crate::aggregator::{AggregationError, Aggregator, Summary};
use crate::config::{ConfigError, PipelineConfig};
use crate::dispatcher::Dispatcher;
use crate::engine::InferenceEngine;
use crate::segmenter::{SourceBlob, segment};

/// Hard failures of a pipeline invocation.
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// Chunks were attempted and every call failed. Distinct from the
    /// empty-input case, which yields a sentinel summary instead.
    #[error("all {attempted} chunk calls failed; analysis produced no results")]
    #[diagnostic(
        code(reqsmith::pipeline::all_calls_failed),
        help("Check engine credentials and connectivity, then re-run.")
    )]
    AllCallsFailed { attempted: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Aggregation(#[from] AggregationError),
}

/// One segmentation → dispatch → reduction pass over a text corpus.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use reqsmith::config::PipelineConfig;
/// use reqsmith::engine::AnthropicEngine;
/// use reqsmith::pipeline::Pipeline;
/// use reqsmith::segmenter::SourceBlob;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = Arc::new(AnthropicEngine::from_env()?);
/// let pipeline = Pipeline::new(engine, PipelineConfig::default());
/// let blobs = vec![SourceBlob::new("fn main() {}")];
/// let summary = pipeline
///     .run(&blobs, "You are a senior software architect.")
///     .await?;
/// println!("{summary}");
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    dispatcher: Dispatcher,
    aggregator: Aggregator,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(engine: Arc<dyn InferenceEngine>, config: PipelineConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&engine), config.clone()),
            aggregator: Aggregator::new(engine),
            config,
        }
    }

    /// Run the full pipeline for one corpus under one instruction.
    #[instrument(skip_all, fields(blobs = blobs.len()))]
    pub async fn run(
        &self,
        blobs: &[SourceBlob],
        instruction: &str,
    ) -> Result<Summary, PipelineError> {
        self.config.validate()?;

        let chunks = segment(blobs, self.config.max_chunk_size);
        if chunks.is_empty() {
            info!("corpus is empty; skipping dispatch");
            return Ok(Summary::NoContent);
        }

        let report = self.dispatcher.dispatch(chunks, instruction).await;
        if report.all_failed() {
            return Err(PipelineError::AllCallsFailed {
                attempted: report.attempted(),
            });
        }

        let failures = report.failures();
        if failures > 0 {
            info!(
                failures,
                attempted = report.attempted(),
                "continuing with partial results"
            );
        }

        let partials = report.into_partials();
        Ok(self.aggregator.reduce(&partials).await?)
    }
}
