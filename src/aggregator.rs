//! Reduction of per-chunk results into one combined summary.
//!
//! A single fixed-depth reduction: the successful partial results are
//! joined in ordinal order and handed to the engine in exactly one further
//! call. There is deliberately no recursive tree-reduce when the combined
//! partials would themselves exceed the chunk budget; that limitation is
//! documented rather than papered over.

use std::fmt;
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::dispatcher::PartialResult;
use crate::engine::{EngineError, InferenceEngine};

/// System instruction for the reduction call.
pub const COMBINE_INSTRUCTION: &str =
    "Combine and summarize the following analysis results into a cohesive overview:";

/// Sentinel text rendered for [`Summary::NoContent`].
pub const NO_CONTENT_SENTINEL: &str = "Not found";

/// The final combined result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// The engine's combined narrative.
    Text(String),
    /// No analyzable content was found; no reduction call was made.
    NoContent,
}

impl Summary {
    pub fn is_content(&self) -> bool {
        matches!(self, Summary::Text(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Summary::Text(text) => Some(text),
            Summary::NoContent => None,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Text(text) => f.write_str(text),
            Summary::NoContent => f.write_str(NO_CONTENT_SENTINEL),
        }
    }
}

/// Errors from the reduction call.
///
/// Unlike per-chunk failures there is no fallback reduction path, so this
/// surfaces as a hard failure of the whole pipeline invocation.
#[derive(Debug, Error, Diagnostic)]
pub enum AggregationError {
    #[error("failed to combine partial results: {0}")]
    #[diagnostic(
        code(reqsmith::aggregator::reduction),
        help("The reduction call has no fallback; re-run the analysis.")
    )]
    Reduction(#[from] EngineError),
}

/// Collapses ordered partial results into one [`Summary`].
pub struct Aggregator {
    engine: Arc<dyn InferenceEngine>,
}

impl Aggregator {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self { engine }
    }

    /// Reduce the partial results to a single summary.
    ///
    /// An empty input returns [`Summary::NoContent`] without spending an
    /// engine call. Otherwise the partial texts are joined with blank
    /// lines, in ordinal order, and reduced in exactly one call.
    #[instrument(skip_all, fields(partials = partials.len()))]
    pub async fn reduce(&self, partials: &[PartialResult]) -> Result<Summary, AggregationError> {
        if partials.is_empty() {
            return Ok(Summary::NoContent);
        }

        let combined = partials
            .iter()
            .map(|partial| partial.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!(chars = combined.len(), "issuing reduction call");
        let text = self.engine.invoke(COMBINE_INSTRUCTION, &combined).await?;
        Ok(Summary::Text(text))
    }
}
