//! Bounded concurrent dispatch of chunks to the inference engine.
//!
//! Each chunk becomes one engine call. Two independent limits bound the
//! calls: a cap on simultaneously in-flight requests (a semaphore) and a
//! minimum spacing between call issuances. Results are written into
//! index-addressed slots keyed by chunk ordinal, so the output order
//! matches the input order no matter which calls finish first.
//!
//! A single chunk's failure is logged with its ordinal and recorded as a
//! tagged failure outcome; it never aborts sibling calls. There is no
//! automatic retry.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::config::PipelineConfig;
use crate::engine::{EngineError, InferenceEngine};
use crate::segmenter::Chunk;

/// User-message preamble prepended to each chunk, matching the per-chunk
/// analysis request the engine expects.
const CHUNK_TASK_PREAMBLE: &str = "Analyze this code chunk and provide insights:";

/// The engine's successful response to one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResult {
    /// Ordinal inherited from the chunk, preserved through aggregation.
    pub ordinal: usize,
    pub text: String,
}

/// Why a single chunk produced no result.
#[derive(Debug, Error, Diagnostic)]
pub enum DispatchFailure {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The worker task was cancelled or panicked before reporting back.
    #[error("chunk task ended before reporting a result")]
    #[diagnostic(code(reqsmith::dispatcher::task_aborted))]
    TaskAborted,
}

/// Tagged per-chunk outcome, one per dispatched chunk, in ordinal order.
#[derive(Debug)]
pub struct ChunkOutcome {
    pub ordinal: usize,
    pub result: Result<String, DispatchFailure>,
}

/// Everything the dispatcher learned from one batch.
///
/// Keeping failures as first-class outcomes lets callers distinguish
/// "nothing to analyze" from "everything failed" instead of inferring it
/// from log output.
#[derive(Debug, Default)]
pub struct DispatchReport {
    outcomes: Vec<ChunkOutcome>,
}

impl DispatchReport {
    /// Number of chunks attempted.
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of chunks whose call failed.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    /// True when at least one chunk was attempted and every call failed.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.result.is_err())
    }

    /// Per-chunk outcomes in ordinal order.
    pub fn outcomes(&self) -> &[ChunkOutcome] {
        &self.outcomes
    }

    /// Successful results in ordinal order, failures dropped.
    pub fn into_partials(self) -> Vec<PartialResult> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| {
                outcome.result.ok().map(|text| PartialResult {
                    ordinal: outcome.ordinal,
                    text,
                })
            })
            .collect()
    }
}

/// Issues one engine call per chunk under the configured bounds.
pub struct Dispatcher {
    engine: Arc<dyn InferenceEngine>,
    config: PipelineConfig,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn InferenceEngine>, config: PipelineConfig) -> Self {
        Self { engine, config }
    }

    /// Dispatch every chunk and collect outcomes in ordinal order.
    ///
    /// The issuance loop acquires a concurrency permit, spawns the call,
    /// then waits out the rate-limit spacing before issuing the next one;
    /// whichever of the two constraints binds last governs the pace.
    /// Completion order is irrelevant: each worker writes its outcome into
    /// the slot owned by its chunk's ordinal.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn dispatch(&self, chunks: Vec<Chunk>, instruction: &str) -> DispatchReport {
        let total = chunks.len();
        if total == 0 {
            return DispatchReport::default();
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_requests));
        let mut workers: JoinSet<(usize, Result<String, EngineError>)> = JoinSet::new();

        for (issued, chunk) in chunks.into_iter().enumerate() {
            if issued > 0 && !self.config.rate_limit_delay.is_zero() {
                tokio::time::sleep(self.config.rate_limit_delay).await;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .expect("dispatch semaphore is never closed");
            let engine = Arc::clone(&self.engine);
            let instruction = instruction.to_string();

            workers.spawn(async move {
                let ordinal = chunk.ordinal;
                let input = format!("{CHUNK_TASK_PREAMBLE}\n\n{}", chunk.text);
                let result = engine.invoke(&instruction, &input).await;
                drop(permit);
                (ordinal, result)
            });
        }

        // Write-once slots keyed by ordinal; completion order does not
        // matter.
        let mut slots: Vec<Option<Result<String, DispatchFailure>>> = (0..total)
            .map(|_| None)
            .collect();

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((ordinal, Ok(text))) => {
                    debug!(ordinal, chars = text.len(), "chunk analyzed");
                    slots[ordinal] = Some(Ok(text));
                }
                Ok((ordinal, Err(error))) => {
                    warn!(ordinal, %error, "chunk analysis failed; dropping result");
                    slots[ordinal] = Some(Err(error.into()));
                }
                Err(join_error) => {
                    warn!(%join_error, "chunk worker ended abnormally");
                }
            }
        }

        let outcomes = slots
            .into_iter()
            .enumerate()
            .map(|(ordinal, slot)| ChunkOutcome {
                ordinal,
                result: slot.unwrap_or(Err(DispatchFailure::TaskAborted)),
            })
            .collect();

        DispatchReport { outcomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(ordinal: usize, result: Result<&str, DispatchFailure>) -> ChunkOutcome {
        ChunkOutcome {
            ordinal,
            result: result.map(str::to_string),
        }
    }

    #[test]
    fn report_distinguishes_empty_from_all_failed() {
        let empty = DispatchReport::default();
        assert!(!empty.all_failed());
        assert_eq!(empty.attempted(), 0);

        let failed = DispatchReport {
            outcomes: vec![outcome(0, Err(DispatchFailure::TaskAborted))],
        };
        assert!(failed.all_failed());
        assert_eq!(failed.attempted(), 1);
        assert_eq!(failed.failures(), 1);
    }

    #[test]
    fn into_partials_drops_failures_and_keeps_order() {
        let report = DispatchReport {
            outcomes: vec![
                outcome(0, Ok("first")),
                outcome(1, Err(DispatchFailure::TaskAborted)),
                outcome(2, Ok("third")),
            ],
        };
        let partials = report.into_partials();
        assert_eq!(partials.len(), 2);
        assert_eq!(partials[0].ordinal, 0);
        assert_eq!(partials[1].ordinal, 2);
        assert_eq!(partials[1].text, "third");
    }
}
