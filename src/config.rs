//! Pipeline configuration.
//!
//! All tunables for the analysis pipeline live in one immutable value that
//! is passed explicitly into the segmenter and dispatcher. Nothing in the
//! pipeline reads configuration from globals, which keeps runs with
//! different settings safe to execute in parallel (tests rely on this).

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Upper bound on a single chunk handed to the inference engine, in
/// characters. Chosen conservatively below the engine's per-call input
/// limit.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 12_000;

/// Default cap on simultaneously in-flight inference calls.
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 5;

/// Default minimum spacing between call issuances.
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(1_000);

/// Immutable configuration for one pipeline invocation.
///
/// # Examples
///
/// ```
/// use reqsmith::config::PipelineConfig;
/// use std::time::Duration;
///
/// let config = PipelineConfig::default()
///     .with_max_chunk_size(8_000)
///     .with_rate_limit_delay(Duration::from_millis(250));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum characters per chunk.
    pub max_chunk_size: usize,
    /// Maximum simultaneously in-flight inference calls.
    pub concurrent_requests: usize,
    /// Minimum delay between issuing two inference calls.
    pub rate_limit_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    #[must_use]
    pub fn with_concurrent_requests(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests;
        self
    }

    #[must_use]
    pub fn with_rate_limit_delay(mut self, rate_limit_delay: Duration) -> Self {
        self.rate_limit_delay = rate_limit_delay;
        self
    }

    /// Reject configurations the pipeline cannot run with.
    ///
    /// Called once at pipeline start so a misconfiguration fails fast
    /// instead of surfacing mid-segmentation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.concurrent_requests == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Errors raised by [`PipelineConfig::validate`].
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// Segmentation is impossible with a zero chunk budget.
    #[error("max_chunk_size must be greater than zero")]
    #[diagnostic(
        code(reqsmith::config::zero_chunk_size),
        help("Set max_chunk_size below the engine's per-call input limit, e.g. 12000.")
    )]
    ZeroChunkSize,

    /// The dispatcher needs at least one worker slot.
    #[error("concurrent_requests must be greater than zero")]
    #[diagnostic(code(reqsmith::config::zero_concurrency))]
    ZeroConcurrency,
}
