//! # Reqsmith: LLM-powered System Requirements Extraction
//!
//! Reqsmith analyzes an existing codebase with a text-inference engine and
//! distills what it finds into a System Requirements Document. The heart
//! of the crate is a three-stage pipeline with hard invariants:
//!
//! - **Segmentation** ([`segmenter`]): raw file contents are packed into
//!   ordered chunks, each below a configured size ceiling, splitting at
//!   the most structure-preserving boundary available (blob → line →
//!   delimiter → raw character).
//! - **Bounded dispatch** ([`dispatcher`]): each chunk becomes one engine
//!   call under a concurrency cap and a minimum inter-call spacing, with
//!   per-chunk failures isolated and results re-ordered by ordinal.
//! - **Hierarchical reduction** ([`aggregator`]): the surviving partial
//!   results are combined in one further engine call, or replaced by a
//!   sentinel when nothing was analyzable.
//!
//! Everything around that core is deliberately thin: [`discovery`] finds
//! and reads the files each analysis category cares about, [`manifest`]
//! parses dependency manifests structurally, [`analyzer`] runs the
//! pipeline once per category, and [`report`] renders the final document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use reqsmith::analyzer::Analyzer;
//! use reqsmith::config::PipelineConfig;
//! use reqsmith::engine::AnthropicEngine;
//! use reqsmith::report::{DocumentGenerator, DEFAULT_OUTPUT_FILE};
//!
//! # async fn example() -> miette::Result<()> {
//! # use miette::IntoDiagnostic;
//! let engine = Arc::new(AnthropicEngine::from_env().into_diagnostic()?);
//! let analyzer = Analyzer::new("path/to/repo", engine, PipelineConfig::default())
//!     .into_diagnostic()?;
//! let results = analyzer.analyze().await.into_diagnostic()?;
//! DocumentGenerator::new()
//!     .write(&results, DEFAULT_OUTPUT_FILE)
//!     .await
//!     .into_diagnostic()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Guide
//!
//! - [`config`] - Pipeline configuration and fail-fast validation
//! - [`segmenter`] - Boundary-preserving chunking
//! - [`engine`] - Inference engine trait and the Anthropic client
//! - [`dispatcher`] - Bounded concurrent dispatch with ordinal slotting
//! - [`aggregator`] - Reduction into a single summary
//! - [`pipeline`] - The three stages wired together
//! - [`discovery`] - Repository walking and file categorization
//! - [`manifest`] - Dependency manifest parsing
//! - [`analyzer`] - Per-category analysis driver
//! - [`report`] - Markdown document assembly

pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod engine;
pub mod manifest;
pub mod pipeline;
pub mod report;
pub mod segmenter;
