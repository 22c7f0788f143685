//! Per-category codebase analysis.
//!
//! Runs the segmentation/dispatch/reduction pipeline once per analysis
//! category, each over its own slice of the repository, and collects the
//! resulting summaries. The dependencies category is the exception: its
//! manifests are parsed structurally instead of burning inference calls.

use std::path::Path;
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{info, instrument};

use crate::aggregator::Summary;
use crate::config::PipelineConfig;
use crate::discovery::{DiscoveryError, FileCategory, FileDiscovery};
use crate::engine::InferenceEngine;
use crate::manifest::{self, DependencyMap};
use crate::pipeline::{Pipeline, PipelineError};

const SYSTEM_OVERVIEW_PROMPT: &str = "You are a senior software architect analyzing a codebase. \
    The code could be in any programming language. Provide a high-level overview of the system.";

const FUNCTIONAL_REQUIREMENTS_PROMPT: &str = "Extract and list all functional requirements \
    from the codebase. The code could be in any programming language.";

const TECHNICAL_ARCHITECTURE_PROMPT: &str = "Analyze the technical architecture and design \
    patterns used in the codebase. The code could be in any programming language.";

const DATA_MODELS_PROMPT: &str = "Extract and document all data models and their relationships. \
    The code could be in any programming language.";

const API_SPECIFICATIONS_PROMPT: &str = "Document all API endpoints, their purposes, and \
    specifications. The code could be in any programming language.";

const SECURITY_REQUIREMENTS_PROMPT: &str = "Identify and document security requirements and \
    potential security concerns. The code could be in any programming language.";

/// One summary per analysis category, plus the parsed dependency map.
#[derive(Debug)]
pub struct AnalysisResults {
    pub system_overview: Summary,
    pub functional_requirements: Summary,
    pub technical_architecture: Summary,
    pub dependencies: DependencyMap,
    pub data_models: Summary,
    pub api_specifications: Summary,
    pub security_requirements: Summary,
}

/// Hard failures of a whole analysis run.
#[derive(Debug, Error, Diagnostic)]
pub enum AnalyzerError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A category's pipeline failed outright; the run does not continue
    /// with a partial document.
    #[error("analysis of {category} failed")]
    #[diagnostic(code(reqsmith::analyzer::category_failed))]
    Category {
        category: &'static str,
        #[source]
        #[diagnostic_source]
        source: PipelineError,
    },
}

/// Drives the analysis categories over one repository.
pub struct Analyzer {
    discovery: FileDiscovery,
    pipeline: Pipeline,
}

impl Analyzer {
    pub fn new(
        repo_path: impl AsRef<Path>,
        engine: Arc<dyn InferenceEngine>,
        config: PipelineConfig,
    ) -> Result<Self, AnalyzerError> {
        Ok(Self {
            discovery: FileDiscovery::new(repo_path)?,
            pipeline: Pipeline::new(engine, config),
        })
    }

    /// Run every category and collect the results.
    #[instrument(skip_all, fields(repo = %self.discovery.root().display()))]
    pub async fn analyze(&self) -> Result<AnalysisResults, AnalyzerError> {
        let dependency_files = self.discovery.files(FileCategory::Dependency);
        let dependencies = manifest::parse_manifests(&dependency_files).await;

        Ok(AnalysisResults {
            system_overview: self
                .run_category("system overview", &[FileCategory::Main], SYSTEM_OVERVIEW_PROMPT)
                .await?,
            functional_requirements: self
                .run_category(
                    "functional requirements",
                    &[FileCategory::Source],
                    FUNCTIONAL_REQUIREMENTS_PROMPT,
                )
                .await?,
            technical_architecture: self
                .run_category(
                    "technical architecture",
                    &[FileCategory::Source],
                    TECHNICAL_ARCHITECTURE_PROMPT,
                )
                .await?,
            dependencies,
            data_models: self
                .run_category("data models", &[FileCategory::Model], DATA_MODELS_PROMPT)
                .await?,
            api_specifications: self
                .run_category(
                    "API specifications",
                    &[FileCategory::Route],
                    API_SPECIFICATIONS_PROMPT,
                )
                .await?,
            security_requirements: self
                .run_category(
                    "security requirements",
                    &[FileCategory::Source, FileCategory::Config],
                    SECURITY_REQUIREMENTS_PROMPT,
                )
                .await?,
        })
    }

    async fn run_category(
        &self,
        category: &'static str,
        file_categories: &[FileCategory],
        prompt: &str,
    ) -> Result<Summary, AnalyzerError> {
        info!(category, "analyzing");
        let blobs = self.discovery.collect_blobs(file_categories).await;
        self.pipeline
            .run(&blobs, prompt)
            .await
            .map_err(|source| AnalyzerError::Category { category, source })
    }
}
