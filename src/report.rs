//! System Requirements Document assembly.
//!
//! Renders [`AnalysisResults`] into a markdown document and persists it.
//! Sections whose analysis came back empty are omitted entirely; the
//! guideline trailer sections only appear when the document has real
//! content to anchor them.

use std::path::Path;

use chrono::Utc;
use miette::Diagnostic;
use thiserror::Error;
use tracing::info;

use crate::aggregator::Summary;
use crate::analyzer::AnalysisResults;
use crate::manifest;

/// Default output file name, relative to the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "system_requirements_document.md";

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("failed to write report to {path}")]
    #[diagnostic(code(reqsmith::report::write))]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Markdown renderer and writer for the analysis results.
#[derive(Debug, Default)]
pub struct DocumentGenerator;

impl DocumentGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Render the full document.
    pub fn render(&self, results: &AnalysisResults) -> String {
        let mut sections: Vec<String> = Vec::new();

        sections.push("# System Requirements Document".to_string());
        sections.push(format!("Generated on: {}\n", Utc::now().to_rfc3339()));

        push_summary(&mut sections, "## 1. System Overview", &results.system_overview);
        push_summary(
            &mut sections,
            "## 2. Functional Requirements",
            &results.functional_requirements,
        );
        push_summary(
            &mut sections,
            "## 3. Technical Architecture",
            &results.technical_architecture,
        );

        if !results.dependencies.is_empty() {
            sections.push("## 4. Dependencies".to_string());
            sections.push("```json".to_string());
            sections.push(manifest::render_json(&results.dependencies));
            sections.push("```\n".to_string());
        }

        push_summary(&mut sections, "## 5. Data Models", &results.data_models);
        push_summary(
            &mut sections,
            "## 6. API Specifications",
            &results.api_specifications,
        );
        push_summary(
            &mut sections,
            "## 7. Security Requirements",
            &results.security_requirements,
        );

        // Header and timestamp alone mean nothing was found; skip the
        // boilerplate trailer in that case.
        if sections.len() > 2 {
            self.push_trailer(&mut sections, results);
        }

        sections.join("\n")
    }

    fn push_trailer(&self, sections: &mut Vec<String>, results: &AnalysisResults) {
        sections.push("## 8. Implementation Guidelines".to_string());
        sections.push(
            "- The system should be implemented following the architecture and patterns described above"
                .to_string(),
        );
        if results.security_requirements.is_content() {
            sections.push("- All security requirements must be strictly followed".to_string());
        }
        if results.api_specifications.is_content() {
            sections
                .push("- API implementations should adhere to the specifications provided".to_string());
        }
        if results.data_models.is_content() {
            sections.push("- Data models should be implemented as documented".to_string());
        }
        if !results.dependencies.is_empty() {
            sections.push(
                "- Dependencies should be kept up to date and security patches applied promptly"
                    .to_string(),
            );
        }
        sections.push(String::new());

        sections.push("## 9. Testing Requirements".to_string());
        sections.push("- Unit tests should be written for all components".to_string());
        if results.api_specifications.is_content() {
            sections.push("- Integration tests should cover API endpoints".to_string());
        }
        if results.security_requirements.is_content() {
            sections.push("- Security testing should be performed regularly".to_string());
        }
        sections.push("- Performance testing should be conducted under expected load\n".to_string());

        sections.push("## 10. Deployment Requirements".to_string());
        sections.push("- CI/CD pipeline should be implemented".to_string());
        sections.push(
            "- Environment-specific configurations should be managed through environment variables"
                .to_string(),
        );
        sections.push("- Logging and monitoring should be implemented".to_string());
        sections.push("- Regular backups should be configured where applicable".to_string());
    }

    /// Render and persist the document.
    pub async fn write(
        &self,
        results: &AnalysisResults,
        path: impl AsRef<Path>,
    ) -> Result<(), ReportError> {
        let path = path.as_ref();
        let content = self.render(results);
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ReportError::Write {
                path: path.display().to_string(),
                source,
            })?;
        info!(path = %path.display(), "report written");
        Ok(())
    }
}

fn push_summary(sections: &mut Vec<String>, heading: &str, summary: &Summary) {
    if let Summary::Text(text) = summary {
        sections.push(heading.to_string());
        sections.push(format!("{text}\n"));
    }
}
