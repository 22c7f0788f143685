//! Whole-run behavior: discovery, per-category pipelines, manifest
//! parsing, and document rendering against a scratch repository.

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::MockEngine;
use tempfile::TempDir;

use reqsmith::analyzer::Analyzer;
use reqsmith::config::PipelineConfig;
use reqsmith::report::DocumentGenerator;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn scratch_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/main.rs", "fn main() { println!(\"svc\"); }\n");
    write(root, "src/models/user.rs", "pub struct User { id: u64 }\n");
    write(root, "routes/users.py", "def list_users(): pass\n");
    write(
        root,
        "package.json",
        "{\"dependencies\": {\"express\": \"^4.18.0\"}, \"devDependencies\": {\"jest\": \"^29.0.0\"}}\n",
    );
    dir
}

fn fast_config() -> PipelineConfig {
    PipelineConfig::default().with_rate_limit_delay(Duration::ZERO)
}

#[tokio::test]
async fn analysis_covers_every_category() {
    let repo = scratch_repo();
    let engine = Arc::new(MockEngine::new());
    let analyzer = Analyzer::new(repo.path(), engine.clone(), fast_config()).unwrap();

    let results = analyzer.analyze().await.unwrap();

    assert!(results.system_overview.is_content());
    assert!(results.functional_requirements.is_content());
    assert!(results.technical_architecture.is_content());
    assert!(results.data_models.is_content());
    assert!(results.api_specifications.is_content());
    assert!(results.security_requirements.is_content());

    let node = results.dependencies.get("nodejs").unwrap();
    assert_eq!(node.get("express").map(String::as_str), Some("^4.18.0"));
    assert_eq!(node.get("jest").map(String::as_str), Some("^29.0.0"));

    // Six LLM categories, each one chunk call plus one reduction call.
    assert_eq!(engine.calls(), 12);
}

#[tokio::test]
async fn repo_without_analyzable_slices_yields_sentinels() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "docs/notes.md", "# notes\n");

    let engine = Arc::new(MockEngine::new());
    let analyzer = Analyzer::new(dir.path(), engine.clone(), fast_config()).unwrap();

    let results = analyzer.analyze().await.unwrap();

    assert!(!results.system_overview.is_content());
    assert!(!results.security_requirements.is_content());
    assert!(results.dependencies.is_empty());
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn rendered_document_reflects_the_analysis() {
    let repo = scratch_repo();
    let engine = Arc::new(MockEngine::new());
    let analyzer = Analyzer::new(repo.path(), engine, fast_config()).unwrap();
    let results = analyzer.analyze().await.unwrap();

    let output = repo.path().join("system_requirements_document.md");
    DocumentGenerator::new().write(&results, &output).await.unwrap();

    let rendered = fs::read_to_string(&output).unwrap();
    assert!(rendered.starts_with("# System Requirements Document"));
    assert!(rendered.contains("## 1. System Overview"));
    assert!(rendered.contains("## 4. Dependencies"));
    assert!(rendered.contains("\"express\": \"^4.18.0\""));
    assert!(rendered.contains("## 10. Deployment Requirements"));
}
