//! Repository file discovery.
//!
//! Walks a repository and sorts files into the categories the analyzer
//! cares about: general source files, entry points, data-model files,
//! route/controller files, configuration files, and dependency manifests.
//! The category conventions are language-agnostic filename and directory
//! heuristics; analysis itself never depends on them being exhaustive.
//!
//! Discovered content is read into [`SourceBlob`]s with whitespace-only
//! and unreadable files dropped, so the pipeline downstream performs no
//! filtering of its own.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, warn};

use crate::segmenter::SourceBlob;

const SOURCE_EXTENSIONS: [&str; 19] = [
    "js", "ts", "jsx", "tsx", "py", "java", "cpp", "cs", "go", "rb", "php", "scala", "rs",
    "swift", "kt", "dart", "h", "c", "sql",
];

const CODE_EXTENSIONS: [&str; 17] = [
    "js", "ts", "jsx", "tsx", "py", "java", "cpp", "cs", "go", "rb", "php", "scala", "rs",
    "swift", "kt", "dart", "c",
];

const MAIN_STEMS: [&str; 5] = ["main", "index", "app", "program", "application"];

const MODEL_DIRS: [&str; 5] = ["models", "entities", "domain", "schemas", "types"];

const ROUTE_DIRS: [&str; 5] = ["routes", "controllers", "handlers", "endpoints", "apis"];

const CONFIG_DIRS: [&str; 3] = ["config", "settings", "configuration"];

const CONFIG_EXTENSIONS: [&str; 8] = [
    "json", "yaml", "yml", "xml", "ini", "env", "properties", "toml",
];

const DEPENDENCY_PATTERNS: [&str; 11] = [
    "package.json",
    "requirements.txt",
    "pom.xml",
    "build.gradle",
    "Gemfile",
    "composer.json",
    "Cargo.toml",
    "*.csproj",
    "go.mod",
    "pubspec.yaml",
    "Podfile",
];

/// Directories never descended into, regardless of gitignore state.
const IGNORED_DIRS: [&str; 8] = [
    "node_modules",
    "dist",
    "build",
    ".git",
    "bin",
    "obj",
    "target",
    "vendor",
];

/// Which slice of the repository an analysis category looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    /// Any recognized source file.
    Source,
    /// Entry-point files (main, index, app, ...).
    Main,
    /// Files under model/entity/schema directories.
    Model,
    /// Files under route/controller/handler directories.
    Route,
    /// Configuration files under config/settings directories.
    Config,
    /// Dependency manifests (package.json, Cargo.toml, ...).
    Dependency,
}

#[derive(Debug, Error, Diagnostic)]
pub enum DiscoveryError {
    #[error("invalid file pattern: {0}")]
    #[diagnostic(code(reqsmith::discovery::pattern))]
    Pattern(#[from] globset::Error),
}

/// Gitignore-aware walker that buckets repository files by category.
pub struct FileDiscovery {
    root: PathBuf,
    dependency_globs: GlobSet,
}

impl FileDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, DiscoveryError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEPENDENCY_PATTERNS {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            dependency_globs: builder.build()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All files in the repository matching `category`, sorted for
    /// reproducible runs.
    pub fn files(&self, category: FileCategory) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);
        builder.filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !IGNORED_DIRS.contains(&name))
        });

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                        continue;
                    }
                    let path = entry.path();
                    if self.matches(path, category) {
                        files.push(path.to_path_buf());
                    }
                }
                Err(error) => warn!(%error, "failed to read directory entry"),
            }
        }

        files.sort();
        debug!(?category, count = files.len(), "discovered files");
        files
    }

    /// Read every file in the given categories into blobs, in category
    /// then path order. Unreadable and whitespace-only files are dropped.
    pub async fn collect_blobs(&self, categories: &[FileCategory]) -> Vec<SourceBlob> {
        let mut blobs = Vec::new();
        for category in categories {
            for path in self.files(*category) {
                match tokio::fs::read_to_string(&path).await {
                    Ok(content) if content.trim().is_empty() => {}
                    Ok(content) => {
                        blobs.push(SourceBlob::new(content).with_origin(path.display().to_string()));
                    }
                    Err(error) => {
                        warn!(path = %path.display(), %error, "could not read file; skipping");
                    }
                }
            }
        }
        blobs
    }

    fn matches(&self, path: &Path, category: FileCategory) -> bool {
        match category {
            FileCategory::Source => has_extension(path, &SOURCE_EXTENSIONS),
            FileCategory::Main => {
                has_extension(path, &CODE_EXTENSIONS)
                    && path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .is_some_and(|stem| MAIN_STEMS.contains(&stem.to_lowercase().as_str()))
            }
            FileCategory::Model => {
                has_extension(path, &CODE_EXTENSIONS) && self.under_directory(path, &MODEL_DIRS)
            }
            FileCategory::Route => {
                has_extension(path, &CODE_EXTENSIONS) && self.under_directory(path, &ROUTE_DIRS)
            }
            FileCategory::Config => {
                has_extension(path, &CONFIG_EXTENSIONS) && self.under_directory(path, &CONFIG_DIRS)
            }
            FileCategory::Dependency => path
                .file_name()
                .is_some_and(|name| self.dependency_globs.is_match(name)),
        }
    }

    /// True when any ancestor directory of `path` (below the discovery
    /// root) has one of the given names.
    fn under_directory(&self, path: &Path, names: &[&str]) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        let Some(parent) = relative.parent() else {
            return false;
        };
        parent.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| names.contains(&name.to_lowercase().as_str()))
        })
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()))
}
