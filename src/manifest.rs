//! Dependency-manifest parsing.
//!
//! The dependencies section of the report is assembled by parsing
//! manifests directly instead of spending inference calls on them.
//! Parsers exist for the manifest formats that are cheap to read
//! structurally: `package.json`, `requirements.txt`, and `Gemfile`.
//! Other discovered manifests are noted at debug level and skipped.
//!
//! Maps are ordered so the rendered document is stable across runs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

/// Ecosystem name → dependency name → version.
pub type DependencyMap = BTreeMap<String, BTreeMap<String, String>>;

const VERSION_UNKNOWN: &str = "latest";

#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
}

/// Parse every supported manifest among `paths` into one dependency map.
///
/// Unreadable or malformed manifests are logged and skipped; they never
/// fail the analysis.
pub async fn parse_manifests(paths: &[PathBuf]) -> DependencyMap {
    let mut map = DependencyMap::new();

    for path in paths {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(error) => {
                warn!(path = %path.display(), %error, "could not read manifest; skipping");
                continue;
            }
        };

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match file_name.as_str() {
            "package.json" => match parse_package_json(&content) {
                Ok(deps) => merge(&mut map, "nodejs", deps),
                Err(error) => {
                    warn!(path = %path.display(), %error, "could not parse package.json");
                }
            },
            "requirements.txt" => merge(&mut map, "python", parse_requirements(&content)),
            "gemfile" => merge(&mut map, "ruby", parse_gemfile(&content)),
            _ => debug!(path = %path.display(), "no structural parser for manifest"),
        }
    }

    map
}

fn merge(map: &mut DependencyMap, ecosystem: &str, deps: BTreeMap<String, String>) {
    if deps.is_empty() {
        return;
    }
    map.entry(ecosystem.to_string()).or_default().extend(deps);
}

fn parse_package_json(content: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    let parsed: PackageJson = serde_json::from_str(content)?;
    let mut deps = parsed.dependencies;
    deps.extend(parsed.dev_dependencies);
    Ok(deps)
}

/// `name==version` lines; comments and blank lines skipped; a bare name
/// maps to "latest".
fn parse_requirements(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.splitn(2, "==");
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let version = parts
                .next()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(VERSION_UNKNOWN);
            Some((name.to_string(), version.to_string()))
        })
        .collect()
}

/// `gem 'name', 'version'` lines; the first quoted token is the name, the
/// second (when present) the version.
fn parse_gemfile(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("gem"))
        .filter_map(|line| {
            let mut quoted = quoted_tokens(line);
            let name = quoted.next()?;
            let version = quoted.next().unwrap_or_else(|| VERSION_UNKNOWN.to_string());
            Some((name, version))
        })
        .collect()
}

/// Tokens enclosed in single or double quotes, in order of appearance.
fn quoted_tokens(line: &str) -> impl Iterator<Item = String> + '_ {
    let mut rest = line;
    std::iter::from_fn(move || {
        let open = rest.find(['\'', '"'])?;
        let quote = rest[open..].chars().next()?;
        let after_open = &rest[open + quote.len_utf8()..];
        let close = after_open.find(quote)?;
        let token = after_open[..close].to_string();
        rest = &after_open[close + quote.len_utf8()..];
        Some(token)
    })
}

/// Render the dependency map as pretty JSON for the report.
pub fn render_json(map: &DependencyMap) -> String {
    serde_json::to_string_pretty(map).unwrap_or_else(|_| "{}".to_string())
}
