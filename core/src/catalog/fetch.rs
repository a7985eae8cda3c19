use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::RegistrySpec;
use crate::inventory::manifest::{MANIFEST_FILE, parse_manifest};
use crate::record::SkillRecord;

const GITHUB_API: &str = "https://api.github.com";
const RAW_GITHUB: &str = "https://raw.githubusercontent.com";
const USER_AGENT: &str = "skillscout/0.1";

/// Repo directories that never hold skills.
const NON_SKILL_DIRS: &[&str] = &["docs", "examples", "tests", "scripts", "assets"];

const KEYWORD_LIMIT: usize = 15;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do",
    "does", "did", "will", "would", "to", "of", "in", "for", "on", "with", "at", "by", "from",
    "and", "but", "if", "or", "this", "that", "use", "using", "claude", "skill", "skills",
    "can", "your", "you",
];

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "document-processing",
        &["docx", "pdf", "pptx", "xlsx", "document", "spreadsheet", "word", "excel"],
    ),
    (
        "development",
        &["code", "git", "debug", "test", "build", "deploy", "api", "mcp", "plugin"],
    ),
    (
        "data-analysis",
        &["data", "csv", "analyze", "chart", "visualization", "query", "database"],
    ),
    (
        "creative",
        &["design", "image", "art", "canvas", "gif", "video", "theme", "brand"],
    ),
    (
        "communication",
        &["email", "slack", "meeting", "write", "content", "comms"],
    ),
    (
        "productivity",
        &["organize", "file", "invoice", "calendar", "task", "workflow", "automate"],
    ),
    ("research", &["research", "search", "web", "scrape", "extract"]),
    (
        "security",
        &["security", "forensic", "threat", "vulnerability", "audit"],
    ),
];

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

pub struct RegistryClient {
    client: reqwest::Client,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Request to {} returned {}", url, response.status());
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))
    }

    /// Top-level directories of the registry repo, i.e. candidate skills.
    pub async fn list_skill_dirs(&self, registry: &RegistrySpec) -> Result<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/contents?ref={}",
            GITHUB_API, registry.owner, registry.repo, registry.branch
        );
        let body = self.fetch_text(&url).await?;
        parse_listing(&body)
    }

    /// Fetch and parse every candidate directory's manifest into external
    /// records tagged with this registry. Directories without a usable
    /// manifest are skipped.
    pub async fn index_registry(&self, registry: &RegistrySpec) -> Result<Vec<SkillRecord>> {
        let dirs = self.list_skill_dirs(registry).await?;
        let mut records = Vec::new();

        for dir in dirs {
            let manifest_url = format!(
                "{}/{}/{}/{}/{}/{}",
                RAW_GITHUB, registry.owner, registry.repo, registry.branch, dir, MANIFEST_FILE
            );

            let content = match self.fetch_text(&manifest_url).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::debug!("No manifest under '{}': {}", dir, e);
                    continue;
                }
            };

            match parse_manifest(&content) {
                Ok(manifest) => {
                    records.push(build_record(registry, &dir, manifest, manifest_url));
                }
                Err(e) => {
                    tracing::warn!("Skipping '{}' in {}: {}", dir, registry.name, e);
                }
            }
        }

        Ok(records)
    }
}

pub fn parse_listing(body: &str) -> Result<Vec<String>> {
    let entries: Vec<ContentsEntry> =
        serde_json::from_str(body).context("Failed to parse registry listing")?;

    Ok(entries
        .into_iter()
        .filter(|e| e.kind == "dir")
        .map(|e| e.name)
        .filter(|name| !name.starts_with('.') && !NON_SKILL_DIRS.contains(&name.as_str()))
        .collect())
}

fn build_record(
    registry: &RegistrySpec,
    dir: &str,
    manifest: crate::inventory::Manifest,
    manifest_url: String,
) -> SkillRecord {
    let category = manifest
        .category
        .clone()
        .or_else(|| categorize(&manifest.name, &manifest.description));

    let keywords = if manifest.tags.is_empty() {
        extract_keywords(&format!("{} {}", manifest.name, manifest.description))
    } else {
        manifest.tags.clone()
    };

    let mut record = SkillRecord::external(manifest.name, manifest.description, &registry.name)
        .with_url(format!("{}/tree/{}/{}", registry.url(), registry.branch, dir))
        .with_manifest_url(manifest_url)
        .with_keywords(keywords);
    record.category = category;
    record
}

/// First matching entry of the fixed category table, if any.
pub fn categorize(name: &str, description: &str) -> Option<String> {
    let text = format!("{} {}", name, description).to_lowercase();

    CATEGORIES
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| text.contains(m)))
        .map(|(category, _)| category.to_string())
}

/// Lowercased words of three or more letters, stopwords removed, first
/// occurrence kept, capped at KEYWORD_LIMIT.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut keywords = Vec::new();

    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| w.len() >= 3)
    {
        if STOPWORDS.contains(&word) || keywords.iter().any(|k| k == word) {
            continue;
        }
        keywords.push(word.to_string());
        if keywords.len() >= KEYWORD_LIMIT {
            break;
        }
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_listing_keeps_candidate_dirs_only() {
        let body = r#"[
            {"name": "invoice-organizer", "type": "dir"},
            {"name": "docs", "type": "dir"},
            {"name": ".github", "type": "dir"},
            {"name": "README.md", "type": "file"}
        ]"#;

        let dirs = parse_listing(body).unwrap();
        assert_eq!(dirs, vec!["invoice-organizer"]);
    }

    #[test]
    fn parse_listing_rejects_garbage() {
        assert!(parse_listing("not json").is_err());
    }

    #[test]
    fn categorize_uses_first_matching_entry() {
        assert_eq!(
            categorize("invoice-organizer", "Organize invoices").as_deref(),
            Some("productivity")
        );
        assert_eq!(
            categorize("pdf-tools", "Split PDF files").as_deref(),
            Some("document-processing")
        );
        assert_eq!(categorize("mystery", "completely unclassifiable"), None);
    }

    #[test]
    fn extract_keywords_filters_stopwords_and_dedups() {
        let keywords = extract_keywords("Use the organizer to organize the invoices invoices");
        assert_eq!(keywords, vec!["organizer", "organize", "invoices"]);
    }

    #[test]
    fn extract_keywords_caps_at_limit() {
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliett \
                    kilo lima mike november oscar papa quebec romeo sierra tango";
        assert_eq!(extract_keywords(text).len(), KEYWORD_LIMIT);
    }
}
