use anyhow::Result;
use serde::Serialize;

use crate::catalog::{ExternalCatalog, RegistryClient};
use crate::config::{Config, RegistrySpec, expand_root, save_config};
use crate::inventory::{LocalInventory, manifest_count};
use crate::matcher::{self, MAX_SCORE, SUBSTRING_SCORE, SearchResult, TOKEN_BAND};
use crate::record::{SkillRecord, SkillSource};

/// Recommendations below this confidence are withheld.
pub const MIN_CONFIDENCE: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub local_only: bool,
    pub external_only: bool,
    pub top_n: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            local_only: false,
            external_only: false,
            top_n: 10,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub local: Vec<SearchResult>,
    pub external: Vec<SearchResult>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.external.is_empty()
    }
}

#[derive(Debug, Serialize)]
pub struct SkillHit {
    #[serde(flatten)]
    pub record: SkillRecord,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub record: SkillRecord,
    pub confidence: f64,
    pub rationale: String,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub kind: String,
    pub name: String,
    pub location: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<usize>,
}

/// Search over both sources. Scans the inventory and loads the catalog
/// lazily, once; a missing catalog degrades to an empty external bucket.
pub struct UnifiedSearch {
    config: Config,
    inventory: LocalInventory,
    external: ExternalCatalog,
    local_scanned: bool,
    external_loaded: bool,
}

impl UnifiedSearch {
    pub fn new(config: Config) -> Self {
        let inventory = LocalInventory::new(config.local_roots.clone());
        let external = ExternalCatalog::new(config.cache_path.clone());

        Self {
            config,
            inventory,
            external,
            local_scanned: false,
            external_loaded: false,
        }
    }

    fn ensure_local_scanned(&mut self) {
        if !self.local_scanned {
            if let Err(e) = self.inventory.scan() {
                tracing::warn!("Local skill scan failed: {}", e);
            }
            self.local_scanned = true;
        }
    }

    fn ensure_external_loaded(&mut self) {
        if !self.external_loaded {
            if let Err(e) = self.external.load() {
                tracing::warn!("External catalog unavailable: {}", e);
            }
            self.external_loaded = true;
        }
    }

    pub fn search(&mut self, query: &str, options: &SearchOptions) -> SearchResults {
        // Both flags contradict each other; treat as a full search.
        let (local_only, external_only) = if options.local_only && options.external_only {
            (false, false)
        } else {
            (options.local_only, options.external_only)
        };

        let mut local = Vec::new();
        if !external_only {
            self.ensure_local_scanned();
            local = score_records(self.inventory.list(), query);
            local.truncate(options.top_n);
        }

        let mut external = Vec::new();
        if !local_only {
            self.ensure_external_loaded();
            external = self.external.search(query);
            external.truncate(options.top_n);
        }

        SearchResults {
            query: query.to_string(),
            local,
            external,
        }
    }

    /// Case-insensitive lookup, local first.
    pub fn get(&mut self, name: &str) -> Option<SkillHit> {
        self.ensure_local_scanned();
        if let Some(record) = self.inventory.get(name) {
            return Some(SkillHit {
                record: record.clone(),
                installed: true,
                install_command: None,
            });
        }

        self.ensure_external_loaded();
        let record = self.external.get(name)?.clone();
        let install_command = install_command(&record);

        Some(SkillHit {
            record,
            installed: false,
            install_command,
        })
    }

    /// Best match across both sources, or None when nothing clears the
    /// confidence gate.
    pub fn recommend(&mut self, task: &str) -> Option<Recommendation> {
        let results = self.search(task, &SearchOptions::default());

        let mut merged: Vec<SearchResult> =
            results.local.into_iter().chain(results.external).collect();
        matcher::rank(&mut merged, task);

        let best = merged.first()?.clone();
        let confidence = best.score / MAX_SCORE;
        if confidence < MIN_CONFIDENCE {
            return None;
        }

        let alternatives = merged
            .iter()
            .skip(1)
            .take(3)
            .map(|r| r.record.name.clone())
            .collect();

        let installed = best.record.source == SkillSource::Local;
        let install_command = if installed {
            None
        } else {
            install_command(&best.record)
        };

        Some(Recommendation {
            rationale: rationale(&best, task),
            confidence,
            installed,
            install_command,
            alternatives,
            record: best.record,
        })
    }

    pub async fn refresh(&mut self) -> Result<usize> {
        let client = RegistryClient::new();
        let count = self
            .external
            .refresh(&client, &self.config.registries)
            .await?;
        self.external_loaded = true;
        Ok(count)
    }

    /// Append a registry for future refreshes and persist the config.
    pub fn add_registry(&mut self, spec: RegistrySpec) -> Result<()> {
        self.config.registries.push(spec);
        save_config(&self.config)
    }

    pub fn list_sources(&self) -> Vec<SourceInfo> {
        let mut sources = Vec::new();

        for root in &self.config.local_roots {
            let expanded = expand_root(root);
            let available = expanded.exists();
            sources.push(SourceInfo {
                kind: "local".to_string(),
                name: root.display().to_string(),
                location: expanded.display().to_string(),
                available,
                skills: available.then(|| manifest_count(&expanded)),
            });
        }

        for registry in &self.config.registries {
            sources.push(SourceInfo {
                kind: "registry".to_string(),
                name: registry.name.clone(),
                location: registry.url(),
                available: true,
                skills: None,
            });
        }

        sources
    }

    /// Cached catalog records, name-sorted, with optional filters.
    pub fn list_external(
        &mut self,
        source: Option<&str>,
        category: Option<&str>,
    ) -> Vec<SkillRecord> {
        self.ensure_external_loaded();

        let mut skills: Vec<SkillRecord> = self
            .external
            .catalog()
            .map(|c| c.skills.values().cloned().collect())
            .unwrap_or_default();

        if let Some(source) = source {
            skills.retain(|s| s.registry.as_deref() == Some(source));
        }
        if let Some(category) = category {
            skills.retain(|s| s.category.as_deref() == Some(category));
        }

        skills
    }
}

fn score_records(records: Vec<SkillRecord>, query: &str) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = records
        .into_iter()
        .filter_map(|record| {
            let score = matcher::score(&record, query);
            (score > 0.0).then(|| SearchResult { record, score })
        })
        .collect();

    matcher::rank(&mut results, query);
    results
}

pub fn install_command(record: &SkillRecord) -> Option<String> {
    if let Some(manifest_url) = &record.manifest_url {
        Some(format!(
            "curl -sL {} -o ~/.skillscout/skills/{}/SKILL.md --create-dirs",
            manifest_url, record.name
        ))
    } else {
        record.url.as_ref().map(|url| format!("# Visit: {}", url))
    }
}

fn rationale(result: &SearchResult, query: &str) -> String {
    if result.score >= MAX_SCORE {
        return "exact name match".to_string();
    }
    if result.score > TOKEN_BAND && result.score <= SUBSTRING_SCORE {
        return "query matches the skill name".to_string();
    }

    let query_tokens = matcher::tokenize(query);
    let mut pool = matcher::tokenize(&result.record.name);
    pool.extend(matcher::tokenize(&result.record.description));
    let matched = query_tokens.iter().filter(|t| pool.contains(*t)).count();

    format!("matched {} of {} query terms", matched, query_tokens.len())
}
