pub mod fetch;

pub use fetch::RegistryClient;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RegistrySpec;
use crate::matcher::{self, SearchResult};
use crate::record::SkillRecord;

pub const CATALOG_VERSION: &str = "1";

/// Snapshot of the merged external registries. Loaded from disk at startup,
/// replaced wholesale on refresh, never partially mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub version: String,
    pub updated: DateTime<Utc>,
    pub skills: BTreeMap<String, SkillRecord>,
}

impl Catalog {
    pub fn new(skills: BTreeMap<String, SkillRecord>) -> Self {
        Self {
            version: CATALOG_VERSION.to_string(),
            updated: Utc::now(),
            skills,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("Catalog cache not found. Run 'skillscout refresh' to build it.")
            } else {
                anyhow::anyhow!("Failed to read catalog from {}: {}", path.display(), e)
            }
        })?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog from {}", path.display()))
    }

    /// Whole-file overwrite via temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self)
            .with_context(|| "Failed to serialize catalog to JSON")?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write catalog to {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace catalog at {}", path.display()))?;

        Ok(())
    }

    pub fn count(&self) -> usize {
        self.skills.len()
    }

    pub fn get(&self, name: &str) -> Option<&SkillRecord> {
        self.skills.get(name).or_else(|| {
            self.skills
                .values()
                .find(|s| s.name.eq_ignore_ascii_case(name))
        })
    }

    /// All records scoring above zero against the query, ranked.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .skills
            .values()
            .filter_map(|record| {
                let score = matcher::score(record, query);
                (score > 0.0).then(|| SearchResult {
                    record: record.clone(),
                    score,
                })
            })
            .collect();

        matcher::rank(&mut results, query);
        results
    }
}

/// Merge per-registry record batches by name. Batches are applied in
/// ascending priority so the highest priority wins each collision,
/// independent of fetch order.
pub fn merge_by_priority(mut batches: Vec<(u32, Vec<SkillRecord>)>) -> BTreeMap<String, SkillRecord> {
    batches.sort_by_key(|(priority, _)| *priority);

    let mut merged = BTreeMap::new();
    for (_, records) in batches {
        for record in records {
            merged.insert(record.name.clone(), record);
        }
    }

    merged
}

/// The external catalog source: a cache file on disk plus the loaded
/// snapshot. Unloaded until `load` or `refresh` succeeds.
pub struct ExternalCatalog {
    cache_path: PathBuf,
    catalog: Option<Catalog>,
}

impl ExternalCatalog {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            catalog: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.is_some()
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn count(&self) -> usize {
        self.catalog.as_ref().map(Catalog::count).unwrap_or(0)
    }

    pub fn load(&mut self) -> Result<usize> {
        let catalog = Catalog::load(&self.cache_path)?;
        let count = catalog.count();
        self.catalog = Some(catalog);
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<&SkillRecord> {
        self.catalog.as_ref()?.get(name)
    }

    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        self.catalog
            .as_ref()
            .map(|c| c.search(query))
            .unwrap_or_default()
    }

    /// Re-index all registries, merge by priority, and overwrite the cache.
    /// A failed registry contributes nothing; the rest are still written.
    pub async fn refresh(
        &mut self,
        client: &RegistryClient,
        registries: &[RegistrySpec],
    ) -> Result<usize> {
        let mut batches = Vec::new();

        for registry in registries {
            match client.index_registry(registry).await {
                Ok(records) => {
                    tracing::info!(
                        registry = %registry.name,
                        indexed = records.len(),
                        "Registry indexed"
                    );
                    batches.push((registry.priority, records));
                }
                Err(e) => {
                    tracing::warn!(registry = %registry.name, "Registry fetch failed: {}", e);
                }
            }
        }

        let catalog = Catalog::new(merge_by_priority(batches));
        catalog.save(&self.cache_path)?;

        let count = catalog.count();
        self.catalog = Some(catalog);
        Ok(count)
    }
}
