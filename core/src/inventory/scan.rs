use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::manifest::{MANIFEST_FILE, load_skill};
use crate::config::expand_root;
use crate::record::SkillRecord;

/// Installed skills discovered under an ordered list of root directories.
/// Earlier roots take precedence on name collision.
pub struct LocalInventory {
    roots: Vec<PathBuf>,
    skills: HashMap<String, SkillRecord>,
}

impl LocalInventory {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            skills: HashMap::new(),
        }
    }

    pub fn scan(&mut self) -> Result<usize> {
        self.skills.clear();

        let mut loaded = 0;
        let mut skipped = 0;

        for root in &self.roots {
            let root = expand_root(root);

            if !root.exists() {
                tracing::debug!("Skill root does not exist: {}", root.display());
                continue;
            }

            let entries = fs::read_dir(&root)
                .with_context(|| format!("Failed to read skill root: {}", root.display()))?;

            for entry in entries {
                let entry = entry?;
                let path = entry.path();

                if !path.is_dir() || !path.join(MANIFEST_FILE).exists() {
                    continue;
                }

                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown");

                if is_unsafe_skill_name(name) {
                    tracing::warn!("Skipping unsafe skill name: {}", name);
                    skipped += 1;
                    continue;
                }

                match load_skill(&path) {
                    Ok(skill) => {
                        if self.skills.contains_key(&skill.name) {
                            tracing::debug!(
                                "Skill '{}' shadowed by an earlier root, skipping {}",
                                skill.name,
                                path.display()
                            );
                            skipped += 1;
                        } else {
                            self.skills.insert(skill.name.clone(), skill);
                            loaded += 1;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load skill '{}': {}", name, e);
                        skipped += 1;
                    }
                }
            }
        }

        tracing::info!(loaded, skipped, "Local skills scanned");

        Ok(loaded)
    }

    /// All records, name-sorted for stable output.
    pub fn list(&self) -> Vec<SkillRecord> {
        let mut skills: Vec<SkillRecord> = self.skills.values().cloned().collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        skills
    }

    pub fn get(&self, name: &str) -> Option<&SkillRecord> {
        self.skills
            .get(name)
            .or_else(|| {
                self.skills
                    .values()
                    .find(|s| s.name.eq_ignore_ascii_case(name))
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn count(&self) -> usize {
        self.skills.len()
    }
}

/// Count of immediate subdirectories holding a manifest, without parsing.
pub fn manifest_count(root: &Path) -> usize {
    match fs::read_dir(root) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                let path = e.path();
                path.is_dir() && path.join(MANIFEST_FILE).exists()
            })
            .count(),
        Err(_) => 0,
    }
}

fn is_unsafe_skill_name(name: &str) -> bool {
    name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
        || name.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_skill(root: &Path, dir: &str, body: &str) {
        let skill_dir = root.join(dir);
        fs::create_dir_all(&skill_dir).unwrap();
        fs::write(skill_dir.join("SKILL.md"), body).unwrap();
    }

    #[test]
    fn scan_loads_skills() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "skill1", "# skill1\nFirst skill\n");
        write_skill(tmp.path(), "skill2", "# skill2\nSecond skill\n");

        let mut inventory = LocalInventory::new(vec![tmp.path().to_path_buf()]);
        assert_eq!(inventory.scan().unwrap(), 2);
        assert!(inventory.contains("skill1"));
        assert!(inventory.contains("skill2"));
    }

    #[test]
    fn earlier_root_wins_name_collision() {
        let high = TempDir::new().unwrap();
        let low = TempDir::new().unwrap();
        write_skill(high.path(), "dup", "---\nname: dup\ndescription: High priority\n---\n");
        write_skill(low.path(), "dup", "---\nname: dup\ndescription: Low priority\n---\n");

        let mut inventory =
            LocalInventory::new(vec![high.path().to_path_buf(), low.path().to_path_buf()]);
        assert_eq!(inventory.scan().unwrap(), 1);
        assert_eq!(inventory.get("dup").unwrap().description, "High priority");
    }

    #[test]
    fn missing_root_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "only", "# only\nThe only skill\n");

        let mut inventory = LocalInventory::new(vec![
            PathBuf::from("/nonexistent/skill/root"),
            tmp.path().to_path_buf(),
        ]);
        assert_eq!(inventory.scan().unwrap(), 1);
    }

    #[test]
    fn malformed_manifest_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "good", "# good\nWorks fine\n");
        write_skill(tmp.path(), "broken", "\n\n\n");

        let mut inventory = LocalInventory::new(vec![tmp.path().to_path_buf()]);
        assert_eq!(inventory.scan().unwrap(), 1);
        assert!(!inventory.contains("broken"));
    }

    #[test]
    fn directory_without_manifest_is_ignored() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("not-a-skill")).unwrap();

        let mut inventory = LocalInventory::new(vec![tmp.path().to_path_buf()]);
        assert_eq!(inventory.scan().unwrap(), 0);
    }

    #[test]
    fn unsafe_names_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "..bad", "# bad\nUnsafe\n");

        let mut inventory = LocalInventory::new(vec![tmp.path().to_path_buf()]);
        assert_eq!(inventory.scan().unwrap(), 0);
    }

    #[test]
    fn get_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "pdf-tools", "# pdf-tools\nWork with PDFs\n");

        let mut inventory = LocalInventory::new(vec![tmp.path().to_path_buf()]);
        inventory.scan().unwrap();
        assert!(inventory.get("PDF-Tools").is_some());
    }

    #[test]
    fn manifest_count_ignores_plain_dirs() {
        let tmp = TempDir::new().unwrap();
        write_skill(tmp.path(), "one", "# one\nA skill\n");
        fs::create_dir_all(tmp.path().join("empty")).unwrap();

        assert_eq!(manifest_count(tmp.path()), 1);
        assert_eq!(manifest_count(Path::new("/nonexistent")), 0);
    }
}
