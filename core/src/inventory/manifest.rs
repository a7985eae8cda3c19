use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::record::SkillRecord;

pub const MANIFEST_FILE: &str = "SKILL.md";

#[derive(Debug, Deserialize)]
struct FrontMatter {
    name: String,
    description: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Declared skill metadata, independent of which source it came from.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

pub fn load_skill(skill_dir: &Path) -> Result<SkillRecord> {
    let md_path = skill_dir.join(MANIFEST_FILE);

    let content = fs::read_to_string(&md_path)
        .with_context(|| format!("Failed to read {}", md_path.display()))?;

    let manifest = parse_manifest(&content)
        .with_context(|| format!("Malformed manifest at {}", md_path.display()))?;

    let mut record = SkillRecord::local(manifest.name, manifest.description, skill_dir)
        .with_keywords(manifest.tags);
    record.category = manifest.category;

    Ok(record)
}

/// Parse a SKILL.md: YAML frontmatter when present, otherwise the first
/// heading as name and the first non-heading line as description. Missing
/// name or description is an error; callers skip the directory.
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    if let Some(frontmatter_str) = front_matter_block(content)
        && let Ok(frontmatter) = serde_yaml::from_str::<FrontMatter>(&frontmatter_str)
    {
        if frontmatter.name.trim().is_empty() || frontmatter.description.trim().is_empty() {
            anyhow::bail!("Manifest frontmatter has empty name or description");
        }
        return Ok(Manifest {
            name: frontmatter.name,
            description: frontmatter.description,
            category: frontmatter.category,
            tags: frontmatter.tags,
        });
    }

    let name = content
        .lines()
        .find(|l| l.starts_with('#'))
        .map(|l| l.trim_start_matches('#').trim().to_string())
        .unwrap_or_default();

    let description = content
        .lines()
        .find(|l| !(l.starts_with('#') || l.starts_with("---") || l.trim().is_empty()))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    if name.is_empty() || description.is_empty() {
        anyhow::bail!("Manifest declares no name or description");
    }

    Ok(Manifest {
        name,
        description,
        category: None,
        tags: vec![],
    })
}

fn front_matter_block(content: &str) -> Option<String> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.len() >= 3 && lines[0].trim() == "---" {
        let closing_index = lines[1..].iter().position(|l| l.trim() == "---");

        if let Some(pos) = closing_index {
            return Some(lines[1..=pos].join("\n"));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SkillSource;
    use tempfile::TempDir;

    #[test]
    fn parse_frontmatter_manifest() {
        let manifest = parse_manifest(
            "---\nname: invoice-organizer\ndescription: Organize invoices and receipts\ncategory: productivity\ntags:\n  - invoices\n---\n\n# Invoice Organizer\n",
        )
        .unwrap();

        assert_eq!(manifest.name, "invoice-organizer");
        assert_eq!(manifest.description, "Organize invoices and receipts");
        assert_eq!(manifest.category.as_deref(), Some("productivity"));
        assert_eq!(manifest.tags, vec!["invoices"]);
    }

    #[test]
    fn parse_heading_fallback() {
        let manifest = parse_manifest("# PDF Tools\nSplit and merge PDF files.\n").unwrap();
        assert_eq!(manifest.name, "PDF Tools");
        assert_eq!(manifest.description, "Split and merge PDF files.");
        assert!(manifest.category.is_none());
    }

    #[test]
    fn manifest_without_name_is_rejected() {
        assert!(parse_manifest("").is_err());
        assert!(parse_manifest("just some text with no heading\n").is_err());
        assert!(parse_manifest("# heading-only\n").is_err());
    }

    #[test]
    fn frontmatter_with_empty_description_is_rejected() {
        assert!(parse_manifest("---\nname: x\ndescription: \"\"\n---\n").is_err());
    }

    #[test]
    fn load_skill_builds_local_record() {
        let tmp = TempDir::new().unwrap();
        let skill_dir = tmp.path().join("test-skill");
        fs::create_dir_all(&skill_dir).unwrap();

        fs::write(
            skill_dir.join("SKILL.md"),
            "# Test Skill\nThis is a test description.\n",
        )
        .unwrap();

        let record = load_skill(&skill_dir).unwrap();
        assert_eq!(record.name, "Test Skill");
        assert_eq!(record.description, "This is a test description.");
        assert_eq!(record.source, SkillSource::Local);
        assert_eq!(record.path.as_deref(), Some(skill_dir.as_path()));
    }

    #[test]
    fn load_skill_without_manifest_fails() {
        let tmp = TempDir::new().unwrap();
        let skill_dir = tmp.path().join("empty");
        fs::create_dir_all(&skill_dir).unwrap();

        assert!(load_skill(&skill_dir).is_err());
    }
}
