use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::record::{SkillRecord, SkillSource};

/// Scoring scale. The confidence denominator and the band boundaries are
/// assumptions of this scale, so they live here and nowhere else.
pub const MAX_SCORE: f64 = 100.0;
pub const SUBSTRING_SCORE: f64 = 80.0;
pub const SUBSTRING_PENALTY: f64 = 10.0;
pub const TOKEN_BAND: f64 = 60.0;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub record: SkillRecord,
    pub score: f64,
}

/// Case-fold, map `-`/`_` to spaces, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == '_' { ' ' } else { c })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn tokenize(text: &str) -> BTreeSet<String> {
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Relevance of one record against a query. Pure and deterministic.
///
/// Bands: exact normalized name equality scores MAX_SCORE; query as a
/// substring of the name scores (70, 80], penalized by how much longer the
/// name is than the query; otherwise token overlap against name and
/// description scales into [0, 60]. No overlap scores 0.
pub fn score(record: &SkillRecord, query: &str) -> f64 {
    let query_norm = normalize(query);
    if query_norm.is_empty() {
        return 0.0;
    }

    let name_norm = normalize(&record.name);
    if name_norm == query_norm {
        return MAX_SCORE;
    }

    if name_norm.contains(&query_norm) {
        let ratio = query_norm.len() as f64 / name_norm.len() as f64;
        return SUBSTRING_SCORE - SUBSTRING_PENALTY * (1.0 - ratio);
    }

    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }

    let mut pool = tokenize(&record.name);
    pool.extend(tokenize(&record.description));

    let overlap = query_tokens.iter().filter(|t| pool.contains(*t)).count();
    if overlap == 0 {
        0.0
    } else {
        TOKEN_BAND * overlap as f64 / query_tokens.len() as f64
    }
}

/// Sort by descending score, breaking ties by category match, shorter name,
/// local-before-external, then name.
pub fn rank(results: &mut [SearchResult], query: &str) {
    let query_tokens = tokenize(query);

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                category_hit(&b.record, &query_tokens).cmp(&category_hit(&a.record, &query_tokens))
            })
            .then_with(|| a.record.name.len().cmp(&b.record.name.len()))
            .then_with(|| source_rank(a.record.source).cmp(&source_rank(b.record.source)))
            .then_with(|| a.record.name.cmp(&b.record.name))
    });
}

fn category_hit(record: &SkillRecord, query_tokens: &BTreeSet<String>) -> bool {
    match &record.category {
        Some(category) => {
            let category_tokens = tokenize(category);
            query_tokens.iter().any(|t| category_tokens.contains(t))
        }
        None => false,
    }
}

fn source_rank(source: SkillSource) -> u8 {
    match source {
        SkillSource::Local => 0,
        SkillSource::External => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, description: &str) -> SkillRecord {
        SkillRecord::external(name, description, "test-registry")
    }

    fn result(name: &str, description: &str, score: f64) -> SearchResult {
        SearchResult {
            record: record(name, description),
            score,
        }
    }

    #[test]
    fn exact_name_match_scores_maximum() {
        let r = record("invoice-organizer", "Organize invoices and receipts");
        assert_eq!(score(&r, "invoice-organizer"), MAX_SCORE);
        assert_eq!(score(&r, "Invoice-Organizer"), MAX_SCORE);
        // Hyphen and space forms normalize to the same name.
        assert_eq!(score(&r, "invoice organizer"), MAX_SCORE);
    }

    #[test]
    fn exact_match_beats_any_substring_match() {
        let exact = record("pdf", "Portable documents");
        let containing = record("pdf-tools", "Split and merge PDF files");
        assert!(score(&exact, "pdf") > score(&containing, "pdf"));
    }

    #[test]
    fn substring_match_lands_in_high_band() {
        let r = record("pdf-tools", "Split and merge PDF files");
        let s = score(&r, "pdf");
        assert!(s > TOKEN_BAND && s < MAX_SCORE);
        assert!(s <= SUBSTRING_SCORE);
    }

    #[test]
    fn shorter_name_scores_higher_on_substring() {
        let short = record("pdf-kit", "PDFs");
        let long = record("pdf-processing-toolchain", "PDFs");
        assert!(score(&short, "pdf") > score(&long, "pdf"));
    }

    #[test]
    fn token_overlap_scales_with_matched_fraction() {
        let r = record("receipts", "Organize invoices and receipts by month");
        let half = score(&r, "invoices taxes");
        let full = score(&r, "invoices receipts");
        assert_eq!(half, TOKEN_BAND * 0.5);
        assert_eq!(full, TOKEN_BAND);
    }

    #[test]
    fn no_overlap_scores_zero() {
        let r = record("invoice-organizer", "Organize invoices and receipts");
        assert_eq!(score(&r, "xyzzy-nonexistent"), 0.0);
        assert_eq!(score(&r, ""), 0.0);
    }

    #[test]
    fn score_is_deterministic() {
        let r = record("chart-maker", "Draw charts from CSV data");
        let q = "csv charts";
        assert_eq!(score(&r, q), score(&r, q));
    }

    #[test]
    fn rank_orders_by_descending_score() {
        let mut results = vec![
            result("low", "nothing", 10.0),
            result("high", "nothing", 90.0),
            result("mid", "nothing", 50.0),
        ];
        rank(&mut results, "query");
        let names: Vec<&str> = results.iter().map(|r| r.record.name.as_str()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn equal_scores_prefer_shorter_name() {
        let mut results = vec![
            result("spreadsheet-organizer", "x", 60.0),
            result("sheets", "x", 60.0),
        ];
        rank(&mut results, "query");
        assert_eq!(results[0].record.name, "sheets");
    }

    #[test]
    fn equal_scores_prefer_category_match_first() {
        let mut results = vec![
            result("aaa", "x", 60.0),
            SearchResult {
                record: record("categorized", "x").with_category("finance"),
                score: 60.0,
            },
        ];
        rank(&mut results, "finance helper");
        assert_eq!(results[0].record.name, "categorized");
    }

    #[test]
    fn equal_scores_prefer_local_source() {
        let mut results = vec![
            result("remote", "x", 60.0),
            SearchResult {
                record: SkillRecord::local("nearby", "x", "/tmp/nearby"),
                score: 60.0,
            },
        ];
        // Same name length so the tie falls through to source precedence.
        rank(&mut results, "query");
        assert_eq!(results[0].record.name, "nearby");
    }

    #[test]
    fn invoice_organizer_example() {
        let r = record("invoice-organizer", "Organize invoices and receipts");
        let s = score(&r, "invoice organizer");
        assert!(s >= SUBSTRING_SCORE);
        assert!(s / MAX_SCORE >= 0.8);
    }
}
