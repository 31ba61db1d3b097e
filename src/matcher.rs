//! Free-text query matching against the catalog.
//!
//! Deliberately simple and deterministic: an item matches when the
//! lowercased query is a substring of its title, description, any tag, or
//! any insight. Stronger retrieval may replace this, but the anchor
//! contract holds: a query that is an exact substring of an item's title
//! always matches.
//!
//! # Ranking
//!
//! 1. Score each item by weighted field hits (title > tags > body text).
//! 2. Sort by score (desc), rating (desc), id (asc).
//! 3. Aggregate confidence = `sqrt(matched / catalog size)`: pure, 0.0
//!    for no matches, monotone in coverage.

use crate::catalog::Catalog;
use crate::models::{ArchiveItem, Category, QueryMatchResult};

/// Matching weights and output bounds, decoupled from application config.
#[derive(Debug, Clone)]
pub struct MatchParams {
    /// Weight of a title substring hit.
    pub title_weight: f64,
    /// Weight of each matching tag.
    pub tag_weight: f64,
    /// Weight of a description hit and of each matching insight.
    pub text_weight: f64,
    /// Cap on `suggested_queries` (keeps the consuming UI bounded).
    pub max_suggestions: usize,
}

impl Default for MatchParams {
    fn default() -> Self {
        MatchParams {
            title_weight: 3.0,
            tag_weight: 2.0,
            text_weight: 1.0,
            max_suggestions: 3,
        }
    }
}

/// Semantic label candidates: a display phrase plus the trigger tokens that
/// select it from the query or from matched items' tags.
const LABEL_CANDIDATES: &[(&str, &[&str])] = &[
    (
        "Sacred manuscripts and scriptures",
        &["manuscript", "scripture", "kangyur", "sutra", "folio", "palm-leaf", "text"],
    ),
    (
        "Meditation and monastic practice",
        &["meditation", "prayer", "ritual", "practice", "chant", "monk"],
    ),
    (
        "Buddhist art and iconography",
        &["thangka", "art", "iconography", "painting", "mural", "statue"],
    ),
    (
        "Monastic architecture and sacred spaces",
        &["architecture", "temple", "gompa", "stupa", "courtyard", "shrine"],
    ),
    (
        "Historical treasures and relics",
        &["treasure", "relic", "gold", "silver", "artifact"],
    ),
    (
        "Tibetan Buddhist heritage",
        &["tibetan", "tibetan-buddhism", "buddhism", "vajrayana", "lineage"],
    ),
    (
        "Archival photography and documentation",
        &["photo", "photograph", "photography", "archive", "documentation"],
    ),
    (
        "Ritual chants and oral tradition",
        &["audio", "recording", "oral", "chanting", "hymn"],
    ),
];

/// Guaranteed-fallback label per category, so `semantic_labels` is never
/// empty when something matched.
fn category_label(category: Category) -> &'static str {
    match category {
        Category::Manuscript => "Sacred manuscripts and scriptures",
        Category::Artifact | Category::Treasure => "Historical treasures and relics",
        Category::Photo => "Archival photography and documentation",
        Category::Audio => "Ritual chants and oral tradition",
        Category::Architecture => "Monastic architecture and sacred spaces",
    }
}

/// Match a free-text query against a catalog snapshot.
///
/// Never fails: an empty (or whitespace/control-only) query returns the
/// empty result with `confidence = 0.0`, mirroring permissive UI behavior.
pub fn match_query(query: &str, catalog: &Catalog, params: &MatchParams) -> QueryMatchResult {
    let needle = normalize_query(query);

    if needle.is_empty() || catalog.is_empty() {
        return QueryMatchResult {
            query: query.to_string(),
            confidence: 0.0,
            matched_items: Vec::new(),
            semantic_labels: Vec::new(),
            suggested_queries: Vec::new(),
        };
    }

    let mut scored: Vec<(&ArchiveItem, f64)> = catalog
        .items()
        .iter()
        .filter_map(|item| {
            let score = score_item(item, &needle, params);
            (score > 0.0).then_some((item, score))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.0.rating
                    .partial_cmp(&a.0.rating)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.0.id.cmp(&b.0.id))
    });

    let matched: Vec<&ArchiveItem> = scored.iter().map(|(item, _)| *item).collect();
    let confidence = (matched.len() as f64 / catalog.len() as f64).sqrt();

    QueryMatchResult {
        query: query.to_string(),
        confidence,
        matched_items: matched.iter().map(|item| item.id.clone()).collect(),
        semantic_labels: semantic_labels(&needle, &matched),
        suggested_queries: suggested_queries(&needle, &matched, params.max_suggestions),
    }
}

/// Lowercase, with control characters treated as whitespace, then trimmed.
fn normalize_query(query: &str) -> String {
    query
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_lowercase()
}

fn score_item(item: &ArchiveItem, needle: &str, params: &MatchParams) -> f64 {
    let mut score = 0.0;
    if item.title.to_lowercase().contains(needle) {
        score += params.title_weight;
    }
    for tag in &item.tags {
        if tag.to_lowercase().contains(needle) {
            score += params.tag_weight;
        }
    }
    if item.description.to_lowercase().contains(needle) {
        score += params.text_weight;
    }
    for insight in &item.insights {
        if insight.to_lowercase().contains(needle) {
            score += params.text_weight;
        }
    }
    score
}

/// Fixed-table labels sharing a token with the query or matched tags; falls
/// back to the top match's category label so the list is non-empty whenever
/// matches exist.
fn semantic_labels(needle: &str, matched: &[&ArchiveItem]) -> Vec<String> {
    if matched.is_empty() {
        return Vec::new();
    }

    let query_tokens: Vec<&str> = needle.split_whitespace().collect();
    let matched_tags: Vec<String> = matched
        .iter()
        .flat_map(|item| item.tags.iter().map(|t| t.to_lowercase()))
        .collect();

    let mut labels: Vec<String> = Vec::new();
    for (phrase, triggers) in LABEL_CANDIDATES {
        let fires = triggers.iter().any(|trigger| {
            query_tokens.contains(trigger) || matched_tags.iter().any(|tag| tag.contains(trigger))
        });
        if fires {
            labels.push((*phrase).to_string());
        }
    }

    if labels.is_empty() {
        labels.push(category_label(matched[0].category).to_string());
    }
    labels
}

/// Tags of matched items (in rank order) not already covered by the query,
/// deduplicated and capped.
fn suggested_queries(needle: &str, matched: &[&ArchiveItem], cap: usize) -> Vec<String> {
    let mut suggestions: Vec<String> = Vec::new();
    for item in matched {
        for tag in &item.tags {
            let tag_lc = tag.to_lowercase();
            if tag_lc.contains(needle) || needle.contains(&tag_lc) {
                continue;
            }
            if suggestions.iter().any(|s| s == &tag_lc) {
                continue;
            }
            suggestions.push(tag_lc);
            if suggestions.len() == cap {
                return suggestions;
            }
        }
    }
    suggestions
}
