//! Personalized recommendation scoring with human-readable justifications.
//!
//! Additive rule table; each rule contributes weight and, when triggered,
//! one reason string:
//!
//! 1. Interest overlap: per tag shared with the profile's interests.
//! 2. Experience fit: exact level, with partial credit one level off.
//! 3. Novelty: never-seen content beats re-recommending history.
//! 4. Popularity prior: normalized rating, with a reason only for
//!    community favorites (rating ≥ 4.5).
//!
//! The final confidence is the score normalized by the maximum any item
//! could attain for that profile, so values are comparable across items.
//! Zero-score items produce no result record at all.

use crate::catalog::Catalog;
use crate::error::IntelError;
use crate::models::{ArchiveItem, RecommendationResult, UserProfile};

/// Rule weights, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RecommendParams {
    /// w1: per matching interest tag.
    pub interest_weight: f64,
    /// w2: experience-level fit.
    pub experience_weight: f64,
    /// w3: item not in viewing history.
    pub novelty_weight: f64,
    /// w4: scaled by `rating / 5.0`.
    pub popularity_weight: f64,
    /// Fraction of w2 granted when profile and item are one level apart.
    pub adjacent_level_factor: f64,
}

impl Default for RecommendParams {
    fn default() -> Self {
        RecommendParams {
            interest_weight: 2.0,
            experience_weight: 1.0,
            novelty_weight: 1.0,
            popularity_weight: 1.0,
            adjacent_level_factor: 0.5,
        }
    }
}

/// Rating at and above which the popularity rule speaks up.
const HIGHLY_RATED_THRESHOLD: f64 = 4.5;

/// Produce up to `limit` ranked, explained recommendations for a profile.
///
/// `limit < 1` is an `InvalidArgument` error. An empty output is a valid
/// state ("no recommendations available"), never an error: an empty
/// interest set simply drops rules 1-2 and falls back to novelty plus
/// popularity.
pub fn recommend(
    profile: &UserProfile,
    catalog: &Catalog,
    limit: i64,
    params: &RecommendParams,
) -> Result<Vec<RecommendationResult>, IntelError> {
    if limit < 1 {
        return Err(IntelError::InvalidArgument(format!(
            "limit must be >= 1, got {limit}"
        )));
    }

    let max = max_attainable(profile, params);
    if max <= 0.0 {
        return Ok(Vec::new());
    }

    let mut scored: Vec<(&ArchiveItem, f64, Vec<String>)> = catalog
        .items()
        .iter()
        .filter_map(|item| {
            let (score, reasons) = score_item(profile, item, params);
            (score > 0.0).then(|| (item, score / max, reasons))
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

    scored.truncate(limit as usize);

    Ok(scored
        .into_iter()
        .map(|(item, confidence, reasons)| RecommendationResult {
            item_id: item.id.clone(),
            confidence,
            reasons,
        })
        .collect())
}

fn score_item(
    profile: &UserProfile,
    item: &ArchiveItem,
    params: &RecommendParams,
) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    // Rules 1-2 only apply to profiles that expressed interests; a blank
    // profile falls back to novelty + popularity uniformly.
    if !profile.interests.is_empty() {
        for tag in &item.tags {
            if profile.interests.iter().any(|interest| interest == tag) {
                score += params.interest_weight;
                reasons.push(format!("Matches your interest in {tag}"));
            }
        }

        match profile.experience_level.distance(item.difficulty) {
            0 => {
                score += params.experience_weight;
                reasons.push(format!(
                    "Suited to your {} experience level",
                    profile.experience_level.label()
                ));
            }
            1 => score += params.experience_weight * params.adjacent_level_factor,
            _ => {}
        }
    }

    if !profile.history.contains(&item.id) {
        score += params.novelty_weight;
        reasons.push("New content for you".to_string());
    }

    let popularity = params.popularity_weight * (item.rating / 5.0);
    if popularity > 0.0 {
        score += popularity;
        if item.rating >= HIGHLY_RATED_THRESHOLD {
            reasons.push("Highly rated by the community".to_string());
        }
    }

    (score, reasons)
}

/// Maximum score any item could reach for this profile: every stated
/// interest matched, exact experience fit, unseen, and a perfect rating.
/// The denominator is the same for every item in the request, so
/// confidences stay comparable across items regardless of how many tags
/// each carries. Only rules active for the request count: a blank
/// interest set deactivates rules 1-2 on both sides of the division,
/// which keeps the popularity fallback ordered purely by rating.
fn max_attainable(profile: &UserProfile, params: &RecommendParams) -> f64 {
    let mut max = params.novelty_weight + params.popularity_weight;
    if !profile.interests.is_empty() {
        max += params.interest_weight * profile.interests.len() as f64;
        max += params.experience_weight;
    }
    max
}
