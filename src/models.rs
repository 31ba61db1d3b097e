//! Core data models used throughout Scriptorium.
//!
//! These types represent the catalog records, OCR extraction results, and
//! scoring outputs that flow through the matching and recommendation
//! pipeline. All boundary types are serde-shaped because the ingestion feed
//! delivers JSON records and callers re-serialize results toward their UIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Content category. Closed set; the ingestion feed rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Manuscript,
    Artifact,
    Treasure,
    Photo,
    Audio,
    Architecture,
}

impl Category {
    /// Parse a filter label. `None` for anything outside the closed set
    /// (the catalog maps that to an `InvalidCategory` error; `"all"` is
    /// handled one level up and never reaches here).
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "manuscript" => Some(Category::Manuscript),
            "artifact" => Some(Category::Artifact),
            "treasure" => Some(Category::Treasure),
            "photo" => Some(Category::Photo),
            "audio" => Some(Category::Audio),
            "architecture" => Some(Category::Architecture),
            _ => None,
        }
    }

    /// Stable lowercase label, matching the serde representation.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Manuscript => "manuscript",
            Category::Artifact => "artifact",
            Category::Treasure => "treasure",
            Category::Photo => "photo",
            Category::Audio => "audio",
            Category::Architecture => "architecture",
        }
    }
}

/// Physical condition of the underlying object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionGrade {
    Excellent,
    Good,
    Fair,
    Fragile,
}

/// Visitor experience level, also used as the item-side difficulty label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    fn rank(self) -> u8 {
        match self {
            ExperienceLevel::Beginner => 0,
            ExperienceLevel::Intermediate => 1,
            ExperienceLevel::Advanced => 2,
        }
    }

    /// Level distance: 0 exact, 1 adjacent, 2 opposite ends.
    pub fn distance(self, other: ExperienceLevel) -> u8 {
        self.rank().abs_diff(other.rank())
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
        }
    }
}

/// One indexed piece of catalog content (manuscript, artifact, photo, ...).
///
/// Created by the ingestion feed and immutable inside this crate;
/// `download_count` and `rating` are bumped by external collaborators
/// between batch loads, never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveItem {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub monastery: String,
    /// Free-text era label, e.g. "12th century".
    pub period: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Descriptive editorial notes, matched as plain text.
    #[serde(default)]
    pub insights: Vec<String>,
    /// Community rating in 0.0-5.0.
    pub rating: f64,
    pub condition_grade: ConditionGrade,
    #[serde(default)]
    pub download_count: u64,
    /// Implied difficulty, assigned by the content-authoring collaborator.
    pub difficulty: ExperienceLevel,
}

/// Pixel-space rectangle locating a text block within its source image.
///
/// Coordinates satisfy `x0 < x1` and `y0 < y1` and lie within the source
/// image extent. Boxes of different blocks may overlap (nested or marginal
/// annotations are common in manuscript scans).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BoundingBox {
    /// Well-formed and inside a `width × height` image.
    pub fn is_valid_within(&self, width: u32, height: u32) -> bool {
        self.x0 < self.x1 && self.y0 < self.y1 && self.x1 <= width && self.y1 <= height
    }
}

/// One recognized region of text in a processed image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    /// Language tag, e.g. "bo" or "en". Always present in the parent
    /// result's `detected_languages`.
    pub language: String,
    /// Recognition confidence in 0-100.
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

/// Quality grade of the source image, derived from recognition confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Output of processing one uploaded image. Immutable; re-processing the
/// same image produces a fresh result that replaces this one caller-side.
///
/// An empty `text_blocks` with `overall_confidence == 0.0` is a successful
/// "no text found" result, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub source_image_id: String,
    /// All block text joined in reading order. May mix scripts.
    pub full_text: String,
    /// Character-count-weighted mean of block confidences, 0-100.
    pub overall_confidence: f64,
    /// Exactly the set of languages appearing on the blocks.
    pub detected_languages: Vec<String>,
    /// Ordered top-to-bottom, then left-to-right.
    pub text_blocks: Vec<TextBlock>,
    pub processing_duration_ms: u64,
    pub image_quality: ImageQualityGrade,
    pub processed_at: DateTime<Utc>,
}

/// Requester interest model, supplied per ranking request by the session
/// store. Never persisted or mutated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub interests: Vec<String>,
    pub experience_level: ExperienceLevel,
    /// Most-preferred first.
    #[serde(default)]
    pub preferred_languages: Vec<String>,
    /// Ids of previously viewed items.
    #[serde(default)]
    pub history: HashSet<String>,
}

/// One ranked recommendation with its justification.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResult {
    pub item_id: String,
    /// Normalized score in [0.0, 1.0], comparable across items.
    pub confidence: f64,
    /// Human-readable justifications, one per triggered scoring rule.
    pub reasons: Vec<String>,
}

/// Ranked outcome of matching a free-text query against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMatchResult {
    /// The original query text, untrimmed.
    pub query: String,
    /// Aggregate match confidence in [0.0, 1.0]; 0.0 when nothing matched.
    pub confidence: f64,
    /// Item ids in descending relevance.
    pub matched_items: Vec<String>,
    /// Short descriptive phrases summarizing match themes. Non-empty
    /// whenever `matched_items` is non-empty.
    pub semantic_labels: Vec<String>,
    /// Follow-up query suggestions drawn from matched items' tags.
    pub suggested_queries: Vec<String>,
}
