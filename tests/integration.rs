//! End-to-end scenarios across ingestion, matching, recommendation, and
//! OCR extraction.

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use scriptorium::catalog::Catalog;
use scriptorium::error::IntelError;
use scriptorium::ingest::load_batch;
use scriptorium::matcher::{match_query, MatchParams};
use scriptorium::models::{BoundingBox, ExperienceLevel, TextBlock, UserProfile};
use scriptorium::ocr::{extract, CancelToken, ImageRef, OcrEngine, OcrParams, RasterImage};
use scriptorium::progress::{ExtractPhase, NoProgress, ProgressEvent, ProgressSink};
use scriptorium::recommend::{recommend, RecommendParams};

fn feed_records() -> Vec<Value> {
    vec![
        json!({
            "id": "ms-kangyur-12",
            "title": "Kangyur folio, volume 12",
            "category": "manuscript",
            "monastery": "Rumtek",
            "period": "17th century",
            "description": "Gold-ink folio from the translated canon.",
            "tags": ["tibetan-buddhism", "gold-ink", "kangyur"],
            "insights": ["Script style points to a Derge workshop."],
            "rating": 4.9,
            "condition_grade": "fragile",
            "download_count": 812,
            "difficulty": "advanced"
        }),
        json!({
            "id": "art-thangka-tara",
            "title": "Thangka of Green Tara",
            "category": "artifact",
            "monastery": "Pemayangtse",
            "period": "18th century",
            "description": "Painted scroll used in meditation practice.",
            "tags": ["thangka", "meditation", "tara"],
            "insights": [],
            "rating": 4.6,
            "condition_grade": "good",
            "download_count": 430,
            "difficulty": "intermediate"
        }),
        json!({
            "id": "photo-courtyard",
            "title": "Morning Prayer",
            "category": "photo",
            "monastery": "Enchey",
            "period": "1962",
            "description": "Monks gathered in the main courtyard.",
            "tags": ["meditation", "daily-life"],
            "insights": ["One of the earliest photographs of the site."],
            "rating": 4.2,
            "condition_grade": "excellent",
            "download_count": 95,
            "difficulty": "beginner"
        }),
    ]
}

fn load_catalog() -> Catalog {
    let report = load_batch(&feed_records());
    assert!(report.rejected.is_empty());
    report.catalog
}

fn profile(interests: &[&str], level: ExperienceLevel, history: &[&str]) -> UserProfile {
    UserProfile {
        interests: interests.iter().map(|s| s.to_string()).collect(),
        experience_level: level,
        preferred_languages: vec!["en".to_string()],
        history: history.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
    }
}

// ============ Ingest → match → recommend flow ============

#[test]
fn meditation_query_matches_tagged_items() {
    let catalog = load_catalog();
    let result = match_query("meditation", &catalog, &MatchParams::default());
    assert!(result
        .matched_items
        .contains(&"photo-courtyard".to_string()));
    assert!(result
        .matched_items
        .contains(&"art-thangka-tara".to_string()));
    assert!(result.confidence > 0.0);
    assert!(!result.semantic_labels.is_empty());
}

#[test]
fn every_title_matches_its_own_item() {
    let catalog = load_catalog();
    for item in catalog.items() {
        let result = match_query(&item.title, &catalog, &MatchParams::default());
        assert!(
            result.matched_items.contains(&item.id),
            "title {:?} missed its own item",
            item.title
        );
    }
}

#[test]
fn interest_profile_gets_explained_recommendations() {
    let catalog = load_catalog();
    let p = profile(&["tibetan-buddhism"], ExperienceLevel::Advanced, &[]);
    let recs = recommend(&p, &catalog, 5, &RecommendParams::default()).unwrap();
    let top = &recs[0];
    assert_eq!(top.item_id, "ms-kangyur-12");
    assert!(top
        .reasons
        .iter()
        .any(|r| r.contains("tibetan-buddhism")));

    // Same item scores lower for a profile with disjoint interests.
    let disjoint = profile(&["woodcarving"], ExperienceLevel::Advanced, &[]);
    let other = recommend(&disjoint, &catalog, 5, &RecommendParams::default()).unwrap();
    let same_item = other
        .iter()
        .find(|r| r.item_id == "ms-kangyur-12")
        .unwrap();
    assert!(top.confidence > same_item.confidence);
}

#[test]
fn blank_profile_falls_back_to_popularity_order() {
    let catalog = load_catalog();
    let p = profile(&[], ExperienceLevel::Beginner, &[]);
    let recs = recommend(&p, &catalog, 5, &RecommendParams::default()).unwrap();
    let order: Vec<&str> = recs.iter().map(|r| r.item_id.as_str()).collect();
    assert_eq!(
        order,
        vec!["ms-kangyur-12", "art-thangka-tara", "photo-courtyard"]
    );
}

#[test]
fn rejected_records_do_not_block_the_batch() {
    let mut records = feed_records();
    records.push(json!({ "id": "broken", "title": "No category" }));
    let report = load_batch(&records);
    assert_eq!(report.accepted, 3);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].id.as_deref(), Some("broken"));
}

// ============ OCR pipeline ============

/// Engine returning fixed blocks, optionally cancelling its own extraction
/// mid-flight to exercise the between-stages checkpoint.
struct ScriptedEngine {
    blocks: Vec<TextBlock>,
    cancel_during_recognize: Option<CancelToken>,
}

#[async_trait]
impl OcrEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(
        &self,
        _image: &RasterImage,
        _language_hint: Option<&str>,
    ) -> Result<Vec<TextBlock>, IntelError> {
        if let Some(token) = &self.cancel_during_recognize {
            token.cancel();
        }
        Ok(self.blocks.clone())
    }
}

struct RecordingSink {
    events: Mutex<Vec<(ExtractPhase, u8)>>,
}

impl RecordingSink {
    fn new() -> Self {
        RecordingSink {
            events: Mutex::new(Vec::new()),
        }
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.phase, event.percent));
    }
}

fn manuscript_block(text: &str, language: &str, confidence: f64, y0: u32) -> TextBlock {
    TextBlock {
        text: text.to_string(),
        language: language.to_string(),
        confidence,
        bounding_box: BoundingBox {
            x0: 8,
            y0,
            x1: 120,
            y1: y0 + 16,
        },
    }
}

fn scan_png() -> Vec<u8> {
    let img = image::GrayImage::from_pixel(128, 96, image::Luma([150u8]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[tokio::test]
async fn extraction_from_a_file_reports_monotone_progress() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.png");
    std::fs::write(&path, scan_png()).unwrap();

    let engine = ScriptedEngine {
        blocks: vec![
            manuscript_block("om mani padme hum", "bo", 91.0, 40),
            manuscript_block("marginal note", "en", 74.0, 8),
        ],
        cancel_during_recognize: None,
    };
    let sink = RecordingSink::new();

    let result = extract(
        &engine,
        ImageRef::Path(path.clone()),
        Some("bo"),
        &OcrParams::default(),
        &CancelToken::new(),
        &sink,
    )
    .await
    .unwrap();

    assert_eq!(result.source_image_id, path.display().to_string());
    assert_eq!(result.text_blocks.len(), 2);
    // Reading order puts the higher block first.
    assert_eq!(result.text_blocks[0].text, "marginal note");

    let events = sink.events.lock().unwrap();
    let percents: Vec<u8> = events.iter().map(|(_, p)| *p).collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
    assert_eq!(*percents.last().unwrap(), 100);
    assert_eq!(events.last().unwrap().0, ExtractPhase::Done);
}

#[tokio::test]
async fn unresolvable_reference_produces_no_result() {
    let engine = ScriptedEngine {
        blocks: vec![],
        cancel_during_recognize: None,
    };
    let err = extract(
        &engine,
        ImageRef::Path("/no/such/scan.png".into()),
        None,
        &OcrParams::default(),
        &CancelToken::new(),
        &NoProgress,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IntelError::SourceUnavailable(_)));
}

#[tokio::test]
async fn unreachable_url_produces_no_result() {
    // Port 1 refuses the connection immediately; no network needed.
    let engine = ScriptedEngine {
        blocks: vec![],
        cancel_during_recognize: None,
    };
    let err = extract(
        &engine,
        ImageRef::Url("http://127.0.0.1:1/folio.png".to_string()),
        None,
        &OcrParams::default(),
        &CancelToken::new(),
        &NoProgress,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IntelError::SourceUnavailable(_)));
}

#[tokio::test]
async fn cancellation_between_stages_discards_everything() {
    let cancel = CancelToken::new();
    let engine = ScriptedEngine {
        blocks: vec![manuscript_block("text", "en", 95.0, 8)],
        cancel_during_recognize: Some(cancel.clone()),
    };
    let sink = RecordingSink::new();

    let err = extract(
        &engine,
        ImageRef::from_bytes(scan_png()),
        None,
        &OcrParams::default(),
        &cancel,
        &sink,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, IntelError::Cancelled));

    // Progress never claimed completion.
    let events = sink.events.lock().unwrap();
    assert!(events.iter().all(|(_, p)| *p < 100));
}

#[tokio::test]
async fn ocr_invariants_hold_end_to_end() {
    let engine = ScriptedEngine {
        blocks: vec![
            manuscript_block("first line of the colophon", "en", 82.0, 8),
            manuscript_block("om svasti", "bo", 88.0, 40),
        ],
        cancel_during_recognize: None,
    };
    let result = extract(
        &engine,
        ImageRef::from_bytes(scan_png()),
        None,
        &OcrParams::default(),
        &CancelToken::new(),
        &NoProgress,
    )
    .await
    .unwrap();

    // Weighted-mean invariant, recomputed from the returned blocks.
    let recomputed = scriptorium::ocr::weighted_confidence(&result.text_blocks);
    assert!((result.overall_confidence - recomputed).abs() < 1e-9);

    // Referential invariant in both directions.
    for block in &result.text_blocks {
        assert!(result.detected_languages.contains(&block.language));
    }
    for lang in &result.detected_languages {
        assert!(result.text_blocks.iter().any(|b| &b.language == lang));
    }
}

// ============ Configuration ============

#[test]
fn config_drives_the_matcher() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scriptorium.toml");
    std::fs::write(&path, "[matcher]\nmax_suggestions = 1\n").unwrap();

    let config = scriptorium::config::load_config(&path).unwrap();
    let catalog = load_catalog();
    let result = match_query("meditation", &catalog, &config.match_params());
    assert!(result.suggested_queries.len() <= 1);
}
