//! OCR extraction contract over uploaded images.
//!
//! This module owns the image→text *contract*, independent of whichever
//! engine performs the recognition: reference resolution, raster
//! validation, cooperative cancellation, progress reporting, and the
//! invariant-checked assembly of the final [`OcrResult`]. Engines plug in
//! through the [`OcrEngine`] trait and only produce raw text blocks.
//!
//! The pipeline is all-or-nothing: a cancelled or failed extraction leaves
//! no partial result observable.
//!
//! ```text
//! ImageRef ──resolve──▶ bytes ──decode──▶ RasterImage
//!                                             │
//!                                      OcrEngine::recognize
//!                                             │
//!                                   assemble (order, confidence,
//!                                    languages, quality grade)
//!                                             │
//!                                         OcrResult
//! ```

use async_trait::async_trait;
use chrono::Utc;
use image::GrayImage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::IntelError;
use crate::models::{ImageQualityGrade, OcrResult, TextBlock};
use crate::progress::{ExtractPhase, MonotonicSink, ProgressEvent, ProgressSink};

/// A resolvable reference to an uploaded image.
#[derive(Debug, Clone)]
pub enum ImageRef {
    /// Local file path.
    Path(PathBuf),
    /// In-memory blob, e.g. from a multipart upload handler.
    Bytes { id: String, data: Vec<u8> },
    /// Remote image, fetched over HTTPS.
    Url(String),
}

impl ImageRef {
    /// Stable identifier recorded on the result as `source_image_id`.
    pub fn image_id(&self) -> String {
        match self {
            ImageRef::Path(path) => path.display().to_string(),
            ImageRef::Bytes { id, .. } => id.clone(),
            ImageRef::Url(url) => url.clone(),
        }
    }

    /// Blob reference with a generated id.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        ImageRef::Bytes {
            id: format!("blob-{}", uuid::Uuid::new_v4()),
            data,
        }
    }
}

/// Decoded grayscale raster handed to engines.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub luma: GrayImage,
}

/// An OCR engine: turns a decoded raster into raw text blocks.
///
/// Implementations wrap real engines (Tesseract bindings, a vision API, an
/// ONNX model). The language hint is advisory only and never changes the
/// output shape. Block ordering, confidence aggregation, and referential
/// invariants are the extractor's job, not the engine's.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Engine name, for logging.
    fn name(&self) -> &str;

    /// Recognize text blocks in the image. Bounding boxes must be in
    /// source-image pixel coordinates.
    async fn recognize(
        &self,
        image: &RasterImage,
        language_hint: Option<&str>,
    ) -> Result<Vec<TextBlock>, IntelError>;
}

/// Extraction tuning knobs, decoupled from application config.
#[derive(Debug, Clone)]
pub struct OcrParams {
    /// Blocks below this confidence never rescue a low-quality image: when
    /// no block reaches it, the result is the successful empty one.
    pub min_block_confidence: f64,
    /// Timeout for fetching `ImageRef::Url` sources.
    pub fetch_timeout_secs: u64,
}

impl Default for OcrParams {
    fn default() -> Self {
        OcrParams {
            min_block_confidence: 25.0,
            fetch_timeout_secs: 30,
        }
    }
}

/// Cooperative cancellation flag for an in-flight extraction. Cloneable;
/// the caller keeps one handle and cancels from wherever the UI lives.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn checkpoint(&self) -> Result<(), IntelError> {
        if self.is_cancelled() {
            Err(IntelError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Run one extraction end to end.
///
/// Stages: resolve → decode → recognize → assemble. The cancel token is
/// checked between stages; progress is reported through a monotonic clamp
/// and reaches 100 exactly when a result is returned.
pub async fn extract(
    engine: &dyn OcrEngine,
    image_ref: ImageRef,
    language_hint: Option<&str>,
    params: &OcrParams,
    cancel: &CancelToken,
    sink: &dyn ProgressSink,
) -> Result<OcrResult, IntelError> {
    let started = Instant::now();
    let sink = MonotonicSink::new(sink);
    let image_id = image_ref.image_id();

    report(&sink, ExtractPhase::Resolving, 5);
    cancel.checkpoint()?;
    let bytes = resolve(image_ref, params).await?;

    report(&sink, ExtractPhase::Decoding, 25);
    cancel.checkpoint()?;
    let raster = decode(&bytes)?;
    tracing::debug!(image_id = %image_id, width = raster.width, height = raster.height, "image decoded");

    report(&sink, ExtractPhase::Recognizing, 45);
    cancel.checkpoint()?;
    let blocks = engine.recognize(&raster, language_hint).await?;
    tracing::debug!(engine = engine.name(), blocks = blocks.len(), "recognition finished");

    report(&sink, ExtractPhase::Assembling, 85);
    cancel.checkpoint()?;
    let result = assemble(image_id, blocks, &raster, params, started)?;

    report(&sink, ExtractPhase::Done, 100);
    Ok(result)
}

fn report(sink: &MonotonicSink<'_>, phase: ExtractPhase, percent: u8) {
    sink.report(ProgressEvent { phase, percent });
}

async fn resolve(image_ref: ImageRef, params: &OcrParams) -> Result<Vec<u8>, IntelError> {
    match image_ref {
        ImageRef::Bytes { data, .. } => Ok(data),
        ImageRef::Path(path) => tokio::fs::read(&path)
            .await
            .map_err(|e| IntelError::SourceUnavailable(format!("{}: {}", path.display(), e))),
        ImageRef::Url(url) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(params.fetch_timeout_secs))
                .build()
                .map_err(|e| IntelError::SourceUnavailable(e.to_string()))?;
            let response = client
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| IntelError::SourceUnavailable(format!("{url}: {e}")))?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| IntelError::SourceUnavailable(format!("{url}: {e}")))?;
            Ok(bytes.to_vec())
        }
    }
}

fn decode(bytes: &[u8]) -> Result<RasterImage, IntelError> {
    let dynamic = image::load_from_memory(bytes)
        .map_err(|e| IntelError::UnsupportedFormat(e.to_string()))?;
    let luma = dynamic.to_luma8();
    Ok(RasterImage {
        width: luma.width(),
        height: luma.height(),
        luma,
    })
}

/// Establish the result invariants from raw engine blocks: validate boxes
/// and confidences, drop text-less blocks, apply the low-quality gate, sort
/// into reading order, and aggregate confidence and languages.
fn assemble(
    source_image_id: String,
    blocks: Vec<TextBlock>,
    raster: &RasterImage,
    params: &OcrParams,
    started: Instant,
) -> Result<OcrResult, IntelError> {
    for block in &blocks {
        if !block.bounding_box.is_valid_within(raster.width, raster.height) {
            return Err(IntelError::InvalidArgument(format!(
                "engine returned bounding box {:?} outside image extent {}x{}",
                block.bounding_box, raster.width, raster.height
            )));
        }
        if !(0.0..=100.0).contains(&block.confidence) || !block.confidence.is_finite() {
            return Err(IntelError::InvalidArgument(format!(
                "engine returned confidence outside 0-100: {}",
                block.confidence
            )));
        }
    }

    // Text-less blocks carry no weight in any aggregate; drop them.
    let mut blocks: Vec<TextBlock> = blocks
        .into_iter()
        .filter(|b| !b.text.is_empty())
        .collect();

    // Low-quality gate: no block worth keeping means a successful empty
    // result; the UI renders "no text found", not an error.
    let usable = blocks
        .iter()
        .any(|b| b.confidence >= params.min_block_confidence);
    if !usable {
        return Ok(OcrResult {
            source_image_id,
            full_text: String::new(),
            overall_confidence: 0.0,
            detected_languages: Vec::new(),
            text_blocks: Vec::new(),
            processing_duration_ms: started.elapsed().as_millis() as u64,
            image_quality: ImageQualityGrade::Poor,
            processed_at: Utc::now(),
        });
    }

    // Reading order: top-to-bottom, then left-to-right.
    blocks.sort_by(|a, b| {
        a.bounding_box
            .y0
            .cmp(&b.bounding_box.y0)
            .then(a.bounding_box.x0.cmp(&b.bounding_box.x0))
    });

    let full_text = blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let overall_confidence = weighted_confidence(&blocks);

    let mut detected_languages: Vec<String> = Vec::new();
    for block in &blocks {
        if !detected_languages.contains(&block.language) {
            detected_languages.push(block.language.clone());
        }
    }

    Ok(OcrResult {
        source_image_id,
        full_text,
        overall_confidence,
        detected_languages,
        text_blocks: blocks,
        processing_duration_ms: started.elapsed().as_millis() as u64,
        image_quality: quality_grade(overall_confidence),
        processed_at: Utc::now(),
    })
}

/// Character-count-weighted mean of block confidences.
pub fn weighted_confidence(blocks: &[TextBlock]) -> f64 {
    let total_chars: usize = blocks.iter().map(|b| b.text.chars().count()).sum();
    if total_chars == 0 {
        return 0.0;
    }
    blocks
        .iter()
        .map(|b| b.confidence * b.text.chars().count() as f64)
        .sum::<f64>()
        / total_chars as f64
}

fn quality_grade(overall_confidence: f64) -> ImageQualityGrade {
    if overall_confidence >= 85.0 {
        ImageQualityGrade::Excellent
    } else if overall_confidence >= 65.0 {
        ImageQualityGrade::Good
    } else if overall_confidence >= 40.0 {
        ImageQualityGrade::Fair
    } else {
        ImageQualityGrade::Poor
    }
}
