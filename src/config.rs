//! TOML configuration with per-field defaults and validation on load.
//!
//! Every section is optional; a missing field falls back to the same
//! default the param structs ship with, so an empty file is a valid
//! config. `Config` converts into the per-module param structs rather
//! than being threaded through the scoring functions directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::matcher::MatchParams;
use crate::ocr::OcrParams;
use crate::recommend::RecommendParams;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MatcherConfig {
    #[serde(default = "default_title_weight")]
    pub title_weight: f64,
    #[serde(default = "default_tag_weight")]
    pub tag_weight: f64,
    #[serde(default = "default_text_weight")]
    pub text_weight: f64,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_title_weight() -> f64 {
    3.0
}
fn default_tag_weight() -> f64 {
    2.0
}
fn default_text_weight() -> f64 {
    1.0
}
fn default_max_suggestions() -> usize {
    3
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            title_weight: default_title_weight(),
            tag_weight: default_tag_weight(),
            text_weight: default_text_weight(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecommendConfig {
    #[serde(default = "default_interest_weight")]
    pub interest_weight: f64,
    #[serde(default = "default_unit_weight")]
    pub experience_weight: f64,
    #[serde(default = "default_unit_weight")]
    pub novelty_weight: f64,
    #[serde(default = "default_unit_weight")]
    pub popularity_weight: f64,
    #[serde(default = "default_adjacent_level_factor")]
    pub adjacent_level_factor: f64,
}

fn default_interest_weight() -> f64 {
    2.0
}
fn default_unit_weight() -> f64 {
    1.0
}
fn default_adjacent_level_factor() -> f64 {
    0.5
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            interest_weight: default_interest_weight(),
            experience_weight: default_unit_weight(),
            novelty_weight: default_unit_weight(),
            popularity_weight: default_unit_weight(),
            adjacent_level_factor: default_adjacent_level_factor(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_min_block_confidence")]
    pub min_block_confidence: f64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_min_block_confidence() -> f64 {
    25.0
}
fn default_fetch_timeout_secs() -> u64 {
    30
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            min_block_confidence: default_min_block_confidence(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Config {
    pub fn match_params(&self) -> MatchParams {
        MatchParams {
            title_weight: self.matcher.title_weight,
            tag_weight: self.matcher.tag_weight,
            text_weight: self.matcher.text_weight,
            max_suggestions: self.matcher.max_suggestions,
        }
    }

    pub fn recommend_params(&self) -> RecommendParams {
        RecommendParams {
            interest_weight: self.recommend.interest_weight,
            experience_weight: self.recommend.experience_weight,
            novelty_weight: self.recommend.novelty_weight,
            popularity_weight: self.recommend.popularity_weight,
            adjacent_level_factor: self.recommend.adjacent_level_factor,
        }
    }

    pub fn ocr_params(&self) -> OcrParams {
        OcrParams {
            min_block_confidence: self.ocr.min_block_confidence,
            fetch_timeout_secs: self.ocr.fetch_timeout_secs,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate matcher
    if config.matcher.title_weight <= 0.0
        || config.matcher.tag_weight <= 0.0
        || config.matcher.text_weight <= 0.0
    {
        anyhow::bail!("matcher weights must be > 0");
    }
    if config.matcher.max_suggestions < 1 {
        anyhow::bail!("matcher.max_suggestions must be >= 1");
    }

    // Validate recommend
    if config.recommend.interest_weight <= 0.0
        || config.recommend.experience_weight <= 0.0
        || config.recommend.novelty_weight <= 0.0
        || config.recommend.popularity_weight <= 0.0
    {
        anyhow::bail!("recommend weights must be > 0");
    }
    if !(0.0..=1.0).contains(&config.recommend.adjacent_level_factor) {
        anyhow::bail!("recommend.adjacent_level_factor must be in [0.0, 1.0]");
    }

    // Validate ocr
    if !(0.0..=100.0).contains(&config.ocr.min_block_confidence) {
        anyhow::bail!("ocr.min_block_confidence must be in [0.0, 100.0]");
    }
    if config.ocr.fetch_timeout_secs < 1 {
        anyhow::bail!("ocr.fetch_timeout_secs must be >= 1");
    }

    Ok(config)
}
