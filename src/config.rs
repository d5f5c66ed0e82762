//! Tuning parameters for the heuristic pipeline.
//!
//! Every threshold has a default that works on typical reports and manuals. A JSON
//! file may override any subset of keys, e.g.
//!
//! ```json
//! { "scoring": { "acceptance_threshold": 2.5 }, "noise": { "repeat_min_pages": 4 } }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutlineConfig {
    pub profile: ProfileConfig,
    pub noise: NoiseConfig,
    pub scoring: ScoringConfig,
    pub merge: MergeConfig,
    pub title: TitleConfig,
}

impl OutlineConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: OutlineConfig =
            serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.profile.tier_margin_ratio > 1.0) {
            return Err(Error::Config(format!(
                "profile.tier_margin_ratio must be greater than 1.0, got {}",
                self.profile.tier_margin_ratio
            )));
        }
        if self.scoring.max_words == 0 {
            return Err(Error::Config("scoring.max_words must be at least 1".to_string()));
        }
        if self.merge.gap_factor < 0.0 || self.noise.repeat_band_tolerance < 0.0 {
            return Err(Error::Config(
                "merge.gap_factor and noise.repeat_band_tolerance must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// A size counts as a heading tier only at `body_size * tier_margin_ratio` or above.
    pub tier_margin_ratio: f32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self { tier_margin_ratio: 1.1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Distinct pages a line must recur on to count as a running header/footer.
    pub repeat_min_pages: usize,
    /// Vertical slack, in points, for "same position" across pages.
    pub repeat_band_tolerance: f32,
    /// Lines with fewer non-space characters are dropped.
    pub min_chars: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            repeat_min_pages: 3,
            repeat_band_tolerance: 12.0,
            min_chars: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// A line becomes a candidate only when its score is strictly above this.
    pub acceptance_threshold: f32,
    /// Lines with more words are rejected outright.
    pub max_words: usize,
    pub tier_weight: f32,
    pub near_body_weight: f32,
    pub small_text_penalty: f32,
    pub bold_weight: f32,
    pub all_caps_weight: f32,
    pub title_case_weight: f32,
    pub prefix_weight: f32,
    pub long_line_penalty: f32,
    pub prose_period_penalty: f32,
    pub continuation_penalty: f32,
    pub numeric_penalty: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 2.0,
            max_words: 20,
            tier_weight: 3.0,
            near_body_weight: 0.5,
            small_text_penalty: 1.5,
            bold_weight: 1.5,
            all_caps_weight: 1.0,
            title_case_weight: 0.75,
            prefix_weight: 2.0,
            long_line_penalty: 1.0,
            prose_period_penalty: 2.0,
            continuation_penalty: 1.0,
            numeric_penalty: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Two candidate lines merge when the second starts within
    /// `gap_factor * font_size` of the first.
    pub gap_factor: f32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { gap_factor: 1.6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TitleConfig {
    /// Use the document's `/Info /Title` over the inferred title when it is present.
    pub prefer_metadata: bool,
}
