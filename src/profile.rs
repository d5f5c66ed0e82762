//! Document-wide font statistics.
//!
//! This is the first of two passes: the profile is computed once over every
//! surviving line and then only read by the scoring pass.

use crate::config::ProfileConfig;
use crate::model::{round_size, size_key, FontProfile, TextLine};
use std::collections::BTreeMap;

const MAX_TIERS: usize = 3;

pub struct FontProfiler {
    config: ProfileConfig,
}

impl FontProfiler {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    pub fn profile(&self, lines: &[TextLine]) -> FontProfile {
        // Keyed by size in tenths of a point; iteration runs smallest first.
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for line in lines.iter().filter(|l| l.font_size > 0.0) {
            *counts.entry(size_key(line.font_size)).or_insert(0) += 1;
        }

        // Strict `>` keeps the smallest of equally frequent sizes.
        let mut body: Option<(i32, usize)> = None;
        for (&key, &count) in &counts {
            if body.map_or(true, |(_, best)| count > best) {
                body = Some((key, count));
            }
        }
        let Some((body_key, _)) = body else {
            return FontProfile::empty();
        };

        let body_size = body_key as f32 / 10.0;
        let heading_floor = round_size(body_size * self.config.tier_margin_ratio);
        let heading_size_tiers: Vec<f32> = counts
            .keys()
            .rev()
            .filter(|&&key| key > body_key && key >= size_key(heading_floor))
            .take(MAX_TIERS)
            .map(|&key| key as f32 / 10.0)
            .collect();

        log::debug!(
            "Font profile: body {:.1}pt, heading floor {:.1}pt, tiers {:?}",
            body_size,
            heading_floor,
            heading_size_tiers
        );

        FontProfile {
            body_size,
            heading_size_tiers,
            heading_floor,
        }
    }
}
