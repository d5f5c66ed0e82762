//! Ordering, split-heading merge and duplicate removal.

use crate::config::MergeConfig;
use crate::model::{size_key, Candidate, TextLine};
use crate::scoring::{is_bare_marker, structural_level};
use std::cmp::Ordering;
use std::collections::HashSet;

pub struct Sequencer {
    config: MergeConfig,
    max_words: usize,
}

impl Sequencer {
    pub fn new(config: MergeConfig, max_words: usize) -> Self {
        Self { config, max_words }
    }

    /// Attach a lone outline marker ("2.", "IV.") to the heading text on the line
    /// right after it, so the pair is scored as the single line it was typeset as.
    pub fn join_markers(&self, lines: Vec<TextLine>) -> Vec<TextLine> {
        let mut joined: Vec<TextLine> = Vec::with_capacity(lines.len());
        for line in lines {
            if let Some(marker) = joined.last_mut() {
                if self.continues_marker(marker, &line) {
                    log::debug!("Joining outline marker {:?} with {:?}", marker.text, line.text);
                    marker.text = format!("{} {}", marker.text.trim(), line.text.trim());
                    marker.is_bold = line.is_bold;
                    continue;
                }
            }
            joined.push(line);
        }
        joined
    }

    fn continues_marker(&self, marker: &TextLine, next: &TextLine) -> bool {
        if marker.page != next.page || size_key(marker.font_size) != size_key(next.font_size) {
            return false;
        }
        if !is_bare_marker(&marker.text) || is_bare_marker(&next.text) || structural_level(&next.text).is_some() {
            return false;
        }
        let gap = next.y_position - marker.y_position;
        (0.0..=self.config.gap_factor * marker.font_size).contains(&gap)
    }

    /// Sort into reading order, merge headings wrapped over several lines and drop
    /// repeated `(text, page)` pairs. The output is non-decreasing in `(page, y)`.
    pub fn sequence(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by(reading_order);

        let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());
        // y of the most recent line folded into the last merged candidate
        let mut tail_y = 0.0f32;

        for candidate in candidates {
            if let Some(prev) = merged.last_mut() {
                if self.should_merge(prev, tail_y, &candidate) {
                    log::debug!("Merging split heading {:?} + {:?}", prev.text, candidate.text);
                    prev.text.push(' ');
                    prev.text.push_str(&candidate.text);
                    prev.score = prev.score.max(candidate.score);
                    tail_y = candidate.y_position;
                    continue;
                }
            }
            tail_y = candidate.y_position;
            merged.push(candidate);
        }

        let mut seen: HashSet<(String, u32)> = HashSet::new();
        merged.retain(|c| seen.insert((c.text.clone(), c.page)));
        merged
    }

    fn should_merge(&self, prev: &Candidate, tail_y: f32, next: &Candidate) -> bool {
        if prev.page != next.page || prev.tentative_level != next.tentative_level {
            return false;
        }
        let gap = next.y_position - tail_y;
        if gap < 0.0 || gap > self.config.gap_factor * prev.raw_font_size {
            return false;
        }
        // A line with its own outline marker starts a new heading.
        if structural_level(&next.text).is_some() {
            return false;
        }
        let combined_words = prev.text.split_whitespace().count() + next.text.split_whitespace().count();
        if combined_words > self.max_words {
            return false;
        }

        let open_ended = !prev.text.ends_with(['.', ':', ';', '!', '?']);
        open_ended || is_bare_marker(&prev.text)
    }
}

fn reading_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.page
        .cmp(&b.page)
        .then_with(|| a.y_position.total_cmp(&b.y_position))
}
