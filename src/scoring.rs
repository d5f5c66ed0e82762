//! Heading likelihood for a single line.
//!
//! Each signal is a pure function of the line, the document's font profile and the
//! weights; the line's score is their sum. A line becomes a [`Candidate`] only when
//! that sum is strictly above the acceptance threshold.

use crate::config::ScoringConfig;
use crate::model::{Candidate, FontProfile, HeadingLevel, TextLine};
use crate::{DOTTED_LEADER, LETTER_HEADING, NUMBERED_HEADING, ROMAN_HEADING, SECTION_HEADING};

/// Words that stay lowercase in title-cased headings.
const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "into", "nor", "of", "on", "or",
    "per", "the", "to", "vs", "via", "with",
];

/// The parts of a line every signal looks at.
pub struct LineFeatures<'a> {
    pub line: &'a TextLine,
    pub text: &'a str,
    pub words: Vec<&'a str>,
    /// Words after any structural prefix such as `2.1` or `IV.`.
    pub body_words: Vec<&'a str>,
    pub prefix_level: Option<HeadingLevel>,
}

impl<'a> LineFeatures<'a> {
    pub fn new(line: &'a TextLine) -> Self {
        let text = line.text.trim();
        let words: Vec<&str> = text.split_whitespace().collect();
        let prefix_level = structural_level(text);
        let body_words = if prefix_level.is_some() && !SECTION_HEADING.is_match(text) {
            words.iter().skip(1).copied().collect()
        } else {
            words.clone()
        };
        Self {
            line,
            text,
            words,
            body_words,
            prefix_level,
        }
    }
}

pub type Signal = fn(&LineFeatures, &FontProfile, &ScoringConfig) -> f32;

pub const SIGNALS: [(&str, Signal); 7] = [
    ("size", size_signal),
    ("bold", bold_signal),
    ("casing", casing_signal),
    ("length", length_signal),
    ("prefix", prefix_signal),
    ("punctuation", punctuation_signal),
    ("numeric", numeric_signal),
];

/// Hitting a heading tier contributes strongly; text slightly above body size a
/// little; text below body size (footnotes, captions) counts against.
pub fn size_signal(f: &LineFeatures, profile: &FontProfile, config: &ScoringConfig) -> f32 {
    if profile.tier_level(f.line.font_size).is_some() {
        return config.tier_weight;
    }
    let ratio = profile.size_ratio(f.line.font_size);
    if ratio > 1.02 {
        config.near_body_weight
    } else if ratio < 0.95 {
        -config.small_text_penalty
    } else {
        0.0
    }
}

pub fn bold_signal(f: &LineFeatures, _: &FontProfile, config: &ScoringConfig) -> f32 {
    if f.line.is_bold {
        config.bold_weight
    } else {
        0.0
    }
}

pub fn casing_signal(f: &LineFeatures, _: &FontProfile, config: &ScoringConfig) -> f32 {
    if f.text.chars().next().map_or(false, char::is_lowercase) {
        return -config.continuation_penalty;
    }
    if is_all_caps(&f.body_words) && f.body_words.len() <= 10 {
        config.all_caps_weight
    } else if is_title_case(&f.body_words) {
        config.title_case_weight
    } else {
        0.0
    }
}

pub fn length_signal(f: &LineFeatures, _: &FontProfile, config: &ScoringConfig) -> f32 {
    if f.words.len() > config.max_words / 2 {
        -config.long_line_penalty
    } else {
        0.0
    }
}

pub fn prefix_signal(f: &LineFeatures, _: &FontProfile, config: &ScoringConfig) -> f32 {
    if f.prefix_level.is_some() {
        config.prefix_weight
    } else {
        0.0
    }
}

/// Headings rarely end like sentences or mid-clause.
pub fn punctuation_signal(f: &LineFeatures, _: &FontProfile, config: &ScoringConfig) -> f32 {
    let sentence_end = f.text.ends_with('.') && !f.text.ends_with("...") && f.words.len() > 5;
    let clause_end = f.text.ends_with(',') || f.text.ends_with(';');
    if sentence_end || clause_end {
        -config.prose_period_penalty
    } else {
        0.0
    }
}

/// Mostly digits and symbols: table cells, dates, figures.
pub fn numeric_signal(f: &LineFeatures, _: &FontProfile, config: &ScoringConfig) -> f32 {
    let visible = f.text.chars().filter(|c| !c.is_whitespace()).count();
    let letters = f.text.chars().filter(|c| c.is_alphabetic()).count();
    if visible > 0 && (letters as f32) < 0.4 * visible as f32 {
        -config.numeric_penalty
    } else {
        0.0
    }
}

pub struct CandidateScorer {
    config: ScoringConfig,
}

impl CandidateScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn total(&self, features: &LineFeatures, profile: &FontProfile) -> f32 {
        SIGNALS
            .iter()
            .map(|(_, signal)| signal(features, profile, &self.config))
            .sum()
    }

    pub fn score(&self, line: &TextLine, profile: &FontProfile) -> Option<Candidate> {
        let features = LineFeatures::new(line);
        if features.words.is_empty() || features.words.len() > self.config.max_words {
            return None;
        }

        let score = self.total(&features, profile);
        if score <= self.config.acceptance_threshold {
            return None;
        }

        let text = clean_heading_text(&line.text);
        if text.is_empty() {
            return None;
        }

        // Explicit numbering is more reliable than font size alone.
        let tentative_level = features
            .prefix_level
            .or_else(|| profile.tier_level(line.font_size))
            .unwrap_or(HeadingLevel::H3);

        log::trace!("Candidate {:?} p{} score {:.2} -> {}", text, line.page, score, tentative_level);

        Some(Candidate {
            text,
            page: line.page,
            y_position: line.y_position,
            raw_font_size: line.font_size,
            score,
            tentative_level,
        })
    }

    pub fn candidates(&self, lines: &[TextLine], profile: &FontProfile) -> Vec<Candidate> {
        lines.iter().filter_map(|line| self.score(line, profile)).collect()
    }
}

/// Nesting depth implied by a leading outline marker, if the line has one.
pub fn structural_level(text: &str) -> Option<HeadingLevel> {
    if SECTION_HEADING.is_match(text) {
        return Some(HeadingLevel::H1);
    }
    if let Some(caps) = NUMBERED_HEADING.captures(text) {
        let depth = caps[1].split('.').filter(|part| !part.is_empty()).count();
        return Some(HeadingLevel::from_depth(depth));
    }
    if let Some(caps) = ROMAN_HEADING.captures(text) {
        let numeral = &caps[1];
        // Lone C/D/L/M read as lettered items, not numerals.
        if numeral.len() > 1 || matches!(numeral, "I" | "V" | "X") {
            return Some(HeadingLevel::H1);
        }
    }
    if let Some(caps) = LETTER_HEADING.captures(text) {
        let is_upper = caps[1].chars().all(|c| c.is_ascii_uppercase());
        return Some(if is_upper { HeadingLevel::H2 } else { HeadingLevel::H3 });
    }
    None
}

/// An outline marker alone on its line, such as "2." or "IV.", with the heading
/// text expected on the next line.
pub fn is_bare_marker(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.contains(char::is_whitespace) {
        return false;
    }
    let probe = format!("{text} X");
    !SECTION_HEADING.is_match(&probe) && structural_level(&probe).is_some()
}

fn is_all_caps(words: &[&str]) -> bool {
    let letters: Vec<char> = words.iter().flat_map(|w| w.chars()).filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

fn is_title_case(words: &[&str]) -> bool {
    let mut significant = 0;
    for word in words {
        let Some(first) = word.chars().find(|c| c.is_alphanumeric()) else {
            continue;
        };
        if !first.is_alphabetic() {
            continue;
        }
        let bare: String = word.chars().filter(|c| c.is_alphabetic()).collect::<String>().to_lowercase();
        if first.is_lowercase() {
            if MINOR_WORDS.contains(&bare.as_str()) {
                continue;
            }
            return false;
        }
        significant += 1;
    }
    significant > 0
}

/// Strip TOC leaders ("Introduction ........ 4"), a trailing colon and extra spaces.
pub fn clean_heading_text(text: &str) -> String {
    let text = text.trim();
    let text = DOTTED_LEADER.replace(text, "");
    let text = text.trim();

    let cleaned = match text.strip_suffix(':') {
        Some(stripped) if !stripped.ends_with(':') => stripped.trim(),
        _ => text,
    };

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
