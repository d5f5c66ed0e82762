//! Page furniture removal: page numbers, running headers/footers and boilerplate.

use crate::config::NoiseConfig;
use crate::model::TextLine;
use crate::{BOILERPLATE, CAPTION, PAGE_NUMBER, ROMAN_PAGE_NUMBER};
use std::collections::{BTreeSet, HashMap, HashSet};

pub struct NoiseFilter {
    config: NoiseConfig,
}

impl NoiseFilter {
    pub fn new(config: NoiseConfig) -> Self {
        Self { config }
    }

    /// Drop every line that is page furniture rather than content.
    pub fn apply(&self, lines: Vec<TextLine>) -> Vec<TextLine> {
        let before = lines.len();
        let repeated = self.running_lines(&lines);

        let kept: Vec<TextLine> = lines
            .into_iter()
            .enumerate()
            .filter(|(i, line)| !repeated.contains(i) && !self.is_noise_text(&line.text))
            .map(|(_, line)| line)
            .collect();

        log::debug!(
            "Noise filter kept {} of {} lines ({} running header/footer lines)",
            kept.len(),
            before,
            repeated.len()
        );
        kept
    }

    /// Text-only checks that need no document context.
    pub fn is_noise_text(&self, text: &str) -> bool {
        let text = text.trim();
        let visible = text.chars().filter(|c| !c.is_whitespace()).count();

        visible < self.config.min_chars.max(1)
            || !text.chars().any(char::is_alphanumeric)
            || PAGE_NUMBER.is_match(text)
            || ROMAN_PAGE_NUMBER.is_match(text)
            || BOILERPLATE.is_match(text)
            || CAPTION.is_match(text)
    }

    /// Indices of lines whose exact text recurs at the same vertical band on
    /// enough distinct pages to be a running header or footer.
    fn running_lines(&self, lines: &[TextLine]) -> HashSet<usize> {
        let mut flagged = HashSet::new();
        let page_count = lines.iter().map(|l| l.page).collect::<BTreeSet<_>>().len();
        if page_count < 2 {
            return flagged;
        }
        let min_pages = self.config.repeat_min_pages.min(page_count).max(2);
        let tolerance = self.config.repeat_band_tolerance;

        let mut by_text: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, line) in lines.iter().enumerate() {
            let key = line.text.split_whitespace().collect::<Vec<_>>().join(" ");
            if !key.is_empty() {
                by_text.entry(key).or_default().push(i);
            }
        }

        for indices in by_text.values() {
            let pages: BTreeSet<u32> = indices.iter().map(|&i| lines[i].page).collect();
            if pages.len() < min_pages {
                continue;
            }
            for &anchor in indices {
                let anchor_y = lines[anchor].y_position;
                let band: Vec<usize> = indices
                    .iter()
                    .copied()
                    .filter(|&i| (lines[i].y_position - anchor_y).abs() <= tolerance)
                    .collect();
                let band_pages: BTreeSet<u32> = band.iter().map(|&i| lines[i].page).collect();
                if band_pages.len() >= min_pages {
                    flagged.extend(band);
                }
            }
        }

        flagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> NoiseFilter {
        NoiseFilter::new(NoiseConfig::default())
    }

    fn line(text: &str, page: u32, y: f32) -> TextLine {
        TextLine::new(text, page, 10.0, false, y)
    }

    #[test]
    fn test_page_number_patterns() {
        let f = filter();
        for text in ["12", "- 12 -", "Page 4", "page 3 of 10", "3 / 10", "— 7 —", "xiv"] {
            assert!(f.is_noise_text(text), "{text} should be noise");
        }
        for text in ["1. Introduction", "Page Layout Rules", "Chapter 3", "XIV. Results"] {
            assert!(!f.is_noise_text(text), "{text} should survive");
        }
    }

    #[test]
    fn test_boilerplate_and_captions() {
        let f = filter();
        assert!(f.is_noise_text("See https://example.org/spec"));
        assert!(f.is_noise_text("Copyright 2023 Example Corp."));
        assert!(f.is_noise_text("© Example Corp"));
        assert!(f.is_noise_text("contact@example.org"));
        assert!(f.is_noise_text("Figure 3: Pipeline stages"));
        assert!(f.is_noise_text("Table 2.1 Results"));
        assert!(f.is_noise_text("Source: internal survey"));
        assert!(!f.is_noise_text("Table of Contents"));
    }

    #[test]
    fn test_copyright_notice_vs_heading() {
        let f = filter();
        assert!(f.is_noise_text("Copyright (c) 2021-2024 Example Corp"));
        assert!(f.is_noise_text("Example Corp. All rights reserved."));
        assert!(!f.is_noise_text("2. Copyright and Trademarks"));
        assert!(!f.is_noise_text("Copyright Law"));
    }

    #[test]
    fn test_roman_page_numbers_need_well_formed_numerals() {
        let f = filter();
        for text in ["i", "iv", "ix", "xii", "xxxviii", "- vii -"] {
            assert!(f.is_noise_text(text), "{text} should be noise");
        }
        for text in ["civil", "mild", "dim", "mix", "vivid", "xiiii"] {
            assert!(!f.is_noise_text(text), "{text} should survive");
        }
    }

    #[test]
    fn test_empty_and_decoration_lines() {
        let f = filter();
        assert!(f.is_noise_text(""));
        assert!(f.is_noise_text("   "));
        assert!(f.is_noise_text("-----"));
        assert!(f.is_noise_text("•"));
        assert!(f.is_noise_text("A"));
    }

    #[test]
    fn test_page_x_of_y_footer_removed_on_every_page() {
        let lines: Vec<TextLine> = (1..=4)
            .flat_map(|p| {
                vec![
                    line(&format!("Body paragraph on page {p} with several words"), p, 100.0),
                    line(&format!("Page {p} of 4"), p, 770.0),
                ]
            })
            .collect();
        let kept = filter().apply(lines);
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|l| !l.text.starts_with("Page ")));
    }

    #[test]
    fn test_running_header_removed() {
        let mut lines = Vec::new();
        for p in 1..=3 {
            lines.push(line("Acme Corporation Annual Report", p, 20.0 + p as f32));
            lines.push(line("Some body text", p, 200.0 + 40.0 * p as f32));
        }
        let kept = filter().apply(lines);
        assert!(kept.iter().all(|l| l.text != "Acme Corporation Annual Report"));
        // Same text at different heights is content, not a header.
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_repeat_needs_same_band() {
        let lines = vec![
            line("Summary", 1, 50.0),
            line("Summary", 2, 300.0),
            line("Summary", 3, 600.0),
        ];
        assert_eq!(filter().apply(lines).len(), 3);
    }

    #[test]
    fn test_single_page_never_repeated() {
        let lines = vec![line("Heading", 1, 50.0), line("Heading", 1, 52.0)];
        assert_eq!(filter().apply(lines).len(), 2);
    }

    #[test]
    fn test_two_page_document_caps_repeat_threshold() {
        let lines = vec![
            line("Draft for review", 1, 780.0),
            line("Draft for review", 2, 781.0),
            line("Intro", 1, 100.0),
        ];
        let kept = filter().apply(lines);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text, "Intro");
    }
}
