//! Final outline assembly.

use crate::config::OutlineConfig;
use crate::error::Result;
use crate::levels::LevelAssigner;
use crate::model::{size_key, Candidate, EmbeddedEntry, HeadingLevel, Outline, OutlineEntry, TextLine};
use crate::noise::NoiseFilter;
use crate::pdf_source::TextLineSource;
use crate::profile::FontProfiler;
use crate::scoring::{clean_heading_text, CandidateScorer};
use crate::sequence::Sequencer;

/// Which path produces the outline; decided once per document.
#[derive(Debug, Clone, PartialEq)]
pub enum OutlineSource {
    /// The document's bookmarks, already normalized.
    Embedded(Vec<OutlineEntry>),
    /// Text lines for the heuristic pipeline.
    Heuristic(Vec<TextLine>),
}

#[derive(Debug, Clone, Default)]
pub struct OutlineBuilder {
    config: OutlineConfig,
}

impl OutlineBuilder {
    pub fn new(config: OutlineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutlineConfig {
        &self.config
    }

    /// Prefer the embedded bookmark tree; only read text lines when it is absent.
    pub fn resolve<S: TextLineSource + ?Sized>(&self, source: &S) -> Result<OutlineSource> {
        let embedded = source.embedded_outline().unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable bookmark tree: {}", e);
            Vec::new()
        });
        let normalized = normalize_embedded(&embedded);
        if !normalized.is_empty() {
            return Ok(OutlineSource::Embedded(normalized));
        }
        if !embedded.is_empty() {
            log::debug!("Bookmark tree has no usable entries, inferring outline from text");
        }
        Ok(OutlineSource::Heuristic(source.lines()?))
    }

    pub fn build<S: TextLineSource + ?Sized>(&self, source: &S) -> Result<Outline> {
        let metadata_title = source.metadata_title();

        let outline = match self.resolve(source)? {
            OutlineSource::Embedded(entries) => {
                log::info!("Using embedded outline with {} entries", entries.len());
                Outline {
                    title: metadata_title.unwrap_or_default(),
                    entries,
                }
            }
            OutlineSource::Heuristic(lines) => {
                let mut outline = self.build_from_lines(lines);
                if self.config.title.prefer_metadata {
                    if let Some(title) = metadata_title {
                        outline.title = title;
                    }
                }
                log::info!("Inferred outline with {} entries", outline.entries.len());
                outline
            }
        };

        Ok(outline)
    }

    /// The heuristic pipeline. Total: any line sequence, including none, yields an outline.
    pub fn build_from_lines(&self, lines: Vec<TextLine>) -> Outline {
        if lines.is_empty() {
            return Outline::default();
        }

        let sequencer = Sequencer::new(self.config.merge.clone(), self.config.scoring.max_words);
        let lines = NoiseFilter::new(self.config.noise.clone()).apply(lines);
        let lines = sequencer.join_markers(lines);
        let profile = FontProfiler::new(self.config.profile.clone()).profile(&lines);
        let candidates = CandidateScorer::new(self.config.scoring.clone()).candidates(&lines, &profile);
        log::debug!("{} heading candidates from {} lines", candidates.len(), lines.len());

        let candidates = LevelAssigner.assign(candidates, &profile);
        let mut candidates = sequencer.sequence(candidates);

        let title = take_title(&lines, &mut candidates);
        log::debug!("Title: {:?}", title);

        Outline {
            title,
            entries: candidates
                .into_iter()
                .map(|c| OutlineEntry {
                    level: c.tentative_level,
                    text: c.text,
                    page: c.page,
                })
                .collect(),
        }
    }
}

/// Fold bookmark depth into H1..H3 and drop entries without any text.
pub fn normalize_embedded(entries: &[EmbeddedEntry]) -> Vec<OutlineEntry> {
    entries
        .iter()
        .filter_map(|entry| {
            let text = entry.title.split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.chars().any(char::is_alphanumeric) {
                return None;
            }
            Some(OutlineEntry {
                level: HeadingLevel::from_depth(entry.level as usize),
                text,
                page: entry.page.max(1),
            })
        })
        .collect()
}

/// Pick the title from the first page and remove it from the candidate list.
///
/// The largest, then highest-scoring, then topmost H1 candidate wins. Without one,
/// the largest line on the page is used (bold, then topmost, breaking ties), and
/// any heading containing that line is dropped with it.
fn take_title(lines: &[TextLine], candidates: &mut Vec<Candidate>) -> String {
    let Some(first_page) = lines.iter().map(|l| l.page).min() else {
        return String::new();
    };

    let best = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.page == first_page && c.tentative_level == HeadingLevel::H1)
        .max_by(|(_, a), (_, b)| {
            size_key(a.raw_font_size)
                .cmp(&size_key(b.raw_font_size))
                .then(a.score.total_cmp(&b.score))
                .then(b.y_position.total_cmp(&a.y_position))
        })
        .map(|(i, _)| i);
    if let Some(i) = best {
        return candidates.remove(i).text;
    }

    let largest = lines
        .iter()
        .filter(|l| l.page == first_page)
        .max_by(|a, b| {
            size_key(a.font_size)
                .cmp(&size_key(b.font_size))
                .then(a.is_bold.cmp(&b.is_bold))
                .then(b.y_position.total_cmp(&a.y_position))
        });
    let Some(line) = largest else {
        return String::new();
    };

    let title = clean_heading_text(&line.text);
    // The line may also have been folded into a heading that starts above it.
    candidates.retain(|c| {
        let same_line = c.page == line.page && c.y_position == line.y_position;
        let absorbed = c.page == line.page
            && c.y_position <= line.y_position
            && !title.is_empty()
            && c.text.contains(title.as_str());
        !(same_line || absorbed)
    });
    title
}
