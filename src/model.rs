use serde::{Deserialize, Serialize};
use std::fmt;

/// Outline depth. Ordering follows nesting: `H1 < H2 < H3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Maps a 1-based nesting depth onto the three supported levels. Depth 0 is
    /// treated as top level and anything past 3 folds into H3.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 | 1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            _ => HeadingLevel::H3,
        }
    }

    pub fn depth(self) -> usize {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of text as laid out on a page.
///
/// `y_position` grows downward from the top edge of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub page: u32,
    pub font_size: f32,
    pub is_bold: bool,
    pub y_position: f32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, page: u32, font_size: f32, is_bold: bool, y_position: f32) -> Self {
        Self {
            text: text.into(),
            page,
            font_size,
            is_bold,
            y_position,
        }
    }
}

/// Document-wide font statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct FontProfile {
    /// Most frequent (rounded) font size among the lines.
    pub body_size: f32,
    /// Up to three heading sizes, largest first, each clearly above `body_size`.
    pub heading_size_tiers: Vec<f32>,
    /// Smallest size that still reads as visually distinct from body text.
    pub heading_floor: f32,
}

impl FontProfile {
    pub fn empty() -> Self {
        Self {
            body_size: 0.0,
            heading_size_tiers: Vec::new(),
            heading_floor: f32::INFINITY,
        }
    }

    /// True when no size stands out from the body text.
    pub fn is_flat(&self) -> bool {
        self.heading_size_tiers.is_empty()
    }

    pub fn size_ratio(&self, size: f32) -> f32 {
        if self.body_size > 0.0 {
            size / self.body_size
        } else {
            1.0
        }
    }

    /// Level implied by font size alone. Sizes below the third tier but still above
    /// the heading floor collapse into H3.
    pub fn tier_level(&self, size: f32) -> Option<HeadingLevel> {
        if self.is_flat() || size_key(size) < size_key(self.heading_floor) {
            return None;
        }
        let larger = self
            .heading_size_tiers
            .iter()
            .filter(|tier| size_key(**tier) > size_key(size))
            .count();
        Some(HeadingLevel::from_depth(larger + 1))
    }
}

/// A line that scored as a probable heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub page: u32,
    pub y_position: f32,
    pub raw_font_size: f32,
    pub score: f32,
    pub tentative_level: HeadingLevel,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Outline {
    pub title: String,
    #[serde(rename = "outline")]
    pub entries: Vec<OutlineEntry>,
}

/// Raw bookmark entry as stored in the document, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedEntry {
    pub level: u32,
    pub title: String,
    pub page: u32,
}

/// Font sizes are compared at 0.1pt resolution.
pub(crate) fn size_key(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

pub(crate) fn round_size(size: f32) -> f32 {
    size_key(size) as f32 / 10.0
}
