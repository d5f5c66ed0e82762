//! Heading-outline inference for PDF documents.
//!
//! When a PDF carries a bookmark tree, that tree is normalized and returned as-is.
//! Otherwise the outline is rebuilt from styled text lines: page furniture is
//! filtered out, a body-text baseline is derived from font statistics, each line is
//! scored as a heading candidate, and the survivors are leveled, merged and
//! ordered into an H1/H2/H3 outline.

use once_cell::sync::Lazy;
use regex::Regex;

pub mod config;
pub mod error;
pub mod font_utils;
pub mod levels;
pub mod model;
pub mod noise;
pub mod outline;
pub mod pdf_source;
pub mod profile;
pub mod scoring;
pub mod sequence;

pub use config::OutlineConfig;
pub use error::{Error, Result};
pub use model::{Candidate, EmbeddedEntry, FontProfile, HeadingLevel, Outline, OutlineEntry, TextLine};
pub use outline::{OutlineBuilder, OutlineSource};
pub use pdf_source::{MemorySource, PdfSource, TextLineSource};

pub static NUMBERED_HEADING: Lazy<Regex> = Lazy::new(||
    // "1 Scope", "1. Scope", "2.3 Design", "4.1.2) Limits". Leading numbers are capped
    // at two digits so years ("2024 Annual Report") do not read as outline markers.
    Regex::new(r"^\s*(\d{1,2}(?:\.\d{1,3})*)[.)]?\s+\S").unwrap());
pub static ROMAN_HEADING: Lazy<Regex> = Lazy::new(||
    Regex::new(r"^\s*([IVXLCDM]{1,6})[.)]\s+\S").unwrap());
pub static LETTER_HEADING: Lazy<Regex> = Lazy::new(||
    Regex::new(r"^\s*([A-Za-z])[.)]\s+\S").unwrap());
pub static SECTION_HEADING: Lazy<Regex> = Lazy::new(||
    Regex::new(r"^\s*(?i:chapter|section|part|appendix)\s+(?:\d+(?:\.\d+)*|[IVXLCDM]+|[A-Z])\b").unwrap());

pub static PAGE_NUMBER: Lazy<Regex> = Lazy::new(||
    Regex::new(r"(?i)^[\s\-–—]*(?:page\s+)?\d{1,4}(?:\s*(?:of|/)\s*\d{1,4})?[\s\-–—]*$").unwrap());
// Well-formed lowercase numerals up to xxxix, so words like "mix" or "civil" survive.
pub static ROMAN_PAGE_NUMBER: Lazy<Regex> = Lazy::new(||
    Regex::new(r"^[\s\-–—]*(?:x{1,3}(?:ix|iv|v?i{0,3})|ix|iv|v?i{1,3}|v)[\s\-–—]*$").unwrap());
// Notices only: a line that merely mentions copyright can be a section heading.
pub static BOILERPLATE: Lazy<Regex> = Lazy::new(||
    Regex::new(r"(?i)(?:https?://|www\.|©|\(c\)\s*\d{4}|^\s*copyright\b.*\d{4}|all\s+rights\s+reserved|^\s*\S+@\S+\.\S+\s*$)").unwrap());
pub static CAPTION: Lazy<Regex> = Lazy::new(||
    Regex::new(r"(?i)^\s*(?:(?:figure|fig\.|table|formula|example|listing|exhibit)\s+\d+(?:[.\-]\d+)*\b|source\s*:)").unwrap());
pub static DOTTED_LEADER: Lazy<Regex> = Lazy::new(||
    Regex::new(r"\s*(?:\.\s*){3,}\d*\s*$").unwrap());
