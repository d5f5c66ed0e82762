//! End-to-end tests for outline inference over in-memory sources.

use pdf_outline::error::Result;
use pdf_outline::{
    EmbeddedEntry, HeadingLevel, Outline, OutlineBuilder, OutlineConfig, TextLine, TextLineSource,
};
use std::cell::Cell;

/// Source that records how often the text path was consulted.
struct CountingSource {
    lines: Vec<TextLine>,
    outline: Vec<EmbeddedEntry>,
    line_calls: Cell<usize>,
}

impl CountingSource {
    fn new(lines: Vec<TextLine>, outline: Vec<EmbeddedEntry>) -> Self {
        Self {
            lines,
            outline,
            line_calls: Cell::new(0),
        }
    }
}

impl TextLineSource for CountingSource {
    fn lines(&self) -> Result<Vec<TextLine>> {
        self.line_calls.set(self.line_calls.get() + 1);
        Ok(self.lines.clone())
    }

    fn embedded_outline(&self) -> Result<Vec<EmbeddedEntry>> {
        Ok(self.outline.clone())
    }
}

struct UnreadableSource;

impl TextLineSource for UnreadableSource {
    fn lines(&self) -> Result<Vec<TextLine>> {
        Err(pdf_outline::Error::InputUnreadable("corrupt xref".to_string()))
    }

    fn embedded_outline(&self) -> Result<Vec<EmbeddedEntry>> {
        Err(pdf_outline::Error::InputUnreadable("corrupt xref".to_string()))
    }
}

/// A three-page report with a cover title, numbered sections, a running
/// header, page-number footers and body paragraphs.
fn report_lines() -> Vec<TextLine> {
    let mut lines = vec![
        TextLine::new("Heuristic Outline Recovery", 1, 26.0, true, 72.0),
        TextLine::new("1. Introduction", 1, 18.0, true, 160.0),
        TextLine::new("This report describes how headings are found in documents.", 1, 11.0, false, 190.0),
        TextLine::new("It relies on font statistics rather than embedded metadata.", 1, 11.0, false, 204.0),
        TextLine::new("1.1 Motivation", 1, 14.0, true, 240.0),
        TextLine::new("Many PDF files ship without bookmarks of any kind.", 1, 11.0, false, 262.0),
        TextLine::new("2. Method", 2, 18.0, true, 90.0),
        TextLine::new("The pipeline runs in two passes over the text lines.", 2, 11.0, false, 120.0),
        TextLine::new("2.1 Font Statistics", 2, 14.0, true, 160.0),
        TextLine::new("The most common size is taken as the body text size.", 2, 11.0, false, 182.0),
        TextLine::new("2.2 Scoring", 2, 14.0, true, 220.0),
        TextLine::new("Each line receives a score from several independent signals.", 2, 11.0, false, 242.0),
        TextLine::new("3. Results", 3, 18.0, true, 90.0),
        TextLine::new("Results are summarized in the tables that follow below.", 3, 11.0, false, 120.0),
        TextLine::new("Figure 1: Precision by document type", 3, 10.0, true, 300.0),
    ];
    for page in 1..=3 {
        lines.push(TextLine::new("Outline Recovery Working Paper", page, 9.0, false, 20.0));
        lines.push(TextLine::new(format!("Page {page} of 3"), page, 9.0, false, 770.0));
    }
    lines
}

#[test]
fn test_report_outline() {
    let source = CountingSource::new(report_lines(), Vec::new());
    let outline = OutlineBuilder::default().build(&source).unwrap();

    assert_eq!(outline.title, "Heuristic Outline Recovery");
    let got: Vec<(HeadingLevel, &str, u32)> = outline
        .entries
        .iter()
        .map(|e| (e.level, e.text.as_str(), e.page))
        .collect();
    assert_eq!(
        got,
        vec![
            (HeadingLevel::H1, "1. Introduction", 1),
            (HeadingLevel::H2, "1.1 Motivation", 1),
            (HeadingLevel::H1, "2. Method", 2),
            (HeadingLevel::H2, "2.1 Font Statistics", 2),
            (HeadingLevel::H2, "2.2 Scoring", 2),
            (HeadingLevel::H1, "3. Results", 3),
        ]
    );
    assert_eq!(source.line_calls.get(), 1);
}

#[test]
fn test_page_footer_never_in_outline() {
    let outline = OutlineBuilder::default().build_from_lines(report_lines());
    assert!(outline.entries.iter().all(|e| !e.text.contains("of 3")));
    assert!(outline.entries.iter().all(|e| e.text != "Outline Recovery Working Paper"));
    assert_ne!(outline.title, "Outline Recovery Working Paper");
}

#[test]
fn test_embedded_outline_bypasses_text_pipeline() {
    let embedded = vec![
        EmbeddedEntry { level: 1, title: "Overview".to_string(), page: 1 },
        EmbeddedEntry { level: 2, title: "Goals".to_string(), page: 2 },
        EmbeddedEntry { level: 3, title: "Non-goals".to_string(), page: 2 },
        EmbeddedEntry { level: 5, title: "Deeply Nested".to_string(), page: 4 },
    ];
    let source = CountingSource::new(report_lines(), embedded);
    let outline = OutlineBuilder::default().build(&source).unwrap();

    assert_eq!(source.line_calls.get(), 0);
    let levels: Vec<HeadingLevel> = outline.entries.iter().map(|e| e.level).collect();
    assert_eq!(
        levels,
        [HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H3, HeadingLevel::H3]
    );
    assert_eq!(outline.entries[3].text, "Deeply Nested");
    assert_eq!(outline.title, "");
}

#[test]
fn test_empty_document() {
    let source = CountingSource::new(Vec::new(), Vec::new());
    let outline = OutlineBuilder::default().build(&source).unwrap();
    assert_eq!(outline, Outline::default());
}

#[test]
fn test_unreadable_input_is_an_error() {
    let err = OutlineBuilder::default().build(&UnreadableSource).unwrap_err();
    assert!(matches!(err, pdf_outline::Error::InputUnreadable(_)));
}

#[test]
fn test_output_is_in_reading_order() {
    let mut lines = report_lines();
    lines.reverse();
    let outline = OutlineBuilder::default().build_from_lines(lines);
    let pages: Vec<u32> = outline.entries.iter().map(|e| e.page).collect();
    let mut sorted = pages.clone();
    sorted.sort();
    assert_eq!(pages, sorted);
    assert_eq!(outline.entries.first().map(|e| e.text.as_str()), Some("1. Introduction"));
}

#[test]
fn test_split_heading_merged_end_to_end() {
    let lines = vec![
        TextLine::new("Design Notes", 1, 24.0, true, 40.0),
        TextLine::new("1. Overview", 1, 16.0, true, 100.0),
        TextLine::new("of the System", 1, 16.0, true, 120.0),
        TextLine::new("Body text explains the overall design in detail.", 1, 10.0, false, 160.0),
        TextLine::new("More body text with further explanation of parts.", 1, 10.0, false, 175.0),
    ];
    let outline = OutlineBuilder::default().build_from_lines(lines);
    assert_eq!(outline.title, "Design Notes");
    assert_eq!(outline.entries.len(), 1);
    assert_eq!(outline.entries[0].text, "1. Overview of the System");
}

#[test]
fn test_number_on_its_own_line_kept_with_heading() {
    let lines = vec![
        TextLine::new("Design Notes", 1, 24.0, true, 40.0),
        TextLine::new("2.", 1, 16.0, true, 100.0),
        TextLine::new("Methods", 1, 16.0, true, 118.0),
        TextLine::new("Body text explains the overall design in detail.", 1, 10.0, false, 160.0),
        TextLine::new("More body text with further explanation of parts.", 1, 10.0, false, 175.0),
    ];
    let outline = OutlineBuilder::default().build_from_lines(lines);
    assert_eq!(outline.title, "Design Notes");
    let got: Vec<(HeadingLevel, &str, u32)> = outline
        .entries
        .iter()
        .map(|e| (e.level, e.text.as_str(), e.page))
        .collect();
    assert_eq!(got, [(HeadingLevel::H1, "2. Methods", 1)]);
}

#[test]
fn test_copyright_section_heading_survives() {
    let lines = vec![
        TextLine::new("Licensing Guide", 1, 24.0, true, 40.0),
        TextLine::new("1. Overview", 1, 18.0, true, 100.0),
        TextLine::new("This guide covers how the software may be used.", 1, 11.0, false, 130.0),
        TextLine::new("Redistribution terms are listed in later sections.", 1, 11.0, false, 145.0),
        TextLine::new("2. Copyright and Trademarks", 2, 18.0, true, 90.0),
        TextLine::new("Trademarks remain the property of their owners.", 2, 11.0, false, 120.0),
        TextLine::new("Copyright 2024 Example Corp. All rights reserved.", 2, 9.0, false, 760.0),
    ];
    let outline = OutlineBuilder::default().build_from_lines(lines);
    let texts: Vec<&str> = outline.entries.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, ["1. Overview", "2. Copyright and Trademarks"]);
}

#[test]
fn test_levels_are_size_monotonic() {
    let outline_lines = report_lines();
    let config = OutlineConfig::default();
    let outline = OutlineBuilder::new(config).build_from_lines(outline_lines.clone());

    let size_of = |text: &str| {
        outline_lines
            .iter()
            .find(|l| l.text == text)
            .map(|l| l.font_size)
            .unwrap()
    };
    for a in &outline.entries {
        for b in &outline.entries {
            if size_of(&a.text) > size_of(&b.text) {
                assert!(a.level <= b.level, "{} deeper than {}", a.text, b.text);
            }
        }
    }
}

#[test]
fn test_profile_idempotent_over_document() {
    let builder = OutlineBuilder::default();
    assert_eq!(
        builder.build_from_lines(report_lines()),
        builder.build_from_lines(report_lines())
    );
}

#[test]
fn test_json_contract() {
    let outline = OutlineBuilder::default().build_from_lines(report_lines());
    let json = serde_json::to_value(&outline).unwrap();
    assert!(json["title"].is_string());
    let first = &json["outline"][0];
    assert_eq!(first["level"], "H1");
    assert_eq!(first["text"], "1. Introduction");
    assert_eq!(first["page"], 1);
}
