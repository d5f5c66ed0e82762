//! Where text lines and bookmarks come from.

use crate::error::{Error, Result};
use crate::font_utils::{self, decode_pdf_string, resolve_dict};
use crate::model::{EmbeddedEntry, TextLine};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Font size given to lines recovered through plain-text extraction, which
/// carries no style information.
const PLAIN_TEXT_FONT_SIZE: f32 = 12.0;
const PLAIN_TEXT_LINE_HEIGHT: f32 = 14.0;
const MAX_OUTLINE_ITEMS: usize = 10_000;

/// Supplies the raw material for outline inference.
pub trait TextLineSource {
    /// All text lines in reading order, page by page.
    fn lines(&self) -> Result<Vec<TextLine>>;

    /// The document's own bookmark tree, flattened in document order. Empty when absent.
    fn embedded_outline(&self) -> Result<Vec<EmbeddedEntry>>;

    /// Title recorded in the document metadata, if any.
    fn metadata_title(&self) -> Option<String> {
        None
    }
}

/// Lines and bookmarks already held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub lines: Vec<TextLine>,
    pub outline: Vec<EmbeddedEntry>,
    pub title: Option<String>,
}

impl MemorySource {
    pub fn from_lines(lines: Vec<TextLine>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }
}

impl TextLineSource for MemorySource {
    fn lines(&self) -> Result<Vec<TextLine>> {
        Ok(self.lines.clone())
    }

    fn embedded_outline(&self) -> Result<Vec<EmbeddedEntry>> {
        Ok(self.outline.clone())
    }

    fn metadata_title(&self) -> Option<String> {
        self.title.clone()
    }
}

/// A PDF decoded with lopdf.
pub struct PdfSource {
    doc: Document,
    raw: Option<Vec<u8>>,
}

impl PdfSource {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let doc = Document::load_mem(&bytes)?;
        Ok(Self {
            doc,
            raw: Some(bytes),
        })
    }

    pub fn from_document(doc: Document) -> Self {
        Self { doc, raw: None }
    }

    fn plain_text_lines(&self) -> Result<Vec<TextLine>> {
        let bytes = match &self.raw {
            Some(bytes) => bytes.clone(),
            None => {
                let mut doc = self.doc.clone();
                let mut buffer = Vec::new();
                doc.save_to(&mut buffer)?;
                buffer
            }
        };
        let text = pdf_extract::extract_text_from_mem(&bytes)?;
        Ok(lines_from_plain_text(&text))
    }

    fn page_numbers(&self) -> HashMap<ObjectId, u32> {
        self.doc
            .get_pages()
            .into_iter()
            .map(|(number, id)| (id, number))
            .collect()
    }
}

impl TextLineSource for PdfSource {
    fn lines(&self) -> Result<Vec<TextLine>> {
        let runs = font_utils::extract_runs(&self.doc);
        let lines = font_utils::group_runs_into_lines(&runs);

        if lines.is_empty() || looks_garbled(&lines) {
            log::warn!("Content streams gave no usable text, falling back to plain-text extraction");
            return match self.plain_text_lines() {
                Ok(fallback) => Ok(fallback),
                Err(e) if lines.is_empty() => {
                    log::warn!("Plain-text extraction failed: {}", e);
                    Ok(Vec::new())
                }
                Err(_) => Ok(lines),
            };
        }

        Ok(lines)
    }

    fn embedded_outline(&self) -> Result<Vec<EmbeddedEntry>> {
        let catalog = self.doc.catalog()?;
        let first = catalog
            .get(b"Outlines")
            .ok()
            .and_then(|o| resolve_dict(&self.doc, o))
            .and_then(|outlines| outlines.get(b"First").ok())
            .and_then(|first| first.as_reference().ok());

        let Some(first) = first else {
            return Ok(Vec::new());
        };

        let walker = OutlineWalker {
            doc: &self.doc,
            pages: self.page_numbers(),
            named: named_destinations(&self.doc, catalog),
        };
        let mut entries = Vec::new();
        let mut visited = HashSet::new();
        walker.walk(first, 1, &mut visited, &mut entries);
        Ok(entries)
    }

    fn metadata_title(&self) -> Option<String> {
        let info = self.doc.trailer.get(b"Info").ok()?;
        let info = resolve_dict(&self.doc, info)?;
        match info.get(b"Title").ok()? {
            Object::String(bytes, _) => {
                let title = decode_pdf_string(bytes).trim().to_string();
                (!title.is_empty()).then_some(title)
            }
            _ => None,
        }
    }
}

struct OutlineWalker<'a> {
    doc: &'a Document,
    pages: HashMap<ObjectId, u32>,
    named: HashMap<Vec<u8>, &'a Object>,
}

impl OutlineWalker<'_> {
    /// Depth-first over `/First` and `/Next`, so entries come out in document order.
    fn walk(
        &self,
        start: ObjectId,
        level: u32,
        visited: &mut HashSet<ObjectId>,
        entries: &mut Vec<EmbeddedEntry>,
    ) {
        let mut current = Some(start);
        while let Some(id) = current {
            if visited.len() >= MAX_OUTLINE_ITEMS {
                log::warn!("Bookmark tree exceeds {} entries, truncating", MAX_OUTLINE_ITEMS);
                return;
            }
            if !visited.insert(id) {
                log::warn!("Bookmark tree revisits object {:?}, stopping", id);
                return;
            }
            let Ok(item) = self.doc.get_dictionary(id) else {
                return;
            };

            let title = match item.get(b"Title") {
                Ok(Object::String(bytes, _)) => decode_pdf_string(bytes),
                _ => String::new(),
            };
            let page = self.destination_page(item).unwrap_or_else(|| {
                let inherited = entries.last().map_or(1, |e: &EmbeddedEntry| e.page);
                log::warn!("Bookmark '{}' has no resolvable page, using {}", title.trim(), inherited);
                inherited
            });
            entries.push(EmbeddedEntry { level, title, page });

            if let Some(child) = item.get(b"First").ok().and_then(|c| c.as_reference().ok()) {
                self.walk(child, level + 1, visited, entries);
            }
            current = item.get(b"Next").ok().and_then(|n| n.as_reference().ok());
        }
    }

    fn destination_page(&self, item: &Dictionary) -> Option<u32> {
        if let Ok(dest) = item.get(b"Dest") {
            return self.resolve_destination(dest, 0);
        }
        let action = item.get(b"A").ok().and_then(|a| resolve_dict(self.doc, a))?;
        self.resolve_destination(action.get(b"D").ok()?, 0)
    }

    fn resolve_destination(&self, dest: &Object, depth: usize) -> Option<u32> {
        if depth > 4 {
            return None;
        }
        match dest {
            Object::Array(parts) => match parts.first()? {
                Object::Reference(page_ref) => self.pages.get(page_ref).copied(),
                // Remote-style destinations carry a 0-based page index.
                Object::Integer(index) => u32::try_from(*index).ok().map(|i| i + 1),
                _ => None,
            },
            Object::Reference(id) => self.resolve_destination(self.doc.get_object(*id).ok()?, depth + 1),
            Object::Dictionary(dict) => self.resolve_destination(dict.get(b"D").ok()?, depth + 1),
            Object::Name(name) | Object::String(name, _) => {
                let target = *self.named.get(name)?;
                self.resolve_destination(target, depth + 1)
            }
            _ => None,
        }
    }
}

/// Named destinations from both the catalog `/Dests` dictionary and the
/// `/Names /Dests` name tree.
fn named_destinations<'a>(doc: &'a Document, catalog: &'a Dictionary) -> HashMap<Vec<u8>, &'a Object> {
    let mut named = HashMap::new();

    if let Some(dests) = catalog.get(b"Dests").ok().and_then(|d| resolve_dict(doc, d)) {
        for (name, target) in dests.iter() {
            named.insert(name.clone(), target);
        }
    }

    let tree = catalog
        .get(b"Names")
        .ok()
        .and_then(|n| resolve_dict(doc, n))
        .and_then(|names| names.get(b"Dests").ok())
        .and_then(|d| resolve_dict(doc, d));
    if let Some(tree) = tree {
        collect_name_tree(doc, tree, &mut named, 0);
    }

    named
}

fn collect_name_tree<'a>(
    doc: &'a Document,
    node: &'a Dictionary,
    named: &mut HashMap<Vec<u8>, &'a Object>,
    depth: usize,
) {
    if depth > 16 {
        return;
    }
    if let Ok(Object::Array(pairs)) = node.get(b"Names") {
        for pair in pairs.chunks_exact(2) {
            if let Object::String(key, _) = &pair[0] {
                named.insert(key.clone(), &pair[1]);
            }
        }
    }
    if let Ok(Object::Array(kids)) = node.get(b"Kids") {
        for kid in kids {
            if let Some(kid) = resolve_dict(doc, kid) {
                collect_name_tree(doc, kid, named, depth + 1);
            }
        }
    }
}

/// Mostly control characters or replacement glyphs means the fonts use an
/// encoding the content-stream decoder does not map.
fn looks_garbled(lines: &[TextLine]) -> bool {
    let (bad, total) = lines
        .iter()
        .flat_map(|l| l.text.chars())
        .filter(|c| !c.is_whitespace())
        .fold((0usize, 0usize), |(bad, total), c| {
            let unreadable = c.is_control() || c == '\u{FFFD}' || ('\u{80}'..'\u{A0}').contains(&c);
            (bad + unreadable as usize, total + 1)
        });
    total > 0 && bad * 10 > total * 3
}

/// Plain text carries pages separated by form feeds and no style.
fn lines_from_plain_text(text: &str) -> Vec<TextLine> {
    text.split('\x0C')
        .enumerate()
        .flat_map(|(page_index, page_text)| {
            page_text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .enumerate()
                .map(move |(i, line)| TextLine {
                    text: line.to_string(),
                    page: page_index as u32 + 1,
                    font_size: PLAIN_TEXT_FONT_SIZE,
                    is_bold: false,
                    y_position: i as f32 * PLAIN_TEXT_LINE_HEIGHT,
                })
        })
        .collect()
}

/// Open a document, mapping any decoder failure to [`Error::InputUnreadable`].
pub fn open_pdf(path: &Path) -> Result<PdfSource> {
    PdfSource::open(path).map_err(|e| match e {
        Error::Io(io) => Error::Io(io),
        other => Error::InputUnreadable(format!("{}: {}", path.display(), other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> TextLine {
        TextLine::new(text, 1, 12.0, false, 0.0)
    }

    #[test]
    fn test_lines_from_plain_text_splits_pages() {
        let lines = lines_from_plain_text("Title\n\n1. Scope\x0CPage two body\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "Title");
        assert_eq!(lines[1].text, "1. Scope");
        assert_eq!(lines[1].y_position, PLAIN_TEXT_LINE_HEIGHT);
        assert_eq!(lines[2].page, 2);
        assert_eq!(lines[2].y_position, 0.0);
    }

    #[test]
    fn test_looks_garbled() {
        assert!(!looks_garbled(&[line("Plain readable text")]));
        assert!(looks_garbled(&[line("\u{1}\u{2}\u{3}\u{4}ab")]));
        assert!(!looks_garbled(&[]));
    }

    #[test]
    fn test_memory_source_round_trip() {
        let source = MemorySource {
            lines: vec![line("Intro")],
            outline: vec![EmbeddedEntry { level: 1, title: "Intro".to_string(), page: 1 }],
            title: Some("Doc".to_string()),
        };
        assert_eq!(source.lines().unwrap().len(), 1);
        assert_eq!(source.embedded_outline().unwrap()[0].title, "Intro");
        assert_eq!(source.metadata_title().as_deref(), Some("Doc"));
    }

    #[test]
    fn test_oversized_bookmark_chain_truncated() {
        use lopdf::dictionary;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => Object::Integer(0),
        });
        let ids: Vec<ObjectId> = (0..MAX_OUTLINE_ITEMS + 5).map(|_| doc.new_object_id()).collect();
        for (i, &id) in ids.iter().enumerate() {
            let mut item = dictionary! { "Title" => Object::string_literal(format!("Item {i}")) };
            if let Some(&next) = ids.get(i + 1) {
                item.set("Next", next);
            }
            doc.objects.insert(id, Object::Dictionary(item));
        }
        let outlines_id = doc.add_object(dictionary! { "Type" => "Outlines", "First" => ids[0] });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "Outlines" => outlines_id,
        });
        doc.trailer.set("Root", catalog_id);

        let entries = PdfSource::from_document(doc).embedded_outline().unwrap();
        assert_eq!(entries.len(), MAX_OUTLINE_ITEMS);
        assert_eq!(entries[0].title, "Item 0");
        assert!(entries.iter().all(|e| e.page == 1));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let err = open_pdf(Path::new("/nonexistent/definitely-missing.pdf")).err().unwrap();
        assert!(matches!(err, Error::Io(_)));
    }
}
