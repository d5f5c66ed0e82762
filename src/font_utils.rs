use crate::error::Result;
use crate::model::TextLine;
use lopdf::{content::Content, Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

const DEFAULT_PAGE_HEIGHT: f32 = 792.0;
// Rough glyph advance as a fraction of the font size; widths are not decoded.
const AVG_GLYPH_WIDTH: f32 = 0.5;
// TJ adjustments beyond this (thousandths of an em) are word gaps.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A single text-showing operation with the font state it was drawn in.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub text: String,
    pub size: f32,
    pub page: u32,
    pub x: f32,
    /// Top of the run, measured downward from the top of the page.
    pub y: f32,
    pub font_name: String,
    pub is_bold: bool,
    pub is_italic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    fn translation(tx: f32, ty: f32) -> Matrix {
        Matrix { e: tx, f: ty, ..Matrix::IDENTITY }
    }

    /// `self × other`, in PDF row-vector convention.
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: number(&operands[0])?,
            b: number(&operands[1])?,
            c: number(&operands[2])?,
            d: number(&operands[3])?,
            e: number(&operands[4])?,
            f: number(&operands[5])?,
        })
    }
}

/// Text and graphics state needed to place runs on the page.
struct TextState {
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    leading: f32,
    font_size: f32,
    font_name: String,
}

impl TextState {
    fn new() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            leading: 0.0,
            font_size: 12.0,
            font_name: String::new(),
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn advance(&mut self, text: &str) {
        let width = text.chars().count() as f32 * self.font_size * AVG_GLYPH_WIDTH;
        self.text_matrix = Matrix::translation(width, 0.0).multiply(&self.text_matrix);
    }
}

/// Extract text runs with their font size, style and position from every page.
///
/// Pages whose content cannot be decoded are skipped with a warning.
pub fn extract_runs(doc: &Document) -> Vec<TextRun> {
    let mut runs = Vec::new();

    for (page_no, page_id) in doc.get_pages() {
        match extract_page_runs(doc, page_no, page_id) {
            Ok(page_runs) => runs.extend(page_runs),
            Err(e) => log::warn!("Could not decode content of page {}: {}", page_no, e),
        }
    }

    runs
}

pub fn extract_page_runs(doc: &Document, page_no: u32, page_id: ObjectId) -> Result<Vec<TextRun>> {
    let content_data = doc.get_page_content(page_id)?;
    let content = Content::decode(&content_data)?;
    let fonts = page_fonts(doc, page_id);
    let page_top = page_top(doc, page_id);

    let mut runs = Vec::new();
    let mut state = TextState::new();

    for op in content.operations {
        let shown = match op.operator.as_str() {
            "q" => {
                state.ctm_stack.push(state.ctm);
                None
            }
            "Q" => {
                if let Some(ctm) = state.ctm_stack.pop() {
                    state.ctm = ctm;
                }
                None
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    state.ctm = m.multiply(&state.ctm);
                }
                None
            }
            "BT" => {
                state.text_matrix = Matrix::IDENTITY;
                state.line_matrix = Matrix::IDENTITY;
                None
            }
            "Tf" => {
                if op.operands.len() == 2 {
                    if let Object::Name(name) = &op.operands[0] {
                        state.font_name = fonts
                            .get(name)
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                    }
                    if let Some(size) = number(&op.operands[1]) {
                        state.font_size = size;
                    }
                }
                None
            }
            "TL" => {
                if let Some(leading) = op.operands.first().and_then(number) {
                    state.leading = leading;
                }
                None
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (
                    op.operands.first().and_then(number),
                    op.operands.get(1).and_then(number),
                ) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
                None
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(&op.operands) {
                    state.text_matrix = m;
                    state.line_matrix = m;
                }
                None
            }
            "T*" => {
                state.next_line();
                None
            }
            "Tj" => op.operands.first().and_then(string_operand),
            "'" => {
                state.next_line();
                op.operands.first().and_then(string_operand)
            }
            "\"" => {
                state.next_line();
                op.operands.get(2).and_then(string_operand)
            }
            "TJ" => match op.operands.first() {
                Some(Object::Array(items)) => Some(combine_tj(items)),
                _ => None,
            },
            _ => None,
        };

        if let Some(text) = shown {
            if !text.trim().is_empty() {
                let placed = state.text_matrix.multiply(&state.ctm);
                let size = state.font_size * placed.vertical_scale();
                let (is_bold, is_italic) = analyze_font_style(&state.font_name);
                runs.push(TextRun {
                    text: text.clone(),
                    size,
                    page: page_no,
                    x: placed.e,
                    y: (page_top - placed.f - size).max(0.0),
                    font_name: state.font_name.clone(),
                    is_bold,
                    is_italic,
                });
            }
            state.advance(&text);
        }
    }

    Ok(runs)
}

fn combine_tj(items: &[Object]) -> String {
    let mut combined = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&decode_pdf_string(bytes)),
            other => {
                if let Some(adjustment) = number(other) {
                    if -adjustment > TJ_SPACE_THRESHOLD
                        && !combined.is_empty()
                        && !combined.ends_with(' ')
                    {
                        combined.push(' ');
                    }
                }
            }
        }
    }
    combined
}

fn string_operand(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Decode a PDF string: UTF-16BE when it carries a byte-order mark, UTF-8 when
/// valid, Latin-1 otherwise.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Real(r) => Some(*r as f32),
        Object::Integer(i) => Some(*i as f32),
        _ => None,
    }
}

pub(crate) fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict),
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up a page attribute, following `/Parent` for inheritable keys.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = page_id;
    for _ in 0..32 {
        let dict = doc.get_dictionary(node).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        node = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Top edge of the page's MediaBox.
fn page_top(doc: &Document, page_id: ObjectId) -> f32 {
    inherited(doc, page_id, b"MediaBox")
        .map(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_array().ok())
        .and_then(|arr| arr.get(3))
        .and_then(number)
        .unwrap_or(DEFAULT_PAGE_HEIGHT)
}

/// Map the page's font resource names (`F1`) to their base font names.
fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, String> {
    let mut fonts = HashMap::new();
    let font_dict = inherited(doc, page_id, b"Resources")
        .and_then(|res| resolve_dict(doc, res))
        .and_then(|res| res.get(b"Font").ok())
        .and_then(|f| resolve_dict(doc, f));

    if let Some(font_dict) = font_dict {
        for (name, obj) in font_dict.iter() {
            let base_font = resolve_dict(doc, obj)
                .and_then(|font| font.get(b"BaseFont").ok())
                .and_then(|base| base.as_name().ok())
                .map(|base| strip_subset_prefix(&String::from_utf8_lossy(base)).to_string());
            if let Some(base_font) = base_font {
                fonts.insert(name.clone(), base_font);
            }
        }
    }
    fonts
}

/// Embedded subsets are named like `ABCDEF+Helvetica-Bold`.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((prefix, rest)) if prefix.len() == 6 && prefix.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

// Analyze font style based on font name
pub fn analyze_font_style(font_name: &str) -> (bool, bool) {
    let font_lower = font_name.to_lowercase();

    let is_bold = font_lower.contains("bold") ||
                  font_lower.contains("black") ||
                  font_lower.contains("heavy") ||
                  font_lower.contains("semibold") ||
                  font_lower.ends_with(",b") ||
                  font_lower.ends_with("-bd");

    let is_italic = font_lower.contains("italic") ||
                    font_lower.contains("oblique");

    (is_bold, is_italic)
}

/// Join runs that share a vertical band into lines, preserving emission order.
pub fn group_runs_into_lines(runs: &[TextRun]) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut current: Vec<&TextRun> = Vec::new();

    for run in runs {
        let same_line = current.last().map_or(false, |prev| {
            prev.page == run.page
                && (prev.y - run.y).abs() <= 0.5 * prev.size.max(run.size)
        });
        if !same_line && !current.is_empty() {
            lines.extend(build_line(&current));
            current.clear();
        }
        current.push(run);
    }
    if !current.is_empty() {
        lines.extend(build_line(&current));
    }

    lines
}

fn build_line(runs: &[&TextRun]) -> Option<TextLine> {
    let mut text = String::new();
    let mut prev_end: Option<f32> = None;
    let mut bold_chars = 0usize;
    let mut total_chars = 0usize;
    let mut dominant: (usize, f32) = (0, 0.0);

    for run in runs {
        if let Some(end) = prev_end {
            let gap = run.x - end;
            if gap > 0.15 * run.size && !text.ends_with(' ') && !run.text.starts_with(' ') {
                text.push(' ');
            }
        }
        text.push_str(&run.text);

        let chars = run.text.trim().chars().count();
        total_chars += chars;
        if run.is_bold {
            bold_chars += chars;
        }
        if chars > dominant.0 {
            dominant = (chars, run.size);
        }
        prev_end = Some(run.x + run.text.chars().count() as f32 * run.size * AVG_GLYPH_WIDTH);
    }

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() || dominant.1 <= 0.0 {
        return None;
    }

    let y = runs.iter().map(|r| r.y).fold(f32::INFINITY, f32::min);
    Some(TextLine {
        text,
        page: runs[0].page,
        font_size: dominant.1,
        is_bold: bold_chars * 2 > total_chars,
        y_position: y,
    })
}
