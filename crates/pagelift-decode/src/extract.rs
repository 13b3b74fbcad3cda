//! Text run recovery from page content streams
//!
//! Walks the decoded operation list with a small text-state machine and
//! emits one `TextRun` per show-text operator (a whole `TJ` array counts as
//! one run). Simple single-byte fonts only; widths come from the font's
//! `Widths` table when present.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use pagelift_core::{Affine, TextRun};

/// Per-mille advance used when a font carries no usable width for a code.
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// Cap on Parent-chain walks; real documents nest a handful deep.
const MAX_TREE_DEPTH: usize = 32;

/// Advance widths for one simple font, in per-mille of the em square.
#[derive(Debug, Clone)]
pub(crate) struct FontWidths {
    first_char: i64,
    widths: Vec<f64>,
    missing: f64,
}

impl FontWidths {
    fn fallback() -> Self {
        Self {
            first_char: 0,
            widths: Vec::new(),
            missing: DEFAULT_GLYPH_WIDTH,
        }
    }

    fn advance(&self, code: u8) -> f64 {
        let idx = code as i64 - self.first_char;
        if idx >= 0 && (idx as usize) < self.widths.len() {
            let w = self.widths[idx as usize];
            if w > 0.0 {
                return w;
            }
        }
        self.missing
    }

    /// Total advance of a byte string at `font_size`, in text-space units.
    fn string_advance(&self, bytes: &[u8], font_size: f64) -> f64 {
        bytes.iter().map(|&b| self.advance(b)).sum::<f64>() / 1000.0 * font_size
    }
}

struct TextState {
    font_size: f64,
    leading: f64,
    /// Text matrix.
    tm: Affine,
    /// Text line matrix: start of the current line.
    tlm: Affine,
    active_font: FontWidths,
}

impl TextState {
    fn new() -> Self {
        Self {
            font_size: 0.0,
            leading: 0.0,
            tm: Affine::IDENTITY,
            tlm: Affine::IDENTITY,
            active_font: FontWidths::fallback(),
        }
    }

    fn next_line(&mut self, tx: f64, ty: f64) {
        self.tlm = self.tlm.multiply(Affine::translate(tx, ty));
        self.tm = self.tlm;
    }
}

/// Recover the text runs of one page, in content order.
///
/// A page without readable content yields no runs rather than an error;
/// only the document container itself is load-bearing for decode failure.
pub(crate) fn extract_runs(doc: &Document, page_id: ObjectId) -> Vec<TextRun> {
    let content = match doc.get_page_content(page_id) {
        Ok(content) => content,
        Err(err) => {
            debug!(%err, "page has no readable content stream");
            return Vec::new();
        }
    };
    let operations = match Content::decode(&content) {
        Ok(decoded) => decoded.operations,
        Err(err) => {
            warn!(%err, "content stream did not decode; emitting no runs");
            return Vec::new();
        }
    };

    let fonts = load_page_fonts(doc, page_id);

    let mut runs = Vec::new();
    let mut state = TextState::new();
    let mut ctm = Affine::IDENTITY;
    let mut ctm_stack: Vec<Affine> = Vec::new();

    for op in &operations {
        match op.operator.as_str() {
            "q" => ctm_stack.push(ctm),
            "Q" => {
                if let Some(saved) = ctm_stack.pop() {
                    ctm = saved;
                }
            }
            "cm" => {
                if let Some(m) = affine_operands(&op.operands) {
                    ctm = ctm.multiply(m);
                }
            }
            "BT" => {
                state.tm = Affine::IDENTITY;
                state.tlm = Affine::IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                if let (Some(Object::Name(name)), Some(size)) =
                    (op.operands.first(), op.operands.get(1).and_then(num))
                {
                    state.font_size = size;
                    state.active_font = fonts
                        .get(String::from_utf8_lossy(name).as_ref())
                        .cloned()
                        .unwrap_or_else(FontWidths::fallback);
                }
            }
            "TL" => {
                if let Some(leading) = op.operands.first().and_then(num) {
                    state.leading = leading;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (
                    op.operands.first().and_then(num),
                    op.operands.get(1).and_then(num),
                ) {
                    state.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (
                    op.operands.first().and_then(num),
                    op.operands.get(1).and_then(num),
                ) {
                    state.leading = -ty;
                    state.next_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = affine_operands(&op.operands) {
                    state.tm = m;
                    state.tlm = m;
                }
            }
            "T*" => state.next_line(0.0, -state.leading),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    show_bytes(&mut runs, &mut state, ctm, bytes);
                }
            }
            "'" => {
                state.next_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    show_bytes(&mut runs, &mut state, ctm, bytes);
                }
            }
            "\"" => {
                // Word/char spacing operands are ignored; the string shows
                // on the next line like a quote operator.
                state.next_line(0.0, -state.leading);
                if let Some(Object::String(bytes, _)) = op.operands.get(2) {
                    show_bytes(&mut runs, &mut state, ctm, bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(parts)) = op.operands.first() {
                    show_array(&mut runs, &mut state, ctm, parts);
                }
            }
            _ => {}
        }
    }

    runs
}

/// Emit one run for a shown byte string and advance the text matrix.
fn show_bytes(runs: &mut Vec<TextRun>, state: &mut TextState, ctm: Affine, bytes: &[u8]) {
    let advance = state.active_font.string_advance(bytes, state.font_size);
    push_run(runs, state, ctm, decode_text_bytes(bytes), advance);
    state.tm = state.tm.multiply(Affine::translate(advance, 0.0));
}

/// A whole `TJ` array is one run: strings concatenate, numeric entries
/// adjust the advance (per-mille of the font size, subtractive).
fn show_array(runs: &mut Vec<TextRun>, state: &mut TextState, ctm: Affine, parts: &[Object]) {
    let mut content = String::new();
    let mut advance = 0.0;
    for part in parts {
        match part {
            Object::String(bytes, _) => {
                content.push_str(&decode_text_bytes(bytes));
                advance += state.active_font.string_advance(bytes, state.font_size);
            }
            other => {
                if let Some(adjust) = num(other) {
                    advance -= adjust / 1000.0 * state.font_size;
                }
            }
        }
    }
    if content.is_empty() {
        return;
    }
    push_run(runs, state, ctm, content, advance);
    state.tm = state.tm.multiply(Affine::translate(advance, 0.0));
}

fn push_run(
    runs: &mut Vec<TextRun>,
    state: &TextState,
    ctm: Affine,
    content: String,
    advance: f64,
) {
    // Baseline anchor with the font size folded in, so the run transform's
    // first-column norm recovers the effective size downstream.
    let combined = ctm.multiply(state.tm);
    let transform = combined.multiply(Affine::scale(state.font_size, state.font_size));
    let width_units = advance * combined.x_scale();
    runs.push(TextRun::new(content, transform, width_units));
}

/// Best-effort string decoding: UTF-8, then UTF-16BE with BOM, then Latin-1.
fn decode_text_bytes(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter(|chunk| chunk.len() == 2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

fn num(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn affine_operands(operands: &[Object]) -> Option<Affine> {
    if operands.len() < 6 {
        return None;
    }
    Some(Affine::new(
        num(&operands[0])?,
        num(&operands[1])?,
        num(&operands[2])?,
        num(&operands[3])?,
        num(&operands[4])?,
        num(&operands[5])?,
    ))
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    if let Object::Reference(id) = obj {
        doc.get_object(*id).unwrap_or(obj)
    } else {
        obj
    }
}

/// Look up a page attribute, walking the Parent chain for inheritable keys.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(obj) = dict.get(key) {
            return Some(resolve(doc, obj));
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Widths per font resource name for one page.
fn load_page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<String, FontWidths> {
    let mut fonts = HashMap::new();
    let Some(resources) = inherited(doc, page_id, b"Resources").and_then(|o| o.as_dict().ok())
    else {
        return fonts;
    };
    let Some(font_dict) = resources
        .get(b"Font")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
    else {
        return fonts;
    };

    for (name, obj) in font_dict.iter() {
        if let Ok(dict) = resolve(doc, obj).as_dict() {
            fonts.insert(
                String::from_utf8_lossy(name).to_string(),
                font_widths(doc, dict),
            );
        }
    }
    fonts
}

fn font_widths(doc: &Document, font: &Dictionary) -> FontWidths {
    let first_char = font
        .get(b"FirstChar")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| num(o))
        .unwrap_or(0.0) as i64;

    let widths = font
        .get(b"Widths")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
        .map(|arr| {
            arr.iter()
                .map(|o| num(resolve(doc, o)).unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default();

    let missing = font
        .get(b"FontDescriptor")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .and_then(|d| d.get(b"MissingWidth").ok().and_then(num))
        .unwrap_or(DEFAULT_GLYPH_WIDTH);

    FontWidths {
        first_char,
        widths,
        missing,
    }
}
