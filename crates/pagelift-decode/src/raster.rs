//! Best-effort background rasterization
//!
//! Paints the page's vector content (paths, rectangles, fills and strokes)
//! onto a white pixmap at viewport resolution. Glyph painting stays behind
//! the decoder boundary; the overlay's occlusion patches cover the text
//! areas regardless.

use lopdf::content::Content;
use lopdf::{Document, ObjectId};
use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::debug;

use pagelift_core::{Affine, PageImage, Viewport};

struct PaintState {
    ctm: Affine,
    fill: Color,
    stroke: Color,
    line_width: f32,
}

impl PaintState {
    fn new() -> Self {
        Self {
            ctm: Affine::IDENTITY,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
        }
    }
}

pub(crate) fn render_background(doc: &Document, page_id: ObjectId, viewport: &Viewport) -> PageImage {
    let width = viewport.width_px.round().max(1.0) as u32;
    let height = viewport.height_px.round().max(1.0) as u32;

    let Some(mut pixmap) = Pixmap::new(width, height) else {
        debug!(width, height, "could not allocate background pixmap");
        return PageImage::filled(1, 1, pagelift_core::Color::WHITE);
    };
    pixmap.fill(Color::WHITE);

    let content = doc.get_page_content(page_id).unwrap_or_default();
    match Content::decode(&content) {
        Ok(decoded) => paint_operations(&mut pixmap, &decoded.operations, viewport),
        Err(err) => debug!(%err, "background content did not decode; leaving page blank"),
    }

    image_from_pixmap(&pixmap)
}

fn paint_operations(
    pixmap: &mut Pixmap,
    operations: &[lopdf::content::Operation],
    viewport: &Viewport,
) {
    let mut state = PaintState::new();
    let mut stack: Vec<PaintState> = Vec::new();
    let mut builder = PathBuilder::new();
    let mut current = (0.0f32, 0.0f32);

    for op in operations {
        let nums: Vec<f32> = op.operands.iter().filter_map(num_f32).collect();
        match op.operator.as_str() {
            "q" => stack.push(PaintState {
                ctm: state.ctm,
                fill: state.fill,
                stroke: state.stroke,
                line_width: state.line_width,
            }),
            "Q" => {
                if let Some(saved) = stack.pop() {
                    state = saved;
                }
            }
            "cm" => {
                if nums.len() >= 6 {
                    state.ctm = state.ctm.multiply(Affine::new(
                        nums[0] as f64,
                        nums[1] as f64,
                        nums[2] as f64,
                        nums[3] as f64,
                        nums[4] as f64,
                        nums[5] as f64,
                    ));
                }
            }
            "m" if nums.len() >= 2 => {
                current = (nums[0], nums[1]);
                builder.move_to(nums[0], nums[1]);
            }
            "l" if nums.len() >= 2 => {
                current = (nums[0], nums[1]);
                builder.line_to(nums[0], nums[1]);
            }
            "c" if nums.len() >= 6 => {
                builder.cubic_to(nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]);
                current = (nums[4], nums[5]);
            }
            "v" if nums.len() >= 4 => {
                builder.cubic_to(current.0, current.1, nums[0], nums[1], nums[2], nums[3]);
                current = (nums[2], nums[3]);
            }
            "y" if nums.len() >= 4 => {
                builder.cubic_to(nums[0], nums[1], nums[2], nums[3], nums[2], nums[3]);
                current = (nums[2], nums[3]);
            }
            "re" if nums.len() >= 4 => {
                let (x, y, w, h) = (nums[0], nums[1], nums[2], nums[3]);
                builder.move_to(x, y);
                builder.line_to(x + w, y);
                builder.line_to(x + w, y + h);
                builder.line_to(x, y + h);
                builder.close();
            }
            "h" => builder.close(),
            "n" => builder = PathBuilder::new(),
            "f" | "F" | "f*" => {
                let rule = if op.operator == "f*" {
                    FillRule::EvenOdd
                } else {
                    FillRule::Winding
                };
                fill_current(pixmap, &mut builder, &state, viewport, rule);
            }
            "S" => stroke_current(pixmap, &mut builder, &state, viewport, false),
            "s" => stroke_current(pixmap, &mut builder, &state, viewport, true),
            "B" | "B*" => {
                let rule = if op.operator == "B*" {
                    FillRule::EvenOdd
                } else {
                    FillRule::Winding
                };
                if let Some(path) = std::mem::replace(&mut builder, PathBuilder::new()).finish() {
                    let transform = to_transform(viewport.doc_to_screen.multiply(state.ctm));
                    let mut paint = Paint::default();
                    paint.anti_alias = true;
                    paint.set_color(state.fill);
                    pixmap.fill_path(&path, &paint, rule, transform, None);
                    paint.set_color(state.stroke);
                    let stroke = Stroke {
                        width: state.line_width,
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(&path, &paint, &stroke, transform, None);
                }
            }
            "w" if !nums.is_empty() => state.line_width = nums[0].max(0.1),
            "rg" if nums.len() >= 3 => {
                state.fill = rgb(nums[0], nums[1], nums[2]);
            }
            "RG" if nums.len() >= 3 => {
                state.stroke = rgb(nums[0], nums[1], nums[2]);
            }
            "g" if !nums.is_empty() => state.fill = rgb(nums[0], nums[0], nums[0]),
            "G" if !nums.is_empty() => state.stroke = rgb(nums[0], nums[0], nums[0]),
            "k" if nums.len() >= 4 => state.fill = cmyk(nums[0], nums[1], nums[2], nums[3]),
            "K" if nums.len() >= 4 => state.stroke = cmyk(nums[0], nums[1], nums[2], nums[3]),
            _ => {}
        }
    }
}

fn fill_current(
    pixmap: &mut Pixmap,
    builder: &mut PathBuilder,
    state: &PaintState,
    viewport: &Viewport,
    rule: FillRule,
) {
    let finished = std::mem::replace(builder, PathBuilder::new()).finish();
    if let Some(path) = finished {
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color(state.fill);
        let transform = to_transform(viewport.doc_to_screen.multiply(state.ctm));
        pixmap.fill_path(&path, &paint, rule, transform, None);
    }
}

fn stroke_current(
    pixmap: &mut Pixmap,
    builder: &mut PathBuilder,
    state: &PaintState,
    viewport: &Viewport,
    close_first: bool,
) {
    let mut taken = std::mem::replace(builder, PathBuilder::new());
    if close_first {
        taken.close();
    }
    if let Some(path) = taken.finish() {
        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color(state.stroke);
        let stroke = Stroke {
            width: state.line_width,
            ..Stroke::default()
        };
        let transform = to_transform(viewport.doc_to_screen.multiply(state.ctm));
        pixmap.stroke_path(&path, &paint, &stroke, transform, None);
    }
}

fn num_f32(obj: &lopdf::Object) -> Option<f32> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f32),
        lopdf::Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::from_rgba(r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0), 1.0)
        .unwrap_or(Color::BLACK)
}

fn cmyk(c: f32, m: f32, y: f32, k: f32) -> Color {
    rgb((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k))
}

fn to_transform(m: Affine) -> Transform {
    Transform::from_row(
        m.a as f32, m.b as f32, m.c as f32, m.d as f32, m.e as f32, m.f as f32,
    )
}

fn image_from_pixmap(pixmap: &Pixmap) -> PageImage {
    let mut rgba = Vec::with_capacity(pixmap.width() as usize * pixmap.height() as usize * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    PageImage::from_rgba(pixmap.width(), pixmap.height(), rgba)
        .unwrap_or_else(|| PageImage::filled(1, 1, pagelift_core::Color::WHITE))
}
