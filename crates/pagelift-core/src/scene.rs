//! Mutable scene model for the editable page
//!
//! The scene is an ordered element log: insertion order is paint order.
//! Elements get stable ids so an editing surface can address them across
//! mutations. Mutations are synchronous and transactional: they either
//! fully apply or leave the scene exactly as it was.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::image::PageImage;
use crate::viewport::Viewport;

pub type ElementId = u64;

/// Axis-aligned box in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest rect containing both.
    pub fn union(&self, other: &ScreenRect) -> ScreenRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        ScreenRect {
            x,
            y,
            width: self.max_x().max(other.max_x()) - x,
            height: self.max_y().max(other.max_y()) - y,
        }
    }
}

/// The page raster under the overlay, stretched to fill the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundImage {
    pub rect: ScreenRect,
    pub image: PageImage,
}

/// Opaque patch painted over original glyphs to hide them. Not selectable,
/// not hit-testable.
#[derive(Debug, Clone, PartialEq)]
pub struct OcclusionPatch {
    pub rect: ScreenRect,
    pub fill: Color,
}

/// In-place editable text element.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableText {
    pub rect: ScreenRect,
    pub content: String,
    pub font_size_px: f64,
    pub font_family: String,
    pub fill: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualElement {
    Background(BackgroundImage),
    Patch(OcclusionPatch),
    Text(EditableText),
}

impl VisualElement {
    pub fn rect(&self) -> ScreenRect {
        match self {
            VisualElement::Background(b) => b.rect,
            VisualElement::Patch(p) => p.rect,
            VisualElement::Text(t) => t.rect,
        }
    }

    /// Only text elements respond to selection and editing.
    pub fn is_interactive(&self) -> bool {
        matches!(self, VisualElement::Text(_))
    }
}

/// One user edit: any combination of reposition and retype. Fields left
/// `None` are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenePatch {
    pub position: Option<(f64, f64)>,
    pub text: Option<String>,
}

/// An element together with its scene-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneElement {
    pub id: ElementId,
    pub element: VisualElement,
}

/// The editable page: viewport plus ordered visual elements.
///
/// Owned exclusively by one editing session; created per upload and replaced
/// wholesale by the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneModel {
    viewport: Viewport,
    next_id: ElementId,
    elements: Vec<SceneElement>,
}

impl SceneModel {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            next_id: 0,
            elements: Vec::new(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Append an element at the top of the paint order.
    pub fn add(&mut self, element: VisualElement) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.push(SceneElement { id, element });
        id
    }

    /// Remove an element by id. Returns `false` when the id is unknown.
    pub fn remove(&mut self, id: ElementId) -> bool {
        if let Some(pos) = self.elements.iter().position(|e| e.id == id) {
            self.elements.remove(pos);
            true
        } else {
            false
        }
    }

    /// Ordered elements, background first, for painting.
    pub fn elements(&self) -> &[SceneElement] {
        &self.elements
    }

    pub fn get(&self, id: ElementId) -> Option<&VisualElement> {
        self.elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| &e.element)
    }

    /// Move an element. Any finite coordinate is allowed, including
    /// off-canvas; no clamping. Returns `false` (no change) for an unknown
    /// id or non-finite coordinates.
    pub fn set_position(&mut self, id: ElementId, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let Some(entry) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        match &mut entry.element {
            VisualElement::Background(b) => {
                b.rect.x = x;
                b.rect.y = y;
            }
            VisualElement::Patch(p) => {
                p.rect.x = x;
                p.rect.y = y;
            }
            VisualElement::Text(t) => {
                t.rect.x = x;
                t.rect.y = y;
            }
        }
        true
    }

    /// Replace the content of a text element. Returns `false` (no change)
    /// when the id is unknown or names a non-text element.
    pub fn set_text(&mut self, id: ElementId, content: &str) -> bool {
        let Some(entry) = self.elements.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        match &mut entry.element {
            VisualElement::Text(t) => {
                t.content = content.to_string();
                true
            }
            _ => false,
        }
    }

    /// Union of every element box, for sizing the export canvas. Falls back
    /// to the viewport box for an empty scene.
    pub fn bounding_box(&self) -> ScreenRect {
        let viewport_rect = ScreenRect::new(0.0, 0.0, self.viewport.width_px, self.viewport.height_px);
        self.elements
            .iter()
            .map(|e| e.element.rect())
            .fold(viewport_rect, |acc, r| acc.union(&r))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
