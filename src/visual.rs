//! Composed-document IR – the "frozen" structure between page composition
//! and the print backend. It encodes exactly what goes on each page:
//! positioned boxes with solid/gradient fills, wrapped text runs, image
//! slots with clip shapes, and vector primitives.
//!
//! The IR is fully serializable so a composed document can be diffed and
//! golden-tested independently of any backend.

use serde::{Deserialize, Serialize};

use crate::plan::PageKind;
pub use crate::theme::Fill;

/// A complete composed booklet ready for a print backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedDocument {
    /// Document title handed to the print subsystem.
    pub title: String,
    /// Page size in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub pages: Vec<ComposedPage>,
}

/// One page of composed content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedPage {
    pub kind: PageKind,
    /// Display page number, `None` for covers.
    pub ordinal: Option<u32>,
    pub boxes: Vec<PageBox>,
}

/// A positioned rectangle with optional content, page-absolute coordinates
/// (origin = top-left of the physical page, in points).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub fill: Option<Fill>,
    pub border: Option<BorderStyle>,
    pub corner_radius: f32,
    /// 0.0–1.0; multiplies the opacity of everything in the box.
    pub opacity: f32,
    /// Decorative rotation in degrees, applied around the box center.
    pub rotation_deg: f32,

    pub text: Option<TextContent>,
    pub image: Option<ImageSlot>,
    pub shape: Option<VecShape>,

    pub children: Vec<PageBox>,
}

impl PageBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            fill: None,
            border: None,
            corner_radius: 0.0,
            opacity: 1.0,
            rotation_deg: 0.0,
            text: None,
            image: None,
            shape: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: String,
    pub dashed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Pre-wrapped text runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub lines: Vec<String>,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub color: String,
    /// Line height as a factor of the font size.
    pub line_height: f32,
    pub align: TextAlign,
}

impl TextContent {
    pub fn new(lines: Vec<String>, font_size: f32, color: &str) -> Self {
        Self {
            lines,
            font_size,
            bold: false,
            italic: false,
            color: color.to_string(),
            line_height: 1.4,
            align: TextAlign::Left,
        }
    }
}

/// Clip applied to an image slot. Polygon points are normalised to the
/// slot (0.0–1.0 on both axes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClipShape {
    Circle,
    RoundedRect { radius: f32 },
    Polygon { points: Vec<[f32; 2]> },
}

/// An image placement. `source` is an opaque reference (usually a base64
/// data URI); the IR never owns image bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSlot {
    pub source: String,
    pub width: f32,
    pub height: f32,
    pub clip: Option<ClipShape>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f32,
    pub dashed: bool,
}

/// Vector primitives for decorative layers (avatar frames, storybook
/// doodles, ruled paper). Coordinates are local to the owning box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VecShape {
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
        fill: Option<String>,
        stroke: Option<Stroke>,
    },
    Polygon {
        points: Vec<[f32; 2]>,
        fill: Option<String>,
        stroke: Option<Stroke>,
    },
    Line {
        points: Vec<[f32; 2]>,
        stroke: Stroke,
    },
}

impl ComposedDocument {
    /// Create an empty A4 document.
    pub fn a4(title: &str) -> Self {
        Self {
            title: title.to_string(),
            // A4: 210mm × 297mm = 595.28 × 841.89 points
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            pages: Vec::new(),
        }
    }

    /// Serialise to JSON (stable field order, usable for golden tests).
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| e.to_string())
    }
}
