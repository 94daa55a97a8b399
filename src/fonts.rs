//! Font metrics and text measurement using `ttf-parser`.
//!
//! The composer needs real advance widths to wrap paragraph text into the
//! fixed panel widths of a page. When a TTF/OTF face is registered we
//! measure actual glyph advances; otherwise a proportional-font heuristic
//! (0.5 × font size per char, bold ~10 % wider) keeps layout deterministic.

use std::collections::HashMap;

/// A registered face with the metrics measurement needs.
#[derive(Clone)]
pub struct FaceMetrics {
    /// Raw face bytes (ttf-parser borrows from these).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

/// Holds registered faces and answers measurement queries.
pub struct FontManager {
    faces: HashMap<FontKey, FaceMetrics>,
    default_key: FontKey,
}

impl FontManager {
    pub fn new() -> Self {
        Self {
            faces: HashMap::new(),
            default_key: FontKey {
                family: "Helvetica".to_string(),
                bold: false,
                italic: false,
            },
        }
    }

    /// Register a TTF/OTF face from bytes.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), String> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| format!("Failed to parse font: {e}"))?;

        let metrics = FaceMetrics {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            bytes,
        };

        let key = FontKey {
            family: family.to_string(),
            bold,
            italic,
        };
        if self.faces.is_empty() {
            self.default_key = key.clone();
        }
        self.faces.insert(key, metrics);
        Ok(())
    }

    /// Register Helvetica-like synthetic metrics so measurement always has
    /// a face to fall back on.
    pub fn ensure_default(&mut self) {
        if !self.faces.is_empty() {
            return;
        }
        for bold in [false, true] {
            let key = FontKey {
                family: "Helvetica".to_string(),
                bold,
                italic: false,
            };
            self.faces.insert(
                key.clone(),
                FaceMetrics {
                    bytes: Vec::new(),
                    units_per_em: 1000.0,
                    ascender: 750.0,
                    descender: -250.0,
                },
            );
            if !bold {
                self.default_key = key;
            }
        }
    }

    fn get(&self, key: &FontKey) -> &FaceMetrics {
        self.faces.get(key).unwrap_or_else(|| {
            self.faces
                .get(&self.default_key)
                .expect("no faces registered")
        })
    }

    /// Width of `text` at `font_size` points.
    pub fn measure_text_width(
        &self,
        text: &str,
        font_size: f32,
        bold: bool,
        italic: bool,
        family: &str,
    ) -> f32 {
        let key = FontKey {
            family: family.to_string(),
            bold,
            italic,
        };
        let metrics = self.get(&key);

        if metrics.bytes.is_empty() {
            let avg = if bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * font_size * avg;
        }

        if let Ok(face) = ttf_parser::Face::parse(&metrics.bytes, 0) {
            let scale = font_size / metrics.units_per_em;
            let mut width = 0.0f32;
            for ch in text.chars() {
                if let Some(gid) = face.glyph_index(ch) {
                    width += face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;
                } else {
                    width += font_size * 0.5;
                }
            }
            width
        } else {
            text.chars().count() as f32 * font_size * 0.5
        }
    }

}

impl Default for FontManager {
    fn default() -> Self {
        let mut mgr = Self::new();
        mgr.ensure_default();
        mgr
    }
}

/// Word-wrap text into lines fitting `max_width` points. Existing newlines
/// are hard breaks; blank paragraphs survive as empty lines.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in &words {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            let w = fonts.measure_text_width(&candidate, font_size, bold, italic, family);
            if w > max_width && !current.is_empty() {
                lines.push(current);
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
