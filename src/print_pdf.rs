//! Default print backend – renders a [`ComposedDocument`] to PDF bytes
//! using `printpdf` (v0.8 ops-based API) and writes them to a file.
//!
//! This backend is deliberately approximate where PDF primitives diverge
//! from the on-screen renderer: gradients become two stacked bands, box
//! opacity is emulated by blending colors toward the paper, circles become
//! 24-gons, box rotation applies to text (the watermark grid) but not to
//! fills or shapes, and clip shapes are not applied to embedded images.
//! Images
//! whose source is not a decodable base64 data URI are skipped with a
//! warning, never fatal.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::export::PrintCapability;
use crate::theme;
use crate::visual::{
    ComposedDocument, Fill, PageBox, Stroke, TextAlign, TextContent, VecShape,
};

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// `PrintCapability` that renders to a PDF file. The composed-document
/// title becomes the PDF metadata title; the configured path receives the
/// bytes.
pub struct PdfPrinter {
    output: PathBuf,
    /// Size of the last artifact written, for the CLI summary.
    pub last_written: Option<usize>,
}

impl PdfPrinter {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            last_written: None,
        }
    }
}

impl PrintCapability for PdfPrinter {
    fn print(&mut self, doc: &ComposedDocument, title: &str) -> Result<(), String> {
        let bytes = render_pdf(doc, title)?;
        std::fs::write(&self.output, &bytes)
            .map_err(|e| format!("Failed to write {}: {e}", self.output.display()))?;
        self.last_written = Some(bytes.len());
        Ok(())
    }
}

/// Render a composed document into PDF bytes.
pub fn render_pdf(doc: &ComposedDocument, title: &str) -> Result<Vec<u8>, String> {
    let page_w = Mm(doc.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(doc.page_height_pt * 0.352778);

    let mut pdf = PdfDocument::new(title);

    // Pre-register all images.
    let mut all_sources: HashSet<&str> = HashSet::new();
    for page in &doc.pages {
        for pbox in &page.boxes {
            collect_image_sources(pbox, &mut all_sources);
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for source in &all_sources {
        let bytes = match parse_data_uri(source) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image — {e}");
                continue;
            }
        };

        // Decode with the `image` crate to obtain pixel dimensions.
        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping image — decode error: {e}");
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image — PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = pdf.add_image(&raw);

        image_resources.insert(
            source.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    let mut pages = Vec::new();
    for page in &doc.pages {
        let mut ops = Vec::new();
        for pbox in &page.boxes {
            render_box(
                &mut ops,
                pbox,
                0.0,
                0.0,
                1.0,
                doc.page_height_pt,
                &image_resources,
            );
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    pdf.with_pages(pages);
    Ok(pdf.save(&PdfSaveOptions::default(), &mut Vec::new()))
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    if !src.starts_with("data:") {
        // char-based truncation; byte slicing could split a multibyte char.
        let preview: String = src.chars().take(80).collect();
        return Err(format!(
            "Image source must be a base64 data URI \
             (e.g. `data:image/png;base64,...`). Got: {preview:?}"
        ));
    }
    let rest = &src["data:".len()..];
    let comma_pos = rest.find(',').ok_or_else(|| {
        "Invalid data URI: missing `,` separator between header and data".to_string()
    })?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err("Only base64-encoded data URIs are supported. \
             The header must contain `;base64` (e.g. `data:image/png;base64,...`)."
            .to_string());
    }
    let b64_data = rest[comma_pos + 1..].trim();
    BASE64_STD
        .decode(b64_data)
        .map_err(|e| format!("Base64 decode error: {e}"))
}

fn collect_image_sources<'a>(pbox: &'a PageBox, sources: &mut HashSet<&'a str>) {
    if let Some(slot) = &pbox.image {
        sources.insert(slot.source.as_str());
    }
    for child in &pbox.children {
        collect_image_sources(child, sources);
    }
}

/// Hex color → unit RGB, blended toward white by the accumulated opacity.
/// Alpha suffixes (8-digit hex) fold into the blend. Malformed colors
/// render black.
fn resolve_color(hex: &str, opacity: f32) -> [f32; 3] {
    let (base, alpha) = if hex.len() == 9 {
        let alpha = u8::from_str_radix(&hex[7..9], 16).unwrap_or(255) as f32 / 255.0;
        (&hex[..7], alpha)
    } else {
        (hex, 1.0)
    };
    let rgb = theme::Color::from_hex(base)
        .map(theme::Color::to_unit_rgb)
        .unwrap_or([0.0, 0.0, 0.0]);
    let a = (opacity * alpha).clamp(0.0, 1.0);
    [
        rgb[0] * a + (1.0 - a),
        rgb[1] * a + (1.0 - a),
        rgb[2] * a + (1.0 - a),
    ]
}

fn rgb_color(col: [f32; 3]) -> Color {
    Color::Rgb(Rgb {
        r: col[0],
        g: col[1],
        b: col[2],
        icc_profile: None,
    })
}

fn rect_ring(x1: f32, y1: f32, x2: f32, y2: f32) -> PolygonRing {
    PolygonRing {
        points: [[x1, y1], [x2, y1], [x2, y2], [x1, y2]]
            .into_iter()
            .map(|[x, y]| LinePoint {
                p: Point { x: Pt(x), y: Pt(y) },
                bezier: false,
            })
            .collect(),
    }
}

fn fill_rect(ops: &mut Vec<Op>, x1: f32, y1: f32, x2: f32, y2: f32, col: [f32; 3]) {
    ops.push(Op::SetFillColor { col: rgb_color(col) });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![rect_ring(x1, y1, x2, y2)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}

/// Circles have no native op in this subset; 24 segments read as round at
/// print resolution.
fn circle_points(cx: f32, cy: f32, r: f32) -> Vec<[f32; 2]> {
    (0..24)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / 24.0;
            [cx + r * angle.cos(), cy + r * angle.sin()]
        })
        .collect()
}

fn draw_polygon(ops: &mut Vec<Op>, points: &[[f32; 2]], fill: Option<[f32; 3]>, stroke: Option<(&Stroke, f32)>) {
    let ring = PolygonRing {
        points: points
            .iter()
            .map(|[x, y]| LinePoint {
                p: Point {
                    x: Pt(*x),
                    y: Pt(*y),
                },
                bezier: false,
            })
            .collect(),
    };
    if let Some(col) = fill {
        ops.push(Op::SetFillColor { col: rgb_color(col) });
        ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![ring.clone()],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }
    if let Some((stroke, opacity)) = stroke {
        ops.push(Op::SetOutlineColor {
            col: rgb_color(resolve_color(&stroke.color, opacity)),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(stroke.width),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: ring.points,
                is_closed: true,
            },
        });
    }
}

/// Estimated text width with the builtin-font heuristic the measurement
/// layer also falls back to.
fn estimate_width(text: &str, font_size: f32, bold: bool) -> f32 {
    let avg = if bold { 0.55 } else { 0.5 };
    text.chars().count() as f32 * font_size * avg
}

fn render_text(
    ops: &mut Vec<Op>,
    text: &TextContent,
    abs_x: f32,
    abs_y: f32,
    width: f32,
    opacity: f32,
    rotation_deg: f32,
    page_height: f32,
) {
    let font = match (text.bold, text.italic) {
        (true, true) => BuiltinFont::HelveticaBoldOblique,
        (true, false) => BuiltinFont::HelveticaBold,
        (false, true) => BuiltinFont::HelveticaOblique,
        (false, false) => BuiltinFont::Helvetica,
    };
    let col = resolve_color(&text.color, opacity);
    let line_step = text.font_size * text.line_height;

    for (i, line) in text.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let est = estimate_width(line, text.font_size, text.bold);
        let text_x = match text.align {
            TextAlign::Left => abs_x,
            TextAlign::Center => abs_x + (width - est) / 2.0,
            TextAlign::Right => abs_x + width - est,
        };
        // Baseline ≈ top of line + ascender (approx 0.75 × font_size).
        let text_y = page_height - (abs_y + i as f32 * line_step) - text.font_size * 0.75;

        ops.push(Op::StartTextSection);
        if rotation_deg != 0.0 {
            // IR rotation is clockwise (screen convention, y-down); the PDF
            // text matrix rotates counter-clockwise.
            ops.push(Op::SetTextMatrix {
                matrix: TextMatrix::TranslateRotate(Pt(text_x), Pt(text_y), -rotation_deg),
            });
        } else {
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(text_x),
                    y: Pt(text_y),
                },
            });
        }
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(text.font_size),
            font,
        });
        ops.push(Op::SetLineHeight { lh: Pt(line_step) });
        ops.push(Op::SetFillColor { col: rgb_color(col) });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(to_winlatin(line))],
            font,
        });
        ops.push(Op::EndTextSection);
    }
}

/// Recursively render a box and its children. `origin` is the parent's
/// absolute top-left; `opacity` accumulates down the tree.
fn render_box(
    ops: &mut Vec<Op>,
    pbox: &PageBox,
    origin_x: f32,
    origin_y: f32,
    opacity: f32,
    page_height: f32,
    images: &HashMap<String, ImageResource>,
) {
    let abs_x = origin_x + pbox.x;
    let abs_y = origin_y + pbox.y;
    let opacity = opacity * pbox.opacity;

    // PDF coordinate system: origin at bottom-left; ours is top-left.
    let pdf_top = page_height - abs_y;
    let pdf_bottom = pdf_top - pbox.height;

    match &pbox.fill {
        Some(Fill::Solid { color }) => {
            fill_rect(
                ops,
                abs_x,
                pdf_bottom,
                abs_x + pbox.width,
                pdf_top,
                resolve_color(color, opacity),
            );
        }
        // Two stacked bands stand in for the gradient ramp.
        Some(Fill::Gradient { from, to }) => {
            let mid = pdf_bottom + pbox.height / 2.0;
            fill_rect(
                ops,
                abs_x,
                mid,
                abs_x + pbox.width,
                pdf_top,
                resolve_color(from, opacity),
            );
            fill_rect(
                ops,
                abs_x,
                pdf_bottom,
                abs_x + pbox.width,
                mid,
                resolve_color(to, opacity),
            );
        }
        None => {}
    }

    if let Some(border) = &pbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb_color(resolve_color(&border.color, opacity)),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });
        ops.push(Op::DrawLine {
            line: Line {
                points: rect_ring(abs_x, pdf_bottom, abs_x + pbox.width, pdf_top).points,
                is_closed: true,
            },
        });
    }

    if let Some(shape) = &pbox.shape {
        // Shape coordinates are local, y-down; flip into page space.
        let to_page = |p: &[f32; 2]| [abs_x + p[0], page_height - (abs_y + p[1])];
        match shape {
            VecShape::Circle {
                cx,
                cy,
                r,
                fill,
                stroke,
            } => {
                let center = to_page(&[*cx, *cy]);
                let points = circle_points(center[0], center[1], *r);
                draw_polygon(
                    ops,
                    &points,
                    fill.as_deref().map(|c| resolve_color(c, opacity)),
                    stroke.as_ref().map(|s| (s, opacity)),
                );
            }
            VecShape::Polygon {
                points,
                fill,
                stroke,
            } => {
                let mapped: Vec<[f32; 2]> = points.iter().map(|p| to_page(p)).collect();
                draw_polygon(
                    ops,
                    &mapped,
                    fill.as_deref().map(|c| resolve_color(c, opacity)),
                    stroke.as_ref().map(|s| (s, opacity)),
                );
            }
            VecShape::Line { points, stroke } => {
                ops.push(Op::SetOutlineColor {
                    col: rgb_color(resolve_color(&stroke.color, opacity)),
                });
                ops.push(Op::SetOutlineThickness {
                    pt: Pt(stroke.width),
                });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: points
                            .iter()
                            .map(|p| {
                                let mapped = to_page(p);
                                LinePoint {
                                    p: Point {
                                        x: Pt(mapped[0]),
                                        y: Pt(mapped[1]),
                                    },
                                    bezier: false,
                                }
                            })
                            .collect(),
                        is_closed: false,
                    },
                });
            }
        }
    }

    if let Some(text) = &pbox.text {
        render_text(
            ops,
            text,
            abs_x,
            abs_y,
            pbox.width,
            opacity,
            pbox.rotation_deg,
            page_height,
        );
    }

    if let Some(slot) = &pbox.image {
        if let Some(res) = images.get(&slot.source) {
            let img_bottom_y = page_height - abs_y - slot.height;
            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                slot.width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                slot.height / res.px_height as f32
            } else {
                1.0
            };
            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(abs_x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &pbox.children {
        render_box(ops, child, abs_x, abs_y, opacity, page_height, images);
    }
}
