//! Avatar frame renderer – procedurally builds the decorative vector
//! composition around a clipped avatar image.
//!
//! Each of the nine frame types is a distinct layered composition of
//! [`VecShape`] primitives below and above the image layer. Everything is
//! deterministic: positions and sizes are index-derived, never random, so
//! identical inputs always produce an identical composition.
//!
//! Borders on polygon-clipped shapes (Hexagon, Shield) cannot use a plain
//! stroked outline – the clip would cut it. The renderer instead uses the
//! double-shape technique: an oversized filled backing shape behind an
//! inset foreground image ([`bordered_backing`]).

use serde::{Deserialize, Serialize};

use crate::snapshot::{AvatarFrame, OutlineShape};
use crate::theme::ThemeTokens;
use crate::visual::{ClipShape, ImageSlot, PageBox, Stroke, VecShape};

/// The colors a frame composition may use. Derived from theme tokens so
/// the renderer itself stays free of business data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePalette {
    pub primary: String,
    pub readable: String,
    pub card: String,
    pub accent: String,
}

impl FramePalette {
    pub fn from_tokens(tokens: &ThemeTokens) -> Self {
        Self {
            primary: tokens.primary.clone(),
            readable: tokens.readable_primary.clone(),
            card: tokens.card.clone(),
            accent: tokens.accent.clone(),
        }
    }
}

/// A composed avatar: decorative layers under the image, the clipped
/// image itself (inset from the edges when a border look applies), and
/// layers over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameComposition {
    /// Side length of the square composition area, in points.
    pub size: f32,
    pub under: Vec<VecShape>,
    /// Inset of the image layer from each edge of the area.
    pub avatar_inset: f32,
    pub avatar: ImageSlot,
    pub over: Vec<VecShape>,
}

impl FrameComposition {
    /// Materialise the composition as a positioned box tree.
    pub fn to_page_box(&self, x: f32, y: f32) -> PageBox {
        let mut root = PageBox::new(x, y, self.size, self.size);
        for shape in &self.under {
            let mut layer = PageBox::new(0.0, 0.0, self.size, self.size);
            layer.shape = Some(shape.clone());
            root.children.push(layer);
        }
        let side = self.size - 2.0 * self.avatar_inset;
        let mut image_box = PageBox::new(self.avatar_inset, self.avatar_inset, side, side);
        image_box.image = Some(self.avatar.clone());
        root.children.push(image_box);
        for shape in &self.over {
            let mut layer = PageBox::new(0.0, 0.0, self.size, self.size);
            layer.shape = Some(shape.clone());
            root.children.push(layer);
        }
        root
    }
}

/// Unit-space polygon points for the polygon-clipped outline shapes.
fn unit_points(shape: OutlineShape) -> Vec<[f32; 2]> {
    match shape {
        OutlineShape::Square => vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        OutlineShape::Hexagon => vec![
            [0.25, 0.0],
            [0.75, 0.0],
            [1.0, 0.5],
            [0.75, 1.0],
            [0.25, 1.0],
            [0.0, 0.5],
        ],
        OutlineShape::Shield => vec![
            [0.5, 0.0],
            [0.85, 0.08],
            [1.0, 0.35],
            [1.0, 0.75],
            [0.5, 1.0],
            [0.0, 0.75],
            [0.0, 0.35],
            [0.15, 0.08],
        ],
        // The circle has no polygon form; callers special-case it.
        OutlineShape::Circle => Vec::new(),
    }
}

/// Clip shape for the image layer.
pub fn clip_for(shape: OutlineShape, size: f32) -> ClipShape {
    match shape {
        OutlineShape::Circle => ClipShape::Circle,
        OutlineShape::Square => ClipShape::RoundedRect {
            radius: size * 0.16,
        },
        _ => ClipShape::Polygon {
            points: unit_points(shape),
        },
    }
}

fn rotate(point: [f32; 2], center: [f32; 2], deg: f32) -> [f32; 2] {
    let rad = deg.to_radians();
    let (sin, cos) = rad.sin_cos();
    let dx = point[0] - center[0];
    let dy = point[1] - center[1];
    [
        center[0] + dx * cos - dy * sin,
        center[1] + dx * sin + dy * cos,
    ]
}

/// Build a centered outline-shape primitive at `scale` of the area,
/// optionally filled, stroked, and rotated.
fn outline_shape(
    shape: OutlineShape,
    size: f32,
    scale: f32,
    fill: Option<String>,
    stroke: Option<Stroke>,
    rotation_deg: f32,
) -> VecShape {
    let c = size / 2.0;
    if shape == OutlineShape::Circle {
        return VecShape::Circle {
            cx: c,
            cy: c,
            r: c * scale,
            fill,
            stroke,
        };
    }
    let points = unit_points(shape)
        .into_iter()
        .map(|[u, v]| {
            let p = [c + (u - 0.5) * size * scale, c + (v - 0.5) * size * scale];
            rotate(p, [c, c], rotation_deg)
        })
        .collect();
    VecShape::Polygon {
        points,
        fill,
        stroke,
    }
}

/// The double-shape border emulation: a full-size backing shape filled
/// with the border color; the image layer is then inset by the border
/// width so the backing shows as a rim. Returns `(backing, inset)`.
pub fn bordered_backing(
    shape: OutlineShape,
    size: f32,
    color: &str,
    border_width: f32,
) -> (VecShape, f32) {
    let backing = outline_shape(shape, size, 1.0, Some(color.to_string()), None, 0.0);
    (backing, border_width)
}

fn with_alpha(color: &str, alpha: &str) -> String {
    format!("{color}{alpha}")
}

/// Regular n-gon (or n-point star when `inner_scale < 1`) around a center.
fn star_points(cx: f32, cy: f32, r: f32, spikes: usize, inner_scale: f32) -> Vec<[f32; 2]> {
    let mut points = Vec::with_capacity(spikes * 2);
    for i in 0..spikes * 2 {
        let radius = if i % 2 == 0 { r } else { r * inner_scale };
        let angle = std::f32::consts::PI * i as f32 / spikes as f32 - std::f32::consts::FRAC_PI_2;
        points.push([cx + radius * angle.cos(), cy + radius * angle.sin()]);
    }
    points
}

/// Render an avatar frame composition.
///
/// `image` is an opaque reference; `size` is the side of the square
/// composition area in points.
pub fn render_avatar_frame(
    image: &str,
    frame: AvatarFrame,
    shape: OutlineShape,
    size: f32,
    palette: &FramePalette,
) -> FrameComposition {
    let mut under: Vec<VecShape> = Vec::new();
    let mut over: Vec<VecShape> = Vec::new();
    let mut inset = 0.0f32;
    let c = size / 2.0;

    match frame {
        AvatarFrame::Plain => {}

        AvatarFrame::Ring => {
            // Card-colored rim plus an outer accent ring.
            let (backing, rim) = bordered_backing(shape, size, &palette.card, size * 0.055);
            under.push(outline_shape(
                shape,
                size,
                1.08,
                None,
                Some(Stroke {
                    color: with_alpha(&palette.primary, "33"),
                    width: size * 0.03,
                    dashed: false,
                }),
                0.0,
            ));
            under.push(backing);
            inset = rim;
        }

        AvatarFrame::Wreath => {
            // Sixteen leaves on a ring, berries on every other spoke.
            let radius = size * 0.62;
            for i in 0..16 {
                let angle = 360.0 * i as f32 / 16.0;
                let rad = angle.to_radians();
                let (lx, ly) = (c + radius * rad.cos(), c + radius * rad.sin());
                let leaf_len = size * 0.14;
                let leaf = vec![
                    [lx, ly - leaf_len * 0.5],
                    [lx + leaf_len * 0.35, ly],
                    [lx, ly + leaf_len * 0.5],
                    [lx - leaf_len * 0.35, ly],
                ]
                .into_iter()
                .map(|p| rotate(p, [lx, ly], angle))
                .collect();
                under.push(VecShape::Polygon {
                    points: leaf,
                    fill: Some(if i % 2 == 0 {
                        palette.primary.clone()
                    } else {
                        with_alpha(&palette.primary, "99")
                    }),
                    stroke: None,
                });
                if i % 2 == 0 {
                    under.push(VecShape::Circle {
                        cx: lx,
                        cy: ly - leaf_len * 0.65,
                        r: size * 0.022,
                        fill: Some(palette.readable.clone()),
                        stroke: None,
                    });
                }
            }
            let (backing, rim) = bordered_backing(shape, size, &palette.card, size * 0.05);
            under.push(backing);
            inset = rim;
        }

        AvatarFrame::Polygon => {
            // Layered rotated hexagon outlines behind a card backing.
            under.push(outline_shape(
                OutlineShape::Hexagon,
                size,
                1.25,
                None,
                Some(Stroke {
                    color: with_alpha(&palette.primary, "4d"),
                    width: size * 0.05,
                    dashed: true,
                }),
                10.0,
            ));
            under.push(outline_shape(
                OutlineShape::Hexagon,
                size,
                1.35,
                None,
                Some(Stroke {
                    color: with_alpha(&palette.readable, "80"),
                    width: size * 0.025,
                    dashed: false,
                }),
                -5.0,
            ));
            let (backing, rim) = bordered_backing(shape, size, &palette.primary, size * 0.035);
            under.push(backing);
            inset = rim;
            // Small floating accent squares, deterministic positions.
            for i in 0..3 {
                let side = size * 0.08;
                let x = if i % 2 == 0 { -size * 0.08 } else { size * 1.0 };
                let y = size * (0.2 + 0.3 * i as f32);
                over.push(VecShape::Polygon {
                    points: vec![
                        [x, y],
                        [x + side, y],
                        [x + side, y + side],
                        [x, y + side],
                    ]
                    .into_iter()
                    .map(|p| rotate(p, [x + side / 2.0, y + side / 2.0], 45.0 * i as f32))
                    .collect(),
                    fill: None,
                    stroke: Some(Stroke {
                        color: palette.accent.clone(),
                        width: size * 0.025,
                        dashed: false,
                    }),
                });
            }
        }

        AvatarFrame::Playful => {
            // Confetti ring: star / circle / diamond repeating by index.
            let radius = size * 0.68;
            for i in 0..12 {
                let angle = std::f32::consts::TAU * i as f32 / 12.0;
                let (px, py) = (c + radius * angle.cos(), c + radius * angle.sin());
                let item = size * (0.05 + 0.015 * (i % 3) as f32);
                let color = if i % 2 == 0 {
                    with_alpha(&palette.primary, "cc")
                } else {
                    with_alpha(&palette.readable, "b3")
                };
                let shape = match i % 3 {
                    0 => VecShape::Polygon {
                        points: star_points(px, py, item, 4, 0.35),
                        fill: Some(color),
                        stroke: None,
                    },
                    1 => VecShape::Circle {
                        cx: px,
                        cy: py,
                        r: item * 0.6,
                        fill: Some(color),
                        stroke: None,
                    },
                    _ => VecShape::Polygon {
                        points: vec![
                            [px, py - item],
                            [px + item, py],
                            [px, py + item],
                            [px - item, py],
                        ],
                        fill: Some(color),
                        stroke: None,
                    },
                };
                under.push(shape);
            }
            let (backing, rim) = bordered_backing(shape, size, &palette.card, size * 0.06);
            under.push(backing);
            inset = rim;
            // Star badge top-right, heart-ish dot bottom-left.
            over.push(VecShape::Circle {
                cx: size * 0.95,
                cy: size * 0.05,
                r: size * 0.09,
                fill: Some(palette.card.clone()),
                stroke: None,
            });
            over.push(VecShape::Polygon {
                points: star_points(size * 0.95, size * 0.05, size * 0.06, 5, 0.45),
                fill: Some("#facc15".to_string()),
                stroke: None,
            });
            over.push(VecShape::Circle {
                cx: size * 0.04,
                cy: size * 0.96,
                r: size * 0.07,
                fill: Some(palette.accent.clone()),
                stroke: None,
            });
        }

        AvatarFrame::Crayon => {
            // Two thick, slightly offset scribble outlines.
            under.push(outline_shape(
                shape,
                size,
                1.22,
                None,
                Some(Stroke {
                    color: with_alpha(&palette.primary, "66"),
                    width: size * 0.08,
                    dashed: false,
                }),
                0.0,
            ));
            under.push(outline_shape(
                shape,
                size,
                1.14,
                None,
                Some(Stroke {
                    color: with_alpha(&palette.readable, "4d"),
                    width: size * 0.055,
                    dashed: false,
                }),
                -2.0,
            ));
            let (backing, rim) = bordered_backing(shape, size, &palette.card, size * 0.08);
            under.push(backing);
            inset = rim;
        }

        AvatarFrame::Stamp => {
            // Postage perforation: a zig-zag edge all the way around.
            let teeth = 10usize;
            let amp = size * 0.05;
            let outer = size * 1.12;
            let origin = -(outer - size) / 2.0;
            let mut points = Vec::new();
            for i in 0..=teeth {
                let x = origin + outer * i as f32 / teeth as f32;
                points.push([x, origin + if i % 2 == 0 { amp } else { 0.0 }]);
            }
            for i in 1..=teeth {
                let y = origin + outer * i as f32 / teeth as f32;
                points.push([origin + outer - if i % 2 == 0 { amp } else { 0.0 }, y]);
            }
            for i in 1..=teeth {
                let x = origin + outer - outer * i as f32 / teeth as f32;
                points.push([x, origin + outer - if i % 2 == 0 { amp } else { 0.0 }]);
            }
            for i in 1..teeth {
                let y = origin + outer - outer * i as f32 / teeth as f32;
                points.push([origin + if i % 2 == 0 { amp } else { 0.0 }, y]);
            }
            under.push(VecShape::Polygon {
                points,
                fill: Some(with_alpha(&palette.primary, "33")),
                stroke: None,
            });
            let (backing, rim) = bordered_backing(shape, size, &palette.card, size * 0.08);
            under.push(backing);
            inset = rim;
            // Cancellation-mark label, top-left.
            over.push(outline_shape(
                OutlineShape::Square,
                size,
                0.3,
                Some(palette.primary.clone()),
                None,
                -12.0,
            ));
        }

        AvatarFrame::PaperCut => {
            under.push(outline_shape(
                shape,
                size,
                1.3,
                None,
                Some(Stroke {
                    color: with_alpha(&palette.primary, "99"),
                    width: size * 0.025,
                    dashed: true,
                }),
                0.0,
            ));
            under.push(outline_shape(
                shape,
                size,
                1.16,
                Some(with_alpha(&palette.primary, "20")),
                None,
                3.0,
            ));
            let (backing, rim) = bordered_backing(shape, size, &palette.card, size * 0.04);
            under.push(backing);
            inset = rim;
        }

        AvatarFrame::Cartoon => {
            // Wobbly blob underlay: a 12-point ring with index-varied radii.
            let mut blob = Vec::new();
            for i in 0..12 {
                let angle = std::f32::consts::TAU * i as f32 / 12.0;
                let r = c * (1.2 + 0.08 * ((i % 3) as f32 - 1.0));
                blob.push([c + r * angle.cos(), c + r * angle.sin()]);
            }
            under.push(VecShape::Polygon {
                points: blob,
                fill: Some(with_alpha(&palette.primary, "33")),
                stroke: None,
            });
            let (backing, rim) = bordered_backing(shape, size, &palette.card, size * 0.08);
            under.push(backing);
            inset = rim;
            // Speech-bubble pill at the bottom edge.
            over.push(VecShape::Polygon {
                points: vec![
                    [size * 0.28, size * 0.96],
                    [size * 0.72, size * 0.96],
                    [size * 0.72, size * 1.08],
                    [size * 0.28, size * 1.08],
                ],
                fill: Some(palette.card.clone()),
                stroke: Some(Stroke {
                    color: palette.primary.clone(),
                    width: size * 0.012,
                    dashed: false,
                }),
            });
        }
    }

    let side = size - 2.0 * inset;
    FrameComposition {
        size,
        under,
        avatar_inset: inset,
        avatar: ImageSlot {
            source: image.to_string(),
            width: side,
            height: side,
            clip: Some(clip_for(shape, side)),
        },
        over,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> FramePalette {
        FramePalette {
            primary: "#0ea5e9".to_string(),
            readable: "#0ea5e9".to_string(),
            card: "#ffffff".to_string(),
            accent: "#fb7185".to_string(),
        }
    }

    const ALL_FRAMES: [AvatarFrame; 9] = [
        AvatarFrame::Plain,
        AvatarFrame::Ring,
        AvatarFrame::Wreath,
        AvatarFrame::Polygon,
        AvatarFrame::Playful,
        AvatarFrame::Crayon,
        AvatarFrame::Stamp,
        AvatarFrame::PaperCut,
        AvatarFrame::Cartoon,
    ];

    const ALL_SHAPES: [OutlineShape; 4] = [
        OutlineShape::Circle,
        OutlineShape::Square,
        OutlineShape::Hexagon,
        OutlineShape::Shield,
    ];

    #[test]
    fn identical_inputs_identical_composition() {
        for frame in ALL_FRAMES {
            let a = render_avatar_frame("ref", frame, OutlineShape::Shield, 148.0, &palette());
            let b = render_avatar_frame("ref", frame, OutlineShape::Shield, 148.0, &palette());
            assert_eq!(a, b, "{frame:?} must be deterministic");
        }
    }

    #[test]
    fn bordered_frames_inset_the_image() {
        // Every frame except Plain synthesizes a border look; the image
        // layer must sit strictly inside the backing shape.
        for frame in ALL_FRAMES {
            for shape in ALL_SHAPES {
                let comp = render_avatar_frame("ref", frame, shape, 148.0, &palette());
                if frame == AvatarFrame::Plain {
                    assert_eq!(comp.avatar_inset, 0.0);
                } else {
                    assert!(
                        comp.avatar_inset > 0.0,
                        "{frame:?}/{shape:?} must inset the image"
                    );
                    assert!(comp.avatar.width < comp.size);
                }
            }
        }
    }

    #[test]
    fn polygon_clips_use_polygon_paths() {
        let comp = render_avatar_frame(
            "ref",
            AvatarFrame::Ring,
            OutlineShape::Hexagon,
            148.0,
            &palette(),
        );
        match comp.avatar.clip {
            Some(ClipShape::Polygon { ref points }) => assert_eq!(points.len(), 6),
            other => panic!("expected polygon clip, got {other:?}"),
        }

        let comp = render_avatar_frame(
            "ref",
            AvatarFrame::Ring,
            OutlineShape::Circle,
            148.0,
            &palette(),
        );
        assert_eq!(comp.avatar.clip, Some(ClipShape::Circle));
    }

    #[test]
    fn composition_materialises_in_layer_order() {
        let comp = render_avatar_frame(
            "ref",
            AvatarFrame::Playful,
            OutlineShape::Circle,
            148.0,
            &palette(),
        );
        let root = comp.to_page_box(10.0, 20.0);
        assert_eq!(
            root.children.len(),
            comp.under.len() + 1 + comp.over.len()
        );
        // The image layer sits after every under-layer.
        let image_index = root
            .children
            .iter()
            .position(|b| b.image.is_some())
            .expect("image layer present");
        assert_eq!(image_index, comp.under.len());
    }
}
