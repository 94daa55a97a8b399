//! Theme resolver – maps an accent color, a layout template, and the
//! dark-mode flag to a flat [`ThemeTokens`] bag consumed by the composer.
//!
//! Pure and O(1): safe to call on every keystroke of a color picker. Two
//! calls with identical inputs always produce identical tokens. Malformed
//! accent strings never fail; they classify as "not light" and fall back
//! to the crate default accent for derived colors.

use serde::{Deserialize, Serialize};

use crate::snapshot::{LayoutTemplate, ResumeSnapshot, ThemePreset};

/// Brightness above which a color counts as "light" and cannot be used as
/// body text over white surfaces.
pub const LIGHT_THRESHOLD: f32 = 185.0;

/// RGB color with 0–255 channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Parse a 6-hex-digit color string, with or without leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Perceptual brightness over 0–255 channels.
    pub fn brightness(self) -> f32 {
        (299.0 * self.r as f32 + 587.0 * self.g as f32 + 114.0 * self.b as f32) / 1000.0
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Normalised channels for PDF fill/stroke ops.
    pub fn to_unit_rgb(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Classify an accent color string. Malformed input is "not light".
pub fn is_light_color(hex: &str) -> bool {
    match Color::from_hex(hex) {
        Some(c) => c.brightness() > LIGHT_THRESHOLD,
        None => false,
    }
}

/// A paint for a box or band: either a flat color or a two-stop gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Fill {
    Solid { color: String },
    Gradient { from: String, to: String },
}

impl Fill {
    pub fn solid(color: &str) -> Self {
        Fill::Solid {
            color: color.to_string(),
        }
    }
}

/// How content panels are framed, per layout template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelBorder {
    /// Full solid frame (Classic).
    Solid,
    /// Heavy accent bar down the left edge, hard corners (Modern).
    LeftBar,
    /// Dashed rounded "storybook" framing.
    Dashed,
}

/// Resolved, render-ready token bag. One stable interface regardless of
/// layout template – downstream renderers never branch on the template
/// except to pick a cover variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeTokens {
    /// The raw accent (or the fallback accent if the input was malformed).
    pub primary: String,
    /// Accent variant that stays legible as text on white surfaces.
    pub readable_primary: String,
    /// Text color used on top of the primary color.
    pub contrast_text: String,
    /// Default body text color.
    pub text: String,
    /// Washed-out accent for card backgrounds (hex + alpha suffix).
    pub secondary: String,
    /// Near-invisible accent tint for page surfaces.
    pub surface: String,
    /// Drop-shadow color.
    pub shadow: String,
    /// Small highlight color for badges.
    pub accent: String,
    /// Card and input surfaces (flipped in dark mode).
    pub card: String,
    pub input: String,
    /// Header band paint: preset gradient, or the flat accent.
    pub header_fill: Fill,

    // Structural tokens, from the per-template table.
    pub header_height: f32,
    pub panel_padding: f32,
    pub corner_radius: f32,
    pub panel_border: PanelBorder,
    pub title_scale: f32,
}

/// Structural values for one layout template.
struct TemplateTable {
    header_height: f32,
    panel_padding: f32,
    corner_radius: f32,
    panel_border: PanelBorder,
    title_scale: f32,
}

fn template_table(layout: LayoutTemplate) -> TemplateTable {
    match layout {
        LayoutTemplate::Classic => TemplateTable {
            header_height: 112.0,
            panel_padding: 24.0,
            corner_radius: 24.0,
            panel_border: PanelBorder::Solid,
            title_scale: 1.0,
        },
        LayoutTemplate::Modern => TemplateTable {
            header_height: 128.0,
            panel_padding: 40.0,
            corner_radius: 0.0,
            panel_border: PanelBorder::LeftBar,
            title_scale: 1.25,
        },
        LayoutTemplate::Storybook => TemplateTable {
            header_height: 128.0,
            panel_padding: 32.0,
            corner_radius: 48.0,
            panel_border: PanelBorder::Dashed,
            title_scale: 1.25,
        },
    }
}

/// Resolve theme tokens from an accent color, layout template, and
/// dark-mode flag. The header band is painted with the flat accent; use
/// [`resolve_theme_preset`] to apply a gradient preset on top.
pub fn resolve_theme(accent: &str, layout: LayoutTemplate, dark: bool) -> ThemeTokens {
    let light = is_light_color(accent);
    // Malformed accents fall back wholesale so hex arithmetic below never
    // sees garbage.
    let base = if Color::from_hex(accent).is_some() {
        normalize_hex(accent)
    } else {
        ResumeSnapshot::fallback_accent().to_string()
    };

    let readable_primary = if dark {
        "#ffffff".to_string()
    } else if light {
        // Darkened, muted slate instead of the unreadably-bright accent.
        "#475569".to_string()
    } else {
        base.clone()
    };
    let contrast_text = if light { "#1e293b" } else { "#ffffff" };
    let text = if light { "#334155" } else { "#1e293b" };
    let accent_badge = if light { "#f43f5e" } else { "#fb7185" };

    let table = template_table(layout);

    ThemeTokens {
        readable_primary,
        contrast_text: contrast_text.to_string(),
        text: text.to_string(),
        secondary: format!("{base}20"),
        surface: if dark {
            "#000000".to_string()
        } else {
            format!("{base}08")
        },
        shadow: if dark {
            "#00000066".to_string()
        } else {
            format!("{base}15")
        },
        accent: accent_badge.to_string(),
        card: if dark { "#1c1c1e" } else { "#ffffff" }.to_string(),
        input: if dark { "#2c2c2e" } else { "#f8fafc" }.to_string(),
        header_fill: Fill::solid(&base),
        primary: base,
        header_height: table.header_height,
        panel_padding: table.panel_padding,
        corner_radius: table.corner_radius,
        panel_border: table.panel_border,
        title_scale: table.title_scale,
    }
}

/// [`resolve_theme`] plus a gradient preset for the header band.
pub fn resolve_theme_preset(
    accent: &str,
    preset: ThemePreset,
    layout: LayoutTemplate,
    dark: bool,
) -> ThemeTokens {
    let mut tokens = resolve_theme(accent, layout, dark);
    let (from, to) = preset.gradient();
    tokens.header_fill = Fill::Gradient {
        from: from.to_string(),
        to: to.to_string(),
    };
    tokens
}

/// Resolve tokens straight from a snapshot's style selectors.
pub fn resolve_snapshot_theme(snapshot: &ResumeSnapshot) -> ThemeTokens {
    resolve_theme_preset(
        &snapshot.accent_color,
        snapshot.theme_preset,
        snapshot.layout,
        snapshot.dark_mode,
    )
}

fn normalize_hex(hex: &str) -> String {
    let trimmed = hex.trim_start_matches('#');
    format!("#{}", trimmed.to_ascii_lowercase())
}
