//! Document composer – materializes the page plan into a renderable box
//! tree ([`ComposedDocument`]).
//!
//! This is a dispatch table, not business logic: `{page kind × layout
//! template}` selects a render function, every decision about which pages
//! exist and what they carry was already made by the planner. The composer
//! is deterministic; identical inputs produce an identical document.

use crate::fonts::{wrap_text, FontManager};
use crate::frame::{render_avatar_frame, FramePalette};
use crate::plan::{plan_pages, HonorsDensity, PageDescriptor, PageKind, PagePayload};
use crate::snapshot::{HobbyShape, LayoutTemplate, OutlineShape, ResumeSnapshot};
use crate::theme::{resolve_snapshot_theme, Fill, PanelBorder, ThemeTokens};
use crate::visual::{
    BorderStyle, ClipShape, ComposedDocument, ComposedPage, ImageSlot, PageBox, TextAlign,
    TextContent, VecShape,
};

/// A4 portrait dimensions in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
/// Outer page margin.
const MARGIN: f32 = 36.0;

/// Structural theme tokens are authored in CSS pixels; pages are in points.
const PX_TO_PT: f32 = 0.75;

/// Watermark text tiled across every page when export requests it.
pub const WATERMARK_TEXT: &str = "PREVIEW COPY";

const BODY_FONT: &str = "Helvetica";

/// Render-pass options. Whether the watermark shows is decided upstream
/// (entitlement) and arrives as a plain flag.
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    pub show_watermark: bool,
    /// Overrides the derived document title when set.
    pub title: Option<String>,
}

struct ComposeCtx<'a> {
    snapshot: &'a ResumeSnapshot,
    tokens: ThemeTokens,
    palette: FramePalette,
    fonts: FontManager,
}

impl ComposeCtx<'_> {
    fn content_width(&self) -> f32 {
        PAGE_WIDTH - 2.0 * MARGIN
    }

    fn header_height(&self) -> f32 {
        self.tokens.header_height * PX_TO_PT
    }

    fn corner_radius(&self) -> f32 {
        self.tokens.corner_radius * PX_TO_PT
    }
}

type PageFn = fn(&ComposeCtx, &PageDescriptor) -> Vec<PageBox>;

/// `{kind × layout}` dispatch. Covers get one strategy per template; the
/// content pages share strategies and read their structural differences
/// from the resolved tokens.
fn page_renderer(kind: PageKind, layout: LayoutTemplate) -> PageFn {
    match (kind, layout) {
        (PageKind::Cover, LayoutTemplate::Classic) => cover_classic,
        (PageKind::Cover, LayoutTemplate::Modern) => cover_modern,
        (PageKind::Cover, LayoutTemplate::Storybook) => cover_storybook,
        (PageKind::BackCover, LayoutTemplate::Classic) => back_cover_classic,
        (PageKind::BackCover, LayoutTemplate::Modern) => back_cover_modern,
        (PageKind::BackCover, LayoutTemplate::Storybook) => back_cover_storybook,
        (PageKind::Profile, _) => profile_page,
        (PageKind::QualityReport, _) => quality_report_page,
        (PageKind::Honors, _) => honors_page,
        (PageKind::Certificates, _) => certificates_page,
        (PageKind::Portfolio, _) => portfolio_page,
        (PageKind::Hobbies, _) => hobbies_page,
        (PageKind::SocialPractice, _) => social_practice_page,
        (PageKind::Essay, _) => essay_page,
        (PageKind::Recommendation, _) => recommendation_page,
    }
}

/// Section header strings: `(title, english subtitle)`.
fn section_heading(kind: PageKind) -> (&'static str, &'static str) {
    match kind {
        PageKind::Profile => ("Personal Profile", "ABOUT ME"),
        PageKind::QualityReport => ("Quality Reports", "SCHOOL REPORTS"),
        PageKind::Honors => ("Honors & Awards", "ACHIEVEMENTS"),
        PageKind::Certificates => ("Certificates", "CERTIFICATES"),
        PageKind::Portfolio => ("Portfolio", "MY WORKS"),
        PageKind::Hobbies => ("Hobbies & Specialties", "INTERESTS"),
        PageKind::SocialPractice => ("Social Practice", "ACTIVITIES"),
        PageKind::Essay => ("Self Introduction", "MY STORY"),
        PageKind::Recommendation => ("Recommendation", "REFERENCE"),
        PageKind::Cover | PageKind::BackCover => ("", ""),
    }
}

/// Compose the full document for one snapshot.
pub fn compose_document(snapshot: &ResumeSnapshot, options: &ComposeOptions) -> ComposedDocument {
    let tokens = resolve_snapshot_theme(snapshot);
    let ctx = ComposeCtx {
        snapshot,
        palette: FramePalette::from_tokens(&tokens),
        tokens,
        fonts: FontManager::default(),
    };

    let title = options.title.clone().unwrap_or_else(|| {
        if snapshot.basic_info.name.is_empty() {
            "Resume Booklet".to_string()
        } else {
            format!("{} - Resume Booklet", snapshot.basic_info.name)
        }
    });

    let mut doc = ComposedDocument::a4(&title);
    for descriptor in plan_pages(snapshot) {
        let mut boxes = Vec::new();

        if let Some(bg) = page_background(&ctx, descriptor.kind) {
            boxes.push(bg);
        }
        if descriptor.kind.is_numbered() {
            boxes.push(header_band(&ctx, descriptor.kind));
        }

        boxes.extend(page_renderer(descriptor.kind, snapshot.layout)(
            &ctx,
            &descriptor,
        ));

        if snapshot.layout == LayoutTemplate::Storybook && descriptor.kind.is_numbered() {
            boxes.extend(storybook_decoration(&ctx));
        }
        if let Some(ordinal) = descriptor.ordinal {
            boxes.push(footer(&ctx, ordinal));
        }
        if options.show_watermark {
            boxes.push(watermark_layer());
        }

        doc.pages.push(ComposedPage {
            kind: descriptor.kind,
            ordinal: descriptor.ordinal,
            boxes,
        });
    }
    doc
}

// ---------------------------------------------------------------------------
// Page furniture
// ---------------------------------------------------------------------------

fn page_background(ctx: &ComposeCtx, kind: PageKind) -> Option<PageBox> {
    let mut bg = PageBox::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT);
    if !ctx.snapshot.page_background.is_empty() && kind.is_numbered() {
        bg.image = Some(ImageSlot {
            source: ctx.snapshot.page_background.clone(),
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            clip: None,
        });
        bg.opacity = 0.35;
        return Some(bg);
    }
    if kind.is_numbered() {
        bg.fill = Some(Fill::solid(&ctx.tokens.surface));
        return Some(bg);
    }
    None
}

fn header_band(ctx: &ComposeCtx, kind: PageKind) -> PageBox {
    let (title, subtitle) = section_heading(kind);
    let height = ctx.header_height();
    let mut band = PageBox::new(0.0, 0.0, PAGE_WIDTH, height);
    band.fill = Some(ctx.tokens.header_fill.clone());

    let title_size = 22.0 * ctx.tokens.title_scale;
    let mut title_box = PageBox::new(MARGIN, height * 0.28, ctx.content_width(), title_size + 4.0);
    let mut text = TextContent::new(vec![title.to_string()], title_size, &ctx.tokens.contrast_text);
    text.bold = true;
    title_box.text = Some(text);
    band.children.push(title_box);

    let mut sub_box = PageBox::new(
        MARGIN,
        height * 0.28 + title_size + 6.0,
        ctx.content_width(),
        12.0,
    );
    sub_box.text = Some(TextContent::new(
        vec![subtitle.to_string()],
        9.0,
        &ctx.tokens.contrast_text,
    ));
    band.children.push(sub_box);

    // Modern's left accent bar; dashed underline for storybook.
    match ctx.tokens.panel_border {
        PanelBorder::LeftBar => {
            let mut bar = PageBox::new(MARGIN - 12.0, height * 0.28, 4.0, title_size + 18.0);
            bar.fill = Some(Fill::solid(&ctx.tokens.contrast_text));
            band.children.push(bar);
        }
        PanelBorder::Dashed => {
            let mut rule = PageBox::new(MARGIN, height - 8.0, ctx.content_width(), 0.0);
            rule.shape = Some(VecShape::Line {
                points: vec![[0.0, 0.0], [ctx.content_width(), 0.0]],
                stroke: crate::visual::Stroke {
                    color: ctx.tokens.contrast_text.clone(),
                    width: 1.2,
                    dashed: true,
                },
            });
            band.children.push(rule);
        }
        PanelBorder::Solid => {}
    }
    band
}

fn footer(ctx: &ComposeCtx, ordinal: u32) -> PageBox {
    let mut footer = PageBox::new(0.0, PAGE_HEIGHT - 28.0, PAGE_WIDTH, 20.0);
    let mut text = TextContent::new(
        vec![format!("{ordinal:02}")],
        9.0,
        &ctx.tokens.readable_primary,
    );
    text.align = TextAlign::Center;
    footer.text = Some(text);

    let mut rule = PageBox::new(PAGE_WIDTH / 2.0 - 24.0, -4.0, 48.0, 0.0);
    rule.shape = Some(VecShape::Line {
        points: vec![[0.0, 0.0], [48.0, 0.0]],
        stroke: crate::visual::Stroke {
            color: ctx.tokens.secondary.clone(),
            width: 0.8,
            dashed: false,
        },
    });
    footer.children.push(rule);
    footer
}

/// Rotated low-opacity text grid, rendered above content. 8 columns by
/// 5 rows covers A4 with generous overlap.
fn watermark_layer() -> PageBox {
    let mut layer = PageBox::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT);
    layer.opacity = 0.08;
    let cell_w = PAGE_WIDTH / 4.0;
    let cell_h = PAGE_HEIGHT / 5.0;
    for row in 0..5 {
        for col in 0..8 {
            // Stagger odd rows half a cell so the tiling has no seams.
            let x = col as f32 * cell_w - PAGE_WIDTH / 2.0
                + if row % 2 == 1 { cell_w / 2.0 } else { 0.0 };
            let y = row as f32 * cell_h;
            let mut cell = PageBox::new(x, y, cell_w, 20.0);
            cell.rotation_deg = -35.0;
            cell.text = Some(TextContent::new(
                vec![WATERMARK_TEXT.to_string()],
                16.0,
                "#94a3b8",
            ));
            layer.children.push(cell);
        }
    }
    layer
}

/// Deterministic corner confetti for the storybook template. Positions are
/// index-derived so the decoration never shifts between renders.
fn storybook_decoration(ctx: &ComposeCtx) -> Vec<PageBox> {
    let mut boxes = Vec::new();
    let anchors = [
        (MARGIN * 0.4, ctx.header_height() + 10.0),
        (PAGE_WIDTH - MARGIN * 0.8, ctx.header_height() + 26.0),
        (MARGIN * 0.5, PAGE_HEIGHT - 70.0),
        (PAGE_WIDTH - MARGIN * 0.7, PAGE_HEIGHT - 52.0),
    ];
    for (i, (x, y)) in anchors.iter().enumerate() {
        let r = 3.0 + (i % 3) as f32 * 1.5;
        let mut dot = PageBox::new(*x, *y, r * 2.0, r * 2.0);
        dot.opacity = 0.4;
        dot.shape = Some(VecShape::Circle {
            cx: r,
            cy: r,
            r,
            fill: Some(if i % 2 == 0 {
                ctx.tokens.primary.clone()
            } else {
                ctx.tokens.accent.clone()
            }),
            stroke: None,
        });
        boxes.push(dot);
    }
    boxes
}

// ---------------------------------------------------------------------------
// Shared panel helpers
// ---------------------------------------------------------------------------

fn panel(ctx: &ComposeCtx, x: f32, y: f32, width: f32, height: f32) -> PageBox {
    let mut panel = PageBox::new(x, y, width, height);
    panel.fill = Some(Fill::solid(&ctx.tokens.card));
    panel.corner_radius = ctx.corner_radius();
    panel.border = Some(match ctx.tokens.panel_border {
        PanelBorder::Dashed => BorderStyle {
            width: 1.2,
            color: ctx.tokens.readable_primary.clone(),
            dashed: true,
        },
        _ => BorderStyle {
            width: 0.8,
            color: ctx.tokens.secondary.clone(),
            dashed: false,
        },
    });
    panel
}

fn panel_title(ctx: &ComposeCtx, label: &str, width: f32) -> PageBox {
    let pad = ctx.tokens.panel_padding * PX_TO_PT;
    let mut title = PageBox::new(pad, pad * 0.6, width - 2.0 * pad, 16.0);
    let mut text = TextContent::new(vec![label.to_string()], 12.0, &ctx.tokens.readable_primary);
    text.bold = true;
    title.text = Some(text);
    title
}

fn body_text(ctx: &ComposeCtx, content: &str, width: f32, font_size: f32) -> TextContent {
    let lines = wrap_text(content, font_size, false, false, BODY_FONT, width, &ctx.fonts);
    let mut text = TextContent::new(lines, font_size, &ctx.tokens.text);
    text.line_height = 1.5;
    text
}

/// A captioned image cell: image on top, caption strip below.
fn image_cell(ctx: &ComposeCtx, x: f32, y: f32, w: f32, h: f32, source: &str, caption: &str) -> PageBox {
    let caption_h = 16.0;
    let mut cell = panel(ctx, x, y, w, h);
    let mut slot = PageBox::new(4.0, 4.0, w - 8.0, h - caption_h - 8.0);
    slot.image = Some(ImageSlot {
        source: source.to_string(),
        width: w - 8.0,
        height: h - caption_h - 8.0,
        clip: Some(ClipShape::RoundedRect {
            radius: ctx.corner_radius() * 0.5,
        }),
    });
    cell.children.push(slot);
    if !caption.is_empty() {
        let mut cap = PageBox::new(4.0, h - caption_h - 2.0, w - 8.0, caption_h);
        let mut text = TextContent::new(vec![caption.to_string()], 8.5, &ctx.tokens.text);
        text.align = TextAlign::Center;
        cap.text = Some(text);
        cell.children.push(cap);
    }
    cell
}

fn avatar_box(ctx: &ComposeCtx, x: f32, y: f32, size: f32, frame: crate::snapshot::AvatarFrame, shape: OutlineShape) -> PageBox {
    let comp = render_avatar_frame(&ctx.snapshot.basic_info.avatar, frame, shape, size, &ctx.palette);
    comp.to_page_box(x, y)
}

fn content_top(ctx: &ComposeCtx) -> f32 {
    ctx.header_height() + 18.0
}

// ---------------------------------------------------------------------------
// Covers
// ---------------------------------------------------------------------------

fn cover_common(ctx: &ComposeCtx) -> (PageBox, Option<PageBox>) {
    let cover = &ctx.snapshot.cover;
    let mut bg = PageBox::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT);
    if cover.background_image.is_empty() {
        bg.fill = Some(ctx.tokens.header_fill.clone());
    } else {
        bg.image = Some(ImageSlot {
            source: cover.background_image.clone(),
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            clip: None,
        });
    }
    let avatar = if cover.show_avatar && !ctx.snapshot.basic_info.avatar.is_empty() {
        let size = 148.0;
        Some(avatar_box(
            ctx,
            (PAGE_WIDTH - size) / 2.0,
            PAGE_HEIGHT * 0.3,
            size,
            cover.avatar_frame,
            cover.avatar_shape,
        ))
    } else {
        None
    };
    (bg, avatar)
}

fn cover_text(ctx: &ComposeCtx, y: f32, content: &str, size: f32, bold: bool) -> PageBox {
    let mut line = PageBox::new(MARGIN, y, ctx.content_width(), size + 6.0);
    let mut text = TextContent::new(vec![content.to_string()], size, &ctx.tokens.contrast_text);
    text.bold = bold;
    text.align = TextAlign::Center;
    line.text = Some(text);
    line
}

fn cover_classic(ctx: &ComposeCtx, _d: &PageDescriptor) -> Vec<PageBox> {
    let cover = &ctx.snapshot.cover;
    let (bg, avatar) = cover_common(ctx);
    let mut boxes = vec![bg];
    boxes.push(cover_text(ctx, PAGE_HEIGHT * 0.14, &cover.title, 34.0 * ctx.tokens.title_scale, true));
    boxes.push(cover_text(ctx, PAGE_HEIGHT * 0.21, &cover.subtitle, 14.0, false));
    if let Some(avatar) = avatar {
        boxes.push(avatar);
    }
    boxes.push(cover_text(ctx, PAGE_HEIGHT * 0.62, &ctx.snapshot.basic_info.name, 22.0, true));
    boxes.push(cover_text(ctx, PAGE_HEIGHT * 0.72, &cover.slogan, 12.0, false));
    boxes
}

fn cover_modern(ctx: &ComposeCtx, _d: &PageDescriptor) -> Vec<PageBox> {
    let cover = &ctx.snapshot.cover;
    let (bg, avatar) = cover_common(ctx);
    let mut boxes = vec![bg];

    // Left accent band instead of the centered classic composition.
    let mut band = PageBox::new(0.0, 0.0, 12.0, PAGE_HEIGHT);
    band.fill = Some(Fill::solid(&ctx.tokens.contrast_text));
    band.opacity = 0.6;
    boxes.push(band);

    let x = MARGIN + 16.0;
    let width = ctx.content_width() - 16.0;
    for (y, content, size, bold) in [
        (PAGE_HEIGHT * 0.12, cover.title.as_str(), 36.0 * ctx.tokens.title_scale, true),
        (PAGE_HEIGHT * 0.2, cover.subtitle.as_str(), 13.0, false),
        (PAGE_HEIGHT * 0.64, ctx.snapshot.basic_info.name.as_str(), 24.0, true),
        (PAGE_HEIGHT * 0.72, cover.slogan.as_str(), 11.0, false),
    ] {
        let mut line = PageBox::new(x, y, width, size + 6.0);
        let mut text = TextContent::new(vec![content.to_string()], size, &ctx.tokens.contrast_text);
        text.bold = bold;
        line.text = Some(text);
        boxes.push(line);
    }
    if let Some(mut avatar) = avatar {
        avatar.x = x;
        boxes.push(avatar);
    }
    boxes
}

fn cover_storybook(ctx: &ComposeCtx, d: &PageDescriptor) -> Vec<PageBox> {
    let mut boxes = cover_classic(ctx, d);
    // Dashed story frame inset from the page edge.
    let inset = MARGIN * 0.6;
    let mut frame = PageBox::new(inset, inset, PAGE_WIDTH - 2.0 * inset, PAGE_HEIGHT - 2.0 * inset);
    frame.corner_radius = ctx.corner_radius();
    frame.border = Some(BorderStyle {
        width: 1.6,
        color: ctx.tokens.contrast_text.clone(),
        dashed: true,
    });
    boxes.push(frame);
    boxes.extend(storybook_decoration(ctx));
    boxes
}

fn back_cover_common(ctx: &ComposeCtx) -> Vec<PageBox> {
    let back = &ctx.snapshot.back_cover;
    let mut bg = PageBox::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT);
    if back.background_image.is_empty() {
        bg.fill = Some(ctx.tokens.header_fill.clone());
    } else {
        bg.image = Some(ImageSlot {
            source: back.background_image.clone(),
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            clip: None,
        });
    }
    let mut boxes = vec![bg];

    if back.show_avatar && !ctx.snapshot.basic_info.avatar.is_empty() {
        let size = 110.0;
        boxes.push(avatar_box(
            ctx,
            (PAGE_WIDTH - size) / 2.0,
            PAGE_HEIGHT * 0.26,
            size,
            back.avatar_frame,
            back.avatar_shape,
        ));
    }

    let message = if ctx.snapshot.closing_message.is_empty() {
        "Thank you for reading".to_string()
    } else {
        ctx.snapshot.closing_message.clone()
    };
    let mut msg = PageBox::new(MARGIN, PAGE_HEIGHT * 0.52, ctx.content_width(), 80.0);
    let lines = wrap_text(&message, 16.0, false, false, BODY_FONT, ctx.content_width(), &ctx.fonts);
    let mut text = TextContent::new(lines, 16.0, &ctx.tokens.contrast_text);
    text.align = TextAlign::Center;
    text.line_height = 1.6;
    msg.text = Some(text);
    boxes.push(msg);
    boxes
}

fn back_cover_classic(ctx: &ComposeCtx, _d: &PageDescriptor) -> Vec<PageBox> {
    back_cover_common(ctx)
}

fn back_cover_modern(ctx: &ComposeCtx, _d: &PageDescriptor) -> Vec<PageBox> {
    let mut boxes = back_cover_common(ctx);
    let mut band = PageBox::new(0.0, PAGE_HEIGHT - 14.0, PAGE_WIDTH, 14.0);
    band.fill = Some(Fill::solid(&ctx.tokens.contrast_text));
    band.opacity = 0.6;
    boxes.push(band);
    boxes
}

fn back_cover_storybook(ctx: &ComposeCtx, _d: &PageDescriptor) -> Vec<PageBox> {
    let mut boxes = back_cover_common(ctx);
    let inset = MARGIN * 0.6;
    let mut frame = PageBox::new(inset, inset, PAGE_WIDTH - 2.0 * inset, PAGE_HEIGHT - 2.0 * inset);
    frame.corner_radius = ctx.corner_radius();
    frame.border = Some(BorderStyle {
        width: 1.6,
        color: ctx.tokens.contrast_text.clone(),
        dashed: true,
    });
    boxes.push(frame);
    boxes
}

// ---------------------------------------------------------------------------
// Content pages
// ---------------------------------------------------------------------------

fn profile_page(ctx: &ComposeCtx, _d: &PageDescriptor) -> Vec<PageBox> {
    let snapshot = ctx.snapshot;
    let pad = ctx.tokens.panel_padding * PX_TO_PT;
    let top = content_top(ctx);
    let mut boxes = Vec::new();

    // Identity panel with the avatar on the right.
    let info_h = 150.0;
    let mut info = panel(ctx, MARGIN, top, ctx.content_width(), info_h);
    info.children.push(panel_title(ctx, "Basic Information", ctx.content_width()));
    let rows = [
        ("Name", snapshot.basic_info.name.as_str()),
        ("Gender", snapshot.basic_info.gender.as_str()),
        ("Birthday", snapshot.basic_info.birthday.as_str()),
        ("School", snapshot.basic_info.school.as_str()),
        ("Target School", snapshot.basic_info.intended_school.as_str()),
        ("Motto", snapshot.basic_info.motto.as_str()),
    ];
    for (i, (label, value)) in rows.iter().enumerate() {
        let y = pad + 22.0 + i as f32 * 18.0;
        let mut row = PageBox::new(pad, y, ctx.content_width() * 0.62, 16.0);
        row.text = Some(TextContent::new(
            vec![format!("{label}: {value}")],
            10.0,
            &ctx.tokens.text,
        ));
        info.children.push(row);
    }
    if !snapshot.basic_info.avatar.is_empty() {
        let size = 96.0;
        let avatar = avatar_box(
            ctx,
            ctx.content_width() - size - pad,
            pad + 14.0,
            size,
            snapshot.cover.avatar_frame,
            snapshot.cover.avatar_shape,
        );
        info.children.push(avatar);
    }
    boxes.push(info);

    // Contact row.
    let contact_y = top + info_h + 12.0;
    let mut contact = panel(ctx, MARGIN, contact_y, ctx.content_width(), 54.0);
    contact.children.push(panel_title(ctx, "Contact", ctx.content_width()));
    let mut parts = vec![
        format!("Phone: {}", snapshot.contact.phone),
        format!("Address: {}", snapshot.contact.address),
    ];
    if !snapshot.contact.email.is_empty() {
        parts.push(format!("Email: {}", snapshot.contact.email));
    }
    if !snapshot.contact.wechat.is_empty() {
        parts.push(format!("WeChat: {}", snapshot.contact.wechat));
    }
    let mut line = PageBox::new(pad, pad + 18.0, ctx.content_width() - 2.0 * pad, 14.0);
    line.text = Some(TextContent::new(vec![parts.join("    ")], 9.5, &ctx.tokens.text));
    contact.children.push(line);
    boxes.push(contact);

    // Family table.
    let family_y = contact_y + 54.0 + 12.0;
    let family_h = 30.0 + 18.0 * (snapshot.family.len().max(1) as f32) + pad;
    let mut family = panel(ctx, MARGIN, family_y, ctx.content_width(), family_h);
    family.children.push(panel_title(ctx, "Family", ctx.content_width()));
    for (i, member) in snapshot.family.iter().enumerate() {
        let mut row = PageBox::new(pad, pad + 22.0 + i as f32 * 18.0, ctx.content_width() - 2.0 * pad, 16.0);
        row.text = Some(TextContent::new(
            vec![format!(
                "{}  {}  {}  {}",
                member.relation, member.name, member.job, member.phone
            )],
            9.5,
            &ctx.tokens.text,
        ));
        family.children.push(row);
    }
    boxes.push(family);

    // Grade table: one row per semester, fixed subject columns. An empty
    // grades list still renders the panel with just its title.
    let grades_y = family_y + family_h + 12.0;
    let grades_h = 30.0 + 18.0 * (snapshot.grades.len() + 1) as f32 + pad;
    let mut grades = panel(ctx, MARGIN, grades_y, ctx.content_width(), grades_h);
    grades.children.push(panel_title(ctx, "Grades", ctx.content_width()));
    let subject_names: Vec<String> = snapshot
        .grades
        .first()
        .map(|row| row.subjects.iter().map(|s| s.name.clone()).collect())
        .unwrap_or_default();
    if !subject_names.is_empty() {
        let mut head = PageBox::new(pad, pad + 20.0, ctx.content_width() - 2.0 * pad, 14.0);
        let mut text = TextContent::new(
            vec![format!("Semester  {}", subject_names.join("  "))],
            9.0,
            &ctx.tokens.readable_primary,
        );
        text.bold = true;
        head.text = Some(text);
        grades.children.push(head);
    }
    for (i, row) in snapshot.grades.iter().enumerate() {
        let values: Vec<String> = row.subjects.iter().map(|s| s.value.clone()).collect();
        let mut line = PageBox::new(
            pad,
            pad + 38.0 + i as f32 * 18.0,
            ctx.content_width() - 2.0 * pad,
            14.0,
        );
        line.text = Some(TextContent::new(
            vec![format!("{}  {}", row.row_name, values.join("  "))],
            9.0,
            &ctx.tokens.text,
        ));
        grades.children.push(line);
    }
    boxes.push(grades);

    boxes
}

/// Quality reports: a vertical stack of up to two large captioned images.
fn quality_report_page(ctx: &ComposeCtx, d: &PageDescriptor) -> Vec<PageBox> {
    let images = match &d.payload {
        PagePayload::Images(items) => items,
        _ => return Vec::new(),
    };
    let top = content_top(ctx);
    let avail = PAGE_HEIGHT - top - 48.0;
    let cell_h = (avail - 12.0) / 2.0;
    images
        .iter()
        .enumerate()
        .map(|(i, item)| {
            image_cell(
                ctx,
                MARGIN,
                top + i as f32 * (cell_h + 12.0),
                ctx.content_width(),
                cell_h,
                &item.image,
                &item.caption,
            )
        })
        .collect()
}

/// Certificates: 2×2 grid of captioned images.
fn certificates_page(ctx: &ComposeCtx, d: &PageDescriptor) -> Vec<PageBox> {
    let images = match &d.payload {
        PagePayload::Images(items) => items,
        _ => return Vec::new(),
    };
    let top = content_top(ctx);
    let gap = 12.0;
    let cell_w = (ctx.content_width() - gap) / 2.0;
    let cell_h = (PAGE_HEIGHT - top - 48.0 - gap) / 2.0;
    images
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let col = (i % 2) as f32;
            let row = (i / 2) as f32;
            image_cell(
                ctx,
                MARGIN + col * (cell_w + gap),
                top + row * (cell_h + gap),
                cell_w,
                cell_h,
                &item.image,
                &item.caption,
            )
        })
        .collect()
}

fn honors_page(ctx: &ComposeCtx, d: &PageDescriptor) -> Vec<PageBox> {
    let (awards, quote, density) = match &d.payload {
        PagePayload::Honors {
            awards,
            quote,
            density,
        } => (awards, quote, *density),
        _ => return Vec::new(),
    };

    // Density ladder: the page tightens instead of paginating.
    let (row_h, name_size, quote_size) = match density {
        HonorsDensity::Normal => (44.0, 11.5, 13.0),
        HonorsDensity::Compact => (34.0, 10.5, 12.0),
        HonorsDensity::UltraCompact => (26.0, 9.5, 9.5),
    };

    let pad = ctx.tokens.panel_padding * PX_TO_PT;
    let top = content_top(ctx);
    let quote_h = quote_size * 3.2;
    let list_h = PAGE_HEIGHT - top - 48.0 - quote_h - 12.0;
    let mut boxes = Vec::new();

    let mut list = panel(ctx, MARGIN, top, ctx.content_width(), list_h);
    for (i, award) in awards.iter().enumerate() {
        let y = pad + i as f32 * row_h;
        if y + row_h > list_h - pad {
            break;
        }
        // Timeline marker, then name / level badge / date.
        let mut marker = PageBox::new(pad, y + row_h * 0.3, 8.0, 8.0);
        marker.shape = Some(VecShape::Circle {
            cx: 4.0,
            cy: 4.0,
            r: 4.0,
            fill: Some(ctx.tokens.readable_primary.clone()),
            stroke: None,
        });
        list.children.push(marker);

        let mut name = PageBox::new(pad + 16.0, y, ctx.content_width() * 0.6, row_h);
        let mut text = TextContent::new(vec![award.name.clone()], name_size, &ctx.tokens.text);
        text.bold = true;
        name.text = Some(text);
        list.children.push(name);

        if !award.level.is_empty() {
            let badge_w = 70.0;
            let mut badge = PageBox::new(ctx.content_width() - pad - badge_w - 70.0, y + 2.0, badge_w, 14.0);
            badge.fill = Some(Fill::solid(&ctx.tokens.secondary));
            badge.corner_radius = 7.0;
            let mut text = TextContent::new(vec![award.level.clone()], 8.0, &ctx.tokens.readable_primary);
            text.align = TextAlign::Center;
            badge.text = Some(text);
            list.children.push(badge);
        }

        let mut date = PageBox::new(ctx.content_width() - pad - 60.0, y + 2.0, 60.0, 14.0);
        let mut text = TextContent::new(vec![award.date.clone()], 8.5, &ctx.tokens.text);
        text.align = TextAlign::Right;
        date.text = Some(text);
        list.children.push(date);
    }
    boxes.push(list);

    let mut quote_box = PageBox::new(MARGIN, top + list_h + 12.0, ctx.content_width(), quote_h);
    let mut text = TextContent::new(
        vec![format!("\u{201c} {quote} \u{201d}")],
        quote_size,
        &ctx.tokens.readable_primary,
    );
    text.italic = true;
    text.align = TextAlign::Center;
    quote_box.text = Some(text);
    boxes.push(quote_box);
    boxes
}

fn portfolio_page(ctx: &ComposeCtx, d: &PageDescriptor) -> Vec<PageBox> {
    let (website, images) = match &d.payload {
        PagePayload::Portfolio { website, images } => (website, images),
        _ => return Vec::new(),
    };
    let top = content_top(ctx);
    let mut boxes = Vec::new();
    let mut y = top;

    if !website.is_empty() {
        let mut link = panel(ctx, MARGIN, y, ctx.content_width(), 32.0);
        let mut text = TextContent::new(
            vec![format!("Portfolio site: {website}")],
            10.5,
            &ctx.tokens.readable_primary,
        );
        text.bold = true;
        let mut line = PageBox::new(ctx.tokens.panel_padding * PX_TO_PT, 9.0, ctx.content_width(), 14.0);
        line.text = Some(text);
        link.children.push(line);
        boxes.push(link);
        y += 44.0;
    }

    // Up to 8 works, 2 columns × 4 rows.
    let gap = 10.0;
    let cell_w = (ctx.content_width() - gap) / 2.0;
    let cell_h = (PAGE_HEIGHT - y - 48.0 - 3.0 * gap) / 4.0;
    for (i, item) in images.iter().enumerate() {
        let col = (i % 2) as f32;
        let row = (i / 2) as f32;
        boxes.push(image_cell(
            ctx,
            MARGIN + col * (cell_w + gap),
            y + row * (cell_h + gap),
            cell_w,
            cell_h,
            &item.image,
            &item.caption,
        ));
    }
    boxes
}

fn hobby_clip(shape: HobbyShape, size: f32) -> ClipShape {
    match shape {
        HobbyShape::Circle => ClipShape::Circle,
        HobbyShape::Square => ClipShape::RoundedRect { radius: size * 0.12 },
        HobbyShape::Diamond => ClipShape::Polygon {
            points: vec![[0.5, 0.0], [1.0, 0.5], [0.5, 1.0], [0.0, 0.5]],
        },
        HobbyShape::Hexagon => ClipShape::Polygon {
            points: vec![
                [0.25, 0.0],
                [0.75, 0.0],
                [1.0, 0.5],
                [0.75, 1.0],
                [0.25, 1.0],
                [0.0, 0.5],
            ],
        },
    }
}

fn hobbies_page(ctx: &ComposeCtx, d: &PageDescriptor) -> Vec<PageBox> {
    let images = match &d.payload {
        PagePayload::Images(items) => items,
        _ => return Vec::new(),
    };
    let snapshot = ctx.snapshot;
    let pad = ctx.tokens.panel_padding * PX_TO_PT;
    let top = content_top(ctx);
    let mut boxes = Vec::new();

    // Specialty chips.
    let mut chip_x = MARGIN;
    for specialty in snapshot.hobbies.specialties.iter().take(crate::snapshot::MAX_SPECIALTIES) {
        let w = ctx
            .fonts
            .measure_text_width(specialty, 9.5, false, false, BODY_FONT)
            + 20.0;
        let mut chip = PageBox::new(chip_x, top, w, 18.0);
        chip.fill = Some(Fill::solid(&ctx.tokens.secondary));
        chip.corner_radius = 9.0;
        let mut text = TextContent::new(vec![specialty.clone()], 9.5, &ctx.tokens.readable_primary);
        text.align = TextAlign::Center;
        chip.text = Some(text);
        boxes.push(chip);
        chip_x += w + 8.0;
    }

    // Narrative panel.
    let text_y = top + 28.0;
    let text_h = 170.0;
    let mut narrative = panel(ctx, MARGIN, text_y, ctx.content_width(), text_h);
    narrative.children.push(panel_title(ctx, "About my hobbies", ctx.content_width()));
    let mut body = PageBox::new(pad, pad + 20.0, ctx.content_width() - 2.0 * pad, text_h - pad - 24.0);
    body.text = Some(body_text(ctx, &snapshot.hobbies.content, ctx.content_width() - 2.0 * pad, 10.0));
    narrative.children.push(body);
    boxes.push(narrative);

    // Photo strip in the selected hobby shape, up to 5 across.
    if !images.is_empty() {
        let y = text_y + text_h + 20.0;
        let gap = 12.0;
        let size = ((ctx.content_width() - gap * 4.0) / 5.0).min(92.0);
        for (i, item) in images.iter().enumerate() {
            let x = MARGIN + i as f32 * (size + gap);
            let mut cell = PageBox::new(x, y, size, size + 16.0);
            let mut slot = PageBox::new(0.0, 0.0, size, size);
            slot.image = Some(ImageSlot {
                source: item.image.clone(),
                width: size,
                height: size,
                clip: Some(hobby_clip(snapshot.hobbies.image_shape, size)),
            });
            cell.children.push(slot);
            if !item.caption.is_empty() {
                let mut cap = PageBox::new(0.0, size + 2.0, size, 12.0);
                let mut text = TextContent::new(vec![item.caption.clone()], 8.0, &ctx.tokens.text);
                text.align = TextAlign::Center;
                cap.text = Some(text);
                cell.children.push(cap);
            }
            boxes.push(cell);
        }
    }
    boxes
}

fn social_practice_page(ctx: &ComposeCtx, d: &PageDescriptor) -> Vec<PageBox> {
    let (content, images) = match &d.payload {
        PagePayload::SocialPractice { content, images } => (content, images),
        _ => return Vec::new(),
    };
    let pad = ctx.tokens.panel_padding * PX_TO_PT;
    let top = content_top(ctx);
    let mut boxes = Vec::new();

    let text_h = 150.0;
    let mut narrative = panel(ctx, MARGIN, top, ctx.content_width(), text_h);
    narrative.children.push(panel_title(ctx, "Activities", ctx.content_width()));
    let mut body = PageBox::new(pad, pad + 20.0, ctx.content_width() - 2.0 * pad, text_h - pad - 24.0);
    body.text = Some(body_text(ctx, content, ctx.content_width() - 2.0 * pad, 10.0));
    narrative.children.push(body);
    boxes.push(narrative);

    // Up to 4 photos, 2×2.
    let y = top + text_h + 16.0;
    let gap = 12.0;
    let cell_w = (ctx.content_width() - gap) / 2.0;
    let cell_h = (PAGE_HEIGHT - y - 48.0 - gap) / 2.0;
    for (i, item) in images.iter().enumerate() {
        let col = (i % 2) as f32;
        let row = (i / 2) as f32;
        boxes.push(image_cell(
            ctx,
            MARGIN + col * (cell_w + gap),
            y + row * (cell_h + gap),
            cell_w,
            cell_h,
            &item.image,
            &item.caption,
        ));
    }
    boxes
}

/// Essay: ruled-paper character grid, or the handwriting image wholesale.
const ESSAY_COLS: usize = 18;
const ESSAY_ROW_H: f32 = 38.0 * PX_TO_PT;

fn essay_page(ctx: &ComposeCtx, d: &PageDescriptor) -> Vec<PageBox> {
    let (text, image) = match &d.payload {
        PagePayload::Essay { text, image } => (text, image),
        _ => return Vec::new(),
    };
    let top = content_top(ctx);
    let avail_h = PAGE_HEIGHT - top - 48.0;

    if let Some(source) = image {
        let mut slot = PageBox::new(MARGIN, top, ctx.content_width(), avail_h);
        slot.image = Some(ImageSlot {
            source: source.clone(),
            width: ctx.content_width(),
            height: avail_h,
            clip: Some(ClipShape::RoundedRect {
                radius: ctx.corner_radius(),
            }),
        });
        return vec![slot];
    }

    let mut sheet = panel(ctx, MARGIN, top, ctx.content_width(), avail_h);
    let pad = 14.0;
    let grid_w = ctx.content_width() - 2.0 * pad;
    let cell_w = grid_w / ESSAY_COLS as f32;
    let rows = ((avail_h - 2.0 * pad) / ESSAY_ROW_H).floor() as usize;

    // Ruled lines under each row of cells.
    for row in 0..rows {
        let y = pad + (row + 1) as f32 * ESSAY_ROW_H - 4.0;
        let mut rule = PageBox::new(pad, y, grid_w, 0.0);
        rule.shape = Some(VecShape::Line {
            points: vec![[0.0, 0.0], [grid_w, 0.0]],
            stroke: crate::visual::Stroke {
                color: ctx.tokens.secondary.clone(),
                width: 0.7,
                dashed: false,
            },
        });
        sheet.children.push(rule);
    }

    // Character-per-cell layout: each paragraph starts on a fresh row with
    // a one-cell indent.
    let mut row = 0usize;
    let mut col = 0usize;
    'outer: for paragraph in text.split('\n') {
        if paragraph.trim().is_empty() {
            continue;
        }
        if col != 0 {
            row += 1;
        }
        col = 1;
        for ch in paragraph.chars() {
            if ch == ' ' && col == 1 {
                continue;
            }
            if row >= rows {
                break 'outer;
            }
            let mut cell = PageBox::new(
                pad + col as f32 * cell_w,
                pad + row as f32 * ESSAY_ROW_H + 4.0,
                cell_w,
                ESSAY_ROW_H - 8.0,
            );
            let mut content = TextContent::new(vec![ch.to_string()], 13.0, &ctx.tokens.text);
            content.align = TextAlign::Center;
            cell.text = Some(content);
            sheet.children.push(cell);
            col += 1;
            if col >= ESSAY_COLS {
                col = 0;
                row += 1;
            }
        }
    }
    vec![sheet]
}

fn recommendation_page(ctx: &ComposeCtx, d: &PageDescriptor) -> Vec<PageBox> {
    let image = match &d.payload {
        PagePayload::Recommendation { image } => image,
        _ => return Vec::new(),
    };
    let top = content_top(ctx);
    let avail_h = PAGE_HEIGHT - top - 48.0;
    let mut slot = PageBox::new(MARGIN, top, ctx.content_width(), avail_h);
    slot.image = Some(ImageSlot {
        source: image.clone(),
        width: ctx.content_width(),
        height: avail_h,
        clip: Some(ClipShape::RoundedRect {
            radius: ctx.corner_radius(),
        }),
    });
    vec![slot]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::CaptionedImage;

    fn snapshot() -> ResumeSnapshot {
        let mut snap = ResumeSnapshot::default();
        snap.accent_color = "#0ea5e9".to_string();
        snap.basic_info.name = "Alex Chen".to_string();
        snap.cover.title = "My Resume".to_string();
        snap
    }

    fn count_boxes(boxes: &[PageBox]) -> usize {
        boxes
            .iter()
            .map(|b| 1 + count_boxes(&b.children))
            .sum()
    }

    #[test]
    fn minimal_snapshot_composes_six_pages() {
        let doc = compose_document(&snapshot(), &ComposeOptions::default());
        assert_eq!(doc.pages.len(), 6);
        assert_eq!(doc.pages[0].kind, PageKind::Cover);
        assert_eq!(doc.pages[5].kind, PageKind::BackCover);
        assert_eq!(doc.title, "Alex Chen - Resume Booklet");
    }

    #[test]
    fn composition_is_deterministic() {
        let snap = snapshot();
        let a = compose_document(&snap, &ComposeOptions::default());
        let b = compose_document(&snap, &ComposeOptions::default());
        assert_eq!(a.to_json(), b.to_json());
    }

    #[test]
    fn watermark_present_on_every_page_when_requested() {
        let snap = snapshot();
        let plain = compose_document(&snap, &ComposeOptions::default());
        let marked = compose_document(
            &snap,
            &ComposeOptions {
                show_watermark: true,
                title: None,
            },
        );
        for (with, without) in marked.pages.iter().zip(plain.pages.iter()) {
            assert_eq!(with.boxes.len(), without.boxes.len() + 1);
            let layer = with.boxes.last().unwrap();
            assert_eq!(layer.opacity, 0.08);
            assert!(layer.children.iter().all(|c| c.rotation_deg == -35.0));
        }
    }

    #[test]
    fn footer_shows_zero_padded_ordinal() {
        let doc = compose_document(&snapshot(), &ComposeOptions::default());
        let profile = &doc.pages[1];
        assert_eq!(profile.ordinal, Some(1));
        let footer_text: Vec<&str> = profile
            .boxes
            .iter()
            .filter_map(|b| b.text.as_ref())
            .flat_map(|t| t.lines.iter().map(String::as_str))
            .filter(|line| *line == "01")
            .collect();
        assert_eq!(footer_text.len(), 1);
    }

    #[test]
    fn essay_image_suppresses_ruled_grid() {
        let mut snap = snapshot();
        snap.cover_letter = "Hello there, reader.".to_string();
        let with_text = compose_document(&snap, &ComposeOptions::default());
        snap.cover_letter_image = "data:image/png;base64,AAAA".to_string();
        let with_image = compose_document(&snap, &ComposeOptions::default());

        let essay_text = with_text
            .pages
            .iter()
            .find(|p| p.kind == PageKind::Essay)
            .unwrap();
        let essay_image = with_image
            .pages
            .iter()
            .find(|p| p.kind == PageKind::Essay)
            .unwrap();
        // The grid sheet carries many child cells; the image page is one slot.
        assert!(count_boxes(&essay_text.boxes) > count_boxes(&essay_image.boxes));
    }

    #[test]
    fn essay_paragraphs_indent_one_cell() {
        let mut snap = snapshot();
        snap.cover_letter = "ab\ncd".to_string();
        let doc = compose_document(&snap, &ComposeOptions::default());
        let essay = doc
            .pages
            .iter()
            .find(|p| p.kind == PageKind::Essay)
            .unwrap();
        let sheet = essay
            .boxes
            .iter()
            .find(|b| {
                b.children
                    .iter()
                    .any(|c| c.text.as_ref().is_some_and(|t| t.lines == ["a"]))
            })
            .unwrap();
        let cells: Vec<&PageBox> = sheet
            .children
            .iter()
            .filter(|c| c.text.is_some())
            .collect();
        assert_eq!(cells.len(), 4);
        // Both paragraphs start at the same indented column, one row apart.
        assert!((cells[0].x - cells[2].x).abs() < 0.01);
        assert!(cells[2].y > cells[0].y);
        // The indent leaves the first column empty.
        let pad = 14.0;
        let cell_w = (PAGE_WIDTH - 2.0 * MARGIN - 2.0 * pad) / ESSAY_COLS as f32;
        assert!((cells[0].x - (pad + cell_w)).abs() < 0.01);
    }

    #[test]
    fn certificates_page_lays_out_two_by_two() {
        let mut snap = snapshot();
        for i in 0..4 {
            snap.certificates
                .push(CaptionedImage::new(&format!("c{i}"), "ref", "cap"));
        }
        let doc = compose_document(&snap, &ComposeOptions::default());
        let certs = doc
            .pages
            .iter()
            .find(|p| p.kind == PageKind::Certificates)
            .unwrap();
        let cells: Vec<&PageBox> = certs
            .boxes
            .iter()
            .filter(|b| b.children.iter().any(|c| c.image.is_some()))
            .collect();
        assert_eq!(cells.len(), 4);
        // Two distinct columns, two distinct rows.
        assert!((cells[0].x - cells[2].x).abs() < 0.01);
        assert!(cells[0].y < cells[2].y);
        assert!(cells[0].x < cells[1].x);
    }

    #[test]
    fn honors_density_tightens_rows() {
        let mut snap = snapshot();
        let doc_normal = compose_document(&snap, &ComposeOptions::default());
        for i in 0..10 {
            snap.awards.push(crate::snapshot::Award {
                id: format!("a{i}"),
                name: format!("Award {i}"),
                date: "2023".to_string(),
                level: "City".to_string(),
            });
        }
        let doc_dense = compose_document(&snap, &ComposeOptions::default());
        let boxes = |doc: &ComposedDocument| {
            doc.pages
                .iter()
                .find(|p| p.kind == PageKind::Honors)
                .map(|p| count_boxes(&p.boxes))
                .unwrap()
        };
        assert!(boxes(&doc_dense) > boxes(&doc_normal));
    }
}
