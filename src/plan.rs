//! Pagination planner – turns a snapshot into a deterministic, ordered
//! list of [`PageDescriptor`]s.
//!
//! Page breaks are rule-based, never computed by flow simulation:
//! - Cover and BackCover are always present and unnumbered
//! - Profile, Honors, Hobbies, and Essay are always exactly one page
//! - Quality reports chunk 2 per page, certificates 4 per page
//! - Portfolio, SocialPractice, and Recommendation appear only when
//!   they have content
//!
//! Ordinals are derived on every plan, never stored on content: Profile is
//! page 1, and every later numbered page is `2 + count of preceding
//! numbered pages`, so any content edit renumbers consistently.

use serde::{Deserialize, Serialize};

use crate::snapshot::{
    Award, CaptionedImage, ResumeSnapshot, MAX_HOBBY_IMAGES, MAX_PORTFOLIO_IMAGES,
    MAX_SOCIAL_IMAGES,
};

/// Quality-report images per page.
pub const QUALITY_CHUNK: usize = 2;
/// Certificate images per page (2×2 grid).
pub const CERT_CHUNK: usize = 4;

/// Shown on the honors page when no quote was written.
pub const DEFAULT_AWARDS_QUOTE: &str = "Every honor is the fruit of hard work";

/// What a physical output page is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    Cover,
    Profile,
    QualityReport,
    Honors,
    Certificates,
    Portfolio,
    Hobbies,
    SocialPractice,
    Essay,
    Recommendation,
    BackCover,
}

impl PageKind {
    /// Cover and BackCover are excluded from the numbering sequence.
    pub fn is_numbered(self) -> bool {
        !matches!(self, PageKind::Cover | PageKind::BackCover)
    }
}

/// Visual density ladder for the honors page. Awards are never split
/// across pages; the page tightens instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HonorsDensity {
    Normal,
    /// More than 5 awards: tighter per-item spacing and typography.
    Compact,
    /// More than 8 awards: tighter still, and the quote block shrinks.
    UltraCompact,
}

impl HonorsDensity {
    pub fn for_count(count: usize) -> Self {
        if count > 8 {
            HonorsDensity::UltraCompact
        } else if count > 5 {
            HonorsDensity::Compact
        } else {
            HonorsDensity::Normal
        }
    }
}

/// The content slice a page owns. Images are lightweight records holding
/// opaque references; image bytes are never copied here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PagePayload {
    /// Pages whose content is wholly scalar snapshot fields.
    None,
    /// One chunk (or capped slice) of a captioned-image collection.
    Images(Vec<CaptionedImage>),
    Honors {
        awards: Vec<Award>,
        quote: String,
        density: HonorsDensity,
    },
    Portfolio {
        website: String,
        images: Vec<CaptionedImage>,
    },
    SocialPractice {
        content: String,
        images: Vec<CaptionedImage>,
    },
    Essay {
        text: String,
        /// When present, replaces the ruled-paper text rendering.
        image: Option<String>,
    },
    Recommendation {
        image: String,
    },
}

/// Planning-time record for one physical output page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDescriptor {
    pub kind: PageKind,
    /// 1-based display page number; `None` for unnumbered pages.
    pub ordinal: Option<u32>,
    pub payload: PagePayload,
}

impl PageDescriptor {
    fn new(kind: PageKind, payload: PagePayload) -> Self {
        Self {
            kind,
            ordinal: None,
            payload,
        }
    }
}

/// Split an ordered collection into fixed-size, order-preserving groups.
/// `chunk([], k)` is `[]`, never one empty group; `chunk(_, 0)` is `[]`.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return Vec::new();
    }
    items.chunks(size).map(<[T]>::to_vec).collect()
}

/// Compute the full page list for one snapshot. Pure: calling twice on the
/// same snapshot yields identical descriptors.
pub fn plan_pages(snapshot: &ResumeSnapshot) -> Vec<PageDescriptor> {
    let mut pages = Vec::new();

    pages.push(PageDescriptor::new(PageKind::Cover, PagePayload::None));
    pages.push(PageDescriptor::new(PageKind::Profile, PagePayload::None));

    for group in chunk(&snapshot.quality_reports, QUALITY_CHUNK) {
        pages.push(PageDescriptor::new(
            PageKind::QualityReport,
            PagePayload::Images(group),
        ));
    }

    let awards: Vec<Award> = snapshot
        .awards
        .iter()
        .filter(|a| a.has_content())
        .cloned()
        .collect();
    let quote = if snapshot.awards_quote.is_empty() {
        DEFAULT_AWARDS_QUOTE.to_string()
    } else {
        snapshot.awards_quote.clone()
    };
    let density = HonorsDensity::for_count(awards.len());
    pages.push(PageDescriptor::new(
        PageKind::Honors,
        PagePayload::Honors {
            awards,
            quote,
            density,
        },
    ));

    for group in chunk(&snapshot.certificates, CERT_CHUNK) {
        pages.push(PageDescriptor::new(
            PageKind::Certificates,
            PagePayload::Images(group),
        ));
    }

    // Second line of defense: collections that somehow exceed their cap
    // are truncated here, never paginated.
    if !snapshot.portfolio.website.is_empty() || !snapshot.portfolio.images.is_empty() {
        pages.push(PageDescriptor::new(
            PageKind::Portfolio,
            PagePayload::Portfolio {
                website: snapshot.portfolio.website.clone(),
                images: truncated(&snapshot.portfolio.images, MAX_PORTFOLIO_IMAGES),
            },
        ));
    }

    pages.push(PageDescriptor::new(
        PageKind::Hobbies,
        PagePayload::Images(truncated(&snapshot.hobbies.images, MAX_HOBBY_IMAGES)),
    ));

    if !snapshot.social_practice.content.is_empty() || !snapshot.social_practice.images.is_empty() {
        pages.push(PageDescriptor::new(
            PageKind::SocialPractice,
            PagePayload::SocialPractice {
                content: snapshot.social_practice.content.clone(),
                images: truncated(&snapshot.social_practice.images, MAX_SOCIAL_IMAGES),
            },
        ));
    }

    pages.push(PageDescriptor::new(
        PageKind::Essay,
        PagePayload::Essay {
            text: snapshot.cover_letter.clone(),
            image: if snapshot.cover_letter_image.is_empty() {
                None
            } else {
                Some(snapshot.cover_letter_image.clone())
            },
        },
    ));

    if !snapshot.recommendation_image.is_empty() {
        pages.push(PageDescriptor::new(
            PageKind::Recommendation,
            PagePayload::Recommendation {
                image: snapshot.recommendation_image.clone(),
            },
        ));
    }

    pages.push(PageDescriptor::new(PageKind::BackCover, PagePayload::None));

    assign_ordinals(&mut pages);
    pages
}

/// Running page-number assignment: numbered pages count up from 1
/// (Profile) with no gaps; Cover/BackCover stay unnumbered.
fn assign_ordinals(pages: &mut [PageDescriptor]) {
    let mut next = 1u32;
    for page in pages.iter_mut() {
        if page.kind.is_numbered() {
            page.ordinal = Some(next);
            next += 1;
        } else {
            page.ordinal = None;
        }
    }
}

fn truncated(items: &[CaptionedImage], cap: usize) -> Vec<CaptionedImage> {
    items.iter().take(cap).cloned().collect()
}
