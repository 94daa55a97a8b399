//! Integration tests for the booklet-forge pipeline.
//!
//! These tests validate:
//! - Theme resolution and contrast classification
//! - Pagination rules, chunking, and page numbering
//! - Composition output shape and determinism
//! - The print-export cycle, including backend failure
//! - PDF output exists and has valid format

use std::time::Duration;

use sha2::{Digest, Sha256};

use booklet_forge::compose::{compose_document, ComposeOptions, WATERMARK_TEXT};
use booklet_forge::export::{
    ExportConfig, ExportOrchestrator, ExportOutcome, ExportPhase, ExportRequest, LayoutMode,
    PrintCapability,
};
use booklet_forge::migrate::load_snapshot;
use booklet_forge::plan::{chunk, plan_pages, PageKind, PagePayload};
use booklet_forge::print_pdf::render_pdf;
use booklet_forge::snapshot::{CaptionedImage, LayoutTemplate, ResumeSnapshot};
use booklet_forge::theme::{is_light_color, resolve_theme};
use booklet_forge::visual::{ComposedDocument, PageBox};

// =====================================================================
// Helpers
// =====================================================================

fn sample_snapshot() -> ResumeSnapshot {
    let mut snap = load_snapshot(None);
    snap.basic_info.name = "Alex Chen".to_string();
    snap.cover.title = "My Resume".to_string();
    snap.cover_letter = "Hello, I am Alex and I like building things.".to_string();
    snap
}

fn img(id: &str) -> CaptionedImage {
    CaptionedImage::new(id, "data:image/png;base64,AAAA", "caption")
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn visit_box(pbox: &PageBox, f: &mut impl FnMut(&PageBox)) {
    f(pbox);
    for child in &pbox.children {
        visit_box(child, f);
    }
}

fn structure_hash(doc: &ComposedDocument) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(doc.to_json().as_bytes());
    hasher.finalize().into()
}

fn no_sleep(_: Duration) {}

fn fast_export_config() -> ExportConfig {
    ExportConfig {
        settle_delay: Duration::from_millis(0),
        sleeper: no_sleep,
    }
}

// =====================================================================
// Theme resolution
// =====================================================================

#[test]
fn brightness_classification_is_stable() {
    for hex in ["#ffffff", "#000000", "#D9F217", "#0ea5e9", "#bogus!"] {
        assert_eq!(is_light_color(hex), is_light_color(hex));
    }
    assert!(is_light_color("#ffffff"));
    assert!(!is_light_color("#000000"));
}

#[test]
fn bright_accent_never_becomes_body_text_on_white() {
    // #D9F217 has brightness well above the threshold.
    assert!(is_light_color("#D9F217"));
    let tokens = resolve_theme("#D9F217", LayoutTemplate::Classic, false);
    assert_eq!(tokens.readable_primary, "#475569");
    assert_eq!(tokens.primary, "#d9f217");
}

#[test]
fn identical_selectors_resolve_identical_tokens() {
    for layout in [
        LayoutTemplate::Classic,
        LayoutTemplate::Modern,
        LayoutTemplate::Storybook,
    ] {
        let a = resolve_theme("#7c3aed", layout, false);
        let b = resolve_theme("#7c3aed", layout, false);
        assert_eq!(a, b);
    }
}

// =====================================================================
// Pagination
// =====================================================================

#[test]
fn chunk_preserves_count_and_order() {
    let items: Vec<u32> = (0..11).collect();
    for k in 1..=5 {
        let groups = chunk(&items, k);
        assert_eq!(groups.len(), items.len().div_ceil(k));
        assert!(groups.iter().all(|g| g.len() <= k));
        let flat: Vec<u32> = groups.into_iter().flatten().collect();
        assert_eq!(flat, items);
    }
    assert!(chunk::<u32>(&[], 3).is_empty());
}

#[test]
fn minimal_snapshot_gets_the_six_core_pages() {
    let pages = plan_pages(&sample_snapshot());
    let kinds: Vec<PageKind> = pages.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            PageKind::Cover,
            PageKind::Profile,
            PageKind::Honors,
            PageKind::Hobbies,
            PageKind::Essay,
            PageKind::BackCover,
        ]
    );
    let by_kind = |kind| {
        pages
            .iter()
            .find(|p| p.kind == kind)
            .and_then(|p| p.ordinal)
    };
    assert_eq!(by_kind(PageKind::Profile), Some(1));
    assert_eq!(by_kind(PageKind::Honors), Some(2));
    assert_eq!(by_kind(PageKind::Hobbies), Some(3));
    assert_eq!(by_kind(PageKind::Essay), Some(4));
}

#[test]
fn ordinals_increase_without_gaps() {
    let mut snap = sample_snapshot();
    for i in 0..9 {
        snap.certificates.push(img(&format!("c{i}")));
    }
    for i in 0..3 {
        snap.quality_reports.push(img(&format!("q{i}")));
    }
    snap.portfolio.website = "https://example.org".to_string();
    snap.social_practice.content = "Volunteering at the library".to_string();
    snap.recommendation_image = "data:image/png;base64,AAAA".to_string();

    let pages = plan_pages(&snap);
    let ordinals: Vec<u32> = pages.iter().filter_map(|p| p.ordinal).collect();
    let expected: Vec<u32> = (1..=ordinals.len() as u32).collect();
    assert_eq!(ordinals, expected);
    assert!(pages.first().unwrap().ordinal.is_none());
    assert!(pages.last().unwrap().ordinal.is_none());
}

#[test]
fn nine_certificates_split_four_four_one() {
    let mut snap = sample_snapshot();
    for i in 0..9 {
        snap.certificates.push(img(&format!("c{i}")));
    }
    let sizes: Vec<usize> = plan_pages(&snap)
        .iter()
        .filter(|p| p.kind == PageKind::Certificates)
        .map(|p| match &p.payload {
            PagePayload::Images(items) => items.len(),
            other => panic!("unexpected payload: {other:?}"),
        })
        .collect();
    assert_eq!(sizes, vec![4, 4, 1]);
}

#[test]
fn collection_caps_hold_at_the_mutation_boundary() {
    let mut snap = sample_snapshot();
    for i in 0..5 {
        snap.add_hobby_image(img(&format!("h{i}"))).unwrap();
    }
    assert!(snap.add_hobby_image(img("h6")).is_err());
    assert_eq!(snap.hobbies.images.len(), 5);

    for i in 0..4 {
        snap.add_social_practice_image(img(&format!("s{i}"))).unwrap();
    }
    assert!(snap.add_social_practice_image(img("s5")).is_err());
    assert_eq!(snap.social_practice.images.len(), 4);

    for i in 0..8 {
        snap.add_portfolio_image(img(&format!("p{i}"))).unwrap();
    }
    assert!(snap.add_portfolio_image(img("p9")).is_err());
    assert_eq!(snap.portfolio.images.len(), 8);
}

// =====================================================================
// Composition
// =====================================================================

#[test]
fn composition_structure_hash_is_deterministic() {
    let snap = sample_snapshot();
    let options = ComposeOptions::default();
    let a = structure_hash(&compose_document(&snap, &options));
    let b = structure_hash(&compose_document(&snap, &options));
    assert_eq!(a, b);

    let marked = structure_hash(&compose_document(
        &snap,
        &ComposeOptions {
            show_watermark: true,
            title: None,
        },
    ));
    assert_ne!(a, marked);
}

#[test]
fn every_layout_template_composes_every_page_kind() {
    let mut snap = sample_snapshot();
    snap.certificates.push(img("c1"));
    snap.quality_reports.push(img("q1"));
    snap.portfolio.website = "https://example.org".to_string();
    snap.social_practice.content = "Beach cleanup".to_string();
    snap.recommendation_image = "data:image/png;base64,AAAA".to_string();

    for layout in [
        LayoutTemplate::Classic,
        LayoutTemplate::Modern,
        LayoutTemplate::Storybook,
    ] {
        snap.layout = layout;
        let doc = compose_document(&snap, &ComposeOptions::default());
        assert_eq!(doc.pages.len(), 11, "layout {layout:?}");
        assert!(doc.pages.iter().all(|p| !p.boxes.is_empty()));
    }
}

#[test]
fn watermark_text_tiles_every_page_when_requested() {
    let doc = compose_document(
        &sample_snapshot(),
        &ComposeOptions {
            show_watermark: true,
            title: None,
        },
    );
    for page in &doc.pages {
        let mut tiles = 0;
        for pbox in &page.boxes {
            visit_box(pbox, &mut |b| {
                if let Some(text) = &b.text {
                    if text.lines.iter().any(|l| l == WATERMARK_TEXT) {
                        tiles += 1;
                    }
                }
            });
        }
        assert!(tiles >= 40, "{:?} page has only {tiles} tiles", page.kind);
    }
}

#[test]
fn composed_document_json_round_trips() {
    let doc = compose_document(&sample_snapshot(), &ComposeOptions::default());
    let json = doc.to_json();
    let back = ComposedDocument::from_json(&json).unwrap();
    assert_eq!(back, doc);
}

// =====================================================================
// Print-export cycle
// =====================================================================

struct FlakyPrinter {
    fail: bool,
    calls: usize,
}

impl PrintCapability for FlakyPrinter {
    fn print(&mut self, _doc: &ComposedDocument, _title: &str) -> Result<(), String> {
        self.calls += 1;
        if self.fail {
            Err("spooler unavailable".to_string())
        } else {
            Ok(())
        }
    }
}

#[test]
fn export_round_trip_from_grid_and_single_layouts() {
    for initial_mode in [LayoutMode::Grid, LayoutMode::Single] {
        for fail in [false, true] {
            let mut orchestrator = ExportOrchestrator::new(fast_export_config());
            orchestrator.session.layout_mode = initial_mode;
            let title_before = orchestrator.session.document_title.clone();
            let watermark_before = orchestrator.session.watermark_visible;

            let mut printer = FlakyPrinter { fail, calls: 0 };
            let outcome = orchestrator.export(
                &sample_snapshot(),
                &ExportRequest {
                    with_watermark: true,
                    title: None,
                },
                &mut printer,
            );

            assert_eq!(outcome, ExportOutcome::Completed { print_ok: !fail });
            assert_eq!(printer.calls, 1);
            assert_eq!(orchestrator.phase(), ExportPhase::Idle);
            assert!(!orchestrator.is_exporting());
            assert!(orchestrator.export_state().is_none());
            assert_eq!(orchestrator.session.layout_mode, initial_mode);
            assert_eq!(orchestrator.session.document_title, title_before);
            assert_eq!(orchestrator.session.watermark_visible, watermark_before);
            assert!(orchestrator.session.notice.is_none());
        }
    }
}

#[test]
fn export_never_mutates_the_snapshot() {
    let snap = sample_snapshot();
    let before = snap.clone();
    let mut orchestrator = ExportOrchestrator::new(fast_export_config());
    let mut printer = FlakyPrinter {
        fail: true,
        calls: 0,
    };
    orchestrator.export(
        &snap,
        &ExportRequest {
            with_watermark: true,
            title: None,
        },
        &mut printer,
    );
    assert_eq!(snap, before);
}

// =====================================================================
// PDF backend
// =====================================================================

#[test]
fn full_booklet_renders_valid_pdf() {
    let mut snap = sample_snapshot();
    snap.certificates.push(img("c1"));
    snap.awards_quote = "Per aspera ad astra".to_string();
    let doc = compose_document(&snap, &ComposeOptions::default());
    let bytes = render_pdf(&doc, &doc.title).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn watermarked_booklet_renders_valid_pdf() {
    let doc = compose_document(
        &sample_snapshot(),
        &ComposeOptions {
            show_watermark: true,
            title: Some("Preview".to_string()),
        },
    );
    let bytes = render_pdf(&doc, "Preview").unwrap();
    assert_valid_pdf(&bytes);
}

// =====================================================================
// Migration
// =====================================================================

#[test]
fn migrated_legacy_snapshot_plans_cleanly() {
    let raw = r#"{
        "accent_color": "not-a-color",
        "certificates": ["data:image/png;base64,AAAA", "data:image/png;base64,BBBB"],
        "hobbies": { "specialties": ["chess", "piano", "go", "swimming"] }
    }"#;
    let snap = load_snapshot(Some(raw));
    assert_eq!(snap.accent_color, "#0ea5e9");
    assert_eq!(snap.hobbies.specialties.len(), 3);
    assert_eq!(snap.awards.len(), 8);

    let pages = plan_pages(&snap);
    assert_eq!(
        pages
            .iter()
            .filter(|p| p.kind == PageKind::Certificates)
            .count(),
        1
    );
}
