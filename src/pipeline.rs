//! Pipeline – ties together migration, theming, planning, composition,
//! and the export cycle into single function calls.

use std::time::Duration;

use crate::compose::{compose_document, ComposeOptions};
use crate::export::{ExportConfig, ExportOrchestrator, ExportOutcome, ExportRequest};
use crate::migrate::load_snapshot;
use crate::print_pdf::PdfPrinter;
use crate::snapshot::{LayoutTemplate, ResumeSnapshot};
use crate::visual::ComposedDocument;

/// Configuration for one booklet build.
#[derive(Debug, Clone)]
pub struct BookletConfig {
    /// Document title; derived from the subject's name when `None`.
    pub title: Option<String>,
    /// Whether pages carry the watermark overlay (entitlement decision,
    /// made by the caller).
    pub watermark: bool,
    /// Overrides the snapshot's stored layout template when set.
    pub layout: Option<LayoutTemplate>,
    /// Settle delay before the print capability runs.
    pub settle_delay: Duration,
}

impl Default for BookletConfig {
    fn default() -> Self {
        Self {
            title: None,
            watermark: false,
            layout: None,
            settle_delay: Duration::from_secs(1),
        }
    }
}

fn effective_snapshot(snapshot: &ResumeSnapshot, config: &BookletConfig) -> ResumeSnapshot {
    let mut snapshot = snapshot.clone();
    if let Some(layout) = config.layout {
        snapshot.layout = layout;
    }
    snapshot
}

/// Compose only (no export cycle, no PDF) – useful for testing and for
/// inspecting the page tree.
pub fn compose_booklet(snapshot: &ResumeSnapshot, config: &BookletConfig) -> ComposedDocument {
    let snapshot = effective_snapshot(snapshot, config);
    compose_document(
        &snapshot,
        &ComposeOptions {
            show_watermark: config.watermark,
            title: config.title.clone(),
        },
    )
}

/// Full pipeline: raw snapshot JSON → migrated snapshot → export cycle
/// writing a PDF artifact. Returns the composed document alongside the
/// export outcome so callers can report page counts.
pub fn export_booklet(
    raw_json: Option<&str>,
    output: &std::path::Path,
    config: &BookletConfig,
) -> Result<(ComposedDocument, ExportOutcome), String> {
    let snapshot = effective_snapshot(&load_snapshot(raw_json), config);
    let doc = compose_booklet(&snapshot, config);

    let mut printer = PdfPrinter::new(output);
    let mut orchestrator = ExportOrchestrator::new(ExportConfig {
        settle_delay: config.settle_delay,
        ..ExportConfig::default()
    });
    let outcome = orchestrator.export(
        &snapshot,
        &ExportRequest {
            with_watermark: config.watermark,
            title: config.title.clone(),
        },
        &mut printer,
    );

    if outcome == (ExportOutcome::Completed { print_ok: false }) {
        return Err("PDF backend failed; see log for details".to_string());
    }
    Ok((doc, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_booklet_honors_layout_override() {
        let snap = ResumeSnapshot::default();
        assert_eq!(snap.layout, LayoutTemplate::Classic);
        let config = BookletConfig {
            layout: Some(LayoutTemplate::Modern),
            ..BookletConfig::default()
        };
        let doc = compose_booklet(&snap, &config);
        assert!(!doc.pages.is_empty());

        // The override never leaks back into the caller's snapshot.
        assert_eq!(snap.layout, LayoutTemplate::Classic);
    }

    #[test]
    fn export_writes_pdf_artifact() {
        let dir = std::env::temp_dir().join("booklet-pipeline-test");
        std::fs::create_dir_all(&dir).unwrap();
        let out = dir.join("out.pdf");

        let config = BookletConfig {
            settle_delay: Duration::from_millis(0),
            ..BookletConfig::default()
        };
        let (doc, outcome) = export_booklet(None, &out, &config).unwrap();
        assert_eq!(outcome, ExportOutcome::Completed { print_ok: true });
        assert_eq!(doc.pages.len(), 6);

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        std::fs::remove_file(&out).ok();
    }
}
