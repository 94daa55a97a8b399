//! Print-export orchestrator.
//!
//! Exporting is a short-lived state machine:
//!
//! ```text
//! Idle -> Preparing -> AwaitingSettle -> Printing -> Restoring -> Idle
//! ```
//!
//! `Preparing` freezes a consistent export mode: the export flag goes up,
//! the session title is swapped for a friendly document title, and a grid
//! layout is forced to single column because grids are not valid on the
//! physical print medium. `AwaitingSettle` holds for a tunable delay so the
//! re-render can finish before capture. The print capability is then
//! invoked; whether it succeeds, is cancelled, or fails, `Restoring` always
//! runs and puts every transient mutation back. Printing is best-effort:
//! backend errors are logged, never propagated, and the snapshot itself is
//! never touched.
//!
//! Re-entrancy: a second request while a cycle is in flight is rejected
//! outright (single-flight), which protects layout-mode restoration from
//! interleaved cycles.

use std::time::Duration;

use log::{error, info, warn};

use crate::compose::{compose_document, ComposeOptions};
use crate::snapshot::ResumeSnapshot;
use crate::visual::ComposedDocument;

/// The blocking external print action. May fail; the orchestrator treats
/// failure as non-fatal. A user cancelling the native dialog is
/// indistinguishable from success.
pub trait PrintCapability {
    fn print(&mut self, doc: &ComposedDocument, title: &str) -> Result<(), String>;
}

/// On-screen arrangement of the page previews. Only `Single` is valid for
/// print; `Grid` is forced away for the duration of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Single,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportPhase {
    #[default]
    Idle,
    Preparing,
    AwaitingSettle,
    Printing,
    Restoring,
}

/// Transient state of one export cycle. Created in `Preparing`, destroyed
/// in `Restoring`, never persisted. Held by the orchestrator for the
/// duration of the cycle and observable through
/// [`ExportOrchestrator::export_state`].
#[derive(Debug, Clone, Default)]
pub struct ExportState {
    pub is_exporting: bool,
    pub is_print_rendering: bool,
    pub preserved_layout_mode: LayoutMode,
    /// Watermark visibility while the cycle runs, decided by entitlement.
    pub watermark_visible: bool,
}

/// The session the orchestrator mutates and restores: everything here is
/// presentation state, never snapshot data.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub layout_mode: LayoutMode,
    pub document_title: String,
    pub watermark_visible: bool,
    /// Transient status notice shown while exporting.
    pub notice: Option<String>,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            layout_mode: LayoutMode::Single,
            document_title: "Resume Editor".to_string(),
            watermark_visible: false,
            notice: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Decided upstream from entitlement status, not here.
    pub with_watermark: bool,
    /// Export document title; derived from the subject's name when absent.
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The cycle ran to completion. `print_ok` is false when the backend
    /// reported an error (already logged).
    Completed { print_ok: bool },
    /// Rejected by the single-flight guard.
    Rejected,
}

/// Orchestrator knobs. The settle delay is tunable rather than business
/// logic; image-heavy documents need about a second.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub settle_delay: Duration,
    /// Injection point for the settle wait; tests install a no-op.
    pub sleeper: fn(Duration),
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            sleeper: std::thread::sleep,
        }
    }
}

pub struct ExportOrchestrator {
    config: ExportConfig,
    phase: ExportPhase,
    state: Option<ExportState>,
    pub session: SessionView,
}

impl ExportOrchestrator {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            phase: ExportPhase::Idle,
            state: None,
            session: SessionView::default(),
        }
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
    }

    /// True for the full duration of a cycle, false once restored.
    pub fn is_exporting(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.is_exporting)
    }

    /// The in-flight cycle state, `None` when idle.
    pub fn export_state(&self) -> Option<&ExportState> {
        self.state.as_ref()
    }

    /// Run one full export cycle. The snapshot is read-only throughout;
    /// every session mutation made here is reverted before returning.
    pub fn export(
        &mut self,
        snapshot: &ResumeSnapshot,
        request: &ExportRequest,
        printer: &mut dyn PrintCapability,
    ) -> ExportOutcome {
        if self.phase != ExportPhase::Idle {
            warn!("export request rejected: a cycle is already in flight");
            return ExportOutcome::Rejected;
        }

        // Preparing: freeze export mode.
        self.phase = ExportPhase::Preparing;
        let previous_title = self.session.document_title.clone();
        let previous_watermark = self.session.watermark_visible;
        self.state = Some(ExportState {
            is_exporting: true,
            is_print_rendering: true,
            preserved_layout_mode: self.session.layout_mode,
            watermark_visible: request.with_watermark,
        });

        let title = request.title.clone().unwrap_or_else(|| {
            if snapshot.basic_info.name.is_empty() {
                "Resume Booklet".to_string()
            } else {
                format!("{} - Resume Booklet", snapshot.basic_info.name)
            }
        });
        self.session.document_title = title.clone();
        self.session.watermark_visible = request.with_watermark;
        self.session.notice = Some("Preparing print layout...".to_string());
        if self.session.layout_mode == LayoutMode::Grid {
            info!("forcing grid preview to single column for print");
            self.session.layout_mode = LayoutMode::Single;
        }

        // AwaitingSettle: let the export-mode re-render finish.
        self.phase = ExportPhase::AwaitingSettle;
        (self.config.sleeper)(self.config.settle_delay);

        // Printing: best-effort, failure only logged.
        self.phase = ExportPhase::Printing;
        let doc = compose_document(
            snapshot,
            &ComposeOptions {
                show_watermark: request.with_watermark,
                title: Some(title.clone()),
            },
        );
        let print_ok = match printer.print(&doc, &title) {
            Ok(()) => true,
            Err(e) => {
                error!("print capability failed: {e}");
                false
            }
        };

        // Restoring: unconditional, on every exit path. Dropping the cycle
        // state is what clears `is_exporting`/`is_print_rendering`.
        self.phase = ExportPhase::Restoring;
        let state = self.state.take().unwrap_or_default();
        self.session.document_title = previous_title;
        self.session.layout_mode = state.preserved_layout_mode;
        self.session.watermark_visible = previous_watermark;
        self.session.notice = None;

        self.phase = ExportPhase::Idle;
        ExportOutcome::Completed { print_ok }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_sleep(_: Duration) {}

    fn test_config() -> ExportConfig {
        ExportConfig {
            settle_delay: Duration::from_millis(0),
            sleeper: no_sleep,
        }
    }

    struct RecordingPrinter {
        calls: usize,
        fail: bool,
        seen_watermark: Option<bool>,
        seen_title: Option<String>,
    }

    impl RecordingPrinter {
        fn new(fail: bool) -> Self {
            Self {
                calls: 0,
                fail,
                seen_watermark: None,
                seen_title: None,
            }
        }
    }

    impl PrintCapability for RecordingPrinter {
        fn print(&mut self, doc: &ComposedDocument, title: &str) -> Result<(), String> {
            self.calls += 1;
            self.seen_title = Some(title.to_string());
            self.seen_watermark = Some(
                doc.pages
                    .iter()
                    .all(|p| p.boxes.last().map(|b| b.opacity == 0.08).unwrap_or(false)),
            );
            if self.fail {
                Err("printer on fire".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn snapshot() -> ResumeSnapshot {
        let mut snap = ResumeSnapshot::default();
        snap.accent_color = "#0ea5e9".to_string();
        snap.basic_info.name = "Alex Chen".to_string();
        snap
    }

    #[test]
    fn round_trip_restores_grid_layout() {
        let mut orchestrator = ExportOrchestrator::new(test_config());
        orchestrator.session.layout_mode = LayoutMode::Grid;
        let before = orchestrator.session.clone();

        let mut printer = RecordingPrinter::new(false);
        let outcome = orchestrator.export(
            &snapshot(),
            &ExportRequest {
                with_watermark: false,
                title: None,
            },
            &mut printer,
        );

        assert_eq!(outcome, ExportOutcome::Completed { print_ok: true });
        assert_eq!(orchestrator.phase(), ExportPhase::Idle);
        assert!(!orchestrator.is_exporting());
        assert!(orchestrator.export_state().is_none());
        assert_eq!(orchestrator.session.layout_mode, LayoutMode::Grid);
        assert_eq!(orchestrator.session.document_title, before.document_title);
        assert_eq!(
            orchestrator.session.watermark_visible,
            before.watermark_visible
        );
        assert!(orchestrator.session.notice.is_none());
        assert_eq!(printer.calls, 1);
        assert_eq!(
            printer.seen_title.as_deref(),
            Some("Alex Chen - Resume Booklet")
        );
    }

    #[test]
    fn round_trip_restores_after_printer_failure() {
        let mut orchestrator = ExportOrchestrator::new(test_config());
        orchestrator.session.layout_mode = LayoutMode::Single;

        let mut printer = RecordingPrinter::new(true);
        let outcome = orchestrator.export(
            &snapshot(),
            &ExportRequest {
                with_watermark: true,
                title: None,
            },
            &mut printer,
        );

        // Failure is downgraded, never propagated; restoration still ran.
        assert_eq!(outcome, ExportOutcome::Completed { print_ok: false });
        assert_eq!(orchestrator.phase(), ExportPhase::Idle);
        assert!(!orchestrator.is_exporting());
        assert_eq!(orchestrator.session.layout_mode, LayoutMode::Single);
        assert!(!orchestrator.session.watermark_visible);
        assert!(orchestrator.session.notice.is_none());
    }

    #[test]
    fn watermark_flag_reaches_the_composed_document() {
        let mut orchestrator = ExportOrchestrator::new(test_config());
        let mut printer = RecordingPrinter::new(false);
        orchestrator.export(
            &snapshot(),
            &ExportRequest {
                with_watermark: true,
                title: None,
            },
            &mut printer,
        );
        assert_eq!(printer.seen_watermark, Some(true));

        let mut printer = RecordingPrinter::new(false);
        orchestrator.export(
            &snapshot(),
            &ExportRequest {
                with_watermark: false,
                title: None,
            },
            &mut printer,
        );
        assert_eq!(printer.seen_watermark, Some(false));
    }

    #[test]
    fn request_mid_cycle_is_rejected_without_session_damage() {
        // Simulates a double-click on the export control while the first
        // cycle is still in its settle window.
        let mut orchestrator = ExportOrchestrator::new(test_config());
        orchestrator.session.layout_mode = LayoutMode::Grid;
        orchestrator.phase = ExportPhase::AwaitingSettle;
        orchestrator.state = Some(ExportState {
            is_exporting: true,
            is_print_rendering: true,
            preserved_layout_mode: LayoutMode::Grid,
            watermark_visible: false,
        });
        let session_before = orchestrator.session.clone();

        let mut printer = RecordingPrinter::new(false);
        let outcome = orchestrator.export(
            &snapshot(),
            &ExportRequest {
                with_watermark: false,
                title: None,
            },
            &mut printer,
        );

        assert_eq!(outcome, ExportOutcome::Rejected);
        assert_eq!(printer.calls, 0);
        assert_eq!(orchestrator.session.layout_mode, session_before.layout_mode);
        assert_eq!(
            orchestrator.session.document_title,
            session_before.document_title
        );
        assert_eq!(orchestrator.phase(), ExportPhase::AwaitingSettle);
        // The in-flight restoration record survives the rejected request.
        assert!(orchestrator.is_exporting());
        let state = orchestrator.export_state().unwrap();
        assert_eq!(state.preserved_layout_mode, LayoutMode::Grid);
    }

    #[test]
    fn custom_title_used_verbatim() {
        let mut orchestrator = ExportOrchestrator::new(test_config());
        let mut printer = RecordingPrinter::new(false);
        orchestrator.export(
            &snapshot(),
            &ExportRequest {
                with_watermark: false,
                title: Some("Booklet 2026".to_string()),
            },
            &mut printer,
        );
        assert_eq!(printer.seen_title.as_deref(), Some("Booklet 2026"));
    }
}
