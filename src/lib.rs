//! # booklet-forge – resume-booklet composition & print-export engine
//!
//! Turns a structured profile snapshot into a paginated, print-ready
//! booklet with selectable visual themes, and exports it as a PDF. The
//! pipeline stages are:
//!
//! 1. **Load / migrate** – raw JSON → [`snapshot::ResumeSnapshot`] ([`migrate`], [`store`])
//! 2. **Theme** – accent color + layout template → visual tokens ([`theme`])
//! 3. **Plan** – snapshot → ordered page descriptors ([`plan`])
//! 4. **Compose** – descriptors + tokens + avatar frames → box tree
//!    ([`compose`], [`frame`], [`visual`], [`fonts`])
//! 5. **Export** – print-export state machine with a pluggable backend
//!    ([`export`], [`print_pdf`])

pub mod compose;
pub mod export;
pub mod fonts;
pub mod frame;
pub mod migrate;
pub mod pipeline;
pub mod plan;
pub mod print_pdf;
pub mod snapshot;
pub mod store;
pub mod theme;
pub mod visual;

// Re-exports for convenience
pub use compose::{compose_document, ComposeOptions};
pub use pipeline::{compose_booklet, export_booklet, BookletConfig};
pub use plan::plan_pages;
pub use snapshot::ResumeSnapshot;
pub use theme::resolve_theme;
