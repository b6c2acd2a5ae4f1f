pub mod composer;
pub mod editing;
pub mod export;
pub mod import;
pub mod models;
pub mod net;
pub mod notify;
pub mod render;
pub mod store;
pub mod stylesheet;

// Re-export key types for easier usage
pub use composer::{Composer, ComposerError, ComposerKind, DragState};
pub use editing::{BlockList, BlockUpdate, EditError, PasteOutcome, ValidationHint};
pub use export::{ExportTarget, HtmlExportOptions, MdxExportOptions, export_html, export_mdx};
pub use models::*;
pub use notify::{Notification, NotificationLevel, Notifier};
pub use render::{
    EmailContainerConfig, EmailPlatform, RenderCache, RenderMode, RenderOutput, RenderRequest,
    RenderStatus, render,
};
pub use store::{CompositionStore, CompositionSummary, StoreError};
pub use stylesheet::{StylesheetData, StylesheetState};
