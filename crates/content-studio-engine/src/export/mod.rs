//! Export of blocks to standalone HTML documents and MDX.
//!
//! Exports are deterministic and never touch their input.

pub mod html;
pub mod mdx;

pub use html::{ExportTarget, HtmlExportOptions, export_html};
pub use mdx::{MdxExportOptions, export_mdx};
