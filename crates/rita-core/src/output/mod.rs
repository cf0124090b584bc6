//! Output layer for reports
//!
//! # Architecture
//!
//! ```text
//! Result Set → DelimitedRenderer → one line per record (always)
//!            → TableRenderer     → one boxed block   (OutputMode::Human)
//! ```
//!
//! The delimited form streams record by record and survives bad records.
//! The table is built completely before anything is written.

mod format;
mod renderers;
mod table;
mod template;

pub use format::{OutputMode, RenderContext, Style, detect_color};
pub use renderers::{DelimitedRenderer, DelimitedReport, TableRenderer};
pub use table::{Alignment, Column, Table};
pub use template::{CONN_LINE_TEMPLATE, LineTemplate};
