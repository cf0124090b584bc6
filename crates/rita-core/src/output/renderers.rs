//! Renderers for connection reports
//!
//! Renderers only handle display; records arrive already ordered.

use std::io::Write;

use super::format::{RenderContext, Style};
use super::table::{Alignment, Column, Table};
use super::template::{CONN_LINE_TEMPLATE, LineTemplate};
use crate::conn::{ConnField, ConnRecord};
use crate::error::{RenderError, Result};

// =============================================================================
// Delimited Renderer
// =============================================================================

/// Outcome of a delimited render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelimitedReport {
    /// Records written as lines
    pub lines_written: usize,
    /// Records replaced by a diagnostic line
    pub failures: usize,
}

/// Streams one line per record through a compiled template
#[derive(Debug, Clone)]
pub struct DelimitedRenderer {
    template: LineTemplate,
}

impl DelimitedRenderer {
    /// Compile the renderer for a template
    pub fn compile(template: &str) -> std::result::Result<Self, RenderError> {
        Ok(Self {
            template: LineTemplate::parse(template)?,
        })
    }

    /// Renderer for the standard comma-separated connection line
    pub fn conn_default() -> std::result::Result<Self, RenderError> {
        Self::compile(CONN_LINE_TEMPLATE)
    }

    /// Write one line per record.
    ///
    /// A record whose values cannot be encoded is replaced by an
    /// `ERROR: Template failure: ...` line and rendering continues.
    ///
    /// # Errors
    /// Returns `Error::Io` at the first failed write or flush; nothing more
    /// is written once the output is gone.
    pub fn render(&self, records: &[ConnRecord], out: &mut dyn Write) -> Result<DelimitedReport> {
        let mut report = DelimitedReport::default();

        for (index, record) in records.iter().enumerate() {
            match self.template.render(record) {
                Ok(line) => {
                    out.write_all(line.as_bytes())?;
                    report.lines_written += 1;
                }
                Err(reason) => {
                    report.failures += 1;
                    tracing::warn!(record = index, %reason, "Skipping record in delimited output");
                    writeln!(out, "ERROR: Template failure: {reason}")?;
                }
            }
            out.flush()?;
        }

        Ok(report)
    }
}

// =============================================================================
// Table Renderer
// =============================================================================

/// Renders the full record set as one boxed table
#[derive(Debug, Clone, Default)]
pub struct TableRenderer {
    ctx: RenderContext,
}

impl TableRenderer {
    #[must_use]
    pub fn new(ctx: RenderContext) -> Self {
        Self { ctx }
    }

    /// Build the table text. Durations use two decimals.
    pub fn build(&self, records: &[ConnRecord]) -> std::result::Result<String, RenderError> {
        let columns = ConnField::ALL
            .iter()
            .map(|field| {
                let alignment = if field.is_numeric() {
                    Alignment::Right
                } else {
                    Alignment::Left
                };
                Column::new(field.label()).align(alignment)
            })
            .collect();
        let mut table = Table::new(columns);

        for record in records {
            table.add_row(vec![
                record.src.clone(),
                record.spt.to_string(),
                record.dst.clone(),
                record.dpt.to_string(),
                format!("{:.2}", record.dur),
                record.proto.clone(),
            ])?;
        }

        Ok(table.render(&Style::from_context(&self.ctx)))
    }

    /// Build the whole table, then write it in one call
    pub fn render(&self, records: &[ConnRecord], out: &mut dyn Write) -> Result<()> {
        let text = self.build(records)?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
