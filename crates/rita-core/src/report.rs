//! The long-connections report
//!
//! Fetches every connection of a dataset longest first, refuses empty
//! results, and writes the table (human mode) followed by the delimited
//! lines (always).

use std::io::Write;

use crate::error::{ConfigError, Error, Result};
use crate::output::{
    CONN_LINE_TEMPLATE, DelimitedRenderer, OutputMode, RenderContext, TableRenderer,
};
use crate::storage::{RecordSource, SortKey};

/// Sort applied to every fetch: longest duration first
pub const DURATION_DESC: &str = "-duration";

/// Counters from one report run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Records fetched
    pub records: usize,
    /// Delimited lines written
    pub lines_written: usize,
    /// Records replaced by a diagnostic line
    pub line_failures: usize,
    /// Whether the table block was written
    pub table_rendered: bool,
}

/// Validate the dataset argument; absent or blank is a config error
pub fn require_dataset(dataset: Option<&str>) -> Result<String> {
    match dataset.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ConfigError::MissingDataset.into()),
    }
}

/// Report over one dataset's connection collection
#[derive(Debug, Clone)]
pub struct LongConnections {
    dataset: String,
    collection: String,
    mode: OutputMode,
    template: String,
    ctx: RenderContext,
}

impl LongConnections {
    #[must_use]
    pub fn new(dataset: impl Into<String>, collection: impl Into<String>, mode: OutputMode) -> Self {
        Self {
            dataset: dataset.into(),
            collection: collection.into(),
            mode,
            template: CONN_LINE_TEMPLATE.to_string(),
            ctx: RenderContext::default(),
        }
    }

    /// Override the delimited line template
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Set the table render context
    #[must_use]
    pub fn with_context(mut self, ctx: RenderContext) -> Self {
        self.ctx = ctx;
        self
    }

    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Run the report against `source`, writing to `out`.
    ///
    /// Nothing is written when the fetch fails, the result is empty, or the
    /// line template does not compile.
    pub fn run(&self, source: &dyn RecordSource, out: &mut dyn Write) -> Result<RunSummary> {
        let span = tracing::info_span!(
            "show_long_connections",
            dataset = %self.dataset,
            collection = %self.collection,
            mode = %self.mode,
        );
        let _guard = span.enter();

        let sort: SortKey = DURATION_DESC.parse()?;
        let records = source.fetch_all(&self.collection, sort)?;
        tracing::debug!(records = records.len(), sort = %sort, "Fetched connections");

        if records.is_empty() {
            return Err(Error::EmptyResult {
                dataset: self.dataset.clone(),
            });
        }

        let delimited = DelimitedRenderer::compile(&self.template)?;

        let table_rendered = if self.mode.renders_table() {
            TableRenderer::new(self.ctx.clone()).render(&records, out)?;
            true
        } else {
            false
        };

        let report = delimited.render(&records, out)?;
        if report.failures > 0 {
            tracing::warn!(failures = report.failures, "Some records could not be rendered");
        }

        tracing::info!(
            records = records.len(),
            lines = report.lines_written,
            table = table_rendered,
            "Report complete"
        );

        Ok(RunSummary {
            records: records.len(),
            lines_written: report.lines_written,
            line_failures: report.failures,
            table_rendered,
        })
    }
}
