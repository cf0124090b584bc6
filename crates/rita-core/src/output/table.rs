//! Table formatting utilities
//!
//! Boxed tables for human-readable output:
//!
//! ```text
//! +-----------+-------------+
//! | Source IP | Source Port |
//! +-----------+-------------+
//! | 10.0.0.1  |        1234 |
//! +-----------+-------------+
//! ```

use super::format::Style;
use crate::error::RenderError;

/// Column alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Left-aligned (default)
    #[default]
    Left,
    /// Right-aligned
    Right,
    /// Center-aligned
    Center,
}

/// Table column definition
#[derive(Debug, Clone)]
pub struct Column {
    /// Column header
    pub header: String,
    /// Cell alignment (headers are always centred)
    pub alignment: Alignment,
}

impl Column {
    /// Create a new left-aligned column
    #[must_use]
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            alignment: Alignment::Left,
        }
    }

    /// Set column alignment
    #[must_use]
    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// Table formatter
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a new table with the given columns
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a row to the table
    ///
    /// # Errors
    /// Returns `RowWidth` if the cell count differs from the column count.
    pub fn add_row(&mut self, cells: Vec<impl Into<String>>) -> Result<(), RenderError> {
        let row: Vec<String> = cells.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(RenderError::RowWidth {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Calculate column widths based on content
    fn calculate_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .columns
            .iter()
            .map(|col| col.header.chars().count())
            .collect();

        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        widths
    }

    /// Format a cell with the given width and alignment
    fn format_cell(cell: &str, width: usize, alignment: Alignment) -> String {
        let visible_len = cell.chars().count();
        if visible_len >= width {
            return cell.to_string();
        }

        let padding = width - visible_len;
        match alignment {
            Alignment::Left => format!("{cell}{}", " ".repeat(padding)),
            Alignment::Right => format!("{}{cell}", " ".repeat(padding)),
            Alignment::Center => {
                let left = padding / 2;
                let right = padding - left;
                format!("{}{cell}{}", " ".repeat(left), " ".repeat(right))
            }
        }
    }

    fn border(widths: &[usize]) -> String {
        let segments: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("+{}+", segments.join("+"))
    }

    fn line(cells: &[String]) -> String {
        let padded: Vec<String> = cells.iter().map(|c| format!(" {c} ")).collect();
        format!("|{}|", padded.join("|"))
    }

    /// Render the table as a string
    #[must_use]
    pub fn render(&self, style: &Style) -> String {
        let widths = self.calculate_widths();
        let border = style.dim(&Self::border(&widths));
        let mut output = String::new();

        output.push_str(&border);
        output.push('\n');

        let header: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| style.bold(&Self::format_cell(&col.header, widths[i], Alignment::Center)))
            .collect();
        output.push_str(&Self::line(&header));
        output.push('\n');
        output.push_str(&border);
        output.push('\n');

        for row in &self.rows {
            let formatted: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| Self::format_cell(cell, widths[i], self.columns[i].alignment))
                .collect();
            output.push_str(&Self::line(&formatted));
            output.push('\n');
        }

        if !self.rows.is_empty() {
            output.push_str(&border);
            output.push('\n');
        }

        output
    }

    /// Check if the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
