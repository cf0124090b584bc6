//! Error types for rita-core

use std::fmt::Write;
use thiserror::Error;

/// Remediation command for resolving an error
#[derive(Debug, Clone)]
pub struct RemediationCommand {
    /// Short label describing the command purpose
    pub label: String,
    /// Command to run
    pub command: String,
}

/// Actionable remediation guidance for an error
#[derive(Debug, Clone)]
pub struct Remediation {
    /// One-line summary of how to fix the issue
    pub summary: String,
    /// Suggested commands to resolve or diagnose the issue
    pub commands: Vec<RemediationCommand>,
    /// Additional alternative guidance
    pub alternatives: Vec<String>,
}

impl Remediation {
    /// Create a new remediation with a summary
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            commands: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Add a suggested command
    #[must_use]
    pub fn command(mut self, label: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.push(RemediationCommand {
            label: label.into(),
            command: command.into(),
        });
        self
    }

    /// Add an alternative suggestion
    #[must_use]
    pub fn alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    /// Render remediation text for human-readable output
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "To fix:");
        let _ = writeln!(output, "  {}", self.summary);

        if !self.commands.is_empty() {
            let _ = writeln!(output, "  Commands:");
            for cmd in &self.commands {
                let _ = writeln!(output, "    - {}: {}", cmd.label, cmd.command);
            }
        }

        if !self.alternatives.is_empty() {
            let _ = writeln!(output, "  Alternatives:");
            for alt in &self.alternatives {
                let _ = writeln!(output, "    - {alt}");
            }
        }

        output
    }
}

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rita-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The query succeeded but the collection held no records
    #[error("No results were found for {dataset}")]
    EmptyResult { dataset: String },

    /// Structural rendering errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// I/O errors while writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Return remediation guidance when available.
    #[must_use]
    pub fn remediation(&self) -> Option<Remediation> {
        match self {
            Self::Config(err) => Some(err.remediation()),
            Self::Storage(err) => Some(err.remediation()),
            Self::EmptyResult { dataset } => Some(
                Remediation::new(format!(
                    "Dataset '{dataset}' has no connection records to report."
                ))
                .command(
                    "Count records",
                    format!(
                        "sqlite3 ~/.local/share/rita/{dataset}.sqlite 'SELECT COUNT(*) FROM conn'"
                    ),
                )
                .alternative(
                    "Datasets live in general.data_dir (RITA_DATA_DIR); check the path and the structure.conn_table setting.",
                ),
            ),
            Self::Render(err) => Some(err.remediation()),
            Self::Io(_) => Some(
                Remediation::new("Writing the report failed. Check the output destination.")
                    .command("Retry to a file", "rita show-long-connections -d <dataset> > report.csv")
                    .alternative("If piping into another program, make sure it reads all input."),
            ),
        }
    }
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Invalid sort key: {0}")]
    InvalidSortKey(String),
}

impl StorageError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::Database(_) => Remediation::new(
                "Database query failed. Check that the dataset was produced by a compatible import.",
            )
            .command("Inspect schema", "sqlite3 <dataset>.sqlite .schema")
            .alternative("Re-run the import that produced this dataset."),
            Self::DatasetNotFound(path) => {
                Remediation::new(format!("No dataset database exists at {path}."))
                    .command("List datasets", "ls ~/.local/share/rita")
                    .alternative("Set general.data_dir in rita.toml or RITA_DATA_DIR.")
            }
            Self::InvalidCollection(_) => Remediation::new(
                "Collection names must be plain identifiers (letters, digits, underscore).",
            )
            .command("Show config", "cat rita.toml")
            .alternative("Fix structure.conn_table in rita.toml or RITA_CONN_TABLE."),
            Self::InvalidSortKey(_) => Remediation::new(
                "Sort keys name a connection field, optionally prefixed with '-' for descending.",
            )
            .command("Example", "-duration"),
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Specify a database with -d")]
    MissingDataset,

    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file {0}: {1}")]
    ReadFailed(String, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Failed to parse config: {0}")]
    ParseFailed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ConfigError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::MissingDataset => Remediation::new("Name the dataset to report on.")
                .command("Report", "rita show-long-connections -d <dataset>"),
            Self::FileNotFound(path) => Remediation::new(format!(
                "Config file not found: {path}. Verify the path and retry."
            ))
            .command("Check path", format!("ls -l \"{path}\""))
            .alternative("Pass --config with the correct path."),
            Self::ReadFailed(path, _) => Remediation::new(format!(
                "Failed to read config file: {path}. Check permissions."
            ))
            .command("Check permissions", format!("ls -l \"{path}\""))
            .alternative("Ensure the file is readable by the current user."),
            Self::ParseError(_) | Self::ParseFailed(_) => {
                Remediation::new("Config parse failed. Fix the syntax and retry.")
                    .command("Show config", "cat rita.toml")
                    .alternative("Validate the config file format.")
            }
            Self::ValidationError(_) => {
                Remediation::new("Config validation failed. Fix the invalid fields and retry.")
                    .command("Show config", "cat rita.toml")
                    .alternative("Review validation errors and adjust rita.toml.")
            }
        }
    }
}

/// Rendering errors
///
/// `FieldContainsDelimiter` is reported per record and never aborts a run;
/// every other variant is structural.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("unknown template field '{0}'")]
    UnknownPlaceholder(String),

    #[error("unterminated placeholder starting at byte {offset}")]
    UnterminatedPlaceholder { offset: usize },

    #[error("unexpected '}}' at byte {offset}")]
    UnexpectedBrace { offset: usize },

    #[error("row has {actual} cells, expected {expected}")]
    RowWidth { expected: usize, actual: usize },

    #[error("field {field} value {value:?} contains a delimiter; withheld to keep one record per line")]
    FieldContainsDelimiter { field: &'static str, value: String },
}

impl RenderError {
    #[must_use]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::UnknownPlaceholder(_)
            | Self::UnterminatedPlaceholder { .. }
            | Self::UnexpectedBrace { .. } => Remediation::new(
                "The output line template is malformed. Use {src},{spt},{dst},{dpt},{dur},{proto}.",
            )
            .command("Default output", "rita show-long-connections -d <dataset>"),
            Self::RowWidth { .. } => Remediation::new("Table construction failed.")
                .command("Delimited output", "rita show-long-connections -d <dataset>")
                .alternative("Retry without --human-readable."),
            Self::FieldContainsDelimiter { .. } => Remediation::new(
                "A record holds a value that cannot be encoded on one delimited line.",
            )
            .command("Table output", "rita show-long-connections -H -d <dataset>"),
        }
    }
}

/// Format an error with remediation guidance for display.
#[must_use]
pub fn format_error_with_remediation(error: &Error) -> String {
    let mut output = format!("Error: {error}");
    if let Some(remediation) = error.remediation() {
        output.push('\n');
        output.push('\n');
        output.push_str(&remediation.render_plain());
    }
    output
}
