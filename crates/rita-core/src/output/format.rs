//! Output mode selection and terminal styling

use std::io::IsTerminal;

/// Which renderers a report runs
///
/// Delimited output is always written. `Human` adds the table in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Delimited lines only
    #[default]
    Delimited,
    /// Table block followed by delimited lines
    Human,
}

impl OutputMode {
    /// Map the `--human-readable` flag to a mode
    #[must_use]
    pub fn from_human_flag(human: bool) -> Self {
        if human { Self::Human } else { Self::Delimited }
    }

    /// Whether the table renderer runs in this mode
    #[must_use]
    pub fn renders_table(self) -> bool {
        matches!(self, Self::Human)
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delimited => write!(f, "delimited"),
            Self::Human => write!(f, "human"),
        }
    }
}

/// Rendering context shared by the renderers
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    /// Emit ANSI styling in the table
    pub color: bool,
}

impl RenderContext {
    /// Context for stdout: colour only on a terminal and when `NO_COLOR` is unset
    #[must_use]
    pub fn detect() -> Self {
        Self {
            color: detect_color(),
        }
    }

    /// Set colour output
    #[must_use]
    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Check (in order) `NO_COLOR` (<https://no-color.org/>), then TTY detection
#[must_use]
pub fn detect_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

/// ANSI escape codes
pub mod colors {
    /// Reset all formatting
    pub const RESET: &str = "\x1b[0m";
    /// Bold text
    pub const BOLD: &str = "\x1b[1m";
    /// Dim text
    pub const DIM: &str = "\x1b[2m";
}

/// Style helper for conditional ANSI formatting
pub struct Style {
    enabled: bool,
}

impl Style {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Create style helper from a render context
    #[must_use]
    pub fn from_context(ctx: &RenderContext) -> Self {
        Self::new(ctx.color)
    }

    /// Wrap text in the given ANSI code
    #[must_use]
    pub fn apply(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{code}{text}{}", colors::RESET)
        } else {
            text.to_string()
        }
    }

    /// Make text bold
    #[must_use]
    pub fn bold(&self, text: &str) -> String {
        self.apply(colors::BOLD, text)
    }

    /// Make text dim
    #[must_use]
    pub fn dim(&self, text: &str) -> String {
        self.apply(colors::DIM, text)
    }
}
