//! Configuration management for rita
//!
//! Handles loading and validation of `rita.toml` configuration files.
//!
//! # Schema Overview
//!
//! - `general`: Log level/format/file, dataset data directory
//! - `structure`: Collection names inside a dataset
//!
//! # Resolution order
//!
//! defaults → config file → `RITA_*` environment → CLI overrides.
//!
//! All sections use `#[serde(default)]`, so missing fields fall back to
//! defaults and unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::logging::LogLevel;
use crate::storage::is_valid_identifier;

/// Config file name searched in the current and user config directories
pub const CONFIG_FILE_NAME: &str = "rita.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings (logging, data directory)
    pub general: GeneralConfig,

    /// Dataset structure (collection names)
    pub structure: StructureConfig,
}

// =============================================================================
// General Config
// =============================================================================

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable pretty format (default for interactive use)
    #[default]
    Pretty,
    /// Machine-parseable JSON lines
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::ParseError(format!(
                "invalid log format: {other} (expected 'pretty' or 'json')"
            ))),
        }
    }
}

/// General configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,

    /// Log format: pretty or json
    pub log_format: LogFormat,

    /// Optional log file path (supports ~ expansion), written in addition to stderr
    pub log_file: Option<String>,

    /// Directory holding dataset databases (supports ~ expansion)
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: LogFormat::default(),
            log_file: None,
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    #[cfg(target_os = "macos")]
    {
        "~/Library/Application Support/rita".to_string()
    }
    #[cfg(not(target_os = "macos"))]
    {
        "~/.local/share/rita".to_string()
    }
}

/// Dataset structure settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureConfig {
    /// Collection holding connection records
    pub conn_table: String,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            conn_table: "conn".to_string(),
        }
    }
}

// =============================================================================
// Config Loading
// =============================================================================

/// CLI overrides applied after env overrides
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub log_file: Option<String>,
    pub data_dir: Option<String>,
    pub conn_table: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(ref log_level) = self.log_level {
            config.general.log_level.clone_from(log_level);
        }
        if let Some(log_format) = self.log_format {
            config.general.log_format = log_format;
        }
        if let Some(ref log_file) = self.log_file {
            config.general.log_file = Some(log_file.clone());
        }
        if let Some(ref data_dir) = self.data_dir {
            config.general.data_dir.clone_from(data_dir);
        }
        if let Some(ref conn_table) = self.conn_table {
            config.structure.conn_table.clone_from(conn_table);
        }
    }
}

/// `RITA_*` environment overrides
#[derive(Debug, Default)]
struct EnvOverrides(ConfigOverrides);

impl EnvOverrides {
    fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut overrides = ConfigOverrides::default();

        if let Some(value) = lookup("RITA_LOG_LEVEL") {
            overrides.log_level = Some(value);
        }
        if let Some(value) = lookup("RITA_LOG_FORMAT") {
            overrides.log_format = Some(value.parse::<LogFormat>()?);
        }
        if let Some(value) = lookup("RITA_LOG_FILE") {
            overrides.log_file = Some(value);
        }
        if let Some(value) = lookup("RITA_DATA_DIR") {
            overrides.data_dir = Some(value);
        }
        if let Some(value) = lookup("RITA_CONN_TABLE") {
            overrides.conn_table = Some(value);
        }

        Ok(Self(overrides))
    }

    fn apply(&self, config: &mut Config) {
        self.0.apply(config);
    }
}

/// Resolve the config path that would be loaded (if any).
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let cwd_config = Path::new(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config.to_path_buf());
    }

    dirs_config_path()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .filter(|path| path.exists())
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./rita.toml
    /// 2. $XDG_CONFIG_HOME/rita/rita.toml or ~/.config/rita/rita.toml
    /// 3. Default values
    pub fn load() -> crate::Result<Self> {
        match resolve_config_path(None) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.display().to_string(), e.to_string()))?;

        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseFailed(e.to_string()).into())
    }

    /// Load configuration with overrides and validation
    ///
    /// With `strict`, a missing explicit config file is an error.
    pub fn load_with_overrides(
        config_path: Option<&Path>,
        strict: bool,
        overrides: &ConfigOverrides,
    ) -> crate::Result<Self> {
        let env = EnvOverrides::from_env()?;
        Self::load_layered(config_path, strict, &env, overrides)
    }

    fn load_layered(
        config_path: Option<&Path>,
        strict: bool,
        env: &EnvOverrides,
        overrides: &ConfigOverrides,
    ) -> crate::Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                if path.exists() {
                    Self::load_from(path)?
                } else if strict {
                    return Err(ConfigError::FileNotFound(path.display().to_string()).into());
                } else {
                    Self::default()
                }
            }
            None => Self::load()?,
        };

        env.apply(&mut config);
        overrides.apply(&mut config);
        config.normalize_paths();
        config.validate()?;

        Ok(config)
    }

    /// Normalize path fields by expanding tildes
    pub fn normalize_paths(&mut self) {
        let data_dir = expand_tilde(&self.general.data_dir);
        self.general.data_dir = path_to_string(&data_dir);

        if let Some(log_file) = self.general.log_file.take() {
            let log_path = expand_tilde(&log_file);
            self.general.log_file = Some(path_to_string(&log_path));
        }
    }

    /// Validate semantic constraints
    pub fn validate(&self) -> crate::Result<()> {
        self.general
            .log_level
            .parse::<LogLevel>()
            .map_err(ConfigError::ValidationError)?;

        if self.general.data_dir.trim().is_empty() {
            return Err(
                ConfigError::ValidationError("general.data_dir must not be empty".to_string())
                    .into(),
            );
        }

        if !is_valid_identifier(&self.structure.conn_table) {
            return Err(ConfigError::ValidationError(format!(
                "structure.conn_table '{}' must be a plain identifier",
                self.structure.conn_table
            ))
            .into());
        }

        Ok(())
    }

    /// Database file for a dataset.
    ///
    /// A dataset written as a path (with a separator or an extension) that
    /// names an existing file is used as-is. Anything else is
    /// `<data_dir>/<dataset>.sqlite`.
    #[must_use]
    pub fn dataset_path(&self, dataset: &str) -> PathBuf {
        if looks_like_path(dataset) {
            let direct = expand_tilde(dataset);
            if direct.is_file() {
                return direct;
            }
        }
        expand_tilde(&self.general.data_dir).join(format!("{dataset}.sqlite"))
    }
}

/// Bare dataset names never resolve against the current directory
fn looks_like_path(dataset: &str) -> bool {
    let path = Path::new(dataset);
    path.components().count() > 1 || path.extension().is_some()
}

fn dirs_config_path() -> Option<PathBuf> {
    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .map(|p| p.join("rita"))
}

/// Expand ~ to home directory
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(suffix) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(suffix);
        }
    }
    PathBuf::from(path)
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
