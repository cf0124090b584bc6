//! rita CLI
//!
//! Reports over recorded network connections.

#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rita_core::config::{Config, ConfigOverrides};
use rita_core::logging::{LogConfig, LogError, init_logging};
use rita_core::output::{OutputMode, RenderContext};
use rita_core::report::{LongConnections, require_dataset};
use rita_core::storage::SqliteRecordSource;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("RITA_GIT_HASH"),
    " ",
    env!("RITA_TARGET"),
    ")"
);

/// rita - Network traffic analysis reports
#[derive(Parser)]
#[command(name = "rita")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RITA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print long connections and relevant information
    ShowLongConnections {
        /// Print a formatted table before the comma-delimited lines
        #[arg(short = 'H', long)]
        human_readable: bool,

        /// Dataset to report on
        #[arg(short, long)]
        database: Option<String>,
    },
}

fn init_logging_from_config(config: &Config) -> anyhow::Result<()> {
    let log_config = LogConfig {
        level: config.general.log_level.clone(),
        format: config.general.log_format,
        file: config.general.log_file.as_ref().map(PathBuf::from),
    };

    match init_logging(&log_config) {
        Ok(()) | Err(LogError::AlreadyInitialized) => {}
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let overrides = ConfigOverrides {
        log_level: cli.verbose.then(|| "debug".to_string()),
        ..ConfigOverrides::default()
    };
    let config = Config::load_with_overrides(cli.config.as_deref(), true, &overrides)?;
    Ok(config)
}

fn show_long_connections(config: &Config, dataset: String, human_readable: bool) -> anyhow::Result<()> {
    let path = config.dataset_path(&dataset);
    tracing::debug!(dataset = %dataset, path = %path.display(), "Opening dataset");

    let source = SqliteRecordSource::open(&path)?;
    let report = LongConnections::new(
        dataset,
        config.structure.conn_table.clone(),
        OutputMode::from_human_flag(human_readable),
    )
    .with_context(RenderContext::detect());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report.run(&source, &mut out)?;
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::ShowLongConnections {
            human_readable,
            database,
        } => {
            // Checked before config or storage are touched.
            let dataset = require_dataset(database.as_deref())?;
            let config = load_config(&cli)?;
            init_logging_from_config(&config)?;
            show_long_connections(&config, dataset, *human_readable)
        }
    }
}

fn handle_fatal_error(err: &anyhow::Error) {
    if let Some(core_err) = err.downcast_ref::<rita_core::Error>() {
        eprintln!(
            "{}",
            rita_core::error::format_error_with_remediation(core_err)
        );
    } else {
        eprintln!("Error: {err}");
    }
}

fn main() {
    if let Err(err) = run() {
        handle_fatal_error(&err);
        std::process::exit(-1);
    }
}
