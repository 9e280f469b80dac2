//! Tracing setup for Ninebets
//!
//! The console shows what the operator asked for; the run log in the logs
//! directory keeps every event of the last run.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Run log file name, truncated on every start.
pub const RUN_LOG_FILE: &str = "ninebets-last-run.log";

#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    #[error("Cannot open run log {path}: {source}")]
    RunLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Installs the console and run log layers, returning the run log path.
///
/// `RUST_LOG` takes precedence over `console_level` for the console.
///
/// # Errors
///
/// - `TracingSetupError::RunLog` - Logs directory or file could not be created
/// - `TracingSetupError::AlreadyInstalled` - Called twice in one process
pub fn init_tracing(console_level: Level, logs_dir: &Path) -> Result<PathBuf, TracingSetupError> {
    let path = logs_dir.join(RUN_LOG_FILE);
    let run_log = create_dir_all(logs_dir)
        .and_then(|()| File::create(&path))
        .map_err(|source| TracingSetupError::RunLog {
            path: path.clone(),
            source,
        })?;

    let console = fmt::layer()
        .with_target(true)
        .with_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(console_level.as_str())),
        );
    let file = fmt::layer()
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(run_log)
        .with_filter(EnvFilter::new("trace"));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|_| TracingSetupError::AlreadyInstalled)?;

    tracing::debug!(console = %console_level, run_log = %path.display(), "Tracing initialized");
    Ok(path)
}

/// `--log-level` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for Level {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}
