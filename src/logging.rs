// ABOUTME: Append-only log file sink for the whole process
// ABOUTME: Routes tracing events to a timestamped file since the terminal hosts the grid

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// File name used when `--log-file` is not given
pub const DEFAULT_LOG_FILE: &str = "sql_dumper.log";

/// Default log location: next to the running executable
///
/// Falls back to the current directory when the executable path cannot be
/// resolved.
pub fn default_log_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_LOG_FILE)
}

/// Open the log file for appending, creating it if needed
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Install the global tracing subscriber writing to `path`
///
/// Every event is formatted in full and then written while holding the file
/// lock, so lines from concurrent workers never interleave. Verbosity defaults
/// to INFO and follows `RUST_LOG` when set.
pub fn init(path: &Path) -> Result<()> {
    let file = open_log_file(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
