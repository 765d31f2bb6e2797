//! Logging setup for the command-line tools.
//!
//! Installs a global tracing subscriber that writes to stderr and, when a log
//! directory is configured, to a per-launch log file. Files are timestamped and
//! kept to a bounded count.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::config::LoggingSettings;

/// Maximum number of log files to retain.
const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "chirp_";
const FALLBACK_LEVEL: &str = "info";

const FILE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const LINE_STAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

static INITIALIZED: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to create or access the log directory.
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to enumerate existing log files for pruning.
    #[error("Failed to read log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to remove an obsolete log file.
    #[error("Failed to remove old log file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to format a timestamp for the log filename.
    #[error("Failed to format log filename time: {0}")]
    FormatTime(time::error::Format),
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
    /// Failed to create the initial log file for this launch.
    #[error("Failed to create log file at {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Initialize tracing to write to stderr and, optionally, a per-launch log file.
///
/// Subsequent calls are no-ops. Failures are returned so callers can continue
/// without logging.
pub fn init(settings: &LoggingSettings) -> Result<(), LoggingError> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let timer = local_timer();
    let env_filter = level_filter(&settings.level);
    let console_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_writer(std::io::stderr);

    let (file_layer, guard, log_path) = match settings.dir.as_deref() {
        Some(log_dir) => {
            fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
                path: log_dir.to_path_buf(),
                source,
            })?;
            let log_file_name = log_file_name(launch_time())?;
            let log_path = log_dir.join(&log_file_name);
            ensure_file_exists(&log_path)?;
            prune_old_logs(log_dir, MAX_LOG_FILES)?;

            let file_appender = rolling::never(log_dir, log_file_name);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_timer(timer)
                .with_writer(file_writer);
            (Some(layer), Some(guard), Some(log_path))
        }
        None => (None, None, None),
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
    let _ = INITIALIZED.set(guard);

    match log_path {
        Some(path) => tracing::info!("Logging initialized; log file at {}", path.display()),
        None => tracing::debug!("Logging initialized"),
    }
    Ok(())
}

fn ensure_file_exists(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Log files left by earlier launches, oldest first.
///
/// Only names carrying the launch prefix are considered. Their timestamps sort
/// chronologically, so no file metadata is needed.
fn launch_logs(dir: &Path) -> Result<Vec<PathBuf>, LoggingError> {
    let entries = fs::read_dir(dir).map_err(|source| LoggingError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut logs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_launch_log(path))
        .collect();
    logs.sort();
    Ok(logs)
}

fn is_launch_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log"))
}

fn prune_old_logs(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let logs = launch_logs(dir)?;
    let excess = logs.len().saturating_sub(keep);
    for path in logs.into_iter().take(excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(())
}

fn log_file_name(started: OffsetDateTime) -> Result<String, LoggingError> {
    let stamp = started
        .format(FILE_STAMP)
        .map_err(LoggingError::FormatTime)?;
    Ok(format!("{LOG_FILE_PREFIX}{stamp}.log"))
}

fn local_timer() -> fmt::time::OffsetTime<&'static [BorrowedFormatItem<'static>]> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, LINE_STAMP)
}

fn launch_time() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// `RUST_LOG` wins; otherwise the configured level, or `info` if that does not parse.
fn level_filter(level: &str) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL)),
    }
}
