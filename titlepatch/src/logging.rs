//! Logging setup.
//!
//! Two layers are installed: a compact stderr layer filtered by `RUST_LOG`
//! (default `warn`, or `debug` when verbose) and a plain-text file layer that
//! always records `info` and above into `titlepatch.log`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::error::{UpdateError, UpdateResult};

/// Name of the log file inside the log directory.
pub const LOG_FILE_NAME: &str = "titlepatch.log";

/// Keeps the background log writer alive. Drop it at exit to flush.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: WorkerGuard,
    log_path: PathBuf,
}

impl LoggingGuard {
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

fn stderr_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber, writing the log file into `log_dir`.
///
/// # Errors
///
/// `UpdateError::Filesystem` if `log_dir` cannot be created and
/// `UpdateError::Config` if a global subscriber is already installed.
pub fn init_logging(log_dir: &Path, verbose: bool) -> UpdateResult<LoggingGuard> {
    fs::create_dir_all(log_dir)
        .map_err(|e| UpdateError::filesystem(log_dir, "create log directory", e))?;

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(stderr_filter(verbose));

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| UpdateError::Config(format!("logging already initialised: {}", e)))?;

    Ok(LoggingGuard {
        _file: guard,
        log_path: log_dir.join(LOG_FILE_NAME),
    })
}
