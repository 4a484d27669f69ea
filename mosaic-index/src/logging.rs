//! Logging infrastructure.
//!
//! Structured `tracing` output to stderr, so command output on stdout stays
//! clean, plus an optional plain-text log file written through a
//! non-blocking appender. Verbosity follows `RUST_LOG` and defaults to
//! `info`.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
#[derive(Debug)]
pub struct LoggingGuard {
    file_guard: Option<WorkerGuard>,
}

impl LoggingGuard {
    /// Whether a log file is being written.
    pub fn has_file(&self) -> bool {
        self.file_guard.is_some()
    }
}

/// Initialize logging.
///
/// With `log_file`, its parent directory is created and the previous log is
/// cleared before the file layer is installed. If a global subscriber is
/// already installed (as in tests), the existing one is kept.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log file
/// cannot be cleared.
pub fn init_logging(log_file: Option<&Path>) -> Result<LoggingGuard, io::Error> {
    let (file_layer, file_guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("log path {} has no file name", path.display()),
                )
            })?;
            fs::create_dir_all(dir)?;
            fs::write(path, "")?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Global subscriber already installed, keeping it");
    }

    Ok(LoggingGuard { file_guard })
}
