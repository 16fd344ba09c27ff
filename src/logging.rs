//! Logging Module
//!
//! Daily-rotated log file plus a pretty console in debug builds.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "vehicle-locator.log";

#[cfg(debug_assertions)]
const DEFAULT_FILTER: &str = "debug,hyper=warn,reqwest=warn";
#[cfg(not(debug_assertions))]
const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Install the global subscriber, writing files under `log_dir`.
///
/// Buffered lines are flushed when the returned guard is dropped, so hosts
/// keep it alive for the life of the process.
pub fn init(log_dir: &Path) -> WorkerGuard {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!("Cannot create log directory {}: {}", log_dir.display(), e);
    }

    let (file_writer, guard) = tracing_appender::non_blocking(RollingFileAppender::new(
        Rotation::DAILY,
        log_dir,
        LOG_FILE_PREFIX,
    ));

    let console = cfg!(debug_assertions).then(|| fmt::layer().with_target(true).pretty());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(console)
        .try_init();
    if installed.is_err() {
        // Embedding hosts may bring their own subscriber
        eprintln!("Global tracing subscriber already set; keeping it");
    }

    guard
}
