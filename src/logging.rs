//! Logging setup.
//!
//! The terminal belongs to the UI, so logs go to a daily-rolling file in the
//! state directory (`~/.local/state/codetime/codetime.log`).

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app_dirs::AppDirs;
use crate::error::Result;

const LOG_FILE_NAME: &str = "codetime.log";

/// Keeps the background log writer alive; pending lines flush on drop.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Installs the global subscriber. `RUST_LOG` wins over `level`.
pub fn init(level: &str) -> Result<LoggingGuard> {
    init_in(&AppDirs::log_dir(), level)
}

pub fn init_in(log_dir: &Path, level: &str) -> Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    // A subscriber may already be installed (tests, embedding hosts)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    tracing::info!(log_dir = %log_dir.display(), level, "logging initialized");

    Ok(LoggingGuard { _guard: guard })
}

/// Logging for tests, captured by the test harness
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
