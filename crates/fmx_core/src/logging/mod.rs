//! Logging infrastructure for FrameMux.
//!
//! This module provides:
//! - The batch log with file + display callback dual output
//! - Tail buffer for failure diagnosis
//! - Integration with the `tracing` ecosystem (console and rolling file)
//!
//! # Example
//!
//! ```no_run
//! use fmx_core::logging::{BatchLog, LogConfig};
//!
//! let log = BatchLog::with_file("/path/to/logs", LogConfig::default(), None).unwrap();
//!
//! log.info("Processing 'C:/captures/demo'");
//! log.command("\"mencoder.exe\" mf://shot_*.tga -mf fps=60 ...");
//! log.encoder_output("Skipping frame!\n");
//! ```

mod batch_log;
mod types;

pub use batch_log::BatchLog;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(env_filter(default_level))
        .init();
}

/// Like [`init_tracing`], with a daily rolling `framemux.log` in `log_dir`.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the lifetime of the program.
pub fn init_tracing_with_file(default_level: LogLevel, log_dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, "framemux.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter(default_level))
        .init();

    guard
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_builds_for_every_level() {
        for level in [LogLevel::Trace, LogLevel::Info, LogLevel::Error] {
            let _ = env_filter(level);
        }
        init_test_tracing();
        tracing::warn!("test tracing initialised");
    }
}
