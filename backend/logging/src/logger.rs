//! Structured Logger
//!
//! Console output plus a daily-rolling NDJSON file, with the level taken
//! from `RUST_LOG` when set.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "docfill";
const LOG_FILE_SUFFIX: &str = "log";

/// Initialize the global logger.
///
/// `console_json` switches the console layer to JSON lines; the file layer
/// is always JSON. Calling this twice is harmless; the second call is a no-op.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str, console_json: bool) -> Result<()> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Writes `docfill.YYYY-MM-DD.log`
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))?;

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_appender)
        .with_ansi(false);

    // Console goes to stderr so command output on stdout stays clean.
    let console_layer = if console_json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
            .boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");
        init_logger(&logs, "info", false).unwrap();
        assert!(logs.is_dir());
        // Second init must not fail even though a global subscriber exists.
        init_logger(&logs, "debug", true).unwrap();
    }
}
