//! Diagnostic logging configuration using tracing
//!
//! These are the service's own diagnostics (lifecycle transitions, write
//! failures), never the records callers hand to the service.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the diagnostic log level
pub const LOG_ENV_VAR: &str = "SIMPLELOG_LOG";

/// Initialize the diagnostic logging subsystem
///
/// Logs are written to `~/.local/share/simplelog/logs/`.
/// Log level is controlled by the `SIMPLELOG_LOG` environment variable.
///
/// # Examples
/// ```bash
/// SIMPLELOG_LOG=debug simplelog --file app.log
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "simplelog.log");

    // Default to info, allow override via SIMPLELOG_LOG
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new("simplelog=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| crate::Error::config(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!("simplelog starting, diagnostics in {}", log_dir.display());

    Ok(())
}

/// Get the diagnostic log directory path
pub fn get_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("simplelog").join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_layout() {
        let dir = get_log_directory();
        assert!(dir.ends_with("simplelog/logs"));
    }
}
