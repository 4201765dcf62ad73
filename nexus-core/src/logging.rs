//! Logging configuration with rotation support
//!
//! # Example
//!
//! ```rust,no_run
//! use nexus_core::logging::init_logging;
//!
//! init_logging("logs", "nexus.log", "info").unwrap();
//! ```

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with daily file rotation
///
/// - `directory`: Directory to store logs
/// - `filename_prefix`: Prefix for log files (e.g. "nexus.log")
/// - `level`: Default log level (e.g. "info", "debug")
pub fn init_logging(directory: &str, filename_prefix: &str, level: &str) -> Result<()> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(filename_prefix)
        .build(directory)
        .map_err(|e| Error::Internal(format!("Failed to create log appender: {}", e)))?;

    // Stdout stays terse; the interactive loop shares the terminal.
    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to init tracing: {}", e)))?;

    Ok(())
}

/// Initialize logging from the `logging` section of the config
pub fn init_from_config(config: &LoggingConfig) -> Result<()> {
    init_logging(&config.directory, &config.file_prefix, &config.level)
}
