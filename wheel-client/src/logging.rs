//! Logging setup for SDK consumers
//!
//! UI hosts embedding the SDK (overlays, touch panels) must keep stdout
//! and stderr clean, so the default is no output at all. Development and
//! debug modes install a `tracing` subscriber with increasing verbosity.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different host environments
#[derive(Debug, Clone, Copy)]
pub enum LoggingMode {
    /// No output; the default for embedded UI hosts
    Silent,
    /// Compact stderr output for development
    Development,
    /// Verbose diagnostics with source locations
    Debug,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Initialize logging with the specified mode
///
/// Call once, early, before constructing a client.
///
/// # Environment Variables
///
/// - `WHEEL_LOG_LEVEL`: override the log level (error, warn, info,
///   debug, trace), also accepts full `tracing` filter directives
/// - `RUST_LOG`: consulted when `WHEEL_LOG_LEVEL` is unset
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(env_filter("info"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(env_filter("debug"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize logging from the `WHEEL_LOG_MODE` environment variable
///
/// Accepts "silent", "development", or "debug"; anything else (or
/// unset) falls back to silent so an embedding UI never gets surprise
/// output.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = match std::env::var("WHEEL_LOG_MODE").as_deref() {
        Ok("development") => LoggingMode::Development,
        Ok("debug") => LoggingMode::Debug,
        _ => LoggingMode::Silent,
    };

    init_logging(mode)
}

/// Whether a global subscriber is already installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

fn env_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var("WHEEL_LOG_LEVEL") {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode_never_fails() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }
}
