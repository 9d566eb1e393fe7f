//! Structured logging for the BIQ server
//!
//! Supports human-readable console output for development, JSON for
//! production, daily-rotated log files, and per-module filtering.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development
    Pretty,
    /// JSON format for production (structured logging)
    Json,
    /// Compact format for testing
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    File,
    Both,
}

impl LogOutput {
    pub fn from_env() -> Self {
        match std::env::var("LOG_OUTPUT").as_deref() {
            Ok("file") => LogOutput::File,
            Ok("both") => LogOutput::Both,
            _ => LogOutput::Stdout,
        }
    }
}

/// Initialize the logging system.
///
/// Environment variables:
/// - `RUST_LOG`: Log level (e.g., "debug", "info", "biq_server=debug")
/// - `LOG_FORMAT`: Output format ("pretty", "json", "compact")
/// - `LOG_OUTPUT`: Where to write logs ("stdout", "file", "both")
/// - `LOG_DIR`: Directory for log files (default: "./logs")
pub fn init() {
    let format = LogFormat::from_env();
    let output = LogOutput::from_env();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap()
        .add_directive("biq_server=debug".parse().unwrap())
        // Filter out noisy third-party crates
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("tokio=warn".parse().unwrap())
        .add_directive("tower=warn".parse().unwrap())
        .add_directive("h2=warn".parse().unwrap());

    match (output, format) {
        (LogOutput::Stdout, LogFormat::Pretty) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_thread_ids(true).with_target(true))
                .init();
        }
        (LogOutput::Stdout, LogFormat::Json) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_current_span(true))
                .init();
        }
        (LogOutput::Stdout, LogFormat::Compact) => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact())
                .init();
        }
        (LogOutput::File, _) => {
            let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
            std::fs::create_dir_all(&log_dir).ok();
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "biq-server.log");

            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(file_appender).with_ansi(false))
                .init();
        }
        (LogOutput::Both, format) => {
            let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
            std::fs::create_dir_all(&log_dir).ok();
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "biq-server.log");

            let stdout_layer = match format {
                LogFormat::Pretty => fmt::layer()
                    .pretty()
                    .with_thread_ids(true)
                    .with_target(true)
                    .boxed(),
                LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
                LogFormat::Compact => fmt::layer().compact().boxed(),
            };

            let file_layer = fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .boxed();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();
        }
    }

    tracing::info!(format = ?format, output = ?output, "logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_env() {
        std::env::set_var("LOG_FORMAT", "json");
        assert_eq!(LogFormat::from_env(), LogFormat::Json);

        std::env::set_var("LOG_FORMAT", "compact");
        assert_eq!(LogFormat::from_env(), LogFormat::Compact);

        std::env::remove_var("LOG_FORMAT");
        assert_eq!(LogFormat::from_env(), LogFormat::Pretty);
    }

    #[test]
    fn test_log_output_from_env() {
        std::env::set_var("LOG_OUTPUT", "file");
        assert_eq!(LogOutput::from_env(), LogOutput::File);

        std::env::set_var("LOG_OUTPUT", "both");
        assert_eq!(LogOutput::from_env(), LogOutput::Both);

        std::env::remove_var("LOG_OUTPUT");
        assert_eq!(LogOutput::from_env(), LogOutput::Stdout);
    }
}
