//! Harness log sink and tracing subscriber setup
//!
//! Every harness log line goes through the [`EventLog`] capability. The
//! production sink, [`TracingLog`], emits through `tracing`; tests inject a
//! recording sink instead.
//!
//! ## Log Format Options
//!
//! The output format is controlled by the `LOG_FORMAT` environment variable:
//!
//! - `plain` - `2024-01-01T12:00:00.000Z - message detail` lines (default)
//! - `json` - Structured JSON format for log aggregation systems
//! - `pretty` - Human-readable format with colors and indentation
//! - `compact` - Colored single-line output
//!
//! ## Environment Variables
//!
//! - `LOG_LEVEL`: Log level (ERROR, WARN, INFO, DEBUG, TRACE) - defaults to INFO
//! - `LOG_FORMAT`: Output format (plain, json, pretty, compact) - defaults to plain
//! - `RUST_LOG`: Full filter directive, replaces the level and the dependency filters
//!
//! ## Examples
//!
//! ```bash
//! # Operator session
//! ./awsiot-harness run
//!
//! # Machine-readable session log
//! LOG_FORMAT=json ./awsiot-harness run > session.jsonl
//!
//! # Include rumqttc internals
//! RUST_LOG=debug,rumqttc=debug ./awsiot-harness run
//! ```

use std::env;
use tracing::{info, Level};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Target used for every harness log line
pub const HARNESS_LOG_TARGET: &str = "awsiot_harness";

/// ISO-8601 UTC with milliseconds, followed by the line separator
const PLAIN_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ -";

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Timestamped plain lines (operator-facing)
    Plain,
    /// JSON format for structured logging (machine-readable)
    Json,
    /// Pretty format with colors and indentation (human-readable)
    Pretty,
    /// Compact format with colors but minimal spacing (terminal-friendly)
    Compact,
}

impl LogFormat {
    /// Parse log format from string
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Plain,
        }
    }
}

/// Parse a `LOG_LEVEL` value, defaulting to INFO
pub fn parse_level(s: &str) -> Level {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Level::ERROR,
        "WARN" => Level::WARN,
        "INFO" => Level::INFO,
        "DEBUG" => Level::DEBUG,
        "TRACE" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Sink for harness log lines: `log(message, optional detail)`
pub trait EventLog: Send + Sync {
    fn log(&self, message: &str, detail: Option<&str>);
}

/// Render a log entry the way it appears after the timestamp (pure function)
pub fn render_entry(message: &str, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{message} {detail}"),
        None => message.to_string(),
    }
}

/// [`EventLog`] that writes through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl EventLog for TracingLog {
    fn log(&self, message: &str, detail: Option<&str>) {
        info!(target: HARNESS_LOG_TARGET, "{}", render_entry(message, detail));
    }
}

/// Initialize logging with manual configuration
pub fn init_logging(level: Level, format: LogFormat) {
    let mut filter = EnvFilter::new(level.to_string())
        // Reduce noise from dependencies
        .add_directive("rumqttc=warn".parse().unwrap())
        .add_directive("tokio=warn".parse().unwrap());

    // Allow RUST_LOG to override
    if let Ok(rust_log) = env::var("RUST_LOG") {
        filter = EnvFilter::new(rust_log);
    }

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Plain => {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::new(PLAIN_TIMESTAMP_FORMAT.to_string()))
                .with_ansi(false)
                .with_level(false)
                .with_target(false);
            subscriber.with(fmt_layer).init();
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer().json().with_timer(ChronoUtc::rfc_3339());
            subscriber.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer().pretty().with_ansi(true);
            subscriber.with(fmt_layer).init();
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_ansi(true)
                .with_target(false);
            subscriber.with(fmt_layer).init();
        }
    }
}

/// Initialize logging from environment variables
///
/// `-v` forces DEBUG and `-vv` forces TRACE over `LOG_LEVEL`.
pub fn init_default_logging(verbose: u8) {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
    let level = match verbose {
        0 => parse_level(&log_level),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let format = env::var("LOG_FORMAT").unwrap_or_else(|_| "plain".to_string());
    init_logging(level, LogFormat::parse(&format));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("Compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("plain"), LogFormat::Plain);
    }

    #[test]
    fn test_log_format_parse_invalid_defaults_to_plain() {
        assert_eq!(LogFormat::parse("invalid"), LogFormat::Plain);
        assert_eq!(LogFormat::parse(""), LogFormat::Plain);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Plain);
    }

    #[test]
    fn test_parse_level() {
        let test_cases = vec![
            ("ERROR", Level::ERROR),
            ("warn", Level::WARN),
            ("Info", Level::INFO),
            ("DEBUG", Level::DEBUG),
            ("trace", Level::TRACE),
            ("invalid", Level::INFO),
        ];

        for (input, expected) in test_cases {
            assert_eq!(parse_level(input), expected, "Failed for input: {input}");
        }
    }

    #[test]
    fn test_render_entry() {
        assert_eq!(render_entry("Connection closed.", None), "Connection closed.");
        assert_eq!(render_entry("Client error:", Some("error")), "Client error: error");
        // Messages ending in a space keep it, as the detail is always space-joined
        assert_eq!(
            render_entry("Publish failed: ", Some("timeout")),
            "Publish failed:  timeout"
        );
    }

    #[test]
    fn test_plain_timestamp_is_iso8601() {
        let timestamp = chrono::DateTime::parse_from_rfc3339("2024-01-02T03:04:05.678Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert_eq!(
            timestamp.format(PLAIN_TIMESTAMP_FORMAT).to_string(),
            "2024-01-02T03:04:05.678Z -"
        );
    }
}
