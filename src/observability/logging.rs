//! Structured logging system using tracing crate
//!
//! ## Log Format Options
//!
//! The output format is controlled by the `LOG_FORMAT` environment variable:
//!
//! - `json` - Structured JSON format for log aggregation
//! - `pretty` - Human-readable format with colors and indentation
//! - `compact` - Terminal-friendly format with colors but minimal spacing
//!
//! ## Environment Variables
//!
//! - `LOG_LEVEL`: Log level (ERROR, WARN, INFO, DEBUG, TRACE) - defaults to INFO
//! - `LOG_FORMAT`: Output format (json, pretty, compact) - defaults to json
//! - `LOG_SPANS`: Include span events (true/false) - defaults to false
//! - `RUST_LOG`: Override log filtering (follows env_logger format)
//!
//! A level from the configuration file takes precedence over `LOG_LEVEL`,
//! and `-v` flags on the command line take precedence over both.
//!
//! ## Examples
//!
//! ```bash
//! LOG_FORMAT=compact LOG_LEVEL=DEBUG ./openwb-bridge run
//! ```

use std::env;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Dependency noise kept out of the bridge's own log level
const DEPENDENCY_DIRECTIVES: &str = "rumqttc=warn,tokio=warn";

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format for structured logging (machine-readable)
    Json,
    /// Pretty format with colors and indentation (human-readable)
    Pretty,
    /// Compact format with colors but minimal spacing (terminal-friendly)
    Compact,
}

impl LogFormat {
    /// Parse log format from string, unknown values fall back to JSON
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Parse a level name, case-insensitive
pub fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" | "WARNING" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}

/// Level selected by repeated `-v` flags; zero flags select nothing
pub fn level_from_verbosity(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

/// Pick the effective level: command line, then config file, then environment
pub fn resolve_level(verbosity: u8, config_level: Option<&str>, env_level: Option<&str>) -> Level {
    level_from_verbosity(verbosity)
        .or_else(|| config_level.and_then(parse_level))
        .or_else(|| env_level.and_then(parse_level))
        .unwrap_or(Level::INFO)
}

fn span_events(include_spans: bool) -> fmt::format::FmtSpan {
    if include_spans {
        fmt::format::FmtSpan::NEW | fmt::format::FmtSpan::CLOSE
    } else {
        fmt::format::FmtSpan::NONE
    }
}

fn build_filter(level: Level) -> EnvFilter {
    // Allow RUST_LOG to override
    match env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::builder().parse_lossy(rust_log),
        Err(_) => EnvFilter::builder().parse_lossy(format!("{level},{DEPENDENCY_DIRECTIVES}")),
    }
}

/// Initialize logging with manual configuration.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_logging(level: Level, format: LogFormat, include_spans: bool) {
    let subscriber = tracing_subscriber::registry().with(build_filter(level));

    let result = match format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_span_events(span_events(include_spans));
            subscriber.with(fmt_layer).try_init()
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_ansi(true)
                .with_span_events(span_events(include_spans));
            subscriber.with(fmt_layer).try_init()
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_ansi(true)
                .with_target(false)
                .with_span_events(span_events(include_spans));
            subscriber.with(fmt_layer).try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
    }
}

/// Format and span settings from `LOG_FORMAT` and `LOG_SPANS`
pub fn env_format() -> (LogFormat, bool) {
    let format = env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let include_spans = env::var("LOG_SPANS")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    (LogFormat::parse(&format), include_spans)
}

/// Initialize logging from environment variables only
pub fn init_default_logging() {
    let env_level = env::var("LOG_LEVEL").ok();
    let level = resolve_level(0, None, env_level.as_deref());
    let (format, include_spans) = env_format();
    init_logging(level, format, include_spans);
}

/// Create a span covering the bridge event loop
#[macro_export]
macro_rules! bridge_span {
    ($($field:tt)*) => {
        tracing::info_span!("bridge", $($field)*)
    };
}

/// Create an MQTT operation span
#[macro_export]
macro_rules! mqtt_span {
    ($($field:tt)*) => {
        tracing::info_span!("mqtt_operation", $($field)*)
    };
}

pub use {bridge_span, mqtt_span};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PrEtTy"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("COMPACT"), LogFormat::Compact);
    }

    #[test]
    fn test_log_format_parse_invalid_defaults_to_json() {
        assert_eq!(LogFormat::parse("invalid"), LogFormat::Json);
        assert_eq!(LogFormat::parse(""), LogFormat::Json);
    }

    #[test]
    fn test_parse_level() {
        let test_cases = vec![
            ("error", Some(Level::ERROR)),
            ("WARN", Some(Level::WARN)),
            ("warning", Some(Level::WARN)),
            (" info ", Some(Level::INFO)),
            ("Debug", Some(Level::DEBUG)),
            ("TRACE", Some(Level::TRACE)),
            ("loud", None),
        ];

        for (input, expected) in test_cases {
            assert_eq!(parse_level(input), expected, "Failed for input: {input}");
        }
    }

    #[test]
    fn test_level_precedence() {
        assert_eq!(resolve_level(0, None, None), Level::INFO);
        assert_eq!(resolve_level(0, None, Some("warn")), Level::WARN);
        assert_eq!(resolve_level(0, Some("error"), Some("warn")), Level::ERROR);
        assert_eq!(resolve_level(1, Some("error"), Some("warn")), Level::DEBUG);
        assert_eq!(resolve_level(3, None, None), Level::TRACE);
        // Unparseable config values fall through to the environment
        assert_eq!(resolve_level(0, Some("loud"), Some("debug")), Level::DEBUG);
    }
}
