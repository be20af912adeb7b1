//! Observability for the bridge: structured logging and span helpers

pub mod logging;

pub use logging::{
    env_format, init_default_logging, init_logging, level_from_verbosity, parse_level,
    resolve_level, LogFormat,
};

// Span macros for structured logging
pub use logging::{bridge_span, mqtt_span};
