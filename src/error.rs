//! Error types for the openWB bridge
//!
//! Each concern has its own error enum; [`BridgeError`] aggregates them for
//! the event loop and the binary. Per-message errors never reach this type:
//! the only fatal runtime condition is [`BridgeError::LivenessTimeout`].

use crate::bridge::state::StateError;
use crate::config::ConfigError;
use crate::property::PropertyBusError;
use crate::transport::MqttError;
use std::time::Duration;
use thiserror::Error;

/// Main error type for bridge operations
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Property state error: {0}")]
    State(#[from] StateError),

    #[error("Transport error: {0}")]
    Transport(#[from] MqttError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Property service error: {0}")]
    PropertyBus(#[from] PropertyBusError),

    #[error("No MQTT message for {}s (timeout {}s)", silence.as_secs(), timeout.as_secs())]
    LivenessTimeout { silence: Duration, timeout: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bridge event channel closed")]
    EventChannelClosed,
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_timeout_message() {
        let error = BridgeError::LivenessTimeout {
            silence: Duration::from_secs(61),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(error.to_string(), "No MQTT message for 61s (timeout 60s)");
    }

    #[test]
    fn test_conversions() {
        let error: BridgeError = StateError::NotFound {
            path: "/Nope".to_string(),
        }
        .into();
        assert!(matches!(error, BridgeError::State(_)));

        let error: BridgeError = ConfigError::InvalidConfig("bad".to_string()).into();
        assert!(matches!(error, BridgeError::Config(_)));

        let error: BridgeError = MqttError::InvalidBrokerUrl("ftp://x".to_string()).into();
        assert_eq!(
            error.to_string(),
            "Transport error: Invalid broker URL: ftp://x"
        );
    }
}
