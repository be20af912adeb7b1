//! Configuration for the openWB bridge
//!
//! Loaded from a TOML file with `[bridge]`, `[mqtt]` and `[wallbox]`
//! sections. MQTT credentials are referenced by environment variable name
//! and resolved when connecting.

use crate::bridge::properties::DeviceIdentity;
use crate::protocol::{normalize_prefix, TopicNamespace};
use crate::transport::mqtt::parse_broker_url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Host value shipped in the sample configuration
pub const PLACEHOLDER_BROKER_HOST: &str = "IP_ADDR_OR_FQDN";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    pub bridge: BridgeSection,
    pub mqtt: MqttSection,
    pub wallbox: WallboxSection,
}

/// Bridge section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeSection {
    /// Device instance on the property service
    pub device_instance: u32,
    /// Shown as product and custom name
    pub device_name: String,
    /// openWB charge point number
    #[serde(default = "default_chargepoint_id")]
    pub chargepoint_id: u32,
    /// Seconds without inbound messages before the bridge exits, 0 disables
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Seconds between reconnection attempts
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    /// Optional log level (error, warn, info, debug, trace)
    pub log_level: Option<String>,
}

fn default_chargepoint_id() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_reconnect_delay_secs() -> u64 {
    15
}

/// MQTT section
///
/// Broker certificates are always verified; there is no option to skip
/// verification, and unknown keys such as `tls_insecure` are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MqttSection {
    /// MQTT broker URL with protocol and port, `mqtts://` enables TLS
    pub broker_url: String,
    /// openWB topic namespace, e.g. `openWB/#`
    pub topic: String,
    /// Environment variable containing username
    pub username_env: Option<String>,
    /// Environment variable containing password
    pub password_env: Option<String>,
    /// CA bundle used to verify the broker certificate
    pub tls_ca_path: Option<PathBuf>,
    /// Keep alive interval in seconds
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_keep_alive_secs() -> u64 {
    60
}

/// Wallbox section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallboxSection {
    /// Maximum charging current in A, initial `/MaxCurrent`
    pub max_current: i64,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BridgeConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = parse_broker_url(&self.mqtt.broker_url)
            .map_err(|_| ConfigError::InvalidBrokerUrl(self.mqtt.broker_url.clone()))?;

        if endpoint.host == PLACEHOLDER_BROKER_HOST {
            return Err(ConfigError::InvalidBrokerUrl(format!(
                "{} still contains the placeholder host {PLACEHOLDER_BROKER_HOST}",
                self.mqtt.broker_url
            )));
        }
        if self.mqtt.tls_ca_path.is_some() && !endpoint.tls {
            return Err(ConfigError::InvalidConfig(
                "mqtt.tls_ca_path requires an mqtts:// broker_url".to_string(),
            ));
        }
        if normalize_prefix(&self.mqtt.topic).is_empty() {
            return Err(ConfigError::InvalidConfig(format!(
                "mqtt.topic '{}' has no prefix before the wildcard",
                self.mqtt.topic
            )));
        }
        if self.mqtt.keep_alive_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "mqtt.keep_alive_secs must be greater than 0".to_string(),
            ));
        }
        if self.bridge.device_name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "bridge.device_name must not be empty".to_string(),
            ));
        }
        if self.wallbox.max_current < 0 {
            return Err(ConfigError::InvalidConfig(
                "wallbox.max_current must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn namespace(&self) -> TopicNamespace {
        TopicNamespace::new(&self.mqtt.topic, self.bridge.chargepoint_id)
    }

    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity {
            device_instance: self.bridge.device_instance,
            device_name: self.bridge.device_name.clone(),
            max_current: self.wallbox.max_current,
        }
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.bridge.timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.bridge.reconnect_delay_secs)
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[bridge]
device_instance = 43
device_name = "openWB"

[mqtt]
broker_url = "mqtt://localhost:1883"
topic = "openWB/#"

[wallbox]
max_current = 32
"#;
        Self::from_toml(toml_content).expect("Test config should parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::test_config();
        assert_eq!(config.bridge.chargepoint_id, 5);
        assert_eq!(config.bridge.timeout_secs, 60);
        assert_eq!(config.reconnect_delay(), Duration::from_secs(15));
        assert_eq!(config.mqtt.keep_alive_secs, 60);
        assert_eq!(config.bridge.log_level, None);
        assert_eq!(config.namespace().prefix(), "openWB");
        assert_eq!(config.identity().max_current, 32);
    }

    #[test]
    fn test_full_config() {
        let toml_content = r#"
[bridge]
device_instance = 1
device_name = "Garage"
chargepoint_id = 3
timeout_secs = 0
reconnect_delay_secs = 5
log_level = "debug"

[mqtt]
broker_url = "mqtts://broker.local:8884"
topic = "site/openWB"
username_env = "MQTT_USER"
password_env = "MQTT_PASS"
tls_ca_path = "/data/ca.pem"
keep_alive_secs = 30

[wallbox]
max_current = 16
"#;
        let config = BridgeConfig::from_toml(toml_content).unwrap();
        assert_eq!(config.liveness_timeout(), Duration::ZERO);
        assert_eq!(
            config.namespace().get_base(),
            "site/openWB/chargepoint/3/get/"
        );
        assert_eq!(config.mqtt.tls_ca_path, Some(PathBuf::from("/data/ca.pem")));
        assert_eq!(config.bridge.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_placeholder_host_rejected() {
        let mut config = BridgeConfig::test_config();
        config.mqtt.broker_url = "mqtt://IP_ADDR_OR_FQDN:1883".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBrokerUrl(_))
        ));
    }

    #[test]
    fn test_ca_without_tls_rejected() {
        let mut config = BridgeConfig::test_config();
        config.mqtt.tls_ca_path = Some(PathBuf::from("/data/ca.pem"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_wildcard_only_topic_rejected() {
        let mut config = BridgeConfig::test_config();
        config.mqtt.topic = "#".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_insecure_tls_option_rejected() {
        let toml_content = r#"
[bridge]
device_instance = 1
device_name = "Garage"

[mqtt]
broker_url = "mqtts://broker.local"
topic = "openWB"
tls_insecure = true

[wallbox]
max_current = 16
"#;
        let result = BridgeConfig::from_toml(toml_content);
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let result = BridgeConfig::from_toml("[bridge]\ndevice_instance = 1\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = BridgeConfig::test_config();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(BridgeConfig::from_toml(&text).unwrap(), config);
    }
}
