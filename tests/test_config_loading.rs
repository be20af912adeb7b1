//! Configuration loading and validation tests
//!
//! Tests focus on the behavior of loading a configuration file from disk:
//! defaults, derived values and the rejections users actually hit.

use openwb_bridge::config::{BridgeConfig, ConfigError};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "{content}").unwrap();
    temp_file
}

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let temp_file = write_config(
        r#"
[bridge]
device_instance = 43
device_name = "openWB"

[mqtt]
broker_url = "mqtt://192.168.1.10:1883"
topic = "openWB/#"

[wallbox]
max_current = 32
"#,
    );

    let config = BridgeConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.bridge.device_instance, 43);
    assert_eq!(config.bridge.chargepoint_id, 5);
    assert_eq!(config.liveness_timeout(), Duration::from_secs(60));
    assert_eq!(config.reconnect_delay(), Duration::from_secs(15));
    assert_eq!(config.namespace().prefix(), "openWB");
    assert_eq!(
        config.identity().service_name(),
        "com.victronenergy.evcharger.mqtt_wb_43"
    );
}

#[test]
fn test_config_loads_with_optional_fields() {
    let temp_file = write_config(
        r#"
[bridge]
device_instance = 7
device_name = "Carport"
chargepoint_id = 2
timeout_secs = 0
reconnect_delay_secs = 30
log_level = "debug"

[mqtt]
broker_url = "mqtts://broker.example.net"
topic = "home/openWB/"
username_env = "MQTT_USER"
password_env = "MQTT_PASS"
keep_alive_secs = 20

[wallbox]
max_current = 16
"#,
    );

    let config = BridgeConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.mqtt.username_env, Some("MQTT_USER".to_string()));
    assert_eq!(config.mqtt.password_env, Some("MQTT_PASS".to_string()));
    assert_eq!(config.liveness_timeout(), Duration::ZERO);
    assert_eq!(
        config.namespace().subscription_topics(),
        vec![
            "home/openWB/chargepoint/2/get/#".to_string(),
            "home/openWB/global/ChargeMode".to_string()
        ]
    );
}

#[test]
fn test_missing_file_is_read_error() {
    let result = BridgeConfig::load_from_file(Path::new("/nonexistent/openwb-bridge.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let temp_file = write_config("[bridge\ndevice_instance = ");
    let result = BridgeConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_missing_required_field_is_parse_error() {
    let temp_file = write_config(
        r#"
[bridge]
device_instance = 43
device_name = "openWB"

[mqtt]
topic = "openWB/#"

[wallbox]
max_current = 32
"#,
    );
    let result = BridgeConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_unedited_sample_is_rejected() {
    let temp_file = write_config(include_str!("../config/openwb-bridge.sample.toml"));
    let result = BridgeConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::InvalidBrokerUrl(_))));
}

#[test]
fn test_unsupported_scheme_is_rejected() {
    let temp_file = write_config(
        r#"
[bridge]
device_instance = 43
device_name = "openWB"

[mqtt]
broker_url = "http://192.168.1.10"
topic = "openWB/#"

[wallbox]
max_current = 32
"#,
    );
    let result = BridgeConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::InvalidBrokerUrl(_))));
}
