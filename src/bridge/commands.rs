//! Translation of property writes into openWB command messages

use super::properties::{paths, PropertyValue};
use crate::protocol::TopicNamespace;
use std::fmt;
use thiserror::Error;

/// `set/` topic suffix for charge mode commands
pub const CHARGEMODE_COMMAND: &str = "chargemode";
/// `set/` topic suffix for current setpoint commands
pub const CURRENT_COMMAND: &str = "current";

/// Charge mode keywords understood by openWB
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeCommand {
    InstantCharging,
    PvCharging,
    Stop,
}

impl ChargeCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeCommand::InstantCharging => "instant_charging",
            ChargeCommand::PvCharging => "pv_charging",
            ChargeCommand::Stop => "stop",
        }
    }
}

impl fmt::Display for ChargeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message to publish on the MQTT side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCommand {
    pub topic: String,
    pub payload: String,
}

/// Why a property write produced no outbound message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WriteRejection {
    #[error("No command mapped for {path}")]
    NoCommand { path: String },

    #[error("Property {path} is not writeable")]
    NotWriteable { path: String },

    #[error("MQTT not connected, dropped command for {path}")]
    NotConnected { path: String },
}

/// Maps externally initiated property writes onto command messages
pub struct CommandTranslator;

impl CommandTranslator {
    /// Translate a write to `path` (pure function)
    pub fn translate(
        namespace: &TopicNamespace,
        path: &str,
        value: &PropertyValue,
    ) -> Result<OutboundCommand, WriteRejection> {
        let (command, payload) = match path {
            paths::START_STOP => {
                let command = if value.is_truthy() {
                    ChargeCommand::InstantCharging
                } else {
                    ChargeCommand::Stop
                };
                (CHARGEMODE_COMMAND, command.to_string())
            }
            paths::MODE => {
                let command = if value.as_i64() == Some(1) {
                    ChargeCommand::PvCharging
                } else {
                    ChargeCommand::InstantCharging
                };
                (CHARGEMODE_COMMAND, command.to_string())
            }
            // Display text of the value: whole floats go out without a
            // fraction (`16`, not `16.0`), openWB parses both as a number
            paths::SET_CURRENT => (CURRENT_COMMAND, value.to_string()),
            _ => {
                return Err(WriteRejection::NoCommand {
                    path: path.to_string(),
                })
            }
        };

        Ok(OutboundCommand {
            topic: namespace.set_topic(command),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace() -> TopicNamespace {
        TopicNamespace::new("openWB/#", 5)
    }

    fn translate(path: &str, value: PropertyValue) -> Result<OutboundCommand, WriteRejection> {
        CommandTranslator::translate(&namespace(), path, &value)
    }

    #[test]
    fn test_start_stop() {
        assert_eq!(
            translate(paths::START_STOP, PropertyValue::Int(1)).unwrap(),
            OutboundCommand {
                topic: "openWB/chargepoint/5/set/chargemode".to_string(),
                payload: "instant_charging".to_string(),
            }
        );
        assert_eq!(
            translate(paths::START_STOP, PropertyValue::Int(0))
                .unwrap()
                .payload,
            "stop"
        );
    }

    #[test]
    fn test_mode() {
        let pv = translate(paths::MODE, PropertyValue::Int(1)).unwrap();
        assert_eq!(pv.topic, "openWB/chargepoint/5/set/chargemode");
        assert_eq!(pv.payload, "pv_charging");

        for other in [0, 2, 3, -1] {
            assert_eq!(
                translate(paths::MODE, PropertyValue::Int(other))
                    .unwrap()
                    .payload,
                "instant_charging"
            );
        }
    }

    #[test]
    fn test_set_current_uses_decimal_text() {
        let command = translate(paths::SET_CURRENT, PropertyValue::Int(16)).unwrap();
        assert_eq!(command.topic, "openWB/chargepoint/5/set/current");
        assert_eq!(command.payload, "16");

        let command = translate(paths::SET_CURRENT, PropertyValue::Float(6.5)).unwrap();
        assert_eq!(command.payload, "6.5");
    }

    #[test]
    fn test_whole_float_current_has_no_fraction() {
        let command = translate(paths::SET_CURRENT, PropertyValue::Float(16.0)).unwrap();
        assert_eq!(command.payload, "16");

        let int_command = translate(paths::SET_CURRENT, PropertyValue::Int(16)).unwrap();
        assert_eq!(command, int_command);
    }

    #[test]
    fn test_other_paths_have_no_command() {
        assert_eq!(
            translate(paths::MAX_CURRENT, PropertyValue::Int(32)),
            Err(WriteRejection::NoCommand {
                path: paths::MAX_CURRENT.to_string()
            })
        );
        assert!(translate("/Unknown", PropertyValue::Int(1)).is_err());
    }
}
