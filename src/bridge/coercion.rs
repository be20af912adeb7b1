//! Conversion of raw MQTT payloads into typed property values
//!
//! All functions here are pure. Failures are reported as [`ParseError`] and
//! never leave partial updates behind: a field either yields its complete
//! set of updates or none at all.

use super::properties::{paths, PropertyValue};
use crate::protocol::FieldId;
use thiserror::Error;

/// `/Status` value while a vehicle is plugged in
pub const STATUS_PLUGGED: i64 = 2;
/// `/Status` value while no vehicle is plugged in
pub const STATUS_UNPLUGGED: i64 = 0;
/// openWB charge mode number for PV surplus charging
pub const OPENWB_PV_CHARGE_MODE: i64 = 2;

/// Malformed or type-mismatched payload
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Payload is not a number: {payload:?}")]
    NotNumeric { payload: String },

    #[error("Payload is not an integer: {payload:?}")]
    NotInteger { payload: String },

    #[error("Payload is not a JSON number array: {0}")]
    InvalidArray(#[from] serde_json::Error),

    #[error("Cannot average an empty array")]
    EmptyArray,
}

/// Charge mode as exposed on `/Mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeMode {
    /// Direct / instant charging
    Instant,
    /// PV surplus charging
    PvSurplus,
}

impl ChargeMode {
    /// Map an openWB charge mode number: 2 is PV surplus, anything else instant
    pub fn from_openwb(mode: i64) -> Self {
        if mode == OPENWB_PV_CHARGE_MODE {
            ChargeMode::PvSurplus
        } else {
            ChargeMode::Instant
        }
    }

    pub fn property_value(&self) -> PropertyValue {
        match self {
            ChargeMode::Instant => PropertyValue::Int(0),
            ChargeMode::PvSurplus => PropertyValue::Int(1),
        }
    }
}

/// One property write produced from an inbound payload
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyUpdate {
    pub path: &'static str,
    pub value: PropertyValue,
}

impl PropertyUpdate {
    fn new(path: &'static str, value: impl Into<PropertyValue>) -> Self {
        Self {
            path,
            value: value.into(),
        }
    }
}

/// Parse a plain decimal payload
pub fn parse_scalar(payload: &str) -> Result<f64, ParseError> {
    payload
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseError::NotNumeric {
            payload: payload.to_string(),
        })
}

/// Parse an integer payload
pub fn parse_integer(payload: &str) -> Result<i64, ParseError> {
    payload
        .trim()
        .parse::<i64>()
        .map_err(|_| ParseError::NotInteger {
            payload: payload.to_string(),
        })
}

/// Parse a JSON array of numbers
pub fn parse_array(payload: &str) -> Result<Vec<f64>, ParseError> {
    Ok(serde_json::from_str::<Vec<f64>>(payload)?)
}

/// Arithmetic mean, refusing empty input
pub fn mean(values: &[f64]) -> Result<f64, ParseError> {
    if values.is_empty() {
        return Err(ParseError::EmptyArray);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Case-insensitive `true`/`1` check; everything else is false
pub fn parse_flag(payload: &str) -> bool {
    payload.eq_ignore_ascii_case("true") || payload == "1"
}

/// Convert the payload of `field` into the property updates it implies
pub fn coerce(field: FieldId, payload: &str) -> Result<Vec<PropertyUpdate>, ParseError> {
    let updates = match field {
        FieldId::Power => vec![PropertyUpdate::new(paths::AC_POWER, parse_scalar(payload)?)],
        FieldId::Powers => parse_array(payload)?
            .into_iter()
            .zip(paths::PHASE_POWER)
            .map(|(value, path)| PropertyUpdate::new(path, value))
            .collect(),
        FieldId::Voltages => {
            let voltages = parse_array(payload)?;
            vec![PropertyUpdate::new(paths::AC_VOLTAGE, mean(&voltages)?)]
        }
        FieldId::DailyImported => vec![PropertyUpdate::new(
            paths::AC_ENERGY_FORWARD,
            parse_scalar(payload)?,
        )],
        FieldId::EvseCurrent => vec![PropertyUpdate::new(paths::CURRENT, parse_scalar(payload)?)],
        FieldId::PlugState => {
            let status = if parse_flag(payload) {
                STATUS_PLUGGED
            } else {
                STATUS_UNPLUGGED
            };
            vec![PropertyUpdate::new(paths::STATUS, status)]
        }
        FieldId::ChargeState => {
            let charging: i64 = parse_flag(payload).into();
            vec![PropertyUpdate::new(paths::START_STOP, charging)]
        }
        FieldId::ChargeMode => {
            let mode = ChargeMode::from_openwb(parse_integer(payload)?);
            vec![PropertyUpdate::new(paths::MODE, mode.property_value())]
        }
    };
    Ok(updates)
}
