//! Exposed property paths, typed values and the startup property table

use std::fmt;

/// Property paths exposed to the property service
pub mod paths {
    pub const MGMT_PROCESS_NAME: &str = "/Mgmt/ProcessName";
    pub const MGMT_PROCESS_VERSION: &str = "/Mgmt/ProcessVersion";
    pub const MGMT_CONNECTION: &str = "/Mgmt/Connection";
    pub const DEVICE_INSTANCE: &str = "/DeviceInstance";
    pub const PRODUCT_ID: &str = "/ProductId";
    pub const PRODUCT_NAME: &str = "/ProductName";
    pub const CUSTOM_NAME: &str = "/CustomName";
    pub const FIRMWARE_VERSION: &str = "/FirmwareVersion";
    pub const HARDWARE_VERSION: &str = "/HardwareVersion";
    pub const CONNECTED: &str = "/Connected";
    pub const UPDATE_INDEX: &str = "/UpdateIndex";
    pub const STATUS: &str = "/Status";

    pub const AC_POWER: &str = "/Ac/Power";
    pub const AC_L1_POWER: &str = "/Ac/L1/Power";
    pub const AC_L2_POWER: &str = "/Ac/L2/Power";
    pub const AC_L3_POWER: &str = "/Ac/L3/Power";
    pub const AC_ENERGY_FORWARD: &str = "/Ac/Energy/Forward";
    pub const AC_VOLTAGE: &str = "/Ac/Voltage";
    pub const CURRENT: &str = "/Current";

    pub const MODE: &str = "/Mode";
    pub const START_STOP: &str = "/StartStop";
    pub const SET_CURRENT: &str = "/SetCurrent";
    pub const MAX_CURRENT: &str = "/MaxCurrent";

    /// Fan-out targets of the per-phase power array, in phase order
    pub const PHASE_POWER: [&str; 3] = [AC_L1_POWER, AC_L2_POWER, AC_L3_POWER];
}

/// Typed value of one property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(v) => Some(*v as f64),
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Non-zero numbers and non-empty text are truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Int(v) => *v != 0,
            PropertyValue::Float(v) => *v != 0.0,
            PropertyValue::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

/// Display unit used for the text representation of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Watt,
    Ampere,
    Volt,
    KiloWattHour,
    Plain,
}

impl Unit {
    /// Text form shown by the property service
    pub fn format(&self, value: &PropertyValue) -> String {
        let Some(number) = value.as_f64() else {
            return value.to_string();
        };
        match self {
            Unit::Watt => format!("{number:.1}W"),
            Unit::Ampere => format!("{number:.1}A"),
            Unit::Volt => format!("{number:.1}V"),
            Unit::KiloWattHour => format!("{number:.2}kWh"),
            Unit::Plain => value.to_string(),
        }
    }
}

/// Declaration of one property at startup
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDecl {
    pub path: &'static str,
    pub initial: PropertyValue,
    pub unit: Unit,
    pub writeable: bool,
}

impl PropertyDecl {
    fn read_only(path: &'static str, initial: impl Into<PropertyValue>, unit: Unit) -> Self {
        Self {
            path,
            initial: initial.into(),
            unit,
            writeable: false,
        }
    }

    fn writeable(path: &'static str, initial: impl Into<PropertyValue>, unit: Unit) -> Self {
        Self {
            path,
            initial: initial.into(),
            unit,
            writeable: true,
        }
    }
}

/// Identity of the charger as presented to the property service
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceIdentity {
    pub device_instance: u32,
    pub device_name: String,
    pub max_current: i64,
}

impl DeviceIdentity {
    /// Property service name, e.g. `com.victronenergy.evcharger.mqtt_wb_43`
    pub fn service_name(&self) -> String {
        format!(
            "com.victronenergy.evcharger.mqtt_wb_{}",
            self.device_instance
        )
    }
}

pub const GENERIC_PRODUCT_ID: i64 = 0xFFFF;
pub const REPORTED_FIRMWARE_VERSION: &str = "2.x";
pub const REPORTED_HARDWARE_VERSION: i64 = 2;

/// Every property the bridge exposes, each path exactly once
pub fn property_table(identity: &DeviceIdentity) -> Vec<PropertyDecl> {
    use paths::*;

    vec![
        PropertyDecl::read_only(MGMT_PROCESS_NAME, env!("CARGO_PKG_NAME"), Unit::Plain),
        PropertyDecl::read_only(
            MGMT_PROCESS_VERSION,
            env!("CARGO_PKG_VERSION"),
            Unit::Plain,
        ),
        PropertyDecl::read_only(MGMT_CONNECTION, "MQTT <-> property bus", Unit::Plain),
        PropertyDecl::read_only(
            DEVICE_INSTANCE,
            i64::from(identity.device_instance),
            Unit::Plain,
        ),
        PropertyDecl::read_only(PRODUCT_ID, GENERIC_PRODUCT_ID, Unit::Plain),
        PropertyDecl::read_only(PRODUCT_NAME, identity.device_name.as_str(), Unit::Plain),
        PropertyDecl::read_only(CUSTOM_NAME, identity.device_name.as_str(), Unit::Plain),
        PropertyDecl::read_only(FIRMWARE_VERSION, REPORTED_FIRMWARE_VERSION, Unit::Plain),
        PropertyDecl::read_only(HARDWARE_VERSION, REPORTED_HARDWARE_VERSION, Unit::Plain),
        PropertyDecl::read_only(CONNECTED, 1i64, Unit::Plain),
        PropertyDecl::read_only(UPDATE_INDEX, 0i64, Unit::Plain),
        PropertyDecl::read_only(STATUS, 0i64, Unit::Plain),
        PropertyDecl::read_only(AC_POWER, 0.0, Unit::Watt),
        PropertyDecl::read_only(AC_L1_POWER, 0.0, Unit::Watt),
        PropertyDecl::read_only(AC_L2_POWER, 0.0, Unit::Watt),
        PropertyDecl::read_only(AC_L3_POWER, 0.0, Unit::Watt),
        PropertyDecl::read_only(AC_ENERGY_FORWARD, 0.0, Unit::KiloWattHour),
        PropertyDecl::read_only(AC_VOLTAGE, 0.0, Unit::Volt),
        PropertyDecl::read_only(CURRENT, 0.0, Unit::Ampere),
        PropertyDecl::writeable(MODE, 0i64, Unit::Plain),
        PropertyDecl::writeable(START_STOP, 0i64, Unit::Plain),
        PropertyDecl::writeable(SET_CURRENT, 0i64, Unit::Ampere),
        PropertyDecl::writeable(MAX_CURRENT, identity.max_current, Unit::Ampere),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            device_instance: 43,
            device_name: "openWB".to_string(),
            max_current: 32,
        }
    }

    #[test]
    fn test_table_declares_each_path_once() {
        let table = property_table(&identity());
        let unique: HashSet<_> = table.iter().map(|decl| decl.path).collect();
        assert_eq!(unique.len(), table.len());
    }

    #[test]
    fn test_only_control_paths_are_writeable() {
        let writeable: HashSet<_> = property_table(&identity())
            .into_iter()
            .filter(|decl| decl.writeable)
            .map(|decl| decl.path)
            .collect();
        assert_eq!(
            writeable,
            HashSet::from([
                paths::MODE,
                paths::START_STOP,
                paths::SET_CURRENT,
                paths::MAX_CURRENT
            ])
        );
    }

    #[test]
    fn test_max_current_initialized_from_identity() {
        let table = property_table(&identity());
        let max = table
            .iter()
            .find(|decl| decl.path == paths::MAX_CURRENT)
            .unwrap();
        assert_eq!(max.initial, PropertyValue::Int(32));
    }

    #[test]
    fn test_unit_formatting() {
        assert_eq!(Unit::Watt.format(&PropertyValue::Float(1234.56)), "1234.6W");
        assert_eq!(Unit::Ampere.format(&PropertyValue::Int(16)), "16.0A");
        assert_eq!(Unit::Volt.format(&PropertyValue::Float(230.0)), "230.0V");
        assert_eq!(
            Unit::KiloWattHour.format(&PropertyValue::Float(12.345)),
            "12.35kWh"
        );
        assert_eq!(Unit::Plain.format(&PropertyValue::Int(2)), "2");
        assert_eq!(Unit::Watt.format(&PropertyValue::from("n/a")), "n/a");
    }

    #[test]
    fn test_truthiness_and_integer_view() {
        assert!(PropertyValue::Int(1).is_truthy());
        assert!(!PropertyValue::Int(0).is_truthy());
        assert!(!PropertyValue::Float(0.0).is_truthy());
        assert!(PropertyValue::from("x").is_truthy());
        assert_eq!(PropertyValue::Float(1.0).as_i64(), Some(1));
        assert_eq!(PropertyValue::Float(1.5).as_i64(), None);
        assert_eq!(PropertyValue::from("1").as_i64(), None);
    }

    #[test]
    fn test_service_name() {
        assert_eq!(
            identity().service_name(),
            "com.victronenergy.evcharger.mqtt_wb_43"
        );
    }
}
