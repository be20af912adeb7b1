//! Property state mirror
//!
//! Current value of every declared property path plus the wrapping
//! `/UpdateIndex` heartbeat. The mirror is owned by the bridge event loop,
//! which is the only writer; every change is forwarded to the property
//! service as it happens.

use super::properties::{paths, PropertyDecl, PropertyValue, Unit};
use crate::property::{PropertyBus, PropertyBusError};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("Property path not declared: {path}")]
    NotFound { path: String },

    #[error("Property service error: {0}")]
    Bus(#[from] PropertyBusError),
}

#[derive(Debug, Clone)]
struct Entry {
    value: PropertyValue,
    unit: Unit,
    writeable: bool,
}

/// Snapshot of all exposed properties
pub struct PropertyStateMirror<B: PropertyBus> {
    entries: HashMap<String, Entry>,
    bus: B,
}

impl<B: PropertyBus> PropertyStateMirror<B> {
    /// Declare every property in `table` on `bus` and start mirroring it
    pub fn declare(table: Vec<PropertyDecl>, mut bus: B) -> Result<Self, StateError> {
        let mut entries = HashMap::with_capacity(table.len());
        for decl in table {
            bus.declare(&decl, &decl.unit.format(&decl.initial))?;
            entries.insert(
                decl.path.to_string(),
                Entry {
                    value: decl.initial,
                    unit: decl.unit,
                    writeable: decl.writeable,
                },
            );
        }
        Ok(Self { entries, bus })
    }

    pub fn get(&self, path: &str) -> Result<&PropertyValue, StateError> {
        self.entry(path).map(|entry| &entry.value)
    }

    /// Overwrite `path` and notify the property service
    pub fn set(&mut self, path: &str, value: PropertyValue) -> Result<(), StateError> {
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| StateError::NotFound {
                path: path.to_string(),
            })?;
        let text = entry.unit.format(&value);
        entry.value = value;
        self.bus.publish(path, &entry.value, &text)?;
        Ok(())
    }

    pub fn is_writeable(&self, path: &str) -> Result<bool, StateError> {
        self.entry(path).map(|entry| entry.writeable)
    }

    /// Advance `/UpdateIndex` by one, wrapping from 255 to 0
    pub fn advance_update_index(&mut self) -> Result<u8, StateError> {
        let current = self.get(paths::UPDATE_INDEX)?.as_i64().unwrap_or(0);
        let next = match u8::try_from(current) {
            Ok(index) => index.wrapping_add(1),
            Err(_) => 0,
        };
        self.set(paths::UPDATE_INDEX, PropertyValue::Int(i64::from(next)))?;
        Ok(next)
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn entry(&self, path: &str) -> Result<&Entry, StateError> {
        self.entries.get(path).ok_or_else(|| StateError::NotFound {
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::properties::{property_table, DeviceIdentity};
    use crate::property::LocalPropertyBus;

    fn mirror() -> (PropertyStateMirror<LocalPropertyBus>, LocalPropertyBus) {
        let bus = LocalPropertyBus::new("test.service");
        let view = bus.clone();
        let identity = DeviceIdentity {
            device_instance: 1,
            device_name: "openWB".to_string(),
            max_current: 16,
        };
        let mirror = PropertyStateMirror::declare(property_table(&identity), bus).unwrap();
        (mirror, view)
    }

    #[test]
    fn test_every_declared_path_has_a_value() {
        let (mirror, view) = mirror();
        let table_len = property_table(&DeviceIdentity {
            device_instance: 1,
            device_name: "openWB".to_string(),
            max_current: 16,
        })
        .len();
        assert_eq!(mirror.paths().count(), table_len);
        for path in mirror.paths() {
            assert!(mirror.get(path).is_ok());
            assert!(view.get(path).is_some(), "{path} not on the bus");
        }
    }

    #[test]
    fn test_set_publishes_with_text() {
        let (mut mirror, view) = mirror();
        mirror
            .set(paths::AC_POWER, PropertyValue::Float(1500.0))
            .unwrap();

        assert_eq!(
            mirror.get(paths::AC_POWER).unwrap(),
            &PropertyValue::Float(1500.0)
        );
        assert_eq!(view.get(paths::AC_POWER).unwrap().text, "1500.0W");
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let (mut mirror, _) = mirror();
        let not_found = StateError::NotFound {
            path: "/Ac/Frequency".to_string(),
        };
        assert_eq!(mirror.get("/Ac/Frequency").unwrap_err(), not_found);
        assert_eq!(
            mirror
                .set("/Ac/Frequency", PropertyValue::Float(50.0))
                .unwrap_err(),
            not_found
        );
        assert!(mirror.is_writeable("/Ac/Frequency").is_err());
    }

    #[test]
    fn test_update_index_wraps_after_255() {
        let (mut mirror, view) = mirror();
        mirror
            .set(paths::UPDATE_INDEX, PropertyValue::Int(254))
            .unwrap();

        assert_eq!(mirror.advance_update_index().unwrap(), 255);
        assert_eq!(mirror.advance_update_index().unwrap(), 0);
        assert_eq!(mirror.advance_update_index().unwrap(), 1);
        assert_eq!(
            view.get(paths::UPDATE_INDEX).unwrap().value,
            PropertyValue::Int(1)
        );
    }

    #[test]
    fn test_update_index_full_cycle_stays_in_range() {
        let (mut mirror, _) = mirror();
        for expected in (1..=255).chain(0..=3) {
            let index = mirror.advance_update_index().unwrap();
            assert_eq!(i64::from(index), expected);
        }
    }
}
