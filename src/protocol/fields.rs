//! Semantic field identifiers for openWB charge point telemetry

use std::fmt;

/// One telemetry or control quantity, independent of its wire topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// Total active power in W
    Power,
    /// Per-phase active power, JSON array in phase order
    Powers,
    /// Per-phase voltage, JSON array reduced to the mean
    Voltages,
    /// Energy imported today in kWh
    DailyImported,
    /// Current set on the EVSE in A
    EvseCurrent,
    /// Vehicle plugged in
    PlugState,
    /// Vehicle actively charging
    ChargeState,
    /// Global charge mode published outside the charge point namespace
    ChargeMode,
}

impl FieldId {
    /// Resolve the key found after `chargepoint/<id>/get/`.
    ///
    /// Returns `None` for keys this bridge does not map so new upstream
    /// fields are ignored instead of treated as errors. `ChargeMode` is never
    /// returned here because it has its own global topic.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "power" => Some(Self::Power),
            "powers" => Some(Self::Powers),
            "voltages" => Some(Self::Voltages),
            "daily_imported" => Some(Self::DailyImported),
            "evse_current" => Some(Self::EvseCurrent),
            "plug_state" => Some(Self::PlugState),
            "charge_state" => Some(Self::ChargeState),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Powers => "powers",
            Self::Voltages => "voltages",
            Self::DailyImported => "daily_imported",
            Self::EvseCurrent => "evse_current",
            Self::PlugState => "plug_state",
            Self::ChargeState => "charge_state",
            Self::ChargeMode => "ChargeMode",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_resolve() {
        for field in [
            FieldId::Power,
            FieldId::Powers,
            FieldId::Voltages,
            FieldId::DailyImported,
            FieldId::EvseCurrent,
            FieldId::PlugState,
            FieldId::ChargeState,
        ] {
            assert_eq!(FieldId::from_key(field.key()), Some(field));
        }
    }

    #[test]
    fn test_unknown_and_global_keys_are_ignored() {
        assert_eq!(FieldId::from_key("imported"), None);
        assert_eq!(FieldId::from_key("ChargeMode"), None);
        assert_eq!(FieldId::from_key("Power"), None);
        assert_eq!(FieldId::from_key(""), None);
    }
}
