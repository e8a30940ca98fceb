//! Thermal profile application over the management client.
//!
//! The fixed profiles are a single fan-mode write. Custom TDP takes the
//! ownership/fan-mode/sub-mode sequence first, then writes both power-limit
//! features with the wattage normalized to whatever unit the firmware
//! expects.

use crate::mgmt::Management;
use crate::types::{ThermalProfile, ThermalStatus, MAX_CUSTOM_WATTS, MIN_CUSTOM_WATTS};

/// Vendor class carrying the fan-mode and control-ownership methods.
pub const GAMEZONE_CLASS: &str = "LENOVO_GAMEZONE_DATA";
/// Sustained power limit feature id (opaque vendor constant).
pub const FEATURE_SUSTAINED_POWER: i32 = 16_973_568;
/// Fast (boost) power limit feature id.
pub const FEATURE_FAST_POWER: i32 = 16_908_032;

const FAN_MODE_CUSTOM: i32 = 255;

pub struct ThermalController<M: Management> {
    mgmt: M,
}

impl<M: Management + Clone> Clone for ThermalController<M> {
    fn clone(&self) -> Self {
        ThermalController { mgmt: self.mgmt.clone() }
    }
}

impl<M: Management> ThermalController<M> {
    pub fn new(mgmt: M) -> Self {
        ThermalController { mgmt }
    }

    /// Push a profile to the hardware. Failures are silent like every other
    /// management call; the next [`ThermalController::query_profile`] shows
    /// what actually took.
    pub fn apply_profile(&self, profile: ThermalProfile) {
        match profile {
            ThermalProfile::Quiet | ThermalProfile::Balanced | ThermalProfile::Performance => {
                self.mgmt
                    .exec_simple_method(GAMEZONE_CLASS, "SetSmartFanMode", profile.fan_mode_id());
            }
            ThermalProfile::Custom(watts) => {
                let watts = watts.clamp(MIN_CUSTOM_WATTS, MAX_CUSTOM_WATTS);
                self.mgmt.exec_simple_method(GAMEZONE_CLASS, "SetDDSControlOwner", 1);
                self.mgmt.exec_simple_method(GAMEZONE_CLASS, "SetSmartFanMode", FAN_MODE_CUSTOM);
                self.mgmt.exec_simple_method(GAMEZONE_CLASS, "SetIntelligentSubMode", FAN_MODE_CUSTOM);
                let value =
                    normalize_watts(watts, self.mgmt.get_feature_value(FEATURE_SUSTAINED_POWER));
                self.mgmt.set_feature_value(FEATURE_SUSTAINED_POWER, value);
                self.mgmt.set_feature_value(FEATURE_FAST_POWER, value);
            }
        }
    }

    /// Read the fan mode back and map it to a profile label.
    pub fn query_profile(&self) -> ThermalStatus {
        self.mgmt
            .invoke(GAMEZONE_CLASS, "GetSmartFanMode", &[], Some("Data"))
            .and_then(|value| value.as_i32())
            .map(ThermalStatus::from_fan_mode)
            .unwrap_or(ThermalStatus::Unknown)
    }
}

/// The sustained-power feature takes watts on some firmware revisions and
/// milliwatts on others, and the unit is not discoverable. A previously
/// stored value above 1000 can only be milliwatts, so the read-back decides
/// the multiplier. Guessing from the requested wattage alone is not enough.
fn normalize_watts(watts: u32, prior_value: i32) -> i32 {
    let multiplier = if prior_value > 1000 { 1000 } else { 1 };
    watts as i32 * multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mgmt::testing::MockManagement;
    use crate::mgmt::MgmtValue;

    #[test]
    fn fixed_profiles_are_a_single_fan_mode_write() {
        let mgmt = MockManagement::default();
        ThermalController::new(&mgmt).apply_profile(ThermalProfile::Balanced);
        let calls = mgmt.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "SetSmartFanMode");
        assert_eq!(calls[0].args, vec![("Data".to_string(), MgmtValue::Int(2))]);
    }

    #[test]
    fn custom_profile_runs_the_full_sequence_in_order() {
        let mgmt = MockManagement::default();
        ThermalController::new(&mgmt).apply_profile(ThermalProfile::Custom(20));
        let methods: Vec<String> =
            mgmt.calls.borrow().iter().map(|call| call.method.clone()).collect();
        assert_eq!(
            methods,
            vec![
                "SetDDSControlOwner",
                "SetSmartFanMode",
                "SetIntelligentSubMode",
                "GetFeatureValue",
                "SetFeatureValue",
                "SetFeatureValue",
            ]
        );
    }

    #[test]
    fn milliwatt_firmware_gets_scaled_values() {
        let mgmt = MockManagement::default();
        // Prior sustained value of 25000 means the firmware speaks milliwatts.
        mgmt.respond(crate::mgmt::FEATURE_CLASS, "GetFeatureValue", MgmtValue::Int(25_000));
        ThermalController::new(&mgmt).apply_profile(ThermalProfile::Custom(20));
        let writes = mgmt.calls_named("SetFeatureValue");
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].args[0], ("IDs".to_string(), MgmtValue::Int(FEATURE_SUSTAINED_POWER)));
        assert_eq!(writes[0].args[1], ("Value".to_string(), MgmtValue::Int(20_000)));
        assert_eq!(writes[1].args[0], ("IDs".to_string(), MgmtValue::Int(FEATURE_FAST_POWER)));
        assert_eq!(writes[1].args[1], ("Value".to_string(), MgmtValue::Int(20_000)));
    }

    #[test]
    fn watt_firmware_gets_raw_values() {
        let mgmt = MockManagement::default();
        mgmt.respond(crate::mgmt::FEATURE_CLASS, "GetFeatureValue", MgmtValue::Int(20));
        ThermalController::new(&mgmt).apply_profile(ThermalProfile::Custom(20));
        let writes = mgmt.calls_named("SetFeatureValue");
        assert_eq!(writes[0].args[1], ("Value".to_string(), MgmtValue::Int(20)));
    }

    #[test]
    fn absent_feature_reads_as_zero_and_stays_in_watt_units() {
        // Feature read fails entirely -> 0 -> watt multiplier.
        assert_eq!(normalize_watts(15, 0), 15);
        assert_eq!(normalize_watts(15, 1000), 15);
        assert_eq!(normalize_watts(15, 1001), 15_000);
    }

    #[test]
    fn out_of_range_wattage_is_clamped_before_reaching_hardware() {
        let mgmt = MockManagement::default();
        ThermalController::new(&mgmt).apply_profile(ThermalProfile::Custom(250));
        let writes = mgmt.calls_named("SetFeatureValue");
        assert_eq!(writes[0].args[1], ("Value".to_string(), MgmtValue::Int(30)));
    }

    #[test]
    fn query_profile_maps_fan_modes_and_failures() {
        let mgmt = MockManagement::default();
        mgmt.respond(GAMEZONE_CLASS, "GetSmartFanMode", MgmtValue::Int(3));
        assert_eq!(ThermalController::new(&mgmt).query_profile(), ThermalStatus::Performance);

        let absent = MockManagement { absent: true, ..Default::default() };
        assert_eq!(ThermalController::new(&absent).query_profile(), ThermalStatus::Unknown);
    }
}
