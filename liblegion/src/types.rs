// Domain types shared between the controllers, the polling loops and the shell.

use strum_macros::{Display, EnumIter};

/// Lower bound of the custom TDP range, in watts.
pub const MIN_CUSTOM_WATTS: u32 = 9;
/// Upper bound of the custom TDP range, in watts.
pub const MAX_CUSTOM_WATTS: u32 = 30;

/// Which loop is allowed to emit synthetic pointer input.
///
/// Exactly one value is active at a time; the UI thread writes it, the
/// gamepad and touchpad loops read it on every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum InputMode {
    /// Right stick moves the pointer, RB/RT click.
    Analog,
    /// Raw touchpad reports move the pointer, taps click.
    Touchpad,
    /// Neither loop emits anything.
    Disabled,
}

impl InputMode {
    pub fn as_raw(self) -> u8 {
        match self {
            InputMode::Analog => 0,
            InputMode::Touchpad => 1,
            InputMode::Disabled => 2,
        }
    }

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => InputMode::Touchpad,
            2 => InputMode::Disabled,
            _ => InputMode::Analog,
        }
    }

    /// Next mode in the Analog → Touchpad → Disabled cycle.
    pub fn next(self) -> Self {
        match self {
            InputMode::Analog => InputMode::Touchpad,
            InputMode::Touchpad => InputMode::Disabled,
            InputMode::Disabled => InputMode::Analog,
        }
    }
}

/// A thermal profile as requested by the user.
///
/// The wattage only exists for `Custom`; the three fixed profiles map to
/// vendor profile ids and the firmware picks its own limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermalProfile {
    Quiet,
    Balanced,
    Performance,
    Custom(u32),
}

impl ThermalProfile {
    /// Vendor fan-mode id sent over the management interface.
    pub fn fan_mode_id(self) -> i32 {
        match self {
            ThermalProfile::Quiet => 1,
            ThermalProfile::Balanced => 2,
            ThermalProfile::Performance => 3,
            ThermalProfile::Custom(_) => 255,
        }
    }

    /// Custom profile with the wattage clamped into the supported range.
    pub fn custom(watts: u32) -> Self {
        ThermalProfile::Custom(watts.clamp(MIN_CUSTOM_WATTS, MAX_CUSTOM_WATTS))
    }
}

/// Profile read back from the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ThermalStatus {
    Quiet,
    Balanced,
    Performance,
    Custom,
    Unknown,
}

impl ThermalStatus {
    pub fn from_fan_mode(mode: i32) -> Self {
        match mode {
            1 => ThermalStatus::Quiet,
            2 => ThermalStatus::Balanced,
            3 => ThermalStatus::Performance,
            255 => ThermalStatus::Custom,
            _ => ThermalStatus::Unknown,
        }
    }

    /// Status-line label; the fixed profiles run firmware-defined wattages.
    pub fn describe(self) -> &'static str {
        match self {
            ThermalStatus::Quiet => "Quiet 9W",
            ThermalStatus::Balanced => "Balanced 15W",
            ThermalStatus::Performance => "Performance 20W",
            ThermalStatus::Custom => "Custom",
            ThermalStatus::Unknown => "Unknown",
        }
    }
}

/// An RGB color as carried in the lighting packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

/// Lighting effect selected for the two LED zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum LedMode {
    /// Brightness 0 with the color preserved; the hardware has no off command.
    Off,
    /// Steady color at the configured brightness.
    Static,
    /// Firmware rainbow effect.
    Rainbow,
    /// Software-driven brightness sweep of the static color.
    Pulse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn input_mode_raw_round_trip() {
        for mode in InputMode::iter() {
            assert_eq!(InputMode::from_raw(mode.as_raw()), mode);
        }
        // Out-of-range storage decays to the default.
        assert_eq!(InputMode::from_raw(7), InputMode::Analog);
    }

    #[test]
    fn input_mode_cycles_through_all_three() {
        let mut mode = InputMode::Analog;
        for _ in 0..3 {
            mode = mode.next();
        }
        assert_eq!(mode, InputMode::Analog);
    }

    #[test]
    fn custom_watts_clamped_to_supported_range() {
        assert_eq!(ThermalProfile::custom(4), ThermalProfile::Custom(9));
        assert_eq!(ThermalProfile::custom(20), ThermalProfile::Custom(20));
        assert_eq!(ThermalProfile::custom(90), ThermalProfile::Custom(30));
    }

    #[test]
    fn fan_mode_ids_match_vendor_contract() {
        assert_eq!(ThermalProfile::Quiet.fan_mode_id(), 1);
        assert_eq!(ThermalProfile::Balanced.fan_mode_id(), 2);
        assert_eq!(ThermalProfile::Performance.fan_mode_id(), 3);
        assert_eq!(ThermalProfile::Custom(15).fan_mode_id(), 255);
    }

    #[test]
    fn fan_mode_read_back_mapping() {
        assert_eq!(ThermalStatus::from_fan_mode(2), ThermalStatus::Balanced);
        assert_eq!(ThermalStatus::from_fan_mode(255), ThermalStatus::Custom);
        assert_eq!(ThermalStatus::from_fan_mode(0), ThermalStatus::Unknown);
        assert_eq!(ThermalStatus::from_fan_mode(42), ThermalStatus::Unknown);
    }
}
