// Battery / AC status read from the system power API.

use anyhow::Result;

/// Snapshot of the system power source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub ac_power: bool,
    /// Charge percent, absent when the firmware does not report one.
    pub percent: Option<u8>,
}

impl BatteryStatus {
    pub fn describe(&self) -> String {
        let source = if self.ac_power { "Plugged In" } else { "Discharging" };
        match self.percent {
            Some(pct) => format!("Battery: {source} @ {pct}%"),
            None => format!("Battery: {source}"),
        }
    }
}

#[cfg(target_os = "windows")]
pub fn get_battery_status() -> Result<BatteryStatus> {
    use windows::Win32::System::Power::{GetSystemPowerStatus, SYSTEM_POWER_STATUS};

    unsafe {
        let mut status: SYSTEM_POWER_STATUS = std::mem::zeroed();
        if GetSystemPowerStatus(&mut status).is_ok() {
            let percent = match status.BatteryLifePercent {
                255 => None,
                pct => Some(pct),
            };
            Ok(BatteryStatus { ac_power: status.ACLineStatus == 1, percent })
        } else {
            Ok(BatteryStatus { ac_power: true, percent: None })
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub fn get_battery_status() -> Result<BatteryStatus> {
    Ok(BatteryStatus { ac_power: true, percent: None })
}
