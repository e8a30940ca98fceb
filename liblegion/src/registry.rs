//! HKCU registry toggles: start-with-Windows and the Game Bar capture
//! switch that steals focus from popup windows.

use anyhow::Result;

/// Value name under the Run key.
pub const RUN_VALUE: &str = "GO-Helper";

#[cfg(windows)]
mod imp {
    use anyhow::{Context, Result};
    use winreg::enums::{HKEY_CURRENT_USER, KEY_READ, KEY_SET_VALUE};
    use winreg::RegKey;

    use super::RUN_VALUE;

    const RUN_KEY: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Run";

    pub fn autostart_enabled() -> bool {
        RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(RUN_KEY, KEY_READ)
            .and_then(|key| key.get_value::<String, _>(RUN_VALUE))
            .is_ok()
    }

    pub fn set_autostart(enable: bool) -> Result<()> {
        let key = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey_with_flags(RUN_KEY, KEY_SET_VALUE)
            .context("opening the Run key")?;
        if enable {
            let exe = std::env::current_exe().context("resolving the executable path")?;
            key.set_value(RUN_VALUE, &exe.to_string_lossy().to_string())
                .context("writing the Run value")?;
        } else {
            key.delete_value(RUN_VALUE).context("removing the Run value")?;
        }
        Ok(())
    }

    pub fn disable_game_bar() -> Result<()> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (capture, _) = hkcu
            .create_subkey("Software\\Microsoft\\Windows\\CurrentVersion\\GameDVR")
            .context("opening the GameDVR key")?;
        capture.set_value("AppCaptureEnabled", &0u32).context("disabling app capture")?;
        let (store, _) =
            hkcu.create_subkey("System\\GameConfigStore").context("opening GameConfigStore")?;
        store.set_value("GameDVR_Enabled", &0u32).context("disabling Game DVR")?;
        Ok(())
    }
}

#[cfg(windows)]
pub use imp::{autostart_enabled, disable_game_bar, set_autostart};

#[cfg(not(windows))]
pub fn autostart_enabled() -> bool {
    false
}

#[cfg(not(windows))]
pub fn set_autostart(_enable: bool) -> Result<()> {
    Ok(())
}

#[cfg(not(windows))]
pub fn disable_game_bar() -> Result<()> {
    Ok(())
}
