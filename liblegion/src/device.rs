//! Raw HID device discovery and handles.
//!
//! One physical interface carries everything this crate reads and writes:
//! 64-byte input reports (touch samples, the side button) and 65-byte output
//! reports (lighting). Consumers never share a handle. The two read loops
//! each hold their own for as long as it works; the lighting path opens a
//! fresh one per packet.

use std::ffi::CString;

use anyhow::{anyhow, Context, Result};
use hidapi::{HidApi, HidDevice};

/// Path signature of the controller interface (vendor 0x17EF, product
/// 0x61EB, interface 2). The full device path varies per machine; the
/// signature substring does not.
pub const DEVICE_SIGNATURE: &str = "vid_17ef&pid_61eb&mi_02";

/// Input reports are a fixed 64 bytes.
pub const INPUT_REPORT_LEN: usize = 64;

/// Locate the controller interface among all HID interfaces.
pub fn find_device_path() -> Result<CString> {
    let api = HidApi::new().context("HID enumeration unavailable")?;
    find_path_in(&api)
}

fn find_path_in(api: &HidApi) -> Result<CString> {
    api.device_list()
        .map(|info| info.path())
        .find(|path| path.to_string_lossy().to_ascii_lowercase().contains(DEVICE_SIGNATURE))
        .map(|path| path.to_owned())
        .ok_or_else(|| anyhow!("no HID interface matching {DEVICE_SIGNATURE}"))
}

/// Open a fresh exclusive handle to the controller interface.
pub fn open() -> Result<HidDevice> {
    let api = HidApi::new().context("HID enumeration unavailable")?;
    let path = find_path_in(&api)?;
    api.open_path(&path)
        .with_context(|| format!("opening HID device {}", path.to_string_lossy()))
}
