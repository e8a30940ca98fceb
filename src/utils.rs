// Small helpers shared across the shell.

/// Collapse whitespace and strip line breaks from strings read out of
/// firmware tables before they hit the UI.
pub fn clean_display_string(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Short feedback tone. Callers check the shared mute flag first.
#[cfg(windows)]
pub fn beep(frequency: u32) {
    use windows::Win32::System::Diagnostics::Debug::Beep;
    unsafe {
        let _ = Beep(frequency, 100);
    }
}

#[cfg(not(windows))]
pub fn beep(_frequency: u32) {}

/// Tone frequency acknowledging a thermal profile change.
pub fn thermal_beep_frequency(fan_mode_id: i32) -> u32 {
    match fan_mode_id {
        1 => 800,
        2 => 900,
        3 => 1000,
        255 => 1100,
        _ => 800,
    }
}
