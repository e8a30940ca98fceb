//! Shared state between the UI thread and the polling loops, plus the
//! core-to-UI event queue.
//!
//! The loops never hold a lock: every field is an atomic read with relaxed
//! ordering. A value changing between two reads of different fields is
//! tolerated by design; the consumers (gesture tracker, gamepad translator)
//! recover by resetting their own per-loop state.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::types::InputMode;

/// Smallest accepted sensitivity slider value.
pub const MIN_SENSITIVITY: u32 = 1;
/// Largest accepted sensitivity slider value.
pub const MAX_SENSITIVITY: u32 = 50;
/// Sensitivity applied before the user touches the slider.
pub const DEFAULT_SENSITIVITY: u32 = 5;

/// Process-wide mutable state, created once before any loop starts.
#[derive(Debug)]
pub struct SharedState {
    input_mode: AtomicU8,
    sensitivity: AtomicU32,
    muted: AtomicBool,
    running: AtomicBool,
    led_pulse: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        SharedState {
            input_mode: AtomicU8::new(InputMode::Analog.as_raw()),
            sensitivity: AtomicU32::new(DEFAULT_SENSITIVITY),
            muted: AtomicBool::new(true),
            running: AtomicBool::new(true),
            led_pulse: AtomicBool::new(false),
        }
    }

    pub fn input_mode(&self) -> InputMode {
        InputMode::from_raw(self.input_mode.load(Ordering::Relaxed))
    }

    pub fn set_input_mode(&self, mode: InputMode) {
        self.input_mode.store(mode.as_raw(), Ordering::Relaxed);
    }

    pub fn sensitivity(&self) -> u32 {
        self.sensitivity.load(Ordering::Relaxed)
    }

    pub fn set_sensitivity(&self, value: u32) {
        let value = value.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
        self.sensitivity.store(value, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn led_pulse_active(&self) -> bool {
        self.led_pulse.load(Ordering::Relaxed)
    }

    pub fn set_led_pulse_active(&self, active: bool) {
        self.led_pulse.store(active, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask every loop to exit at its next iteration. The loops are never
    /// joined; a read blocked on a device only returns on error or process
    /// exit.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events the core pushes at the UI thread. Background loops must never call
/// into UI code directly; this queue is the only crossing point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    /// The dedicated hardware button went from released to pressed.
    HardwareButtonPressed,
    /// Post-cooldown re-read of the display mode after a refresh-rate change.
    RefreshRateConfirmed(u32),
    /// Periodic brightness poll found a value away from what the UI shows
    /// (hardware keys changed it underneath us).
    BrightnessDrifted(u8),
}

pub type EventSender = Sender<CoreEvent>;

pub fn event_channel() -> (Sender<CoreEvent>, Receiver<CoreEvent>) {
    mpsc::channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_startup_expectations() {
        let state = SharedState::new();
        assert_eq!(state.input_mode(), InputMode::Analog);
        assert_eq!(state.sensitivity(), DEFAULT_SENSITIVITY);
        assert!(state.is_muted());
        assert!(state.is_running());
        assert!(!state.led_pulse_active());
    }

    #[test]
    fn sensitivity_is_clamped_at_the_command_boundary() {
        let state = SharedState::new();
        state.set_sensitivity(0);
        assert_eq!(state.sensitivity(), MIN_SENSITIVITY);
        state.set_sensitivity(500);
        assert_eq!(state.sensitivity(), MAX_SENSITIVITY);
    }

    #[test]
    fn shutdown_flips_running() {
        let state = SharedState::new();
        state.shutdown();
        assert!(!state.is_running());
    }
}
