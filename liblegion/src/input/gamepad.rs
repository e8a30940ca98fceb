//! Controller-to-pointer translation.
//!
//! Polls the gamepad at a fixed short interval while the input mode is
//! Analog: right stick becomes relative pointer motion after deadzone
//! shaping, the right shoulder mirrors the left button, the right trigger
//! mirrors the right button. Button emission is edge-triggered so holding a
//! control never repeat-fires, and held buttons are released when the mode
//! leaves Analog.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::input::mouse::{PointerButton, PointerSink};
use crate::state::SharedState;
use crate::types::InputMode;

/// Polling cadence.
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Raw stick deflection treated as centered.
pub const STICK_DEADZONE: i32 = 8000;
/// Analog trigger depth that counts as pressed.
pub const TRIGGER_THRESHOLD: u8 = 30;
/// Sensitivity slider units map to this motion multiplier.
pub const SENSE_FACTOR: f64 = 0.0005;

/// Raw right-stick and click-source sample from the OS controller API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PadSample {
    pub stick_x: i16,
    pub stick_y: i16,
    pub shoulder: bool,
    pub trigger: u8,
}

/// Supplies controller samples; `None` while no controller is connected.
pub trait GamepadSource {
    fn sample(&mut self) -> Option<PadSample>;
}

/// First XInput user slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct XInputSource;

#[cfg(windows)]
impl GamepadSource for XInputSource {
    fn sample(&mut self) -> Option<PadSample> {
        use windows::Win32::Foundation::ERROR_SUCCESS;
        use windows::Win32::UI::Input::XboxController::{
            XInputGetState, XINPUT_GAMEPAD_RIGHT_SHOULDER, XINPUT_STATE,
        };

        let mut state = XINPUT_STATE::default();
        let result = unsafe { XInputGetState(0, &mut state) };
        if result != ERROR_SUCCESS.0 {
            return None;
        }
        let pad = state.Gamepad;
        Some(PadSample {
            stick_x: pad.sThumbRX,
            stick_y: pad.sThumbRY,
            shoulder: pad.wButtons.contains(XINPUT_GAMEPAD_RIGHT_SHOULDER),
            trigger: pad.bRightTrigger,
        })
    }
}

#[cfg(not(windows))]
impl GamepadSource for XInputSource {
    fn sample(&mut self) -> Option<PadSample> {
        None
    }
}

/// Symmetric deadzone shaping: deflection inside the zone reads as zero,
/// outside it the zone width is subtracted so motion ramps from zero
/// instead of jumping.
pub fn shape_axis(raw: i16, deadzone: i32) -> i32 {
    let value = i32::from(raw);
    if value.abs() < deadzone {
        0
    } else if value > 0 {
        value - deadzone
    } else {
        value + deadzone
    }
}

/// Stateful sample-to-pointer translation (button latches).
#[derive(Debug, Default)]
pub struct PadTranslator {
    shoulder_down: bool,
    trigger_down: bool,
}

impl PadTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate<S: PointerSink>(&mut self, sample: PadSample, sensitivity: u32, sink: &mut S) {
        let shaped_x = shape_axis(sample.stick_x, STICK_DEADZONE);
        let shaped_y = shape_axis(sample.stick_y, STICK_DEADZONE);
        if shaped_x != 0 || shaped_y != 0 {
            let factor = f64::from(sensitivity) * SENSE_FACTOR;
            // Stick up is positive, screen up is negative.
            sink.move_by(
                (f64::from(shaped_x) * factor) as i32,
                (-f64::from(shaped_y) * factor) as i32,
            );
        }

        let shoulder = sample.shoulder;
        if shoulder != self.shoulder_down {
            sink.button(PointerButton::Left, shoulder);
            self.shoulder_down = shoulder;
        }
        let trigger = sample.trigger > TRIGGER_THRESHOLD;
        if trigger != self.trigger_down {
            sink.button(PointerButton::Right, trigger);
            self.trigger_down = trigger;
        }
    }

    /// Release anything still held; called when the loop loses the right to
    /// emit input so a click can never stay stuck across a mode switch.
    pub fn release_all<S: PointerSink>(&mut self, sink: &mut S) {
        if self.shoulder_down {
            sink.button(PointerButton::Left, false);
            self.shoulder_down = false;
        }
        if self.trigger_down {
            sink.button(PointerButton::Right, false);
            self.trigger_down = false;
        }
    }
}

/// Start the polling loop on its own thread.
pub fn spawn_gamepad_loop<S>(shared: Arc<SharedState>, sink: S) -> JoinHandle<()>
where
    S: PointerSink + Send + 'static,
{
    thread::spawn(move || run_gamepad_loop(&shared, XInputSource, sink))
}

fn run_gamepad_loop<G, S>(shared: &SharedState, mut source: G, mut sink: S)
where
    G: GamepadSource,
    S: PointerSink,
{
    let mut translator = PadTranslator::new();
    while shared.is_running() {
        if shared.input_mode() == InputMode::Analog {
            if let Some(sample) = source.sample() {
                translator.translate(sample, shared.sensitivity(), &mut sink);
            }
        } else {
            translator.release_all(&mut sink);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
