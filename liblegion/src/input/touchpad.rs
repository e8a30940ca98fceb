//! Touchpad gesture tracking: raw contact samples in, pointer motion and
//! tap clicks out.
//!
//! Per-contact lifecycle: NoContact → Down (first sample) → Moving, with a
//! tap candidate that survives until it drifts too far or times out. The
//! tracker is pure; the polling loop around it owns the device handle and
//! the input-mode gate.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::device::{self, INPUT_REPORT_LEN};
use crate::input::mouse::{PointerButton, PointerSink};
use crate::input::report::{LegionReports, ReportDecoder, TouchPoint, PAD_MIDLINE};
use crate::state::SharedState;
use crate::types::InputMode;

/// A contact released within this window can still be a tap.
pub const TAP_TIMEOUT: Duration = Duration::from_millis(200);
/// Accumulated |dx|+|dy| from the tap start that invalidates a tap.
pub const TAP_DRIFT_TOLERANCE: i32 = 20;
/// Exponential smoothing factor for motion deltas.
const SMOOTHING: f64 = 0.5;
/// Sensitivity slider units map to this fraction of pad units per pixel.
const SENSE_SCALE: f64 = 0.3;

/// Delay before retrying after the device disappears.
const REOPEN_DELAY: Duration = Duration::from_millis(1000);
/// Delay after a read error before reopening.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// What one sample produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GestureOutput {
    pub motion: Option<(i32, i32)>,
    pub click: Option<PointerButton>,
}

#[derive(Debug, Clone, Copy)]
struct TapCandidate {
    x: i32,
    y: i32,
    started: Instant,
}

/// Per-contact gesture state machine.
#[derive(Debug, Default)]
pub struct GestureTracker {
    /// Last valid sample position, `None` while no contact.
    last: Option<(f64, f64)>,
    /// Smoothed sub-pixel remainder carried between samples.
    rem_x: f64,
    rem_y: f64,
    tap: Option<TapCandidate>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all gesture state without emitting anything. Called when contact
    /// tracking must not survive: the input mode left Touchpad, or the
    /// device went away.
    pub fn reset(&mut self) {
        self.last = None;
        self.tap = None;
        self.rem_x = 0.0;
        self.rem_y = 0.0;
    }

    pub fn on_sample(
        &mut self,
        contact: Option<TouchPoint>,
        sensitivity: u32,
        now: Instant,
    ) -> GestureOutput {
        match contact {
            Some(point) => self.on_contact(point, sensitivity, now),
            None => self.on_release(now),
        }
    }

    fn on_contact(&mut self, point: TouchPoint, sensitivity: u32, now: Instant) -> GestureOutput {
        let mut output = GestureOutput::default();
        if let Some((last_x, last_y)) = self.last {
            let scale = f64::from(sensitivity) * SENSE_SCALE;
            let delta_x = (f64::from(point.x) - last_x) * scale;
            let delta_y = (f64::from(point.y) - last_y) * scale;

            if let Some(tap) = self.tap {
                let drift = (point.x - tap.x).abs() + (point.y - tap.y).abs();
                if drift > TAP_DRIFT_TOLERANCE {
                    self.tap = None;
                }
            }

            // Smooth into the remainder, emit the integer part, carry the
            // fraction forward. Dropping the carry would swallow slow
            // movements entirely.
            self.rem_x = SMOOTHING * delta_x + (1.0 - SMOOTHING) * self.rem_x;
            self.rem_y = SMOOTHING * delta_y + (1.0 - SMOOTHING) * self.rem_y;
            let move_x = self.rem_x as i32;
            let move_y = self.rem_y as i32;
            if move_x != 0 || move_y != 0 {
                self.rem_x -= f64::from(move_x);
                self.rem_y -= f64::from(move_y);
                output.motion = Some((move_x, move_y));
            }
        } else {
            // First sample of a new contact.
            self.rem_x = 0.0;
            self.rem_y = 0.0;
            self.tap = Some(TapCandidate { x: point.x, y: point.y, started: now });
        }
        self.last = Some((f64::from(point.x), f64::from(point.y)));
        output
    }

    fn on_release(&mut self, now: Instant) -> GestureOutput {
        let click = self.tap.take().and_then(|tap| {
            if now.duration_since(tap.started) < TAP_TIMEOUT {
                Some(if tap.x < PAD_MIDLINE { PointerButton::Left } else { PointerButton::Right })
            } else {
                None
            }
        });
        self.last = None;
        GestureOutput { motion: None, click }
    }
}

/// Start the touchpad polling loop on its own thread. The loop holds its own
/// device handle, reopening with backoff for as long as the process runs.
pub fn spawn_tracker<S>(shared: Arc<SharedState>, sink: S) -> JoinHandle<()>
where
    S: PointerSink + Send + 'static,
{
    thread::spawn(move || run_tracker(&shared, sink, LegionReports))
}

fn run_tracker<S, D>(shared: &SharedState, mut sink: S, decoder: D)
where
    S: PointerSink,
    D: ReportDecoder,
{
    let mut tracker = GestureTracker::new();
    while shared.is_running() {
        let handle = match device::open() {
            Ok(handle) => handle,
            Err(error) => {
                debug!("touchpad device not available: {error:#}");
                thread::sleep(REOPEN_DELAY);
                continue;
            }
        };
        while shared.is_running() {
            let mut report = [0u8; INPUT_REPORT_LEN];
            match handle.read(&mut report) {
                Ok(_) => {
                    if shared.input_mode() != InputMode::Touchpad {
                        // Never let a gesture straddle a mode switch.
                        tracker.reset();
                        continue;
                    }
                    let output = tracker.on_sample(
                        decoder.touch(&report),
                        shared.sensitivity(),
                        Instant::now(),
                    );
                    if let Some((dx, dy)) = output.motion {
                        sink.move_by(dx, dy);
                    }
                    if let Some(button) = output.click {
                        sink.click(button);
                    }
                }
                Err(error) => {
                    warn!("touchpad read failed, reopening: {error}");
                    tracker.reset();
                    break;
                }
            }
        }
        thread::sleep(RETRY_DELAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::mouse::testing::RecordingPointer;

    fn point(x: i32, y: i32) -> Option<TouchPoint> {
        Some(TouchPoint { x, y })
    }

    fn advance(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    #[test]
    fn quick_left_side_tap_clicks_left() {
        let mut tracker = GestureTracker::new();
        let start = Instant::now();
        tracker.on_sample(point(200, 400), 5, start);
        let output = tracker.on_sample(None, 5, advance(start, 120));
        assert_eq!(output.click, Some(PointerButton::Left));
        assert_eq!(output.motion, None);
    }

    #[test]
    fn quick_right_side_tap_clicks_right() {
        let mut tracker = GestureTracker::new();
        let start = Instant::now();
        tracker.on_sample(point(700, 400), 5, start);
        let output = tracker.on_sample(None, 5, advance(start, 120));
        assert_eq!(output.click, Some(PointerButton::Right));
    }

    #[test]
    fn slow_release_is_not_a_tap() {
        let mut tracker = GestureTracker::new();
        let start = Instant::now();
        tracker.on_sample(point(200, 400), 5, start);
        let output = tracker.on_sample(None, 5, advance(start, 250));
        assert_eq!(output.click, None);
    }

    #[test]
    fn drift_beyond_tolerance_invalidates_the_tap() {
        let mut tracker = GestureTracker::new();
        let start = Instant::now();
        tracker.on_sample(point(200, 400), 5, start);
        // 15 + 10 = 25 units of drift, past the tolerance of 20.
        tracker.on_sample(point(215, 410), 5, advance(start, 30));
        let output = tracker.on_sample(None, 5, advance(start, 90));
        assert_eq!(output.click, None);
    }

    #[test]
    fn drift_within_tolerance_keeps_the_tap_alive() {
        let mut tracker = GestureTracker::new();
        let start = Instant::now();
        tracker.on_sample(point(200, 400), 5, start);
        tracker.on_sample(point(205, 405), 5, advance(start, 30));
        let output = tracker.on_sample(None, 5, advance(start, 90));
        assert_eq!(output.click, Some(PointerButton::Left));
    }

    #[test]
    fn remainder_carry_turns_sub_pixel_deltas_into_motion() {
        let mut tracker = GestureTracker::new();
        let start = Instant::now();
        // Sensitivity 2 -> scale 0.6; 2-unit steps give smoothed deltas of
        // 0.6, 0.9, 1.05, ... — the third sample only crosses 1.0 because
        // the fractional remainder of the first two is carried forward.
        tracker.on_sample(point(100, 500), 2, start);
        let mut motions = Vec::new();
        for step in 1..=6 {
            let output =
                tracker.on_sample(point(100 + step * 2, 500), 2, advance(start, step as u64 * 10));
            motions.push(output.motion);
        }
        assert_eq!(
            motions,
            vec![None, None, Some((1, 0)), None, None, Some((1, 0))]
        );
    }

    #[test]
    fn steady_drag_emits_motion_every_sample() {
        let mut tracker = GestureTracker::new();
        let start = Instant::now();
        // Sensitivity 10 -> scale 3.0; smoothing halves the first delta and
        // the carry keeps the stream at one pixel per sample thereafter.
        tracker.on_sample(point(100, 500), 10, start);
        for step in 1..=4 {
            let output =
                tracker.on_sample(point(100 + step, 500), 10, advance(start, step as u64 * 10));
            assert_eq!(output.motion, Some((1, 0)), "sample {step}");
        }
    }

    #[test]
    fn no_systematic_loss_across_contacts() {
        let mut tracker = GestureTracker::new();
        let start = Instant::now();
        tracker.on_sample(point(500, 500), 10, start);
        let output = tracker.on_sample(point(510, 500), 10, advance(start, 10));
        // 10 units * 10 * 0.3 = 30, halved by smoothing on the first step.
        assert_eq!(output.motion, Some((15, 0)));
    }

    #[test]
    fn reset_mid_contact_never_replays_the_gesture() {
        let mut tracker = GestureTracker::new();
        let start = Instant::now();
        tracker.on_sample(point(200, 400), 5, start);
        // Mode leaves Touchpad: the loop resets the tracker.
        tracker.reset();
        // Mode returns; the release that eventually arrives is not a tap,
        // and the next contact starts from scratch.
        let output = tracker.on_sample(None, 5, advance(start, 50));
        assert_eq!(output.click, None);
        let output = tracker.on_sample(point(220, 420), 5, advance(start, 60));
        assert_eq!(output.motion, None);
    }

    #[test]
    fn release_through_the_sink_is_a_full_click() {
        let mut sink = RecordingPointer::default();
        sink.click(PointerButton::Left);
        assert_eq!(
            sink.clicks(),
            vec![(PointerButton::Left, true), (PointerButton::Left, false)]
        );
    }
}
