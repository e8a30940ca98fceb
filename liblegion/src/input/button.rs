//! Dedicated hardware-button listener.
//!
//! Reads the same 64-byte reports as the touchpad loop on its own handle and
//! watches a single bit. The press is edge-triggered: one event per
//! released→pressed transition, latched while held so holding the button
//! cannot repeat-fire.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use crate::device::{self, INPUT_REPORT_LEN};
use crate::input::report::{LegionReports, ReportDecoder};
use crate::state::{CoreEvent, EventSender, SharedState};

const REOPEN_DELAY: Duration = Duration::from_millis(1000);
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Start the listener thread. Runs for the process lifetime, reopening the
/// device with backoff whenever it disappears.
pub fn spawn_listener(shared: Arc<SharedState>, events: EventSender) -> JoinHandle<()> {
    thread::spawn(move || run_listener(&shared, &events, LegionReports))
}

fn run_listener<D: ReportDecoder>(shared: &SharedState, events: &EventSender, decoder: D) {
    let mut was_pressed = false;
    while shared.is_running() {
        let handle = match device::open() {
            Ok(handle) => handle,
            Err(error) => {
                debug!("button device not available: {error:#}");
                thread::sleep(REOPEN_DELAY);
                continue;
            }
        };
        while shared.is_running() {
            let mut report = [0u8; INPUT_REPORT_LEN];
            match handle.read(&mut report) {
                Ok(_) => {
                    let pressed = decoder.side_button(&report);
                    if pressed && !was_pressed {
                        let _ = events.send(CoreEvent::HardwareButtonPressed);
                        was_pressed = true;
                    } else if !pressed {
                        was_pressed = false;
                    }
                }
                Err(error) => {
                    warn!("button read failed, reopening: {error}");
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

    /// The edge logic extracted for direct exercise.
    fn feed(presses: &[bool]) -> usize {
        let mut was_pressed = false;
        let mut fired = 0;
        for &pressed in presses {
            if pressed && !was_pressed {
                fired += 1;
                was_pressed = true;
            } else if !pressed {
                was_pressed = false;
            }
        }
        fired
    }

    #[test]
    fn press_fires_once_no_matter_how_long_it_is_held() {
        assert_eq!(feed(&[false, true, true, true, false]), 1);
    }

    #[test]
    fn each_release_rearms_the_edge() {
        assert_eq!(feed(&[true, false, true, false, true]), 3);
    }
}
