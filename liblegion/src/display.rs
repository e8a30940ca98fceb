//! Screen refresh rate and panel brightness.
//!
//! Refresh rate goes through the display-mode API and is fire-and-forget at
//! the OS level: the mode switch lands seconds later, so a confirmation
//! re-read must wait out a cooldown or it races the switch and reads stale
//! data. Brightness goes through the management layer and is applied to
//! every monitor-brightness instance (a no-op when none exist).

use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;

use crate::mgmt::{Management, MgmtValue, HARDWARE_NAMESPACE};
use crate::state::{CoreEvent, EventSender};

/// Monitor-brightness method class.
pub const BRIGHTNESS_CLASS: &str = "WmiMonitorBrightnessMethods";
const BRIGHTNESS_QUERY: &str = "SELECT CurrentBrightness FROM WmiMonitorBrightness";

/// How long to wait before re-reading the mode after a refresh-rate change.
pub const REFRESH_CONFIRM_COOLDOWN: Duration = Duration::from_secs(4);
/// Brightness poll differences at or below this are treated as noise.
pub const BRIGHTNESS_DRIFT_THRESHOLD: u8 = 5;

/// Reads and requests display modes. One production implementation; tests
/// substitute their own so the confirm task is deterministic.
pub trait RefreshRate {
    /// Currently active refresh rate in Hz.
    fn current(&self) -> u32;
    /// Request a mode switch; takes effect asynchronously.
    fn request(&self, hz: u32);
}

/// Display-mode API implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct GdiRefresh;

#[cfg(windows)]
impl RefreshRate for GdiRefresh {
    fn current(&self) -> u32 {
        use windows::core::PCWSTR;
        use windows::Win32::Graphics::Gdi::{EnumDisplaySettingsW, DEVMODEW, ENUM_CURRENT_SETTINGS};

        unsafe {
            let mut mode = DEVMODEW {
                dmSize: std::mem::size_of::<DEVMODEW>() as u16,
                ..Default::default()
            };
            if EnumDisplaySettingsW(PCWSTR::null(), ENUM_CURRENT_SETTINGS, &mut mode).as_bool() {
                mode.dmDisplayFrequency
            } else {
                60
            }
        }
    }

    fn request(&self, hz: u32) {
        use windows::core::PCWSTR;
        use windows::Win32::Graphics::Gdi::{
            ChangeDisplaySettingsW, EnumDisplaySettingsW, CDS_UPDATEREGISTRY, DEVMODEW,
            DISP_CHANGE_SUCCESSFUL, DM_DISPLAYFREQUENCY, ENUM_CURRENT_SETTINGS,
        };

        unsafe {
            let mut mode = DEVMODEW {
                dmSize: std::mem::size_of::<DEVMODEW>() as u16,
                ..Default::default()
            };
            if !EnumDisplaySettingsW(PCWSTR::null(), ENUM_CURRENT_SETTINGS, &mut mode).as_bool() {
                warn!("could not read the current display mode");
                return;
            }
            mode.dmDisplayFrequency = hz;
            mode.dmFields = DM_DISPLAYFREQUENCY;
            let status = ChangeDisplaySettingsW(Some(&mode), CDS_UPDATEREGISTRY);
            if status != DISP_CHANGE_SUCCESSFUL {
                warn!("display mode switch to {hz} Hz returned {status:?}");
            }
        }
    }
}

#[cfg(not(windows))]
impl RefreshRate for GdiRefresh {
    fn current(&self) -> u32 {
        60
    }

    fn request(&self, _hz: u32) {}
}

pub struct DisplayController<M: Management> {
    mgmt: M,
}

impl<M: Management + Clone> Clone for DisplayController<M> {
    fn clone(&self) -> Self {
        DisplayController { mgmt: self.mgmt.clone() }
    }
}

impl<M: Management> DisplayController<M> {
    pub fn new(mgmt: M) -> Self {
        DisplayController { mgmt }
    }

    /// Current panel brightness, absent when no brightness instance exists.
    pub fn brightness_pct(&self) -> Option<u8> {
        self.mgmt
            .query_scalar(HARDWARE_NAMESPACE, BRIGHTNESS_QUERY, "CurrentBrightness")
            .and_then(|value| value.as_i32())
            .map(|value| value.clamp(0, 100) as u8)
    }

    /// Set brightness on every panel that has a brightness instance. The
    /// hardware applies the change asynchronously relative to this call.
    pub fn set_brightness_pct(&self, pct: u8) {
        let pct = pct.min(100);
        self.mgmt.invoke_all(
            BRIGHTNESS_CLASS,
            "WmiSetBrightness",
            &[("Timeout", MgmtValue::Int(1)), ("Brightness", MgmtValue::Byte(pct))],
        );
    }
}

/// Request a refresh-rate change, wait out the cooldown, then post the
/// confirmed rate. The handle is returned so callers (and tests) own the
/// task instead of leaking a detached thread.
pub fn apply_refresh_rate<R>(
    backend: R,
    hz: u32,
    cooldown: Duration,
    events: EventSender,
) -> JoinHandle<()>
where
    R: RefreshRate + Send + 'static,
{
    thread::spawn(move || {
        backend.request(hz);
        thread::sleep(cooldown);
        let _ = events.send(CoreEvent::RefreshRateConfirmed(backend.current()));
    })
}

/// Re-read brightness off the UI thread and post a drift event when the
/// hardware moved more than the threshold away from what the UI shows.
pub fn poll_brightness_drift<M>(
    display: DisplayController<M>,
    shown_pct: u8,
    events: EventSender,
) -> JoinHandle<()>
where
    M: Management + Send + 'static,
{
    thread::spawn(move || {
        if let Some(actual) = display.brightness_pct() {
            if actual.abs_diff(shown_pct) > BRIGHTNESS_DRIFT_THRESHOLD {
                let _ = events.send(CoreEvent::BrightnessDrifted(actual));
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::mgmt::testing::MockManagement;
    use crate::state::event_channel;

    struct FakeRefresh {
        requested: Arc<AtomicU32>,
        reports: u32,
    }

    impl RefreshRate for FakeRefresh {
        fn current(&self) -> u32 {
            self.reports
        }

        fn request(&self, hz: u32) {
            self.requested.store(hz, Ordering::SeqCst);
        }
    }

    #[test]
    fn refresh_confirm_posts_the_re_read_rate() {
        let requested = Arc::new(AtomicU32::new(0));
        let backend = FakeRefresh { requested: requested.clone(), reports: 144 };
        let (tx, rx) = event_channel();
        let task = apply_refresh_rate(backend, 144, Duration::ZERO, tx);
        task.join().unwrap();
        assert_eq!(requested.load(Ordering::SeqCst), 144);
        assert_eq!(rx.recv().unwrap(), CoreEvent::RefreshRateConfirmed(144));
    }

    #[test]
    fn confirm_reports_what_the_hardware_settled_on() {
        // The OS refused the switch; the confirm must carry the real rate.
        let backend = FakeRefresh { requested: Arc::new(AtomicU32::new(0)), reports: 60 };
        let (tx, rx) = event_channel();
        apply_refresh_rate(backend, 144, Duration::ZERO, tx).join().unwrap();
        assert_eq!(rx.recv().unwrap(), CoreEvent::RefreshRateConfirmed(60));
    }

    #[test]
    fn brightness_set_targets_every_instance_with_timeout_and_byte_value() {
        let mgmt = MockManagement::default();
        DisplayController::new(&mgmt).set_brightness_pct(70);
        let calls = mgmt.calls_named("WmiSetBrightness");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].class, BRIGHTNESS_CLASS);
        assert_eq!(
            calls[0].args,
            vec![
                ("Timeout".to_string(), crate::mgmt::MgmtValue::Int(1)),
                ("Brightness".to_string(), crate::mgmt::MgmtValue::Byte(70)),
            ]
        );
    }

    #[test]
    fn brightness_set_clamps_percentage() {
        let mgmt = MockManagement::default();
        DisplayController::new(&mgmt).set_brightness_pct(200);
        let calls = mgmt.calls_named("WmiSetBrightness");
        assert_eq!(calls[0].args[1], ("Brightness".to_string(), crate::mgmt::MgmtValue::Byte(100)));
    }

    #[test]
    fn brightness_read_is_absent_without_instances() {
        let mgmt = MockManagement { absent: true, ..Default::default() };
        assert_eq!(DisplayController::new(&mgmt).brightness_pct(), None);
    }

    #[test]
    fn drift_poll_fires_only_past_the_threshold() {
        let mgmt = MockManagement::default();
        mgmt.rows.borrow_mut().insert(
            "CurrentBrightness".to_string(),
            vec![crate::mgmt::MgmtValue::Byte(80)],
        );

        let (tx, rx) = event_channel();
        poll_brightness_drift(DisplayController::new(mgmt), 50, tx).join().unwrap();
        assert_eq!(rx.recv().unwrap(), CoreEvent::BrightnessDrifted(80));

        let close = MockManagement::default();
        close.rows.borrow_mut().insert(
            "CurrentBrightness".to_string(),
            vec![crate::mgmt::MgmtValue::Byte(52)],
        );
        let (tx, rx) = event_channel();
        poll_brightness_drift(DisplayController::new(close), 50, tx).join().unwrap();
        assert!(rx.try_recv().is_err());
    }
}
