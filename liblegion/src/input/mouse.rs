//! Synthetic pointer output.

/// Pointer buttons the loops can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
}

/// Sink for synthetic pointer events. Production injects into the OS input
/// queue; tests record what the loops emitted.
pub trait PointerSink {
    fn move_by(&mut self, dx: i32, dy: i32);
    fn button(&mut self, button: PointerButton, pressed: bool);

    fn click(&mut self, button: PointerButton) {
        self.button(button, true);
        self.button(button, false);
    }
}

/// OS input-queue injection.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPointer;

#[cfg(windows)]
mod system {
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
        MOUSEEVENTF_MOVE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEINPUT,
        MOUSE_EVENT_FLAGS,
    };

    use super::{PointerButton, PointerSink, SystemPointer};

    fn send(dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS) {
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT { dx, dy, mouseData: 0, dwFlags: flags, time: 0, dwExtraInfo: 0 },
            },
        };
        unsafe {
            SendInput(&[input], std::mem::size_of::<INPUT>() as i32);
        }
    }

    impl PointerSink for SystemPointer {
        fn move_by(&mut self, dx: i32, dy: i32) {
            send(dx, dy, MOUSEEVENTF_MOVE);
        }

        fn button(&mut self, button: PointerButton, pressed: bool) {
            let flags = match (button, pressed) {
                (PointerButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
                (PointerButton::Left, false) => MOUSEEVENTF_LEFTUP,
                (PointerButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
                (PointerButton::Right, false) => MOUSEEVENTF_RIGHTUP,
            };
            send(0, 0, flags);
        }
    }
}

#[cfg(not(windows))]
impl PointerSink for SystemPointer {
    fn move_by(&mut self, _dx: i32, _dy: i32) {}

    fn button(&mut self, _button: PointerButton, _pressed: bool) {}
}
