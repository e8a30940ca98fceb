//! Status line shown in the header.
//!
//! One message at a time: new messages replace the current one immediately,
//! errors linger longer than routine status, and expired messages fade out
//! instead of vanishing.

use std::time::{Duration, Instant};

/// Visual category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// How long the fade-out runs once a message expires.
pub const FADE_DURATION: Duration = Duration::from_millis(1500);

const INFO_LIFETIME: Duration = Duration::from_secs(3);
const ERROR_LIFETIME: Duration = Duration::from_secs(8);

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
    shown_at: Instant,
}

impl StatusLine {
    fn lifetime(&self) -> Duration {
        match self.kind {
            StatusKind::Info => INFO_LIFETIME,
            StatusKind::Error => ERROR_LIFETIME,
        }
    }

    /// 1.0 while fully visible, falling to 0.0 across the fade window.
    pub fn opacity(&self) -> f32 {
        let elapsed = self.shown_at.elapsed();
        let lifetime = self.lifetime();
        if elapsed <= lifetime {
            return 1.0;
        }
        let fading = (elapsed - lifetime).as_secs_f32() / FADE_DURATION.as_secs_f32();
        (1.0 - fading).max(0.0)
    }

    pub fn is_gone(&self) -> bool {
        self.shown_at.elapsed() > self.lifetime() + FADE_DURATION
    }
}

/// Owner of the current status line.
#[derive(Debug, Default)]
pub struct MessageCenter {
    current: Option<StatusLine>,
}

impl MessageCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.show(text.into(), StatusKind::Info);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.show(text.into(), StatusKind::Error);
    }

    fn show(&mut self, text: String, kind: StatusKind) {
        self.current = Some(StatusLine { text, kind, shown_at: Instant::now() });
    }

    /// Drop the message once its fade has completed. Call once per frame.
    pub fn tick(&mut self) {
        if self.current.as_ref().is_some_and(StatusLine::is_gone) {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&StatusLine> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_messages_replace_the_current_one() {
        let mut center = MessageCenter::new();
        center.info("first");
        center.error("second");
        let line = center.current().unwrap();
        assert_eq!(line.text, "second");
        assert_eq!(line.kind, StatusKind::Error);
    }

    #[test]
    fn fresh_messages_are_fully_opaque() {
        let mut center = MessageCenter::new();
        center.info("hello");
        assert_eq!(center.current().unwrap().opacity(), 1.0);
        center.tick();
        assert!(center.current().is_some());
    }
}
