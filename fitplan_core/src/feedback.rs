//! Haptic and notification feedback.
//!
//! Feedback is fire-and-forget: callers never learn whether a pulse was
//! delivered, and a host without haptics simply uses [`SilentFeedback`].

/// Strength of an impact pulse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

/// Kind of notification pulse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

pub trait Feedback {
    fn impact(&self, style: ImpactStyle);
    fn notify(&self, kind: NotificationKind);
}

/// Drops every pulse
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentFeedback;

impl Feedback for SilentFeedback {
    fn impact(&self, _style: ImpactStyle) {}
    fn notify(&self, _kind: NotificationKind) {}
}

/// Records pulses as tracing events (terminal hosts)
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn impact(&self, style: ImpactStyle) {
        tracing::debug!("haptic impact: {:?}", style);
    }

    fn notify(&self, kind: NotificationKind) {
        tracing::debug!("haptic notification: {:?}", kind);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Captures pulses for assertions
    #[derive(Debug, Default)]
    pub struct RecordingFeedback {
        pub impacts: RefCell<Vec<ImpactStyle>>,
        pub notifications: RefCell<Vec<NotificationKind>>,
    }

    impl Feedback for RecordingFeedback {
        fn impact(&self, style: ImpactStyle) {
            self.impacts.borrow_mut().push(style);
        }

        fn notify(&self, kind: NotificationKind) {
            self.notifications.borrow_mut().push(kind);
        }
    }
}
