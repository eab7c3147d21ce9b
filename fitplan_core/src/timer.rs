//! Rest timer between sets.
//!
//! The countdown is advisory: remaining seconds and the running flag are
//! persisted on every change so a later invocation can pick it up, but
//! nothing guarantees ticks arrive exactly once per second.

use crate::feedback::{Feedback, ImpactStyle, NotificationKind};
use crate::store::{keys, KeyValueStore};
use crate::{Error, Result};

/// Preset rest lengths in minutes
pub const PRESETS_MINUTES: [u32; 6] = [2, 3, 4, 5, 7, 10];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestTimer {
    remaining: u32,
    running: bool,
}

impl RestTimer {
    /// Restore from `timer_rem` / `timer_running`; a missing, malformed or
    /// zero remainder gives a stopped timer
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let remaining = store
            .get_raw(keys::TIMER_REMAINING)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(0);
        if remaining == 0 {
            return Self::default();
        }
        Self {
            remaining,
            running: store.get_raw(keys::TIMER_RUNNING).as_deref() == Some("1"),
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        minutes: u32,
        feedback: &dyn Feedback,
    ) -> Result<()> {
        if minutes == 0 {
            return Err(Error::InvalidInput("rest timer needs at least one minute".into()));
        }
        self.remaining = minutes.saturating_mul(60);
        self.running = true;
        self.persist(store)?;
        feedback.impact(ImpactStyle::Light);
        tracing::debug!("Rest timer started for {} min", minutes);
        Ok(())
    }

    /// Count down one second. Reaching zero stops the timer and fires a
    /// success notification. Returns true when this tick finished it.
    pub fn tick<S: KeyValueStore + ?Sized>(&mut self, store: &mut S, feedback: &dyn Feedback) -> Result<bool> {
        if !self.running || self.remaining == 0 {
            self.running = false;
            return Ok(false);
        }

        self.remaining -= 1;
        self.running = self.remaining > 0;
        self.persist(store)?;

        if self.remaining == 0 {
            feedback.notify(NotificationKind::Success);
            tracing::info!("Rest timer finished");
            return Ok(true);
        }
        Ok(false)
    }

    pub fn reset<S: KeyValueStore + ?Sized>(&mut self, store: &mut S, feedback: &dyn Feedback) -> Result<()> {
        *self = Self::default();
        self.persist(store)?;
        feedback.impact(ImpactStyle::Light);
        Ok(())
    }

    /// Remaining time as `m:ss`
    pub fn display(&self) -> String {
        format!("{}:{:02}", self.remaining / 60, self.remaining % 60)
    }

    fn persist<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.set_raw(keys::TIMER_REMAINING, self.remaining.to_string())?;
        store.set_raw(
            keys::TIMER_RUNNING,
            if self.running { "1" } else { "0" }.to_string(),
        )
    }
}
