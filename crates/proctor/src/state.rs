//! Per-session state tracking

use event_journal::Journal;
use std::time::{Duration, Instant};

use crate::status::Event;
use crate::{ProctorConfig, ProctorError};

/// Start time of an uninterrupted condition streak
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionTimer {
    since: Option<Instant>,
}

impl ConditionTimer {
    /// Record that the condition holds at `now`.
    ///
    /// The first call of a streak only arms the timer; later calls return
    /// true once at least `threshold` has elapsed since it was armed.
    pub fn hold(&mut self, now: Instant, threshold: Duration) -> bool {
        match self.since {
            None => {
                self.since = Some(now);
                false
            }
            Some(start) => now.saturating_duration_since(start) >= threshold,
        }
    }

    /// The condition broke; the next streak starts from scratch
    pub fn clear(&mut self) {
        self.since = None;
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.since
    }

    pub fn is_armed(&self) -> bool {
        self.since.is_some()
    }
}

/// State owned by one connected participant
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Set when gaze first leaves center, cleared when it returns
    pub look_away: ConditionTimer,

    /// Set when the confusion score first reaches the trigger
    pub confusion: ConditionTimer,

    /// Emitted events, oldest first
    pub journal: Journal<Event>,
}

impl SessionState {
    pub fn new(config: &ProctorConfig) -> Result<Self, ProctorError> {
        Ok(Self {
            look_away: ConditionTimer::default(),
            confusion: ConditionTimer::default(),
            journal: Journal::new(config.journal_capacity)?,
        })
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            look_away: ConditionTimer::default(),
            confusion: ConditionTimer::default(),
            journal: Journal::with_default_capacity(),
        }
    }
}
