//! Hysteresis engine: instantaneous signals to debounced statuses

use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::MissingLandmarks;
use crate::signals::FrameSignals;
use crate::state::SessionState;
use crate::status::{Reason, Verdict};
use crate::ProctorConfig;

/// Per-frame classifier with fixed, session-independent thresholds.
///
/// Holds no session data itself; timers live in [`SessionState`].
#[derive(Debug, Clone)]
pub struct HysteresisEngine {
    look_away_threshold: Duration,
    confusion_threshold: Duration,
    confusion_trigger: u8,
    missing_landmarks: MissingLandmarks,
}

impl HysteresisEngine {
    pub fn new(config: &ProctorConfig) -> Self {
        Self {
            look_away_threshold: config.look_away_threshold(),
            confusion_threshold: config.confusion_threshold(),
            confusion_trigger: config.confusion_trigger,
            missing_landmarks: config.missing_landmarks,
        }
    }

    /// Classify one perceived frame.
    ///
    /// `signals` is `None` when a face was found but its landmarks were not.
    /// Checks run in priority order and the first match wins:
    /// face count, landmark availability, look-away, confusion, focused.
    pub fn classify(
        &self,
        state: &mut SessionState,
        now: Instant,
        face_count: usize,
        signals: Option<FrameSignals>,
    ) -> Verdict {
        // Integrity conditions bypass hysteresis and leave timers alone
        if face_count == 0 {
            return Verdict::alert(Reason::NoFace);
        }
        if face_count > 1 {
            return Verdict::alert(Reason::MultipleFaces);
        }

        let Some(signals) = signals else {
            return match self.missing_landmarks {
                MissingLandmarks::Focused => Verdict::focused(None),
                MissingLandmarks::Uncertain => Verdict::uncertain(),
            };
        };

        if let Some(reason) = Reason::look_away(signals.gaze) {
            if state.look_away.hold(now, self.look_away_threshold) {
                debug!("Look-away sustained: {}", reason);
                return Verdict::alert(reason);
            }
        } else {
            state.look_away.clear();
        }

        if signals.confusion.value() >= self.confusion_trigger {
            if state.confusion.hold(now, self.confusion_threshold) {
                debug!("Confusion sustained (score {})", signals.confusion.value());
                return Verdict::confused();
            }
        } else {
            state.confusion.clear();
        }

        Verdict::focused(Some(signals.gaze.into()))
    }
}

impl Default for HysteresisEngine {
    fn default() -> Self {
        Self::new(&ProctorConfig::default())
    }
}
