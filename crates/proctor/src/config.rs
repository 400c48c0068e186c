//! Proctoring configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ProctorError;

/// How to classify a frame with exactly one face but no usable landmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingLandmarks {
    /// Report FOCUSED with no reason (wire-compatible behaviour)
    #[default]
    Focused,
    /// Report UNCERTAIN / LANDMARKS_UNAVAILABLE
    Uncertain,
}

/// Proctoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProctorConfig {
    /// Continuous look-away time before a proctor alert (milliseconds)
    pub look_away_threshold_ms: u64,

    /// Continuous confusion time before a CONFUSED event (milliseconds)
    pub confusion_threshold_ms: u64,

    /// Horizontal margin between nose tip and eye corner for gaze (normalized)
    pub gaze_margin: f32,

    /// Brow points closer than this count as furrowed (normalized)
    pub brow_gap_max: f32,

    /// Mouth corners closer than this count as pursed (normalized)
    pub mouth_width_max: f32,

    /// Nose further than this from frame center counts as head tilt (normalized)
    pub nose_offset_min: f32,

    /// Confusion score (0-3) at which the confusion timer arms
    pub confusion_trigger: u8,

    /// Events retained in each session's journal
    pub journal_capacity: usize,

    /// Policy for a detected face without landmarks
    pub missing_landmarks: MissingLandmarks,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            look_away_threshold_ms: 4000,
            confusion_threshold_ms: 2500,
            gaze_margin: 0.02,
            brow_gap_max: 0.18,
            mouth_width_max: 0.35,
            nose_offset_min: 0.05,
            confusion_trigger: 2,
            journal_capacity: event_journal::DEFAULT_CAPACITY,
            missing_landmarks: MissingLandmarks::Focused,
        }
    }
}

impl ProctorConfig {
    /// Create strict config (lower thresholds, missing landmarks surfaced)
    pub fn strict() -> Self {
        Self {
            look_away_threshold_ms: 2500,
            confusion_threshold_ms: 1500,
            missing_landmarks: MissingLandmarks::Uncertain,
            ..Default::default()
        }
    }

    /// Create lenient config (higher thresholds)
    pub fn lenient() -> Self {
        Self {
            look_away_threshold_ms: 6000,
            confusion_threshold_ms: 4000,
            gaze_margin: 0.04,
            ..Default::default()
        }
    }

    pub fn look_away_threshold(&self) -> Duration {
        Duration::from_millis(self.look_away_threshold_ms)
    }

    pub fn confusion_threshold(&self) -> Duration {
        Duration::from_millis(self.confusion_threshold_ms)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ProctorError> {
        if self.look_away_threshold_ms == 0 {
            return Err(ProctorError::Config("look_away_threshold_ms must be positive".into()));
        }
        if self.confusion_threshold_ms == 0 {
            return Err(ProctorError::Config("confusion_threshold_ms must be positive".into()));
        }
        if self.confusion_trigger > 3 {
            return Err(ProctorError::Config(format!(
                "confusion_trigger {} exceeds the maximum score of 3",
                self.confusion_trigger
            )));
        }
        if self.journal_capacity == 0 {
            return Err(ProctorError::Config("journal_capacity must be at least 1".into()));
        }
        let margins = [
            ("gaze_margin", self.gaze_margin),
            ("brow_gap_max", self.brow_gap_max),
            ("mouth_width_max", self.mouth_width_max),
            ("nose_offset_min", self.nose_offset_min),
        ];
        for (name, value) in margins {
            if !value.is_finite() || value < 0.0 {
                return Err(ProctorError::Config(format!("{name} must be a non-negative number")));
            }
        }
        Ok(())
    }
}
