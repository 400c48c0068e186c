//! Participant Proctoring
//!
//! Per-frame attentiveness and integrity classification for a remote
//! participant's video stream:
//! - Face count checks (no face, multiple faces)
//! - Gaze direction from nose / eye-corner geometry
//! - Confusion score from brow, mouth, and head-offset geometry
//! - Look-away and confusion debouncing (hysteresis)
//! - Bounded per-session event journal

pub mod config;
pub mod engine;
pub mod landmarks;
pub mod oracle;
pub mod session;
pub mod signals;
pub mod state;
pub mod status;

pub use config::{MissingLandmarks, ProctorConfig};
pub use engine::HysteresisEngine;
pub use landmarks::{FacePoints, Landmark, LandmarkSet};
pub use oracle::{PerceptionOracle, ScriptedObservation, ScriptedOracle, StaticOracle};
pub use session::{perceive, Perception, Session};
pub use signals::{ConfusionScore, FrameSignals, GazeDirection, SignalExtractor};
pub use state::{ConditionTimer, SessionState};
pub use status::{Event, Reason, StatusKind, StatusPayload, Verdict};

use event_journal::JournalError;
use thiserror::Error;

/// Proctoring error types
#[derive(Error, Debug)]
pub enum ProctorError {
    #[error("Perception oracle failed: {0}")]
    Oracle(String),

    #[error("Landmark {0} missing from mesh")]
    LandmarkMissing(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),
}
