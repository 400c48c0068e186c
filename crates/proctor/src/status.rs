//! Classification results, journal events, and the outbound payload

use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::signals::GazeDirection;

/// Per-frame status reported to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusKind {
    /// The frame could not be decoded or perceived
    NoFrame,
    /// Participant attentive (or not yet past any threshold)
    Focused,
    /// Sustained confusion expression
    Confused,
    /// Integrity violation, always carries a reason
    ProctorAlert,
    /// Face present but landmarks unavailable (opt-in policy)
    Uncertain,
}

impl StatusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::NoFrame => "NO_FRAME",
            StatusKind::Focused => "FOCUSED",
            StatusKind::Confused => "CONFUSED",
            StatusKind::ProctorAlert => "PROCTOR_ALERT",
            StatusKind::Uncertain => "UNCERTAIN",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason attached to a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reason {
    NoFace,
    MultipleFaces,
    LookLeft,
    LookRight,
    /// Informational gaze on FOCUSED frames
    Center,
    Left,
    Right,
    LandmarksUnavailable,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::NoFace => "NO_FACE",
            Reason::MultipleFaces => "MULTIPLE_FACES",
            Reason::LookLeft => "LOOK_LEFT",
            Reason::LookRight => "LOOK_RIGHT",
            Reason::Center => "CENTER",
            Reason::Left => "LEFT",
            Reason::Right => "RIGHT",
            Reason::LandmarksUnavailable => "LANDMARKS_UNAVAILABLE",
        }
    }

    /// Alert reason for a sustained non-center gaze
    pub fn look_away(gaze: GazeDirection) -> Option<Self> {
        match gaze {
            GazeDirection::Left => Some(Reason::LookLeft),
            GazeDirection::Right => Some(Reason::LookRight),
            GazeDirection::Center => None,
        }
    }
}

impl From<GazeDirection> for Reason {
    fn from(gaze: GazeDirection) -> Self {
        match gaze {
            GazeDirection::Center => Reason::Center,
            GazeDirection::Left => Reason::Left,
            GazeDirection::Right => Reason::Right,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub status: StatusKind,
    pub reason: Option<Reason>,
}

impl Verdict {
    pub fn no_frame() -> Self {
        Self { status: StatusKind::NoFrame, reason: None }
    }

    pub fn focused(reason: Option<Reason>) -> Self {
        Self { status: StatusKind::Focused, reason }
    }

    pub fn confused() -> Self {
        Self { status: StatusKind::Confused, reason: None }
    }

    pub fn alert(reason: Reason) -> Self {
        Self { status: StatusKind::ProctorAlert, reason: Some(reason) }
    }

    pub fn uncertain() -> Self {
        Self {
            status: StatusKind::Uncertain,
            reason: Some(Reason::LandmarksUnavailable),
        }
    }

    pub fn is_alert(&self) -> bool {
        self.status == StatusKind::ProctorAlert
    }
}

/// Journal entry: one emitted verdict with its wall-clock time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub status: StatusKind,
    #[serde(rename = "time", serialize_with = "serialize_clock_time")]
    pub timestamp: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

impl Event {
    pub fn new(verdict: Verdict, timestamp: DateTime<Local>) -> Self {
        Self {
            status: verdict.status,
            timestamp,
            reason: verdict.reason,
        }
    }

    /// HH:MM:SS, as shown in the client timeline
    pub fn clock_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

fn serialize_clock_time<S: Serializer>(ts: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format("%H:%M:%S"))
}

/// Message pushed to the client after every frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPayload {
    pub status: StatusKind,
    /// Always present on the wire, `null` when absent
    pub reason: Option<Reason>,
    /// Journal snapshot, oldest first, ending with this frame's event
    pub history: Vec<Event>,
}
