//! Perception oracle seam: face count and landmark extraction

use frame_codec::VideoFrame;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::warn;

use crate::landmarks::LandmarkSet;
use crate::ProctorError;

/// Face detection and landmark extraction backend.
///
/// Shared across sessions, so implementations must be reentrant or
/// serialize access internally.
pub trait PerceptionOracle: Send + Sync {
    /// Number of faces visible in the frame
    fn detect_faces(&self, frame: &VideoFrame) -> Result<usize, ProctorError>;

    /// Landmark mesh of the single visible face, if it could be extracted.
    /// Only called when `detect_faces` returned 1.
    fn extract_landmarks(&self, frame: &VideoFrame) -> Result<Option<LandmarkSet>, ProctorError>;
}

/// Fixed-answer oracle used when no perception backend is configured
#[derive(Debug, Clone)]
pub struct StaticOracle {
    face_count: usize,
    landmarks: Option<LandmarkSet>,
}

impl StaticOracle {
    pub fn new(face_count: usize, landmarks: Option<LandmarkSet>) -> Self {
        warn!(
            "No perception backend configured. Using static oracle ({} face(s), landmarks: {})",
            face_count,
            landmarks.is_some()
        );
        Self { face_count, landmarks }
    }

    /// One frontal, attentive face in every frame
    pub fn attentive() -> Self {
        Self::new(1, Some(LandmarkSet::neutral()))
    }
}

impl PerceptionOracle for StaticOracle {
    fn detect_faces(&self, _frame: &VideoFrame) -> Result<usize, ProctorError> {
        Ok(self.face_count)
    }

    fn extract_landmarks(&self, _frame: &VideoFrame) -> Result<Option<LandmarkSet>, ProctorError> {
        Ok(self.landmarks.clone())
    }
}

/// One scripted perception result
#[derive(Debug, Clone)]
pub enum ScriptedObservation {
    Faces { count: usize, landmarks: Option<LandmarkSet> },
    Fail(String),
}

/// Oracle that replays a queue of observations, one per frame.
///
/// Each `detect_faces` call pops the next observation; a following
/// `extract_landmarks` call reads the landmarks of that same observation.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    inner: Mutex<ScriptState>,
}

#[derive(Debug, Default)]
struct ScriptState {
    queue: VecDeque<ScriptedObservation>,
    current: Option<LandmarkSet>,
}

impl ScriptedOracle {
    pub fn new(observations: impl IntoIterator<Item = ScriptedObservation>) -> Self {
        Self {
            inner: Mutex::new(ScriptState {
                queue: observations.into_iter().collect(),
                current: None,
            }),
        }
    }

    pub fn push(&self, observation: ScriptedObservation) -> Result<(), ProctorError> {
        self.lock()?.queue.push_back(observation);
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.lock().map(|s| s.queue.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ScriptState>, ProctorError> {
        self.inner
            .lock()
            .map_err(|e| ProctorError::Oracle(format!("Lock error: {}", e)))
    }
}

impl PerceptionOracle for ScriptedOracle {
    fn detect_faces(&self, _frame: &VideoFrame) -> Result<usize, ProctorError> {
        let mut state = self.lock()?;
        match state.queue.pop_front() {
            Some(ScriptedObservation::Faces { count, landmarks }) => {
                state.current = landmarks;
                Ok(count)
            }
            Some(ScriptedObservation::Fail(msg)) => {
                state.current = None;
                Err(ProctorError::Oracle(msg))
            }
            None => Err(ProctorError::Oracle("script exhausted".into())),
        }
    }

    fn extract_landmarks(&self, _frame: &VideoFrame) -> Result<Option<LandmarkSet>, ProctorError> {
        Ok(self.lock()?.current.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> VideoFrame {
        VideoFrame::new(vec![0; 12], 2, 2, 0)
    }

    #[test]
    fn test_static_oracle() {
        let oracle = StaticOracle::attentive();
        assert_eq!(oracle.detect_faces(&frame()).unwrap(), 1);
        assert_eq!(oracle.extract_landmarks(&frame()).unwrap(), Some(LandmarkSet::neutral()));

        let empty = StaticOracle::new(0, None);
        assert_eq!(empty.detect_faces(&frame()).unwrap(), 0);
        assert!(empty.extract_landmarks(&frame()).unwrap().is_none());
    }

    #[test]
    fn test_scripted_oracle_replays_in_order() {
        let oracle = ScriptedOracle::new([
            ScriptedObservation::Faces { count: 1, landmarks: Some(LandmarkSet::neutral()) },
            ScriptedObservation::Faces { count: 2, landmarks: None },
            ScriptedObservation::Fail("camera glitch".into()),
        ]);
        assert_eq!(oracle.remaining(), 3);

        assert_eq!(oracle.detect_faces(&frame()).unwrap(), 1);
        assert!(oracle.extract_landmarks(&frame()).unwrap().is_some());
        // Landmarks are consumed by the first read
        assert!(oracle.extract_landmarks(&frame()).unwrap().is_none());

        assert_eq!(oracle.detect_faces(&frame()).unwrap(), 2);
        assert!(matches!(oracle.detect_faces(&frame()), Err(ProctorError::Oracle(_))));
        assert!(matches!(oracle.detect_faces(&frame()), Err(ProctorError::Oracle(_))));

        oracle.push(ScriptedObservation::Faces { count: 0, landmarks: None }).unwrap();
        assert_eq!(oracle.detect_faces(&frame()).unwrap(), 0);
    }
}
