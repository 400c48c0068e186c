//! Per-participant frame pipeline: perceive, extract, classify, journal

use chrono::{DateTime, Local};
use frame_codec::{FrameError, VideoFrame};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::engine::HysteresisEngine;
use crate::landmarks::{FacePoints, LandmarkSet};
use crate::oracle::PerceptionOracle;
use crate::signals::{FrameSignals, SignalExtractor};
use crate::state::SessionState;
use crate::status::{Event, StatusPayload, Verdict};
use crate::{ProctorConfig, ProctorError};

/// What the perception stage learned about one inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Perception {
    /// No pixels to look at (decode or oracle failure)
    NoFrame,
    /// Face count, plus landmarks when exactly one face was seen
    Faces {
        count: usize,
        landmarks: Option<LandmarkSet>,
    },
}

/// Run the oracle over a decoded frame.
///
/// Blocking; callers on an async runtime should run it off the reactor.
pub fn perceive(oracle: &dyn PerceptionOracle, frame: Result<VideoFrame, FrameError>) -> Perception {
    let frame = match frame {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Frame decode failed: {}", e);
            return Perception::NoFrame;
        }
    };

    let count = match oracle.detect_faces(&frame) {
        Ok(count) => count,
        Err(e) => {
            warn!("Face detection failed on frame {}: {}", frame.sequence, e);
            return Perception::NoFrame;
        }
    };

    let landmarks = if count == 1 {
        oracle.extract_landmarks(&frame).unwrap_or_else(|e| {
            warn!("Landmark extraction failed on frame {}: {}", frame.sequence, e);
            None
        })
    } else {
        None
    };

    Perception::Faces { count, landmarks }
}

/// One connected participant: owns the timers and journal for its lifetime
pub struct Session {
    oracle: Arc<dyn PerceptionOracle>,
    extractor: SignalExtractor,
    engine: HysteresisEngine,
    state: SessionState,
    frames_processed: u64,
}

impl Session {
    pub fn new(config: &ProctorConfig, oracle: Arc<dyn PerceptionOracle>) -> Result<Self, ProctorError> {
        config.validate()?;
        Ok(Self {
            oracle,
            extractor: SignalExtractor::new(config),
            engine: HysteresisEngine::new(config),
            state: SessionState::new(config)?,
            frames_processed: 0,
        })
    }

    /// Shared oracle handle, for running [`perceive`] on a worker thread
    pub fn oracle(&self) -> Arc<dyn PerceptionOracle> {
        Arc::clone(&self.oracle)
    }

    /// Perceive and classify a frame in one step
    pub fn process(
        &mut self,
        frame: Result<VideoFrame, FrameError>,
        now: Instant,
        wall: DateTime<Local>,
    ) -> StatusPayload {
        let perception = perceive(self.oracle.as_ref(), frame);
        self.apply(perception, now, wall)
    }

    /// Classify an already-perceived frame, journal it, and build the reply
    pub fn apply(&mut self, perception: Perception, now: Instant, wall: DateTime<Local>) -> StatusPayload {
        self.frames_processed += 1;

        let verdict = match perception {
            // Timers persist across undecodable frames
            Perception::NoFrame => Verdict::no_frame(),
            Perception::Faces { count, landmarks } => {
                let signals = landmarks.as_ref().and_then(|set| self.signals(set));
                self.engine.classify(&mut self.state, now, count, signals)
            }
        };

        debug!(
            frame = self.frames_processed,
            status = %verdict.status,
            reason = ?verdict.reason,
            "Frame classified"
        );

        self.state.journal.append(Event::new(verdict, wall));

        StatusPayload {
            status: verdict.status,
            reason: verdict.reason,
            history: self.state.journal.snapshot(),
        }
    }

    fn signals(&self, set: &LandmarkSet) -> Option<FrameSignals> {
        match FacePoints::from_landmarks(set) {
            Ok(points) => Some(self.extractor.extract(&points)),
            Err(e) => {
                warn!("Unusable landmark mesh ({} points): {}", set.len(), e);
                None
            }
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}
