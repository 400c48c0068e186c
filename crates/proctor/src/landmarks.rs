//! Facial landmark points

use serde::{Deserialize, Serialize};

use crate::ProctorError;

/// Mesh indices consumed by the signal extractor
pub mod index {
    pub const NOSE_TIP: usize = 1;
    pub const LEFT_EYE_CORNER: usize = 33;
    pub const RIGHT_EYE_CORNER: usize = 263;
    pub const LEFT_BROW: usize = 65;
    pub const RIGHT_BROW: usize = 295;
    pub const MOUTH_LEFT: usize = 61;
    pub const MOUTH_RIGHT: usize = 291;

    /// Smallest mesh that contains every index above
    pub const REQUIRED_LEN: usize = RIGHT_BROW + 1;
}

/// A single landmark, normalized to roughly [0, 1] in image space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Ordered landmark mesh for one face in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Overwrite one point, growing the mesh with zeroed points if needed
    pub fn set(&mut self, index: usize, point: Landmark) {
        if index >= self.points.len() {
            self.points.resize(index + 1, Landmark::default());
        }
        self.points[index] = point;
    }

    /// A frontal, relaxed face: gaze CENTER, confusion score 0
    pub fn neutral() -> Self {
        let mut set = Self::new(vec![Landmark::new(0.5, 0.5, 0.0); index::REQUIRED_LEN]);
        set.set(index::NOSE_TIP, Landmark::new(0.5, 0.55, -0.05));
        set.set(index::LEFT_EYE_CORNER, Landmark::new(0.38, 0.42, 0.0));
        set.set(index::RIGHT_EYE_CORNER, Landmark::new(0.62, 0.42, 0.0));
        set.set(index::LEFT_BROW, Landmark::new(0.38, 0.35, 0.0));
        set.set(index::RIGHT_BROW, Landmark::new(0.62, 0.35, 0.0));
        set.set(index::MOUTH_LEFT, Landmark::new(0.30, 0.70, 0.0));
        set.set(index::MOUTH_RIGHT, Landmark::new(0.70, 0.70, 0.0));
        set
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self::new(points)
    }
}

/// The seven points the extractor reads, pulled out of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacePoints {
    pub nose: Landmark,
    pub left_eye: Landmark,
    pub right_eye: Landmark,
    pub left_brow: Landmark,
    pub right_brow: Landmark,
    pub mouth_left: Landmark,
    pub mouth_right: Landmark,
}

impl FacePoints {
    pub fn from_landmarks(set: &LandmarkSet) -> Result<Self, ProctorError> {
        let point = |i: usize| set.get(i).ok_or(ProctorError::LandmarkMissing(i));
        Ok(Self {
            nose: point(index::NOSE_TIP)?,
            left_eye: point(index::LEFT_EYE_CORNER)?,
            right_eye: point(index::RIGHT_EYE_CORNER)?,
            left_brow: point(index::LEFT_BROW)?,
            right_brow: point(index::RIGHT_BROW)?,
            mouth_left: point(index::MOUTH_LEFT)?,
            mouth_right: point(index::MOUTH_RIGHT)?,
        })
    }
}
