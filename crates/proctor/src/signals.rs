//! Per-frame geometric signals derived from landmarks

use serde::{Deserialize, Serialize};

use crate::landmarks::FacePoints;
use crate::ProctorConfig;

/// Horizontal gaze direction for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GazeDirection {
    #[default]
    Center,
    Left,
    Right,
}

/// Number of satisfied confusion sub-conditions (0-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ConfusionScore(u8);

impl ConfusionScore {
    pub const MAX: u8 = 3;

    /// Clamped to `MAX`
    pub fn new(score: u8) -> Self {
        Self(score.min(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Everything the hysteresis engine needs to know about a face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSignals {
    pub gaze: GazeDirection,
    pub confusion: ConfusionScore,
}

/// Stateless landmark-to-signal mapping with fixed thresholds
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    gaze_margin: f32,
    brow_gap_max: f32,
    mouth_width_max: f32,
    nose_offset_min: f32,
}

impl SignalExtractor {
    pub fn new(config: &ProctorConfig) -> Self {
        Self {
            gaze_margin: config.gaze_margin,
            brow_gap_max: config.brow_gap_max,
            mouth_width_max: config.mouth_width_max,
            nose_offset_min: config.nose_offset_min,
        }
    }

    pub fn extract(&self, points: &FacePoints) -> FrameSignals {
        FrameSignals {
            gaze: self.gaze(points),
            confusion: self.confusion(points),
        }
    }

    /// Nose tip crossing an eye corner (plus margin) means the head is turned
    pub fn gaze(&self, points: &FacePoints) -> GazeDirection {
        if points.nose.x < points.left_eye.x - self.gaze_margin {
            GazeDirection::Left
        } else if points.nose.x > points.right_eye.x + self.gaze_margin {
            GazeDirection::Right
        } else {
            GazeDirection::Center
        }
    }

    /// Furrowed brows, pursed mouth, off-center head: one point each
    pub fn confusion(&self, points: &FacePoints) -> ConfusionScore {
        let conditions = [
            (points.left_brow.x - points.right_brow.x).abs() < self.brow_gap_max,
            (points.mouth_left.x - points.mouth_right.x).abs() < self.mouth_width_max,
            (points.nose.x - 0.5).abs() > self.nose_offset_min,
        ];
        ConfusionScore::new(conditions.iter().filter(|&&hit| hit).count() as u8)
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new(&ProctorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{index, Landmark, LandmarkSet};

    fn points_with(edit: impl FnOnce(&mut LandmarkSet)) -> FacePoints {
        let mut set = LandmarkSet::neutral();
        edit(&mut set);
        FacePoints::from_landmarks(&set).unwrap()
    }

    fn set_x(set: &mut LandmarkSet, i: usize, x: f32) {
        let mut p = set.get(i).unwrap();
        p.x = x;
        set.set(i, p);
    }

    #[test]
    fn test_neutral_face() {
        let signals = SignalExtractor::default().extract(&points_with(|_| {}));
        assert_eq!(signals.gaze, GazeDirection::Center);
        assert_eq!(signals.confusion.value(), 0);
    }

    #[test]
    fn test_gaze_left_and_right() {
        let extractor = SignalExtractor::default();

        // Left eye corner at 0.38: nose must be below 0.36
        let left = points_with(|s| set_x(s, index::NOSE_TIP, 0.35));
        assert_eq!(extractor.gaze(&left), GazeDirection::Left);

        // Right eye corner at 0.62: nose must be above 0.64
        let right = points_with(|s| set_x(s, index::NOSE_TIP, 0.65));
        assert_eq!(extractor.gaze(&right), GazeDirection::Right);

        // Inside the margin stays centered
        let near = points_with(|s| set_x(s, index::NOSE_TIP, 0.37));
        assert_eq!(extractor.gaze(&near), GazeDirection::Center);
    }

    #[test]
    fn test_confusion_conditions_add_up() {
        let extractor = SignalExtractor::default();

        let brows = points_with(|s| {
            set_x(s, index::LEFT_BROW, 0.45);
            set_x(s, index::RIGHT_BROW, 0.55);
        });
        assert_eq!(extractor.confusion(&brows).value(), 1);

        let brows_and_mouth = points_with(|s| {
            set_x(s, index::LEFT_BROW, 0.45);
            set_x(s, index::RIGHT_BROW, 0.55);
            set_x(s, index::MOUTH_LEFT, 0.40);
            set_x(s, index::MOUTH_RIGHT, 0.60);
        });
        assert_eq!(extractor.confusion(&brows_and_mouth).value(), 2);

        let all = points_with(|s| {
            set_x(s, index::LEFT_BROW, 0.45);
            set_x(s, index::RIGHT_BROW, 0.55);
            set_x(s, index::MOUTH_LEFT, 0.40);
            set_x(s, index::MOUTH_RIGHT, 0.60);
            set_x(s, index::NOSE_TIP, 0.58);
        });
        let signals = extractor.extract(&all);
        assert_eq!(signals.confusion.value(), 3);
        assert_eq!(signals.gaze, GazeDirection::Center);
    }

    #[test]
    fn test_custom_margins() {
        let config = ProctorConfig {
            gaze_margin: 0.2,
            ..Default::default()
        };
        let extractor = SignalExtractor::new(&config);
        let points = points_with(|s| s.set(index::NOSE_TIP, Landmark::new(0.30, 0.5, 0.0)));
        assert_eq!(extractor.gaze(&points), GazeDirection::Center);
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(ConfusionScore::new(9).value(), ConfusionScore::MAX);
    }
}
