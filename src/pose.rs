//! Keypoint and pose types produced by a keypoint detector.
//!
//! Positions are in the detector's native input space, not screen space.

use serde::{Deserialize, Serialize};

/// Named anatomical landmark, using the PoseNet part vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyPart {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// 2D point. Used for both detector-space and screen-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A single detected landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub part: BodyPart,
    pub position: Point,
    /// Detector confidence in [0, 1]
    pub score: f32,
}

impl Keypoint {
    pub fn new(part: BodyPart, x: f32, y: f32, score: f32) -> Self {
        Self {
            part,
            position: Point::new(x, y),
            score,
        }
    }
}

/// All keypoints detected in one frame, in detector emission order.
///
/// Parts may be missing or repeated; consumers must not assume one entry per part.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseEstimate {
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
    /// Overall pose confidence, when the detector reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl PoseEstimate {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self {
            keypoints,
            score: None,
        }
    }

    /// An estimate with no keypoints at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// First keypoint for `part` scoring strictly above `threshold`, in emission order.
    pub fn first_confident(&self, part: BodyPart, threshold: f32) -> Option<&Keypoint> {
        self.keypoints
            .iter()
            .find(|k| k.part == part && k.score > threshold)
    }

    /// Mirror every keypoint across the vertical axis of a detector `width` pixels wide.
    ///
    /// Part labels are kept as-is: the detector already names eyes from the subject's view.
    pub fn mirrored(mut self, width: f32) -> Self {
        for keypoint in &mut self.keypoints {
            keypoint.position.x = width - keypoint.position.x;
        }
        self
    }
}
