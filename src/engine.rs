//! Overlay transform engine.
//!
//! Turns one frame's [`PoseEstimate`] into an [`OverlayPlacement`]: whether the
//! eyewear is shown, how much it is scaled, and where its top-left anchor sits
//! on screen. Every input maps to a defined output; the engine holds no state
//! between frames.

use serde::Serialize;

use crate::pose::{BodyPart, PoseEstimate, Point};
use crate::selection::{OverlayAsset, SelectionState};

/// Tunables for overlay placement.
///
/// The defaults were tuned by hand for a front-facing phone camera and a
/// 168px wide detector input. Other geometries will likely need new values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayParams {
    /// Eye keypoints must score strictly above this
    pub threshold: f32,
    /// Eye distance (screen px) that maps to scale 1.0
    pub normalization_factor: f32,
    /// Divisor applied to the left eye's screen y
    pub vertical_damping: f32,
    /// Added to the damped y
    pub top_offset: f32,
    /// Added to the left eye's screen x
    pub left_offset: f32,
}

impl OverlayParams {
    pub const DEFAULT_THRESHOLD: f32 = 0.85;
    pub const DEFAULT_NORMALIZATION_FACTOR: f32 = 35.0;
    pub const DEFAULT_VERTICAL_DAMPING: f32 = 2.4;
    pub const DEFAULT_TOP_OFFSET: f32 = 40.0;
    pub const DEFAULT_LEFT_OFFSET: f32 = 45.0;
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            normalization_factor: Self::DEFAULT_NORMALIZATION_FACTOR,
            vertical_damping: Self::DEFAULT_VERTICAL_DAMPING,
            top_offset: Self::DEFAULT_TOP_OFFSET,
            left_offset: Self::DEFAULT_LEFT_OFFSET,
        }
    }
}

/// Linear detector-to-screen factor, applied uniformly to x and y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionFactor(f32);

impl ConversionFactor {
    /// Width of the detector input the bundled model expects.
    pub const DEFAULT_DETECTOR_WIDTH: u32 = 168;

    pub const IDENTITY: ConversionFactor = ConversionFactor(1.0);

    /// `screen_width / detector_width`. A zero detector width yields the identity.
    pub fn from_widths(screen_width: u32, detector_width: u32) -> Self {
        if detector_width == 0 {
            return Self::IDENTITY;
        }
        Self(screen_width as f32 / detector_width as f32)
    }

    pub fn from_raw(factor: f32) -> Self {
        Self(factor)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn to_screen(self, point: Point) -> Point {
        Point::new(point.x * self.0, point.y * self.0)
    }
}

/// Engine output for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayPlacement {
    pub visible: bool,
    pub scale: f32,
    pub anchor: Point,
    #[serde(skip)]
    pub asset: OverlayAsset,
}

impl OverlayPlacement {
    pub fn hidden(asset: OverlayAsset) -> Self {
        Self {
            visible: false,
            scale: 0.0,
            anchor: Point::default(),
            asset,
        }
    }
}

/// Debug dot drawn at a confident keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub part: BodyPart,
    pub position: Point,
}

/// Settings for debug keypoint markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerParams {
    pub threshold: f32,
    pub left_offset: f32,
    pub top_offset: f32,
}

impl Default for MarkerParams {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            left_offset: 35.0,
            top_offset: 60.0,
        }
    }
}

/// Computes overlay placements from pose estimates.
#[derive(Debug, Clone, Copy)]
pub struct OverlayEngine {
    params: OverlayParams,
    conversion: ConversionFactor,
    markers: MarkerParams,
}

impl OverlayEngine {
    pub fn new(params: OverlayParams, conversion: ConversionFactor) -> Self {
        Self {
            params,
            conversion,
            markers: MarkerParams::default(),
        }
    }

    pub fn with_markers(mut self, markers: MarkerParams) -> Self {
        self.markers = markers;
        self
    }

    pub fn params(&self) -> &OverlayParams {
        &self.params
    }

    pub fn conversion(&self) -> ConversionFactor {
        self.conversion
    }

    /// Place `asset` over the eyes found in `pose`.
    pub fn place(&self, pose: &PoseEstimate, asset: OverlayAsset) -> OverlayPlacement {
        let threshold = self.params.threshold;
        let (left, right) = match (
            pose.first_confident(BodyPart::LeftEye, threshold),
            pose.first_confident(BodyPart::RightEye, threshold),
        ) {
            (Some(left), Some(right)) => (left, right),
            _ => return OverlayPlacement::hidden(asset),
        };

        let left = self.conversion.to_screen(left.position);
        let right = self.conversion.to_screen(right.position);

        let scale = (right.x - left.x).abs() / self.params.normalization_factor;
        let anchor = Point::new(
            left.x + self.params.left_offset,
            left.y / self.params.vertical_damping + self.params.top_offset,
        );

        OverlayPlacement {
            visible: true,
            scale,
            anchor,
            asset,
        }
    }

    /// Place whatever asset `selection` currently holds.
    pub fn place_selected(&self, pose: &PoseEstimate, selection: &SelectionState) -> OverlayPlacement {
        self.place(pose, selection.current())
    }

    /// Screen positions of every keypoint above the marker threshold.
    pub fn markers(&self, pose: &PoseEstimate) -> Vec<Marker> {
        pose.keypoints
            .iter()
            .filter(|k| k.score > self.markers.threshold)
            .map(|k| {
                let p = self.conversion.to_screen(k.position);
                Marker {
                    part: k.part,
                    position: Point::new(p.x + self.markers.left_offset, p.y + self.markers.top_offset),
                }
            })
            .collect()
    }
}
