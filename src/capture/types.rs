//! Capture geometry and error types.

use std::fmt;

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Input size of the bundled pose model (portrait 3:4)
    pub const DETECTOR: Resolution = Resolution {
        width: 168,
        height: 224,
    };

    /// Portrait phone preview, 4:3 like the camera texture
    pub const PREVIEW: Resolution = Resolution {
        width: 375,
        height: 500,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Resolutions needed to map detector coordinates onto the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureGeometry {
    /// Size of the image the keypoint detector sees
    pub detector: Resolution,
    /// Size of the on-screen camera preview
    pub preview: Resolution,
}

impl Default for CaptureGeometry {
    fn default() -> Self {
        Self {
            detector: Resolution::DETECTOR,
            preview: Resolution::PREVIEW,
        }
    }
}

/// Errors that can occur while opening a frame source.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Failed to open capture: {0}")]
    OpenFailed(String),

    #[error("Recording contains no frames")]
    NoFrames,

    #[error("Invalid capture geometry: {0}")]
    InvalidGeometry(String),
}
