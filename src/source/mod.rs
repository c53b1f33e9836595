//! Keypoint source interface.
//!
//! The pose model itself is a black box. The frame loop only needs a one-time
//! readiness gate and one asynchronous estimate per frame.

mod replay;

pub use replay::{load_poses, parse_poses, ReplaySource};

use crate::pose::PoseEstimate;

/// Errors reported by a keypoint source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to load pose model: {0}")]
    LoadFailed(String),

    #[error("Keypoint source is not initialized")]
    NotReady,

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pose on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Detector producing keypoints for frames of type `F`.
///
/// Both methods run on the frame loop's single thread; implementations may
/// suspend freely but must not block it.
#[allow(async_fn_in_trait)]
pub trait KeypointSource<F> {
    /// Load the model. Called once before any frame is submitted.
    async fn initialize(&self) -> Result<(), SourceError>;

    /// Estimate the pose visible in `frame`.
    async fn estimate(&self, frame: &F) -> Result<PoseEstimate, SourceError>;
}
