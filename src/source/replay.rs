//! Keypoint source that plays back recorded pose estimates.
//!
//! Recordings are JSON lines, one PoseNet-style estimate per line:
//!
//! ```text
//! {"keypoints":[{"part":"leftEye","position":{"x":70.1,"y":88.0},"score":0.93}, ...]}
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{KeypointSource, SourceError};
use crate::capture::ReplayFrame;
use crate::pose::PoseEstimate;

/// Parse a JSON-lines recording. Blank lines are skipped.
pub fn parse_poses(content: &str) -> Result<Vec<PoseEstimate>, SourceError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| SourceError::Parse { line: i + 1, source })
        })
        .collect()
}

/// Read and parse a JSON-lines recording from disk.
pub fn load_poses(path: &Path) -> Result<Vec<PoseEstimate>, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_poses(&content)
}

/// Serves recorded poses by frame index, with optional simulated inference latency.
#[derive(Debug)]
pub struct ReplaySource {
    poses: Vec<PoseEstimate>,
    latency: Duration,
    /// Detector width to mirror across, when flipping is enabled
    flip_width: Option<f32>,
    ready: AtomicBool,
}

impl ReplaySource {
    pub fn new(poses: Vec<PoseEstimate>) -> Self {
        Self {
            poses,
            latency: Duration::ZERO,
            flip_width: None,
            ready: AtomicBool::new(false),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Mirror keypoints horizontally across a detector `width` pixels wide.
    pub fn flip_horizontal(mut self, width: u32) -> Self {
        self.flip_width = Some(width as f32);
        self
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

impl KeypointSource<ReplayFrame> for ReplaySource {
    async fn initialize(&self) -> Result<(), SourceError> {
        if self.poses.is_empty() {
            return Err(SourceError::LoadFailed("recording has no poses".to_string()));
        }
        self.ready.store(true, Ordering::Release);
        log::info!("Replay source ready with {} poses", self.poses.len());
        Ok(())
    }

    async fn estimate(&self, frame: &ReplayFrame) -> Result<PoseEstimate, SourceError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(SourceError::NotReady);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let pose = self.poses.get(frame.index()).cloned().ok_or_else(|| {
            SourceError::Inference(format!("no recorded pose for frame {}", frame.index()))
        })?;

        Ok(match self.flip_width {
            Some(width) => pose.mirrored(width),
            None => pose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureGeometry, FrameSource, ReplayCapture};
    use crate::pose::BodyPart;
    use std::io::Write;

    const RECORDING: &str = r#"{"keypoints":[{"part":"leftEye","position":{"x":60.0,"y":80.0},"score":0.9}]}

{"keypoints":[]}
"#;

    #[test]
    fn test_parse_skips_blank_lines() {
        let poses = parse_poses(RECORDING).unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].keypoints[0].part, BodyPart::LeftEye);
        assert!(poses[1].is_empty());
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = parse_poses("{\"keypoints\":[]}\n\nnot json\n").unwrap_err();
        match err {
            SourceError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_poses_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RECORDING.as_bytes()).unwrap();
        let poses = load_poses(file.path()).unwrap();
        assert_eq!(poses.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_poses(Path::new("/nonexistent/poses.jsonl")).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[tokio::test]
    async fn test_initialize_fails_without_poses() {
        let source = ReplaySource::new(vec![]);
        assert!(matches!(source.initialize().await, Err(SourceError::LoadFailed(_))));
    }

    #[tokio::test]
    async fn test_estimate_requires_initialize() {
        let source = ReplaySource::new(parse_poses(RECORDING).unwrap());
        let capture = ReplayCapture::new(2, CaptureGeometry::default());
        let frame = capture.acquire().unwrap();
        assert!(matches!(source.estimate(&frame).await, Err(SourceError::NotReady)));
        capture.dispose(frame);
    }

    #[tokio::test]
    async fn test_estimate_returns_recorded_pose() {
        let source = ReplaySource::new(parse_poses(RECORDING).unwrap());
        source.initialize().await.unwrap();
        let capture = ReplayCapture::new(2, CaptureGeometry::default());
        let frame = capture.acquire().unwrap();
        let pose = source.estimate(&frame).await.unwrap();
        assert_eq!(pose.keypoints[0].position.x, 60.0);
        capture.dispose(frame);
    }

    #[tokio::test]
    async fn test_flip_horizontal_mirrors_keypoints() {
        let source = ReplaySource::new(parse_poses(RECORDING).unwrap()).flip_horizontal(168);
        source.initialize().await.unwrap();
        let capture = ReplayCapture::new(2, CaptureGeometry::default());
        let frame = capture.acquire().unwrap();
        let pose = source.estimate(&frame).await.unwrap();
        assert_eq!(pose.keypoints[0].position.x, 108.0);
        capture.dispose(frame);
    }

    #[tokio::test]
    async fn test_out_of_range_frame_is_inference_error() {
        let source = ReplaySource::new(parse_poses(RECORDING).unwrap());
        source.initialize().await.unwrap();
        let capture = ReplayCapture::new(3, CaptureGeometry::default());
        let frames: Vec<_> = (0..3).map(|_| capture.acquire().unwrap()).collect();
        assert!(matches!(
            source.estimate(&frames[2]).await,
            Err(SourceError::Inference(_))
        ));
        for frame in frames {
            capture.dispose(frame);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let source =
            ReplaySource::new(parse_poses(RECORDING).unwrap()).with_latency(Duration::from_millis(250));
        source.initialize().await.unwrap();
        let capture = ReplayCapture::new(2, CaptureGeometry::default());
        let frame = capture.acquire().unwrap();
        let start = tokio::time::Instant::now();
        source.estimate(&frame).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
        capture.dispose(frame);
    }
}
