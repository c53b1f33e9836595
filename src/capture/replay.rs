//! Frame source backed by a recorded pose stream.
//!
//! Each recorded pose is one "frame"; the handle is just its index. Paired with
//! [`ReplaySource`](crate::source::ReplaySource) this drives the full loop
//! without a camera.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::types::{CaptureError, CaptureGeometry};
use super::FrameSource;
use crate::event_loop::Shutdown;

/// Handle to one recorded frame.
#[derive(Debug, PartialEq, Eq)]
pub struct ReplayFrame {
    index: usize,
}

impl ReplayFrame {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Replays `frame_count` frames in order, optionally looping.
#[derive(Debug)]
pub struct ReplayCapture {
    frame_count: usize,
    geometry: CaptureGeometry,
    looping: bool,
    cursor: AtomicUsize,
    outstanding: AtomicUsize,
    acquired: AtomicUsize,
    exhausted: AtomicBool,
    /// Torn down once the recording runs out (non-looping only)
    on_exhausted: Option<Shutdown>,
}

impl ReplayCapture {
    pub fn new(frame_count: usize, geometry: CaptureGeometry) -> Self {
        Self {
            frame_count,
            geometry,
            looping: false,
            cursor: AtomicUsize::new(0),
            outstanding: AtomicUsize::new(0),
            acquired: AtomicUsize::new(0),
            exhausted: AtomicBool::new(false),
            on_exhausted: None,
        }
    }

    /// Start over from the first frame instead of running dry.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// End the session through `shutdown` when the last frame has been handed out.
    pub fn shutdown_when_exhausted(mut self, shutdown: Shutdown) -> Self {
        self.on_exhausted = Some(shutdown);
        self
    }

    /// Frames acquired but not yet disposed.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Total frames handed out so far.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }
}

impl FrameSource for ReplayCapture {
    type Frame = ReplayFrame;

    fn open(&self) -> Result<CaptureGeometry, CaptureError> {
        if self.frame_count == 0 {
            return Err(CaptureError::NoFrames);
        }
        if self.geometry.detector.width == 0 || self.geometry.preview.width == 0 {
            return Err(CaptureError::InvalidGeometry(format!(
                "detector {} / preview {}",
                self.geometry.detector, self.geometry.preview
            )));
        }
        log::info!(
            "Replay capture opened: {} frames, detector {}, preview {}",
            self.frame_count,
            self.geometry.detector,
            self.geometry.preview
        );
        Ok(self.geometry)
    }

    fn acquire(&self) -> Option<ReplayFrame> {
        if self.frame_count == 0 {
            return None;
        }

        let position = self.cursor.fetch_add(1, Ordering::SeqCst);
        let index = if position < self.frame_count {
            position
        } else if self.looping {
            position % self.frame_count
        } else {
            if !self.exhausted.swap(true, Ordering::SeqCst) {
                log::info!("Replay finished after {} frames", self.frame_count);
                if let Some(ref shutdown) = self.on_exhausted {
                    shutdown.trigger();
                }
            }
            return None;
        };

        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Some(ReplayFrame { index })
    }

    fn dispose(&self, _frame: ReplayFrame) {
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Resolution;

    #[test]
    fn test_open_rejects_empty_recording() {
        let capture = ReplayCapture::new(0, CaptureGeometry::default());
        assert!(matches!(capture.open(), Err(CaptureError::NoFrames)));
    }

    #[test]
    fn test_open_rejects_zero_width() {
        let geometry = CaptureGeometry {
            detector: Resolution::new(0, 224),
            preview: Resolution::PREVIEW,
        };
        let capture = ReplayCapture::new(3, geometry);
        assert!(matches!(capture.open(), Err(CaptureError::InvalidGeometry(_))));
    }

    #[test]
    fn test_frames_in_order_then_dry() {
        let capture = ReplayCapture::new(2, CaptureGeometry::default());
        let a = capture.acquire().unwrap();
        let b = capture.acquire().unwrap();
        assert_eq!((a.index(), b.index()), (0, 1));
        assert!(capture.acquire().is_none());
        assert!(capture.is_exhausted());
        assert_eq!(capture.outstanding(), 2);
        capture.dispose(a);
        capture.dispose(b);
        assert_eq!(capture.outstanding(), 0);
    }

    #[test]
    fn test_looping_wraps_around() {
        let capture = ReplayCapture::new(2, CaptureGeometry::default()).looping(true);
        let indices: Vec<usize> = (0..5)
            .map(|_| {
                let frame = capture.acquire().unwrap();
                let index = frame.index();
                capture.dispose(frame);
                index
            })
            .collect();
        assert_eq!(indices, vec![0, 1, 0, 1, 0]);
        assert!(!capture.is_exhausted());
    }

    #[test]
    fn test_exhaustion_triggers_shutdown_once() {
        let shutdown = Shutdown::new();
        let capture =
            ReplayCapture::new(1, CaptureGeometry::default()).shutdown_when_exhausted(shutdown.clone());
        let frame = capture.acquire().unwrap();
        capture.dispose(frame);
        assert!(!shutdown.is_triggered());
        assert!(capture.acquire().is_none());
        assert!(shutdown.is_triggered());
        assert!(capture.acquire().is_none());
        assert_eq!(capture.acquired(), 1);
    }
}
