//! Frame capture interface.
//!
//! This module provides the seam between the frame loop and whatever supplies
//! frames:
//! - The [`FrameSource`] trait for acquiring and disposing frame handles
//! - [`FrameLease`] for scoped release of an acquired frame
//! - [`ReplayCapture`] which replays a recorded pose stream frame by frame

mod lease;
mod replay;
mod types;

pub use lease::FrameLease;
pub use replay::{ReplayCapture, ReplayFrame};
pub use types::{CaptureError, CaptureGeometry, Resolution};

/// Supplies opaque frame handles to the frame loop.
///
/// Every handle returned by [`acquire`](FrameSource::acquire) must be passed back
/// to [`dispose`](FrameSource::dispose) exactly once. Wrap it in a
/// [`FrameLease`] to get that for free.
pub trait FrameSource {
    type Frame;

    /// Start the stream. Fails when the device is unavailable or access is denied.
    fn open(&self) -> Result<CaptureGeometry, CaptureError>;

    /// The latest frame, or `None` when nothing new is available this tick.
    fn acquire(&self) -> Option<Self::Frame>;

    /// Release the resources backing `frame`.
    fn dispose(&self, frame: Self::Frame);
}
