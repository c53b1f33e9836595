//! Scoped ownership of an acquired frame.

use super::FrameSource;

/// A frame borrowed from a [`FrameSource`], disposed when the lease drops.
///
/// Dropping covers every exit path: normal completion, an error return, or the
/// owning future being cancelled mid-inference.
pub struct FrameLease<'a, S: FrameSource + ?Sized> {
    source: &'a S,
    frame: Option<S::Frame>,
}

impl<'a, S: FrameSource + ?Sized> FrameLease<'a, S> {
    /// Acquire the next frame from `source`, if one is available.
    pub fn acquire(source: &'a S) -> Option<Self> {
        source.acquire().map(|frame| Self {
            source,
            frame: Some(frame),
        })
    }

    pub fn frame(&self) -> &S::Frame {
        match self.frame.as_ref() {
            Some(frame) => frame,
            // `frame` is only taken in `drop`
            None => unreachable!("frame lease used after release"),
        }
    }
}

impl<S: FrameSource + ?Sized> Drop for FrameLease<'_, S> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.source.dispose(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CaptureError, CaptureGeometry};
    use std::cell::Cell;

    struct Counting {
        next: Cell<u32>,
        disposed: Cell<u32>,
        available: bool,
    }

    impl FrameSource for Counting {
        type Frame = u32;

        fn open(&self) -> Result<CaptureGeometry, CaptureError> {
            Ok(CaptureGeometry::default())
        }

        fn acquire(&self) -> Option<u32> {
            if !self.available {
                return None;
            }
            let n = self.next.get();
            self.next.set(n + 1);
            Some(n)
        }

        fn dispose(&self, _frame: u32) {
            self.disposed.set(self.disposed.get() + 1);
        }
    }

    fn source(available: bool) -> Counting {
        Counting {
            next: Cell::new(7),
            disposed: Cell::new(0),
            available,
        }
    }

    #[test]
    fn test_lease_disposes_on_drop() {
        let source = source(true);
        {
            let lease = FrameLease::acquire(&source).unwrap();
            assert_eq!(*lease.frame(), 7);
            assert_eq!(source.disposed.get(), 0);
        }
        assert_eq!(source.disposed.get(), 1);
    }

    #[test]
    fn test_no_frame_no_dispose() {
        let source = source(false);
        assert!(FrameLease::acquire(&source).is_none());
        assert_eq!(source.disposed.get(), 0);
    }

    #[test]
    fn test_lease_disposes_on_early_return() {
        fn fails(source: &Counting) -> Result<(), ()> {
            let _lease = FrameLease::acquire(source).ok_or(())?;
            Err(())
        }
        let source = source(true);
        assert!(fails(&source).is_err());
        assert_eq!(source.disposed.get(), 1);
    }
}
