//! Frame loop scheduler.
//!
//! Drives acquisition, keypoint estimation, placement and rendering on a
//! single cooperative timeline. The loop:
//! 1. Waits for the frame source to open and the keypoint source to load,
//!    showing the loading presentation meanwhile
//! 2. On every display tick, acquires a frame and starts an estimate unless
//!    one is already in flight (then the tick is a no-op)
//! 3. When an estimate completes, releases its frame, computes the placement
//!    from the current selection and hands it to the renderer
//!
//! The loop has no exit of its own; it runs until [`Shutdown`] is triggered.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::capture::{CaptureError, CaptureGeometry, FrameLease, FrameSource};
use crate::engine::{ConversionFactor, MarkerParams, OverlayEngine, OverlayParams};
use crate::pose::PoseEstimate;
use crate::renderer::{RenderFrame, Renderer};
use crate::selection::{Catalog, SelectionState};
use crate::source::{KeypointSource, SourceError};

/// External tear-down signal for a session. Cloning shares the signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request tear-down. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`trigger`](Self::trigger) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this can only end by observing `true`.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Why the loop never left the loading state.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Tunables for one session.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    pub overlay: OverlayParams,
    /// Debug markers, when enabled
    pub markers: Option<MarkerParams>,
    /// Display tick period
    pub tick_interval: Duration,
}

impl LoopSettings {
    /// Roughly one display refresh at 60 Hz.
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(16);
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            overlay: OverlayParams::default(),
            markers: None,
            tick_interval: Self::DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Counters collected over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Display ticks observed after readiness
    pub ticks: u64,
    /// Estimates that completed and were rendered
    pub frames: u64,
    /// Ticks skipped because an estimate was still in flight
    pub busy_ticks: u64,
    /// Ticks where the capture had no frame
    pub empty_ticks: u64,
    /// Estimates that failed
    pub source_errors: u64,
    /// Frames rendered with the overlay visible
    pub visible: u64,
    /// Whether the sources ever became ready
    pub ready: bool,
}

struct InFlight<'a> {
    tick: u64,
    estimate: LocalBoxFuture<'a, Result<PoseEstimate, SourceError>>,
}

/// Await the in-flight estimate, or never resolve when there is none.
async fn next_estimate(slot: &mut Option<InFlight<'_>>) -> (u64, Result<PoseEstimate, SourceError>) {
    match slot {
        Some(in_flight) => (in_flight.tick, in_flight.estimate.as_mut().await),
        None => std::future::pending().await,
    }
}

/// One rendering session: capture, keypoint source, renderer and selection.
pub struct FrameLoop<C, S, R> {
    capture: C,
    source: S,
    renderer: R,
    catalog: Arc<Catalog>,
    selection: Arc<SelectionState>,
    settings: LoopSettings,
}

impl<C, S, R> FrameLoop<C, S, R>
where
    C: FrameSource,
    S: KeypointSource<C::Frame>,
    R: Renderer,
{
    pub fn new(
        capture: C,
        source: S,
        renderer: R,
        catalog: Arc<Catalog>,
        selection: Arc<SelectionState>,
    ) -> Self {
        Self {
            capture,
            source,
            renderer,
            catalog,
            selection,
            settings: LoopSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: LoopSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    async fn initialize(capture: &C, source: &S) -> Result<CaptureGeometry, InitError> {
        let geometry = capture.open()?;
        source.initialize().await?;
        Ok(geometry)
    }

    /// Run until `shutdown` is triggered.
    ///
    /// If initialization fails the renderer stays on the loading presentation
    /// until tear-down; the failure is logged, not returned.
    pub async fn run(&mut self, shutdown: &Shutdown) -> LoopStats {
        let Self {
            capture,
            source,
            renderer,
            catalog,
            selection,
            settings,
        } = self;
        let capture = &*capture;
        let source = &*source;

        let mut stats = LoopStats::default();

        if let Err(e) = renderer.set_ready(false) {
            log::warn!("Renderer failed to show loading state: {}", e);
        }

        let init = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return stats,
            init = Self::initialize(capture, source) => init,
        };

        let geometry = match init {
            Ok(geometry) => geometry,
            Err(e) => {
                log::error!("Initialization failed, staying in loading state: {}", e);
                shutdown.cancelled().await;
                return stats;
            }
        };

        stats.ready = true;
        if let Err(e) = renderer.set_ready(true) {
            log::warn!("Renderer failed to show live state: {}", e);
        }

        let conversion = ConversionFactor::from_widths(geometry.preview.width, geometry.detector.width);
        let mut engine = OverlayEngine::new(settings.overlay, conversion);
        if let Some(markers) = settings.markers {
            engine = engine.with_markers(markers);
        }
        log::info!(
            "Frame loop started: conversion factor {:.3}, tick every {:?}",
            conversion.value(),
            settings.tick_interval
        );

        let mut interval = tokio::time::interval(settings.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: Option<InFlight<'_>> = None;

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                (tick, result) = next_estimate(&mut in_flight) => {
                    in_flight = None;

                    let pose = match result {
                        Ok(pose) => pose,
                        Err(e) => {
                            stats.source_errors += 1;
                            log::warn!("Keypoint estimate for tick {} failed: {}", tick, e);
                            PoseEstimate::empty()
                        }
                    };
                    stats.frames += 1;

                    let placement = engine.place_selected(&pose, selection);
                    if placement.visible {
                        stats.visible += 1;
                    }
                    let markers = if settings.markers.is_some() {
                        engine.markers(&pose)
                    } else {
                        Vec::new()
                    };

                    let frame = RenderFrame {
                        tick,
                        placement,
                        asset: catalog.entry(placement.asset),
                        markers: &markers,
                    };
                    if let Err(e) = renderer.render(&frame) {
                        log::warn!("Render failed on tick {}: {}", tick, e);
                    }
                }

                _ = interval.tick() => {
                    stats.ticks += 1;
                    if in_flight.is_some() {
                        stats.busy_ticks += 1;
                        continue;
                    }
                    match FrameLease::acquire(capture) {
                        Some(lease) => {
                            // The frame is released as soon as the estimate
                            // returns, or when this future is dropped.
                            let estimate = async move {
                                let result = source.estimate(lease.frame()).await;
                                drop(lease);
                                result
                            };
                            in_flight = Some(InFlight {
                                tick: stats.ticks,
                                estimate: Box::pin(estimate),
                            });
                        }
                        None => stats.empty_ticks += 1,
                    }
                }
            }
        }

        // Dropping the in-flight estimate releases its frame.
        drop(in_flight);

        log::info!(
            "Frame loop stopped: {} ticks, {} frames ({} visible), {} busy, {} empty, {} errors",
            stats.ticks,
            stats.frames,
            stats.visible,
            stats.busy_ticks,
            stats.empty_ticks,
            stats.source_errors
        );
        stats
    }
}
