//! Presentation of overlay placements.
//!
//! The frame loop hands each computed placement to a [`Renderer`] together
//! with the selected asset. Two line-oriented renderers are provided: a human
//! readable one and a JSON-lines one for piping into a compositor.

use std::io::Write;

use serde::Serialize;

use crate::engine::{Marker, OverlayPlacement};
use crate::selection::AssetEntry;

/// Everything the renderer needs for one tick.
#[derive(Debug)]
pub struct RenderFrame<'a> {
    /// Tick on which the frame was acquired
    pub tick: u64,
    pub placement: OverlayPlacement,
    pub asset: &'a AssetEntry,
    /// Debug keypoint markers; empty unless enabled
    pub markers: &'a [Marker],
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Draws the loading presentation or the live overlay.
pub trait Renderer {
    /// Switch between the loading presentation (`false`) and the live view (`true`).
    fn set_ready(&mut self, ready: bool) -> Result<(), RenderError>;

    /// Composite one placement.
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn set_ready(&mut self, ready: bool) -> Result<(), RenderError> {
        (**self).set_ready(ready)
    }

    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError> {
        (**self).render(frame)
    }
}

/// Writes one human-readable line per tick.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn set_ready(&mut self, ready: bool) -> Result<(), RenderError> {
        if ready {
            writeln!(self.out, "Camera ready")?;
        } else {
            writeln!(self.out, "Loading pose model...")?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError> {
        let placement = &frame.placement;
        if placement.visible {
            write!(
                self.out,
                "tick {:>5}  {}  scale={:.2}  anchor=({:.1}, {:.1})",
                frame.tick, frame.asset.name, placement.scale, placement.anchor.x, placement.anchor.y
            )?;
        } else {
            write!(self.out, "tick {:>5}  {}  hidden", frame.tick, frame.asset.name)?;
        }
        for marker in frame.markers {
            write!(
                self.out,
                "  {:?}@({:.0}, {:.0})",
                marker.part, marker.position.x, marker.position.y
            )?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    tick: u64,
    asset: &'a str,
    #[serde(flatten)]
    placement: &'a OverlayPlacement,
    #[serde(skip_serializing_if = "<[Marker]>::is_empty")]
    markers: &'a [Marker],
}

/// Writes one JSON object per line.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn set_ready(&mut self, ready: bool) -> Result<(), RenderError> {
        serde_json::to_writer(&mut self.out, &serde_json::json!({ "ready": ready }))?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError> {
        let line = JsonLine {
            tick: frame.tick,
            asset: &frame.asset.name,
            placement: &frame.placement,
            markers: frame.markers,
        };
        serde_json::to_writer(&mut self.out, &line)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
