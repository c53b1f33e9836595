//! eyewear-overlay library crate.
//!
//! Places an eyewear graphic over the eyes found in a stream of pose
//! estimates. The pure placement math lives in [`engine`]; [`event_loop`]
//! drives capture, keypoint estimation and rendering once per display tick.

pub mod capture;
pub mod cli;
pub mod config;
pub mod engine;
pub mod event_loop;
#[cfg(feature = "hotkeys")]
pub mod hotkeys;
pub mod input;
pub mod pose;
pub mod renderer;
pub mod selection;
pub mod source;
