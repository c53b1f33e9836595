//! Global hotkey handling for eyewear-overlay.
//!
//! This module provides global keyboard capture for cycling the overlay catalog.
//! Uses rdev for cross-platform global key listening. Enabled with the
//! `hotkeys` cargo feature.

use rdev::{listen, Event, EventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::input::{apply_command, SelectionCommand};
use crate::selection::{Catalog, SelectionState};

/// Map a pressed key to a selection command.
///
/// Right arrow selects the next overlay, left arrow the previous one.
pub fn command_for_key(key: Key) -> Option<SelectionCommand> {
    match key {
        Key::RightArrow => Some(SelectionCommand::Next),
        Key::LeftArrow => Some(SelectionCommand::Prev),
        _ => None,
    }
}

/// Listens for global arrow keys and publishes selection changes.
pub struct SelectionHotkeys {
    catalog: Arc<Catalog>,
    selection: Arc<SelectionState>,
    /// Flag to stop processing events
    stop_flag: Arc<AtomicBool>,
    listener_thread: Option<JoinHandle<()>>,
}

impl SelectionHotkeys {
    pub fn new(catalog: Arc<Catalog>, selection: Arc<SelectionState>) -> Self {
        Self {
            catalog,
            selection,
            stop_flag: Arc::new(AtomicBool::new(false)),
            listener_thread: None,
        }
    }

    /// Start listening for global hotkeys on a background thread.
    /// Returns an error if the listener is already running.
    pub fn start(&mut self) -> Result<(), String> {
        if self.listener_thread.is_some() {
            return Err("Hotkey listener already running".to_string());
        }

        let catalog = self.catalog.clone();
        let selection = self.selection.clone();
        let stop_flag = self.stop_flag.clone();

        let handle = thread::Builder::new()
            .name("selection-hotkeys".to_string())
            .spawn(move || {
                let callback = move |event: Event| {
                    if stop_flag.load(Ordering::SeqCst) {
                        return;
                    }
                    if let EventType::KeyPress(key) = event.event_type {
                        if let Some(command) = command_for_key(key) {
                            let asset = apply_command(command, &catalog, &selection);
                            log::info!("Selected overlay: {}", catalog.name(asset));
                        }
                    }
                };

                // Blocks until the listener errors; on macOS this needs Accessibility permission
                if let Err(e) = listen(callback) {
                    log::warn!("Hotkey listener error: {:?}", e);
                }
            })
            .map_err(|e| format!("Failed to spawn hotkey thread: {}", e))?;

        self.listener_thread = Some(handle);
        Ok(())
    }

    /// Stop reacting to hotkeys.
    ///
    /// rdev's `listen` cannot be interrupted, so the thread lives until the
    /// process exits; the flag makes it ignore further events.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.listener_thread = None;
    }

    pub fn is_running(&self) -> bool {
        self.listener_thread.is_some()
    }
}

impl Drop for SelectionHotkeys {
    fn drop(&mut self) {
        self.stop();
    }
}
