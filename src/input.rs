//! Line-based selection input.
//!
//! This module handles:
//! - Parsing selection commands typed on stdin (`next`, `prev`, an asset name)
//! - Applying them to the shared [`SelectionState`]

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use crate::selection::{Catalog, OverlayAsset, SelectionState};

/// A parsed selection command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCommand {
    Next,
    Prev,
    Select(OverlayAsset),
}

/// Result of handling one input line.
#[derive(Debug, PartialEq, Eq)]
pub enum InputAction {
    /// Selection now points at this asset
    Selected(OverlayAsset),
    /// Blank line, nothing to do
    None,
    /// Line did not match any command or asset
    Unknown(String),
}

/// Parse one line of input against `catalog`.
///
/// Accepts `next`/`n`/`>` and `prev`/`p`/`<`, an asset name, or a catalog index.
pub fn parse_command(line: &str, catalog: &Catalog) -> Option<SelectionCommand> {
    let word = line.trim();
    match word.to_lowercase().as_str() {
        "next" | "n" | ">" => Some(SelectionCommand::Next),
        "prev" | "p" | "<" => Some(SelectionCommand::Prev),
        _ => catalog
            .find(word)
            .or_else(|| word.parse::<usize>().ok().and_then(|i| catalog.get(i)))
            .map(SelectionCommand::Select),
    }
}

/// Apply `command` to `selection`, returning the newly selected asset.
pub fn apply_command(
    command: SelectionCommand,
    catalog: &Catalog,
    selection: &SelectionState,
) -> OverlayAsset {
    let asset = match command {
        SelectionCommand::Next => catalog.next(selection.current()),
        SelectionCommand::Prev => catalog.prev(selection.current()),
        SelectionCommand::Select(asset) => asset,
    };
    selection.select(asset);
    asset
}

/// Parse and apply one input line.
pub fn handle_line(line: &str, catalog: &Catalog, selection: &SelectionState) -> InputAction {
    if line.trim().is_empty() {
        return InputAction::None;
    }
    match parse_command(line, catalog) {
        Some(command) => InputAction::Selected(apply_command(command, catalog, selection)),
        None => InputAction::Unknown(line.trim().to_string()),
    }
}

/// Read selection commands from stdin until it closes.
pub fn spawn_stdin_selector(
    catalog: Arc<Catalog>,
    selection: Arc<SelectionState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match handle_line(&line, &catalog, &selection) {
                    InputAction::Selected(asset) => {
                        log::info!("Selected overlay: {}", catalog.name(asset));
                    }
                    InputAction::Unknown(word) => {
                        log::warn!("Unknown overlay or command: {}", word);
                    }
                    InputAction::None => {}
                },
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Stopped reading selection input: {}", e);
                    break;
                }
            }
        }
    })
}
