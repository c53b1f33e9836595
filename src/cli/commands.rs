//! Subcommand handlers for assets and config actions.

use std::path::{Path, PathBuf};

use super::args::ConfigAction;
use crate::config::{default_path as get_config_path, Config};
use crate::selection::Catalog;

/// Template written by `config init`.
pub const DEFAULT_CONFIG: &str = r#"# eyewear-overlay configuration

[overlay]
# Eye keypoints must score above this to place the overlay
threshold = 0.85
# Eye distance in screen pixels that maps to scale 1.0
normalization_factor = 35.0
# The left eye's screen y is divided by this, then top_offset is added
vertical_damping = 2.4
top_offset = 40.0
# Added to the left eye's screen x
left_offset = 45.0
# Overlay selected at startup (defaults to the first catalog entry)
# asset = "aviator"

[detector]
# Input size of the pose model
input_width = 168
input_height = 224
# Mirror keypoints horizontally
flip_horizontal = false

[display]
# Camera preview size in screen pixels
width = 375
height = 500

[frame_loop]
# Display tick period
tick_interval_ms = 16

[debug]
# Draw a marker at every confident keypoint
markers = false
marker_threshold = 0.5
marker_left_offset = 35.0
marker_top_offset = 60.0

# Overlay catalog. Leave empty to use the built-in eyewear.
# [[catalog]]
# name = "aviator"
# path = "assets/aviator.png"
"#;

/// Print the catalog, marking the overlay selected at startup.
pub fn list_assets(catalog: &Catalog, initial: Option<&str>) {
    let selected = initial
        .and_then(|name| catalog.find(name))
        .unwrap_or_else(|| catalog.first());
    println!("Available overlays:");
    for (asset, entry) in catalog.iter() {
        let marker = if asset == selected { "*" } else { " " };
        println!(
            " {} [{}] {} ({})",
            marker,
            asset.index(),
            entry.name,
            entry.path.display()
        );
    }
    println!();
    println!("Use --asset <name> to choose one at startup, or type its name while running.");
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    explicit_path: Option<&Path>,
) -> Result<(), String> {
    let config_path = explicit_path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            let params = config.overlay_params();
            let geometry = config.geometry();
            println!("Current configuration:");
            println!("  Threshold: {}", params.threshold);
            println!("  Normalization factor: {}", params.normalization_factor);
            println!("  Vertical damping: {}", params.vertical_damping);
            println!("  Offsets: top {} / left {}", params.top_offset, params.left_offset);
            println!("  Detector input: {}", geometry.detector);
            println!("  Display: {}", geometry.preview);
            println!("  Tick interval: {} ms", config.frame_loop.tick_interval_ms);
            println!(
                "  Debug markers: {}",
                if config.debug.markers { "yes" } else { "no" }
            );
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            write_default_config(&config_path)?;
            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}

/// Write [`DEFAULT_CONFIG`] to `path`, refusing to overwrite an existing file.
fn write_default_config(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Err(format!(
            "Config file already exists: {}\nUse 'eyewear-overlay config show' to view current settings.",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Error creating config directory: {}", e))?;
    }

    std::fs::write(path, DEFAULT_CONFIG).map_err(|e| format!("Error writing config file: {}", e))
}
