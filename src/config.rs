//! Configuration file handling for eyewear-overlay.
//!
//! Loads configuration from `<config dir>/eyewear-overlay/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::{CaptureGeometry, Resolution};
use crate::engine::{MarkerParams, OverlayParams};
use crate::event_loop::LoopSettings;
use crate::selection::{AssetEntry, Catalog, CatalogError};

/// Configuration file structure for eyewear-overlay.
/// Every section and field is optional; missing values fall back to built-in defaults.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub frame_loop: FrameLoopConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub catalog: Vec<AssetEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub threshold: f32,
    pub normalization_factor: f32,
    pub vertical_damping: f32,
    pub top_offset: f32,
    pub left_offset: f32,
    /// Asset selected at startup (defaults to the first catalog entry)
    pub asset: Option<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        let params = OverlayParams::default();
        Self {
            threshold: params.threshold,
            normalization_factor: params.normalization_factor,
            vertical_damping: params.vertical_damping,
            top_offset: params.top_offset,
            left_offset: params.left_offset,
            asset: None,
        }
    }
}

impl OverlayConfig {
    /// Returns the name of the first tunable the engine cannot work with.
    ///
    /// `threshold` must lie in [0, 1]; `normalization_factor` and
    /// `vertical_damping` are divisors and must be positive.
    fn validate(&self) -> Result<(), &'static str> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err("threshold");
        }
        if !(self.normalization_factor.is_finite() && self.normalization_factor > 0.0) {
            return Err("normalization_factor");
        }
        if !(self.vertical_damping.is_finite() && self.vertical_damping > 0.0) {
            return Err("vertical_damping");
        }
        if !self.top_offset.is_finite() {
            return Err("top_offset");
        }
        if !self.left_offset.is_finite() {
            return Err("left_offset");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub input_width: u32,
    pub input_height: u32,
    /// Mirror keypoints horizontally (front camera on some platforms)
    pub flip_horizontal: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_width: Resolution::DETECTOR.width,
            input_height: Resolution::DETECTOR.height,
            flip_horizontal: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: Resolution::PREVIEW.width,
            height: Resolution::PREVIEW.height,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FrameLoopConfig {
    pub tick_interval_ms: u64,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: LoopSettings::DEFAULT_TICK_INTERVAL.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub markers: bool,
    pub marker_threshold: f32,
    pub marker_left_offset: f32,
    pub marker_top_offset: f32,
}

impl Default for DebugConfig {
    fn default() -> Self {
        let markers = MarkerParams::default();
        Self {
            markers: false,
            marker_threshold: markers.threshold,
            marker_left_offset: markers.left_offset,
            marker_top_offset: markers.top_offset,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            Self::load_from_explicit(path)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Load configuration from a path the user named explicitly.
    /// Unlike [`Config::load`], a missing file is an error.
    pub fn load_from_explicit(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.clone(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?;
        config.overlay.validate().map_err(|field| ConfigError::Invalid {
            path: path.clone(),
            field,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn overlay_params(&self) -> OverlayParams {
        OverlayParams {
            threshold: self.overlay.threshold,
            normalization_factor: self.overlay.normalization_factor,
            vertical_damping: self.overlay.vertical_damping,
            top_offset: self.overlay.top_offset,
            left_offset: self.overlay.left_offset,
        }
    }

    pub fn marker_params(&self) -> Option<MarkerParams> {
        self.debug.markers.then(|| MarkerParams {
            threshold: self.debug.marker_threshold,
            left_offset: self.debug.marker_left_offset,
            top_offset: self.debug.marker_top_offset,
        })
    }

    pub fn geometry(&self) -> CaptureGeometry {
        CaptureGeometry {
            detector: Resolution::new(self.detector.input_width, self.detector.input_height),
            preview: Resolution::new(self.display.width, self.display.height),
        }
    }

    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            overlay: self.overlay_params(),
            markers: self.marker_params(),
            tick_interval: Duration::from_millis(self.frame_loop.tick_interval_ms.max(1)),
        }
    }

    /// The configured catalog, or the built-in one when none is configured.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        if self.catalog.is_empty() {
            Ok(Catalog::builtin())
        } else {
            Catalog::new(self.catalog.clone())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid {
        path: PathBuf,
        field: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Invalid { path, field } => {
                write!(
                    f,
                    "Invalid value for 'overlay.{}' in config file '{}'",
                    field,
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("eyewear-overlay").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/eyewear-overlay/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_match_engine_defaults() {
        let config = Config::default();
        assert_eq!(config.overlay_params(), OverlayParams::default());
        assert_eq!(config.geometry(), CaptureGeometry::default());
        assert!(config.marker_params().is_none());
        assert_eq!(config.loop_settings().tick_interval, Duration::from_millis(16));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/eyewear/config.toml"))).unwrap();
        assert_eq!(config.overlay.threshold, 0.85);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Config::load_from_explicit(PathBuf::from("/nonexistent/eyewear/config.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_partial_overlay_section() {
        let file = write_config(
            r#"
[overlay]
threshold = 0.6
asset = "aviator"

[display]
width = 336
"#,
        );
        let config = Config::load(Some(file.path())).unwrap();
        let params = config.overlay_params();
        assert_eq!(params.threshold, 0.6);
        assert_eq!(params.normalization_factor, 35.0);
        assert_eq!(config.overlay.asset.as_deref(), Some("aviator"));
        assert_eq!(config.geometry().preview.width, 336);
        assert_eq!(config.geometry().detector.width, 168);
    }

    #[test]
    fn test_catalog_entries() {
        let file = write_config(
            r#"
[[catalog]]
name = "wayfarer"
path = "glasses/wayfarer.png"

[[catalog]]
name = "monocle"
path = "glasses/monocle.png"
"#,
        );
        let config = Config::load(Some(file.path())).unwrap();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name(catalog.first()), "wayfarer");
    }

    #[test]
    fn test_empty_catalog_falls_back_to_builtin() {
        let catalog = Config::default().catalog().unwrap();
        assert_eq!(catalog.name(catalog.first()), "sun");
    }

    #[test]
    fn test_debug_markers_enabled() {
        let file = write_config("[debug]\nmarkers = true\nmarker_threshold = 0.3\n");
        let config = Config::load(Some(file.path())).unwrap();
        let markers = config.marker_params().unwrap();
        assert_eq!(markers.threshold, 0.3);
        assert_eq!(markers.left_offset, 35.0);
        assert_eq!(markers.top_offset, 60.0);
    }

    #[test]
    fn test_zero_tick_interval_is_clamped() {
        let file = write_config("[frame_loop]\ntick_interval_ms = 0\n");
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.loop_settings().tick_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_parse_error_names_path() {
        let file = write_config("[overlay\nthreshold = ");
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    fn invalid_field(content: &str) -> &'static str {
        let file = write_config(content);
        match Config::load(Some(file.path())) {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected invalid config, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_normalization_factor_rejected() {
        assert_eq!(
            invalid_field("[overlay]\nnormalization_factor = -35.0\n"),
            "normalization_factor"
        );
        assert_eq!(
            invalid_field("[overlay]\nnormalization_factor = 0.0\n"),
            "normalization_factor"
        );
        assert_eq!(
            invalid_field("[overlay]\nnormalization_factor = inf\n"),
            "normalization_factor"
        );
    }

    #[test]
    fn test_zero_vertical_damping_rejected() {
        assert_eq!(invalid_field("[overlay]\nvertical_damping = 0.0\n"), "vertical_damping");
        assert_eq!(invalid_field("[overlay]\nvertical_damping = -2.4\n"), "vertical_damping");
        assert_eq!(invalid_field("[overlay]\nvertical_damping = nan\n"), "vertical_damping");
    }

    #[test]
    fn test_threshold_outside_unit_range_rejected() {
        assert_eq!(invalid_field("[overlay]\nthreshold = 1.5\n"), "threshold");
        assert_eq!(invalid_field("[overlay]\nthreshold = -0.1\n"), "threshold");
        assert_eq!(invalid_field("[overlay]\nthreshold = nan\n"), "threshold");
    }

    #[test]
    fn test_non_finite_offset_rejected() {
        assert_eq!(invalid_field("[overlay]\ntop_offset = inf\n"), "top_offset");
        assert_eq!(invalid_field("[overlay]\nleft_offset = -inf\n"), "left_offset");
    }

    #[test]
    fn test_invalid_error_names_field_and_path() {
        let file = write_config("[overlay]\nvertical_damping = 0.0\n");
        let err = Config::load(Some(file.path())).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("overlay.vertical_damping"), "{}", message);
        assert!(message.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_valid_overlay_keeps_placement_in_range() {
        use crate::engine::{ConversionFactor, OverlayEngine};
        use crate::pose::{BodyPart, Keypoint, PoseEstimate};

        let file = write_config("[overlay]\nnormalization_factor = 20.0\nvertical_damping = 1.5\n");
        let config = Config::load(Some(file.path())).unwrap();
        let engine = OverlayEngine::new(config.overlay_params(), ConversionFactor::IDENTITY);
        let pose = PoseEstimate::new(vec![
            Keypoint::new(BodyPart::LeftEye, 140.0, 100.0, 0.9),
            Keypoint::new(BodyPart::RightEye, 100.0, 100.0, 0.9),
        ]);
        let placement = engine.place(&pose, Catalog::builtin().first());
        assert!(placement.visible);
        assert!(placement.scale >= 0.0);
        assert!(placement.anchor.y.is_finite());
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = default_path();
        assert!(path.ends_with("eyewear-overlay/config.toml"));
    }
}
