//! Daemon configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are overridden by the user's file, which in turn is overridden by the
//! `--import` / `--export` command line flags.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! import = "/data/import"   # Watched for raw files (non-recursive)
//! export = "/data/export"   # Receives the desqueezed DNGs
//!
//! [lens]
//! scale_factor = 1.33                   # Anamorphic stretch ratio
//! candidate_focal_lengths = [0, 24, 50] # Focal lengths reported with the adapter
//! default_focal_length = "35.0A mm"     # Written when the adapter reports 0 mm
//! raw_file_types = ["ARW"]              # exiftool FileType codes to consider
//!
//! [schedule]
//! interval_secs = 300       # Pause between scans
//!
//! [thumbnail]
//! width = 1024              # Embedded PreviewImage width
//! # pad_to_height = 768     # Letterbox onto a black canvas of this height
//!
//! [tools]
//! exiftool = "exiftool"
//! dnglab = "dnglab"
//! magick = "magick"
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::ThumbnailConfig;
use crate::lens::LensProfile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("{role} directory does not exist: {path}")]
    MissingDirectory { role: &'static str, path: PathBuf },
    #[error("{role} path is not a directory: {path}")]
    NotADirectory { role: &'static str, path: PathBuf },
    #[error("{role} directory is not writable: {path}: {source}")]
    NotWritable {
        role: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Daemon configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Import and export directories.
    pub paths: PathsConfig,
    /// Adapter constants and the raw formats to consider.
    pub lens: LensConfig,
    /// Scan interval.
    pub schedule: ScheduleConfig,
    /// Embedded thumbnail size.
    pub thumbnail: ThumbnailSettings,
    /// External tool executables.
    pub tools: ToolsConfig,
}

impl DaemonConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scale = self.lens.scale_factor;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ConfigError::Validation(
                "lens.scale_factor must be a positive number".into(),
            ));
        }
        if self.lens.candidate_focal_lengths.is_empty() {
            return Err(ConfigError::Validation(
                "lens.candidate_focal_lengths must not be empty".into(),
            ));
        }
        if self.lens.raw_file_types.is_empty() {
            return Err(ConfigError::Validation(
                "lens.raw_file_types must not be empty".into(),
            ));
        }
        if self.schedule.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "schedule.interval_secs must be non-zero".into(),
            ));
        }
        if self.thumbnail.width == 0 {
            return Err(ConfigError::Validation(
                "thumbnail.width must be non-zero".into(),
            ));
        }
        if self.thumbnail.pad_to_height == Some(0) {
            return Err(ConfigError::Validation(
                "thumbnail.pad_to_height must be non-zero when set".into(),
            ));
        }
        Ok(())
    }

    pub fn lens_profile(&self) -> LensProfile {
        LensProfile {
            scale_factor: self.lens.scale_factor,
            candidate_focal_lengths: self.lens.candidate_focal_lengths.clone(),
            default_focal_length: self.lens.default_focal_length.clone(),
        }
    }

    pub fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            width: self.thumbnail.width,
            pad_to_height: self.thumbnail.pad_to_height,
            ..ThumbnailConfig::default()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }
}

/// Import and export directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub import: PathBuf,
    pub export: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            import: PathBuf::from("/data/import"),
            export: PathBuf::from("/data/export"),
        }
    }
}

/// Adapter constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LensConfig {
    pub scale_factor: f64,
    pub candidate_focal_lengths: Vec<u32>,
    pub default_focal_length: String,
    pub raw_file_types: Vec<String>,
}

impl Default for LensConfig {
    fn default() -> Self {
        let profile = LensProfile::default();
        Self {
            scale_factor: profile.scale_factor,
            candidate_focal_lengths: profile.candidate_focal_lengths,
            default_focal_length: profile.default_focal_length,
            raw_file_types: vec!["ARW".to_string()],
        }
    }
}

/// Scan interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

/// Embedded thumbnail size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailSettings {
    pub width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad_to_height: Option<u32>,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            pad_to_height: None,
        }
    }
}

/// External tool executables, looked up on `PATH` unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub exiftool: PathBuf,
    pub dnglab: PathBuf,
    pub magick: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            exiftool: PathBuf::from("exiftool"),
            dnglab: PathBuf::from("dnglab"),
            magick: PathBuf::from("magick"),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(DaemonConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<DaemonConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: DaemonConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `config.toml` file, or stock defaults when `None`.
///
/// An explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<DaemonConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Check the directories the daemon needs before it starts scanning.
///
/// Both directories must exist and accept changes: the export directory
/// receives new files, and processed sources are deleted from the import
/// directory. Writability is checked by creating and removing a marker file.
pub fn check_directories(paths: &PathsConfig) -> Result<(), ConfigError> {
    require_dir("import", &paths.import)?;
    require_dir("export", &paths.export)?;
    require_writable("import", &paths.import)?;
    require_writable("export", &paths.export)
}

fn require_dir(role: &'static str, path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingDirectory {
            role,
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory {
            role,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn require_writable(role: &'static str, path: &Path) -> Result<(), ConfigError> {
    let marker = path.join(".desqueeze-write-check");
    fs::write(&marker, b"")
        .and_then(|_| fs::remove_file(&marker))
        .map_err(|source| ConfigError::NotWritable {
            role,
            path: path.to_path_buf(),
            source,
        })
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# desqueeze configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Directories
# ---------------------------------------------------------------------------
[paths]
# Scanned for raw files on every run (files directly inside only).
import = "/data/import"

# Desqueezed DNGs are written here. Originals are deleted from the import
# directory once their DNG is complete.
export = "/data/export"

# ---------------------------------------------------------------------------
# Anamorphic adapter
# ---------------------------------------------------------------------------
[lens]
# Horizontal-to-vertical stretch of the adapter. Written to DefaultScale.
scale_factor = 1.33

# Whole-millimetre focal lengths the camera reports with the adapter fitted.
# Combined with an unrecorded aperture (undef or 0) these mark a file as
# anamorphic.
candidate_focal_lengths = [0, 24, 50]

# Written to FocalLength when the camera reported 0 mm.
default_focal_length = "35.0A mm"

# exiftool FileType codes that are considered at all.
raw_file_types = ["ARW"]

# ---------------------------------------------------------------------------
# Scheduling
# ---------------------------------------------------------------------------
[schedule]
# Seconds between the end of one scan and the start of the next.
interval_secs = 300

# ---------------------------------------------------------------------------
# Embedded thumbnail (PreviewImage)
# ---------------------------------------------------------------------------
[thumbnail]
# Width in pixels; the height follows the desqueezed aspect ratio.
width = 1024

# Letterbox onto a black canvas of this height when the thumbnail is shorter.
# pad_to_height = 768

# ---------------------------------------------------------------------------
# External tools
# ---------------------------------------------------------------------------
[tools]
exiftool = "exiftool"
dnglab = "dnglab"
magick = "magick"
"##
}
