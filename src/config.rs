//! Configuration file support.
//!
//! Engine settings are stored as versioned JSON. Every field has a serde
//! default, so older or hand-trimmed files keep loading.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::canvas::CanvasSettings;
use crate::model::{HANDLE_HIT_RADIUS, MIN_BBOX_SIZE};
use crate::palette::{Palette, Rgb};
use crate::undo::UndoConfig;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,

    /// Canvas editing behavior
    #[serde(default)]
    pub canvas: CanvasConfig,

    /// Undo history
    #[serde(default)]
    pub undo: UndoSection,

    /// Explicit class colors, installed into the palette at start-up
    #[serde(default)]
    pub class_colors: BTreeMap<String, Rgb>,
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Canvas section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Corner grab radius in image pixels
    #[serde(default = "default_hit_tolerance")]
    pub hit_tolerance: f64,

    /// Smallest box side accepted from a gesture, in image pixels
    #[serde(default = "default_min_box_size")]
    pub min_box_size: f64,

    /// Keep boxes inside the image while drawing and moving
    #[serde(default = "default_clamp_to_image")]
    pub clamp_to_image: bool,

    /// Shift applied to boxes pasted back onto the image they were copied from
    #[serde(default = "default_paste_offset")]
    pub paste_offset: f64,
}

fn default_hit_tolerance() -> f64 {
    HANDLE_HIT_RADIUS
}

fn default_min_box_size() -> f64 {
    MIN_BBOX_SIZE
}

fn default_clamp_to_image() -> bool {
    true
}

fn default_paste_offset() -> f64 {
    10.0
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            hit_tolerance: default_hit_tolerance(),
            min_box_size: default_min_box_size(),
            clamp_to_image: default_clamp_to_image(),
            paste_offset: default_paste_offset(),
        }
    }
}

impl CanvasConfig {
    /// Settings for the interaction state machine.
    pub fn settings(&self) -> CanvasSettings {
        CanvasSettings {
            hit_tolerance: self.hit_tolerance,
            min_box_size: self.min_box_size,
            clamp_to_image: self.clamp_to_image,
        }
    }
}

/// Undo section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoSection {
    /// Maximum number of undo steps kept per image
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_max_history() -> usize {
    UndoConfig::default().max_history
}

impl Default for UndoSection {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

impl UndoSection {
    pub fn undo_config(&self) -> UndoConfig {
        UndoConfig {
            max_history: self.max_history,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: Preferences::default(),
            canvas: CanvasConfig::default(),
            undo: UndoSection::default(),
            class_colors: BTreeMap::new(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Install the configured class colors into `palette`.
    pub fn apply_class_colors(&self, palette: &mut Palette) {
        for (label, rgb) in &self.class_colors {
            palette.set_override(label, *rgb);
        }
    }

    /// Replace the stored class colors with the palette's current overrides.
    pub fn capture_class_colors(&mut self, palette: &Palette) {
        self.class_colors = palette.overrides();
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "bboxed-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("bboxed").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("bboxed")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
