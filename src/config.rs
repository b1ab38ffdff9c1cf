//! Configuration file support.
//!
//! Settings are stored as JSON: in the platform config directory on native
//! targets and in `localStorage` on the web.

use fillfx_gpu::{CameraConfig, ClearColor};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PIXEL_SIZE, MAX_PIXEL_SIZE, MIN_PIXEL_SIZE};

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

/// Camera and clear colour of the preview canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Distance from the camera to the image plane
    pub camera_distance: f32,
    /// RGBA, each in `0.0..=1.0`
    pub clear_color: [f64; 4],
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let camera = CameraConfig::default();
        let clear = ClearColor::TRANSPARENT;
        Self {
            fov_y_degrees: camera.fov_y_degrees,
            z_near: camera.z_near,
            z_far: camera.z_far,
            camera_distance: camera.distance,
            clear_color: [clear.r, clear.g, clear.b, clear.a],
        }
    }
}

impl PreviewConfig {
    pub fn camera(&self) -> CameraConfig {
        CameraConfig {
            fov_y_degrees: self.fov_y_degrees,
            z_near: self.z_near,
            z_far: self.z_far,
            distance: self.camera_distance,
        }
    }

    pub fn clear_color(&self) -> ClearColor {
        let [r, g, b, a] = self.clear_color;
        ClearColor::new(r, g, b, a)
    }
}

impl From<&PreviewConfig> for CameraConfig {
    fn from(config: &PreviewConfig) -> Self {
        config.camera()
    }
}

/// Defaults for the "Pixelate" action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelateConfig {
    pub pixel_size: u32,
    pub min_pixel_size: u32,
    pub max_pixel_size: u32,
    /// Add the result as a new fill instead of replacing the last upload
    pub add_new_layer: bool,
}

impl Default for PixelateConfig {
    fn default() -> Self {
        Self {
            pixel_size: DEFAULT_PIXEL_SIZE,
            min_pixel_size: MIN_PIXEL_SIZE,
            max_pixel_size: MAX_PIXEL_SIZE,
            add_new_layer: false,
        }
    }
}

impl PixelateConfig {
    /// Clamp a requested pixel size into the configured bounds.
    pub fn clamp(&self, pixel_size: u32) -> u32 {
        let (lo, hi) = if self.min_pixel_size <= self.max_pixel_size {
            (self.min_pixel_size, self.max_pixel_size)
        } else {
            (self.max_pixel_size, self.min_pixel_size)
        };
        pixel_size.clamp(lo, hi)
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub pixelate: PixelateConfig,
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            preview: PreviewConfig::default(),
            pixelate: PixelateConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "fillfx-config.json"
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("fillfx").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("fillfx")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load from the default path, or `None` if missing or unreadable.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        Self::load_from_path(&path)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &std::path::Path) -> Option<Self> {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to_path(&path)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// LocalStorage key for WASM config persistence.
    #[cfg(target_arch = "wasm32")]
    const LOCALSTORAGE_KEY: &'static str = "fillfx-config";

    /// Try to load configuration from localStorage (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Option<Self> {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;

        match storage.get_item(Self::LOCALSTORAGE_KEY) {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from localStorage");
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config from localStorage: {}", e);
                    None
                }
            },
            Ok(None) => {
                log::debug!("No config found in localStorage");
                None
            }
            Err(e) => {
                log::warn!("Failed to read from localStorage: {:?}", e);
                None
            }
        }
    }

    /// Save configuration to localStorage (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn save_to_local_storage(&self) -> Result<(), ConfigError> {
        let window = web_sys::window()
            .ok_or_else(|| ConfigError::StorageError("No window object available".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(|e| ConfigError::StorageError(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| ConfigError::StorageError("localStorage not available".to_string()))?;

        let json = self.to_json()?;
        storage
            .set_item(Self::LOCALSTORAGE_KEY, &json)
            .map_err(|e| {
                ConfigError::StorageError(format!("Failed to save to localStorage: {:?}", e))
            })?;

        log::info!("Saved configuration to localStorage");
        Ok(())
    }

    /// Load from wherever this target persists config, else defaults.
    pub fn load_or_default() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let loaded = Self::load_from_default_path();
        #[cfg(target_arch = "wasm32")]
        let loaded = Self::load_from_local_storage();
        loaded.unwrap_or_default()
    }
}

impl Default for AppConfig {
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

    /// Storage error (localStorage in WASM)
    #[error("Storage error: {0}")]
    StorageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let mut config = AppConfig::new();
        config.log_level = LogLevel::Debug;
        config.pixelate.pixel_size = 12;
        config.preview.clear_color = [0.1, 0.2, 0.3, 1.0];

        let json = config.to_json().unwrap();
        let parsed = AppConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_version_too_new() {
        let json = format!(r#"{{ "version": {} }}"#, CONFIG_VERSION + 1);
        let result = AppConfig::from_json(&json);
        assert!(matches!(result, Err(ConfigError::VersionTooNew { .. })));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let parsed = AppConfig::from_json(r#"{ "version": 1, "pixelate": { "pixel_size": 6 } }"#)
            .unwrap();
        assert_eq!(parsed.log_level, LogLevel::Info);
        assert_eq!(parsed.preview, PreviewConfig::default());
        assert_eq!(parsed.pixelate.pixel_size, 6);
        assert_eq!(parsed.pixelate.max_pixel_size, MAX_PIXEL_SIZE);
    }

    #[test]
    fn test_log_level_names() {
        let parsed: LogLevel = serde_json::from_str(r#""warn""#).unwrap();
        assert_eq!(parsed.to_level_filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_preview_config_matches_camera_defaults() {
        let camera: CameraConfig = (&PreviewConfig::default()).into();
        assert_eq!(camera, CameraConfig::default());
        assert_eq!(PreviewConfig::default().clear_color(), ClearColor::TRANSPARENT);
    }

    #[test]
    fn test_pixel_size_clamp() {
        let config = PixelateConfig::default();
        assert_eq!(config.clamp(0), MIN_PIXEL_SIZE);
        assert_eq!(config.clamp(10_000), MAX_PIXEL_SIZE);
        assert_eq!(config.clamp(DEFAULT_PIXEL_SIZE), DEFAULT_PIXEL_SIZE);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_save_and_load_path() {
        let path = std::env::temp_dir()
            .join(format!("fillfx-config-test-{}", std::process::id()))
            .join(AppConfig::default_filename());
        let mut config = AppConfig::new();
        config.pixelate.add_new_layer = true;

        config.save_to_path(&path).unwrap();
        assert_eq!(AppConfig::load_from_path(&path), Some(config));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
