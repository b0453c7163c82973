//! Toolkit configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global toolkit configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Acquisition defaults used when a command does not override them.
    pub acquisition: AcquisitionDefaults,

    /// Activity matrix buffering defaults.
    pub buffering: BufferingDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default acquisition parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionDefaults {
    /// Frame width in pixels after sensor binning.
    pub frame_width: u32,

    /// Frame height in pixels after sensor binning.
    pub frame_height: u32,

    /// Reduction operator name (sum, avg, min, max).
    pub operation: String,

    /// Fallback ROI settings file, used when no settings are supplied.
    pub roi_defaults_path: PathBuf,
}

/// Defaults for buffering activity streams into matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferingDefaults {
    /// Number of frames per matrix.
    pub buffer_size: usize,

    /// Number of frames between the starts of consecutive matrices.
    pub skip_size: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "fip_processing_core=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AcquisitionDefaults {
    fn default() -> Self {
        Self {
            frame_width: 200,
            frame_height: 200,
            operation: "sum".to_string(),
            roi_defaults_path: PathBuf::from("../.local/default.json"),
        }
    }
}

impl Default for BufferingDefaults {
    fn default() -> Self {
        Self {
            buffer_size: 5,
            skip_size: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from `path`, falling back to defaults when the file is
    /// missing or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("fip").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_rig() {
        let config = AppConfig::default();
        assert_eq!(config.acquisition.frame_width, 200);
        assert_eq!(config.acquisition.frame_height, 200);
        assert_eq!(config.acquisition.operation, "sum");
        assert_eq!(config.buffering.buffer_size, 5);
        assert_eq!(config.buffering.skip_size, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"acquisition": {"operation": "max"}}"#).unwrap();
        assert_eq!(config.acquisition.operation, "max");
        assert_eq!(config.acquisition.frame_width, 200);
        assert_eq!(config.buffering, BufferingDefaults::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("fip_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.buffering.buffer_size = 12;
        config.logging.json = true;
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path), config);

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());

        std::fs::remove_dir_all(&dir).ok();
    }
}
