// ABOUTME: Application configuration handling.
// ABOUTME: Loads and saves settings from TOML config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::GlassSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glass effect settings
    pub glass: GlassSettings,

    /// Backdrop image to load at startup (aspect-filled to the window)
    pub background_image: Option<PathBuf>,

    /// When true the glass shape follows the ambient animation feed
    /// instead of the generated rounded rectangle
    pub ambient_mask: bool,

    /// Pixels moved per arrow-key press
    pub key_step: f32,

    /// Window dimensions
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            glass: GlassSettings::default(),
            background_image: None,
            ambient_mask: false,
            key_step: 10.0,
            window_width: 1200,
            window_height: 800,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

impl Config {
    /// Get the default config file path (~/.config/liquid-glass/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("liquid-glass").join("config.toml"))
    }

    /// Load config from a path
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config.sanitized())
    }

    /// Load config from default path, or return default config if not found
    pub fn load_or_default() -> Self {
        Self::default_path()
            .and_then(|path| Self::load(&path).ok())
            .unwrap_or_default()
    }

    /// Save config to a path
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        self.glass = self.glass.sanitized();
        self.key_step = self.key_step.max(1.0);
        self.window_width = self.window_width.max(1);
        self.window_height = self.window_height.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let restored: Config = toml::from_str(&text).unwrap();
        assert_eq!(restored.glass, config.glass);
        assert_eq!(restored.key_step, config.key_step);
        assert_eq!(restored.window_width, config.window_width);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = toml::from_str("ambient_mask = true").unwrap();
        assert!(config.ambient_mask);
        assert_eq!(config.window_width, Config::default().window_width);
    }

    #[test]
    fn load_clamps_out_of_range_values() {
        let dir = std::env::temp_dir().join("glass-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "key_step = -5.0\n[glass]\nblur_radius = 99.0\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.key_step, 1.0);
        assert_eq!(config.glass.blur_radius, crate::settings::MAX_BLUR_RADIUS);
        std::fs::remove_file(&path).ok();
    }
}
