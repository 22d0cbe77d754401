// ABOUTME: Shared types and configuration for liquid-glass.
// ABOUTME: Defines colors, pixel buffers, glass settings, and config file handling.

pub mod color;
pub mod config;
pub mod pixels;
pub mod settings;

pub use color::Color;
pub use config::{Config, ConfigError};
pub use pixels::PixelBuffer;
pub use settings::GlassSettings;
