//! Configuration module for mipscope
//!
//! A [`ScopeConfig`] describes everything needed to build a
//! [`Scope`](crate::scope::Scope): the channels with their rates and
//! calibration, the viewport tuning, and the frame rate of the render loop.
//! Sample history is never persisted.
//!
//! # Location
//!
//! The default configuration lives in the platform data directory:
//! - **Linux**: `~/.local/share/dev.mipscope/scope.toml`
//! - **macOS**: `~/Library/Application Support/dev.mipscope/scope.toml`
//! - **Windows**: `%APPDATA%\dev.mipscope\scope.toml`
//!
//! # Format
//!
//! Files ending in `.toml` are read and written as TOML, anything else as
//! JSON. Every field has a default, so partial files are fine:
//!
//! ```toml
//! frame_rate = 60.0
//!
//! [[channels]]
//! name = "adc0"
//! unit = "V"
//! frequency = 960.0
//!
//! [channels.mapping]
//! value_min = 0.0
//! value_min_raw = 0.0
//! value_max = 5.0
//! value_max_raw = 255.0
//! ```

use crate::channel::{ChannelConfig, ValueMapping};
use crate::error::{Result, ScopeError};
use crate::types::{generate_color, TraceStyle};
use crate::viewport::ViewportSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.mipscope";

/// Default config filename
pub const CONFIG_FILE: &str = "scope.toml";

/// Current config format version
pub const CONFIG_VERSION: u32 = 1;

/// Default render loop rate in Hz
pub const DEFAULT_FRAME_RATE: f64 = 60.0;

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the path of the default config file
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }
}

/// Complete scope setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Version for future migration support
    pub version: u32,
    /// Render loop rate in Hz
    pub frame_rate: f64,
    /// Channels in draw order; the first one is the time reference
    pub channels: Vec<ChannelConfig>,
    /// Viewport motion and limits
    pub viewport: ViewportSettings,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        let fast = ChannelConfig::new("ch0", 60.0)
            .with_unit("V")
            .with_mapping(ValueMapping::new(0.0, 0.0, 5.0, 255.0));
        let slow = ChannelConfig::new("ch1", 5.0)
            .with_unit("V")
            .with_mapping(ValueMapping::new(0.0, 0.0, 3.3, 255.0))
            .with_style(TraceStyle::default().with_color(generate_color(1)));

        Self {
            version: CONFIG_VERSION,
            frame_rate: DEFAULT_FRAME_RATE,
            channels: vec![fast, slow],
            viewport: ViewportSettings::default(),
        }
    }
}

impl ScopeConfig {
    /// Load a config file, TOML or JSON by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScopeError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = match Format::of(path) {
            Format::Toml => toml::from_str(&content).map_err(|e| {
                ScopeError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?,
            Format::Json => serde_json::from_str(&content).map_err(|e| {
                ScopeError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?,
        };

        config.validate()?;
        tracing::debug!(
            "Loaded config {:?} with {} channel(s)",
            path,
            config.channels.len()
        );
        Ok(config)
    }

    /// Load the config from the platform data directory, falling back to
    /// defaults when it is missing or invalid
    pub fn load_or_default() -> Self {
        let Some(path) = default_config_path() else {
            tracing::warn!("Could not determine app data directory, using default config");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save to disk, TOML or JSON by extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = match Format::of(path) {
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| ScopeError::Serialization(format!("{}", e)))?,
            Format::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ScopeError::Serialization(format!("{}", e)))?,
        };

        std::fs::write(path, content).map_err(|e| {
            ScopeError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Check everything a [`Scope`](crate::scope::Scope) needs
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(ScopeError::Configuration(
                "at least one channel is required".to_string(),
            ));
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ScopeError::Configuration(format!(
                "frame rate must be positive, got {}",
                self.frame_rate
            )));
        }
        for (i, channel) in self.channels.iter().enumerate() {
            channel
                .validate()
                .map_err(|e| e.with_context(format!("channels[{}]", i)))?;
        }
        Ok(())
    }

    /// Seconds between two frames
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.frame_rate
    }
}
