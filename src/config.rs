//! # webprint configuration
//!
//! One TOML file configures logging, job tracking, capability defaults, accepted document
//! types and the simulated print queue. Every table and key is optional.
//!
//! ## Example
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [tracker]
//! poll_interval_ms = 3000
//!
//! [defaults]
//! media = "iso_a4_210x297mm"
//! color_mode = "color"
//! quality = "normal"
//!
//! [documents]
//! allowed_extensions = ["pdf", "txt", "png", "jpg", "jpeg", "gif", "doc", "docx"]
//!
//! [simulator]
//! pending_ms = 2000
//! processing_ms = 5000
//! retention_ms = 60000
//!
//! [[simulator.printers]]
//! name = "office_laser"
//! media = ["na_letter_8.5x11in", "iso_a4_210x297mm"]
//! color_modes = ["monochrome"]
//! qualities = ["draft", "normal"]
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use webprint_shared::DocumentKind;
use webprint_simulator::SimulatorConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Values preferred when deriving defaults from a printer's capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_media")]
    pub media: String,
    #[serde(default = "default_color_mode")]
    pub color_mode: String,
    #[serde(default = "default_quality")]
    pub quality: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            media: default_media(),
            color_mode: default_color_mode(),
            quality: default_quality(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl DocumentsConfig {
    /// Kind for `file_name`, or `None` if its extension is not accepted.
    pub fn classify(&self, file_name: &str) -> Option<DocumentKind> {
        let ext = std::path::Path::new(file_name).extension()?.to_str()?;
        let allowed = self
            .allowed_extensions
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext));
        if allowed {
            DocumentKind::from_extension(ext)
        } else {
            None
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tracker.poll_interval_ms must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.simulator.abort_probability) {
            return Err(ConfigError::Invalid(
                "simulator.abort_probability must be between 0 and 1".to_string(),
            ));
        }
        for ext in &self.documents.allowed_extensions {
            if DocumentKind::from_extension(ext).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "documents.allowed_extensions: no handler for '{ext}'"
                )));
            }
        }
        let mut names: Vec<&str> = self.simulator.printers.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(ConfigError::Invalid(
                "simulator.printers: duplicate printer name".to_string(),
            ));
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String { "info".to_string() }
fn default_poll_interval_ms() -> u64 { 3000 }
fn default_media() -> String { "iso_a4_210x297mm".to_string() }
fn default_color_mode() -> String { "color".to_string() }
fn default_quality() -> String { "normal".to_string() }
fn default_allowed_extensions() -> Vec<String> {
    ["pdf", "txt", "png", "jpg", "jpeg", "gif", "doc", "docx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    let config: Config = match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to parse config TOML: {}", e);
            return Err(ConfigError::Toml(e));
        }
    };
    config.validate()?;
    Ok(config)
}
