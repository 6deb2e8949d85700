//! Configuration management for psdb
//!
//! Handles the snapshot store location, snapshot naming and price locale
//! settings, and the remote database refresh policy. TOML-based config files.

mod store_config;
mod update_config;

pub use store_config::{DEFAULT_FREE_TOKEN, DEFAULT_TABLE_PREFIX, StoreConfig};
pub use update_config::UpdateConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// System-wide configuration directory
pub const CONFIG_DIR: &str = "/etc/psdb";

/// Configuration file name inside a config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Main psdb configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PsdbConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub update: UpdateConfig,
}

impl PsdbConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        // Try user config first, then system config
        if let Some(user_config) = user_config_path().filter(|p| p.exists()) {
            return Self::load(&user_config);
        }

        let system_config = Path::new(CONFIG_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Self::load(&system_config);
        }

        tracing::warn!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check values that deserialize fine but cannot work at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.update.validate()?;
        Ok(())
    }
}

/// Per-user configuration file, if the platform has a config directory
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("psdb").join(CONFIG_FILE))
}
