//! Snapshot store configuration

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Literal that starts every snapshot table name
pub const DEFAULT_TABLE_PREFIX: &str = "games";

/// Price token meaning the edition costs nothing
pub const DEFAULT_FREE_TOKEN: &str = "ücretsiz";

/// Where the snapshot database lives and how its contents are read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite database file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Prefix of snapshot table names (`<prefix>_dd_MM_yyyy_HH_mm`)
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    /// Word the catalog uses for free editions
    #[serde(default = "default_free_token")]
    pub free_token: String,
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("psdb")
        .join("playstation_games.db")
}

fn default_table_prefix() -> String {
    DEFAULT_TABLE_PREFIX.to_string()
}

fn default_free_token() -> String {
    DEFAULT_FREE_TOKEN.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            table_prefix: default_table_prefix(),
            free_token: default_free_token(),
        }
    }
}

impl StoreConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.table_prefix.is_empty() {
            return Err(ConfigError::Invalid("store.table_prefix is empty".into()));
        }
        if self.table_prefix.contains('"') {
            return Err(ConfigError::Invalid(
                "store.table_prefix must not contain '\"'".into(),
            ));
        }
        if self.free_token.trim().is_empty() {
            return Err(ConfigError::Invalid("store.free_token is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_file_name() {
        let config = StoreConfig::default();
        assert!(config.path.ends_with("psdb/playstation_games.db"));
    }

    #[test]
    fn test_validate_prefix() {
        let mut config = StoreConfig::default();
        config.table_prefix = String::new();
        assert!(config.validate().is_err());

        config.table_prefix = "ga\"mes".to_string();
        assert!(config.validate().is_err());

        config.table_prefix = "games".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_free_token() {
        let config = StoreConfig {
            free_token: "   ".to_string(),
            ..StoreConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
