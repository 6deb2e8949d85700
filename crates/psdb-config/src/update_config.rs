//! Remote database refresh configuration

use crate::ConfigError;
use serde::{Deserialize, Serialize};

/// Where fresh snapshot databases are downloaded from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// URL of the published database file
    #[serde(default = "default_url")]
    pub url: String,

    /// Download attempts before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "https://raw.githubusercontent.com/jrkurban/playstation-scraper/main/playstation_games.db"
        .to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl UpdateConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "update.url is not an http(s) URL: {}",
                self.url
            )));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("update.max_retries must be >= 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("update.timeout_secs must be >= 1".into()));
        }
        Ok(())
    }
}
