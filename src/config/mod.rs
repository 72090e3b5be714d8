//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::Window;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// First year counted in the recent (PRM) window, inclusive
    #[serde(default = "default_recent_cutoff_year")]
    pub recent_cutoff_year: u16,
}

fn default_recent_cutoff_year() -> u16 {
    2023
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            recent_cutoff_year: default_recent_cutoff_year(),
        }
    }
}

/// Minimum games in a window before an entity can earn a medal there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedalRules {
    #[serde(default = "default_min_games_total")]
    pub min_games_total: u32,

    #[serde(default = "default_min_games_recent")]
    pub min_games_recent: u32,

    #[serde(default = "default_min_games_year")]
    pub min_games_year: u32,
}

fn default_min_games_total() -> u32 {
    20
}

fn default_min_games_recent() -> u32 {
    10
}

fn default_min_games_year() -> u32 {
    10
}

impl Default for MedalRules {
    fn default() -> Self {
        Self {
            min_games_total: default_min_games_total(),
            min_games_recent: default_min_games_recent(),
            min_games_year: default_min_games_year(),
        }
    }
}

impl MedalRules {
    /// Eligibility floor for a window.
    pub fn min_games(&self, window: Window) -> u32 {
        match window {
            Window::Total => self.min_games_total,
            Window::Recent => self.min_games_recent,
            Window::Year(_) => self.min_games_year,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub stats: StatsConfig,

    #[serde(default)]
    pub medals: MedalRules,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            stats: StatsConfig::default(),
            medals: MedalRules::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cutoff = self.stats.recent_cutoff_year;
        if !(1993..=9999).contains(&cutoff) {
            return Err(ConfigError::ValidationError(format!(
                "recent_cutoff_year must be between 1993 and 9999, got {}",
                cutoff
            )));
        }

        let floors = [
            ("min_games_total", self.medals.min_games_total),
            ("min_games_recent", self.medals.min_games_recent),
            ("min_games_year", self.medals.min_games_year),
        ];
        for (name, value) in floors {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        Ok(())
    }
}
