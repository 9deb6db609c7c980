//! # Configuration
//!
//! Runtime settings for the `roommap` tool, read from a TOML file.
//!
//! - [`MapConfig`] - where the room dataset lives and the default edge cost
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ```toml
//! [map]
//! data_file = "data/map.json"
//! default_cost = 0.2
//!
//! [logging]
//! level = "info"
//! file = "roommap.log"
//! ```
//!
//! CLI verbosity flags take precedence over `logging.level`.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::map::DEFAULT_COST;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// JSON room dataset (an array of wire-format room objects).
    pub data_file: String,
    /// Travel time for edges without an explicit weight. Defaults to 0.2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cost: Option<f64>,
}

impl MapConfig {
    pub fn default_cost(&self) -> f64 {
        self.default_cost.unwrap_or(DEFAULT_COST)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub map: MapConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.map.data_file.trim().is_empty() {
            return Err(anyhow!("map.data_file must not be empty"));
        }
        if let Some(cost) = self.map.default_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(anyhow!(
                    "map.default_cost must be a non-negative number, got {}",
                    cost
                ));
            }
        }
        Ok(())
    }

    /// Log level filter for `logging.level`, falling back to Info.
    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map: MapConfig {
                data_file: "data/map.json".to_string(),
                default_cost: None,
            },
            logging: LoggingConfig::default(),
        }
    }
}
