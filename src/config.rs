use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::stats::clock::DEFAULT_PERIOD_LENGTH_SECONDS;
use crate::stats::trackers::ReboundKind;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Conventions the aggregation engine cannot derive from events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Length of every period, overtime included
    #[serde(default = "default_period_length")]
    pub period_length_seconds: u32,
    /// Classification of a rebound with no earlier missed shot
    #[serde(default = "default_orphan_rebound")]
    pub orphan_rebound: ReboundKind,
}

fn default_period_length() -> u32 {
    DEFAULT_PERIOD_LENGTH_SECONDS
}

fn default_orphan_rebound() -> ReboundKind {
    ReboundKind::Defensive
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            period_length_seconds: default_period_length(),
            orphan_rebound: default_orphan_rebound(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default(
                "engine.period_length_seconds",
                i64::from(DEFAULT_PERIOD_LENGTH_SECONDS),
            )?
            .set_default("engine.orphan_rebound", "DEFENSIVE")?
            .set_default("database.max_connections", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Environment-specific overrides, e.g. config/production.toml
            .add_source(
                File::from(config_dir.join(
                    std::env::var("BOXSCORE_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // BOXSCORE_DATABASE__URL, BOXSCORE_ENGINE__PERIOD_LENGTH_SECONDS, ...
            .add_source(
                Environment::with_prefix("BOXSCORE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
