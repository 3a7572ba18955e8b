//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Maintenance scheduling configuration.
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Maintenance scheduling configuration.
///
/// Cadence is best-effort: the engine tolerates missed or duplicate
/// invocations, so these intervals only control how closely the window
/// counters track the spans their names suggest.
#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    /// Seconds between hourly-counter resets.
    #[serde(default = "default_hourly_reset_secs")]
    pub hourly_reset_secs: u64,
    /// Seconds between daily-counter resets.
    #[serde(default = "default_daily_reset_secs")]
    pub daily_reset_secs: u64,
    /// Seconds between staleness sweeps.
    #[serde(default = "default_stale_sweep_secs")]
    pub stale_sweep_secs: u64,
    /// Days of inactivity before a trend is deactivated.
    #[serde(default = "default_stale_cutoff_days")]
    pub stale_cutoff_days: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            hourly_reset_secs: default_hourly_reset_secs(),
            daily_reset_secs: default_daily_reset_secs(),
            stale_sweep_secs: default_stale_sweep_secs(),
            stale_cutoff_days: default_stale_cutoff_days(),
        }
    }
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_hourly_reset_secs() -> u64 {
    3600
}

const fn default_daily_reset_secs() -> u64 {
    86400
}

const fn default_stale_sweep_secs() -> u64 {
    86400
}

const fn default_stale_cutoff_days() -> i64 {
    30
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `CHIRP_ENV`)
    /// 3. Environment variables with `CHIRP_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("CHIRP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CHIRP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("CHIRP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
