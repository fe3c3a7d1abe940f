//! Environment-driven runtime configuration

use std::env;
use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub db_path: String,
    pub write_interval_secs: u64,
    pub command_prefix: char,
    /// Channels to start tracking at boot, in addition to whatever the store
    /// already holds.
    pub seed_channels: Vec<String>,
    pub rust_log: String,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = env::var("BEHOLD_DB_PATH").unwrap_or_else(|_| "behold.db".to_string());

        let write_interval_secs = match env::var("BEHOLD_WRITE_INTERVAL_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "BEHOLD_WRITE_INTERVAL_SECS must be a non-negative integer, got '{}'",
                    raw
                ))
            })?,
            Err(_) => 60,
        };

        let command_prefix = match env::var("BEHOLD_COMMAND_PREFIX") {
            Ok(raw) => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(prefix), None) => prefix,
                    _ => {
                        return Err(ConfigError::InvalidValue(format!(
                            "BEHOLD_COMMAND_PREFIX must be a single character, got '{}'",
                            raw
                        )))
                    }
                }
            }
            Err(_) => '!',
        };

        let seed_channels = env::var("BEHOLD_CHANNELS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            db_path,
            write_interval_secs,
            command_prefix,
            seed_channels,
            rust_log,
        })
    }
}
