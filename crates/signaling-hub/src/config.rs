//! Signaling hub configuration.
//!
//! Configuration is loaded from environment variables, with `from_vars`
//! taking an explicit map so tests do not touch the process environment.

use common::config::{ObservabilityConfig, DEFAULT_LOG_LEVEL};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default maximum number of rooms held by one registry.
pub const DEFAULT_MAX_ROOMS: usize = 10_000;

/// Signaling hub configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of concurrently held rooms (default: 10000).
    pub max_rooms: usize,

    /// Maximum members per room. `None` means unlimited (the default).
    pub max_clients_per_room: Option<usize>,

    /// Logging settings for processes embedding the hub.
    pub observability: ObservabilityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_rooms: DEFAULT_MAX_ROOMS,
            max_clients_per_room: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// See [`Config::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a limit is zero or not an
    /// integer, or if `HUB_JSON_LOGS` is not a boolean.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let max_rooms = match vars.get("HUB_MAX_ROOMS") {
            Some(value) => parse_positive("HUB_MAX_ROOMS", value)?,
            None => DEFAULT_MAX_ROOMS,
        };

        let max_clients_per_room = vars
            .get("HUB_MAX_CLIENTS_PER_ROOM")
            .map(|value| parse_positive("HUB_MAX_CLIENTS_PER_ROOM", value))
            .transpose()?;

        let log_level = vars
            .get("HUB_LOG_LEVEL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let json_logs = match vars.get("HUB_JSON_LOGS").map(String::as_str) {
            None => false,
            Some("true" | "1") => true,
            Some("false" | "0") => false,
            Some(other) => {
                return Err(ConfigError::InvalidValue(format!(
                    "HUB_JSON_LOGS must be true or false, got '{other}'"
                )))
            }
        };

        Ok(Config {
            max_rooms,
            max_clients_per_room,
            observability: ObservabilityConfig {
                log_level,
                json_logs,
            },
        })
    }
}

fn parse_positive(name: &str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidValue(format!(
            "{name} must be greater than zero"
        ))),
        Ok(parsed) => Ok(parsed),
        Err(e) => Err(ConfigError::InvalidValue(format!(
            "{name} must be a positive integer, got '{value}': {e}"
        ))),
    }
}
