use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::autosave::DEFAULT_DEBOUNCE;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_GEOCODING_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = "laundry-backoffice/0.1";

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub autosave_debounce: Duration,
    pub geocoding_url: String,
    pub geocoding_country: Option<String>,
    pub geocoding_user_agent: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} must be a valid number (got '{value}')")]
    InvalidNumber { name: &'static str, value: String },
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match non_empty("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidNumber {
                name: "PORT",
                value: v,
            })?,
            None => DEFAULT_PORT,
        };
        let autosave_debounce = match non_empty("AUTOSAVE_DEBOUNCE_MS") {
            Some(v) => Duration::from_millis(v.parse().map_err(|_| {
                ConfigError::InvalidNumber {
                    name: "AUTOSAVE_DEBOUNCE_MS",
                    value: v,
                }
            })?),
            None => DEFAULT_DEBOUNCE,
        };

        Ok(Self {
            database_url,
            host,
            port,
            autosave_debounce,
            geocoding_url: non_empty("GEOCODING_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
            geocoding_country: non_empty("GEOCODING_COUNTRY"),
            geocoding_user_agent: non_empty("GEOCODING_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        })
    }
}
