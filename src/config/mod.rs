//! Configuration module for Atrium.
//!
//! Loads configuration from environment variables (and `.env` if present).

use std::env;
use std::time::Duration;

use crate::cache::{CacheConfig, DEFAULT_STALE_TTL};
use crate::readiness::CoordinatorConfig;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // API
    /// Base URL of the site API, e.g. `https://example.org/api/`.
    pub api_url: String,
    /// Bearer token sent with every request.
    pub api_token: Option<String>,
    pub request_timeout: Duration,

    // Caching
    pub stale_ttl: Duration,

    // Readiness
    pub include_permissions: bool,
    pub min_loading_duration: Duration,

    /// Role to start the session with. `None` or `guest` starts anonymous.
    pub role: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = var("ATRIUM_API_URL").ok_or(ConfigError::Missing("ATRIUM_API_URL"))?;
        url::Url::parse(&api_url).map_err(|e| ConfigError::InvalidValue {
            field: "ATRIUM_API_URL",
            reason: e.to_string(),
        })?;

        let request_timeout = match var("ATRIUM_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("ATRIUM_REQUEST_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_REQUEST_TIMEOUT,
        };
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "ATRIUM_REQUEST_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        let stale_ttl = match var("ATRIUM_STALE_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse_number("ATRIUM_STALE_TTL_SECS", &raw)?),
            None => DEFAULT_STALE_TTL,
        };

        let include_permissions = match var("ATRIUM_INCLUDE_PERMISSIONS") {
            Some(raw) => parse_bool("ATRIUM_INCLUDE_PERMISSIONS", &raw)?,
            None => true,
        };

        let min_loading_duration = match var("ATRIUM_MIN_LOADING_MS") {
            Some(raw) => Duration::from_millis(parse_number("ATRIUM_MIN_LOADING_MS", &raw)?),
            None => Duration::ZERO,
        };

        Ok(Self {
            api_url,
            api_token: var("ATRIUM_API_TOKEN"),
            request_timeout,
            stale_ttl,
            include_permissions,
            min_loading_duration,
            role: var("ATRIUM_ROLE").map(|r| r.to_lowercase()),
        })
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            include_permissions: self.include_permissions,
            min_loading_duration: self.min_loading_duration,
            cache: CacheConfig::default().ttl(self.stale_ttl),
        }
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
        field,
        reason: format!("'{}' is not a whole number ({})", raw, e),
    })
}

fn parse_bool(field: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field,
            reason: format!("'{}' is not a boolean", raw),
        }),
    }
}
