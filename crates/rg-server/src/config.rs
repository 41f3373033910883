//! Server configuration.
//!
//! Every setting has a dotted property name and an environment variable.
//! [`ServerConfig::from_env`] reads the environment (plus an optional `.env`
//! file), [`ServerConfig::from_properties`] reads a property map; both go
//! through the same parsing and validation.

use std::collections::HashMap;
use std::time::Duration;

use chrono::TimeDelta;
use rg_filter::FailurePolicy;
use thiserror::Error;

/// Property names and the environment variables they are read from.
pub const PROPERTIES: &[(&str, &str)] = &[
    (REDIS_URL, "REDIS_URL"),
    (REDIS_CLUSTER_ENABLED, "REDIS_CLUSTER_ENABLE"),
    (REDIS_KEY_PREFIX, "REDIS_KEY_PREFIX"),
    (REDIS_TIMEOUT_MS, "REDIS_TIMEOUT_MS"),
    (REDIS_CONNECT_TIMEOUT_MS, "REDIS_CONNECT_TIMEOUT_MS"),
    (REVOCATION_TTL_SECONDS, "REVOCATION_TTL_SECONDS"),
    (REVOCATION_FAILURE_POLICY, "REVOCATION_FAILURE_POLICY"),
    (MEMORY_SWEEP_INTERVAL_SECONDS, "MEMORY_SWEEP_INTERVAL_SECONDS"),
    (SERVER_HOST, "RG_HOST"),
    (SERVER_PORT, "RG_PORT"),
];

const REDIS_URL: &str = "redis.url";
const REDIS_CLUSTER_ENABLED: &str = "redis.cluster.enabled";
const REDIS_KEY_PREFIX: &str = "redis.key.prefix";
const REDIS_TIMEOUT_MS: &str = "redis.timeout.ms";
const REDIS_CONNECT_TIMEOUT_MS: &str = "redis.connect.timeout.ms";
const REVOCATION_TTL_SECONDS: &str = "revocation.ttl.seconds";
const REVOCATION_FAILURE_POLICY: &str = "revocation.failure.policy";
const MEMORY_SWEEP_INTERVAL_SECONDS: &str = "memory.sweep.interval.seconds";
const SERVER_HOST: &str = "server.host";
const SERVER_PORT: &str = "server.port";

/// Longest accepted revocation lifetime: ten years.
pub const MAX_REVOCATION_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A value could not be parsed.
    #[error("invalid value '{value}' for '{key}': {reason}")]
    Invalid {
        /// Property name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: String,
    },

    /// A value must be positive.
    #[error("'{0}' must be greater than zero")]
    NotPositive(&'static str),
}

/// Settings the store selector needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Comma-separated Redis nodes; `None` selects the in-process store.
    pub redis_url: Option<String>,

    /// Treat the Redis nodes as a cluster.
    pub cluster_enabled: bool,

    /// Namespace for Redis keys.
    pub key_prefix: String,

    /// Per-command timeout.
    pub command_timeout: Duration,

    /// Initial connection timeout.
    pub connect_timeout: Duration,

    /// Period of the in-process expiry sweep.
    pub sweep_interval: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            cluster_enabled: false,
            key_prefix: "rg".to_string(),
            command_timeout: Duration::from_millis(2000),
            connect_timeout: Duration::from_millis(5000),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Store selection and tuning.
    pub store: StoreSettings,

    /// Lifetime of a revocation written by logout ingestion, in seconds.
    pub revocation_ttl_seconds: i64,

    /// What the request filter does when the store cannot answer.
    pub failure_policy: FailurePolicy,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let properties = PROPERTIES
            .iter()
            .filter_map(|(property, var)| {
                std::env::var(var)
                    .ok()
                    .map(|value| ((*property).to_string(), value))
            })
            .collect();

        Self::from_properties(&properties)
    }

    /// Loads configuration from dotted property names.
    ///
    /// Unknown properties are ignored and blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a property holds an invalid value.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let props = Properties(properties);
        let defaults = Self::default();

        let store = StoreSettings {
            redis_url: props.get(REDIS_URL).map(ToString::to_string),
            cluster_enabled: props
                .parse_bool(REDIS_CLUSTER_ENABLED)?
                .unwrap_or(defaults.store.cluster_enabled),
            key_prefix: props
                .get(REDIS_KEY_PREFIX)
                .map_or(defaults.store.key_prefix, ToString::to_string),
            command_timeout: props
                .parse_positive::<u64>(REDIS_TIMEOUT_MS)?
                .map_or(defaults.store.command_timeout, Duration::from_millis),
            connect_timeout: props
                .parse_positive::<u64>(REDIS_CONNECT_TIMEOUT_MS)?
                .map_or(defaults.store.connect_timeout, Duration::from_millis),
            sweep_interval: props
                .parse_positive::<u64>(MEMORY_SWEEP_INTERVAL_SECONDS)?
                .map_or(defaults.store.sweep_interval, Duration::from_secs),
        };

        let failure_policy = match props.get(REVOCATION_FAILURE_POLICY) {
            Some(value) => value.parse().map_err(|e: rg_filter::PolicyParseError| {
                ConfigError::Invalid {
                    key: REVOCATION_FAILURE_POLICY,
                    value: value.to_string(),
                    reason: e.to_string(),
                }
            })?,
            None => defaults.failure_policy,
        };

        Ok(Self {
            host: props
                .get(SERVER_HOST)
                .map_or(defaults.host, ToString::to_string),
            port: props.parse::<u16>(SERVER_PORT)?.unwrap_or(defaults.port),
            store,
            revocation_ttl_seconds: props
                .parse_positive::<i64>(REVOCATION_TTL_SECONDS)?
                .map(bounded_ttl)
                .transpose()?
                .unwrap_or(defaults.revocation_ttl_seconds),
            failure_policy,
        })
    }

    /// Creates a configuration for testing.
    ///
    /// Binds to an ephemeral loopback port and uses the in-process store.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            ..Self::default()
        }
    }

    /// Returns the revocation lifetime.
    ///
    /// Values outside the range of [`TimeDelta`] saturate to its maximum.
    #[must_use]
    pub fn revocation_ttl(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.revocation_ttl_seconds).unwrap_or(TimeDelta::MAX)
    }

    /// Returns the socket address string to bind to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            store: StoreSettings::default(),
            revocation_ttl_seconds: 3600,
            failure_policy: FailurePolicy::FailClosed,
        }
    }
}

fn bounded_ttl(ttl: i64) -> Result<i64, ConfigError> {
    if ttl <= MAX_REVOCATION_TTL_SECONDS {
        return Ok(ttl);
    }
    Err(ConfigError::Invalid {
        key: REVOCATION_TTL_SECONDS,
        value: ttl.to_string(),
        reason: format!("must not exceed {MAX_REVOCATION_TTL_SECONDS} seconds"),
    })
}

struct Properties<'a>(&'a HashMap<String, String>);

impl Properties<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|value| {
                value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                    key,
                    value: value.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn parse_positive<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr + PartialOrd + Default,
        T::Err: std::fmt::Display,
    {
        match self.parse::<T>(key)? {
            Some(value) if value <= T::default() => Err(ConfigError::NotPositive(key)),
            other => Ok(other),
        }
    }

    fn parse_bool(&self, key: &'static str) -> Result<Option<bool>, ConfigError> {
        self.get(key)
            .map(|value| match value.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    key,
                    value: value.to_string(),
                    reason: "expected a boolean".to_string(),
                }),
            })
            .transpose()
    }
}
