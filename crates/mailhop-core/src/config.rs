//! Configuration structures.
//!
//! Loaded from `MAILHOP_*` environment variables. The connection setting is
//! only a name handed to the host's queue binding; nothing here parses it.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::queue::QueuePolicy;

pub const ENV_CONNECTION_SETTING: &str = "MAILHOP_CONNECTION_SETTING";
pub const ENV_QUEUE_NAME: &str = "MAILHOP_QUEUE_NAME";
pub const ENV_MAX_CONCURRENT_CALLS: &str = "MAILHOP_MAX_CONCURRENT_CALLS";
pub const ENV_LOCK_DURATION_SECS: &str = "MAILHOP_LOCK_DURATION_SECS";
pub const ENV_MAX_DELIVERY_COUNT: &str = "MAILHOP_MAX_DELIVERY_COUNT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Consumer host configuration. Serializes to the effective-config log line.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Name of the app setting holding the queue connection.
    pub connection_setting: String,

    pub queue_name: String,

    /// Parallel invocations across distinct messages.
    pub max_concurrent_calls: usize,

    pub lock_duration_secs: u64,

    pub max_delivery_count: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection_setting: "ServiceBusConnection".to_string(),
            queue_name: "email-queue".to_string(),
            max_concurrent_calls: 1,
            lock_duration_secs: 30,
            max_delivery_count: 10,
        }
    }
}

impl Config {
    /// Defaults overridden by whatever `MAILHOP_*` variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading through `lookup` instead of the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_CONNECTION_SETTING) {
            config.connection_setting = value;
        }
        if let Some(value) = lookup(ENV_QUEUE_NAME) {
            config.queue_name = value;
        }
        if let Some(value) = lookup(ENV_MAX_CONCURRENT_CALLS) {
            config.max_concurrent_calls = parse_number(ENV_MAX_CONCURRENT_CALLS, value)?;
        }
        if let Some(value) = lookup(ENV_LOCK_DURATION_SECS) {
            config.lock_duration_secs = parse_number(ENV_LOCK_DURATION_SECS, value)?;
        }
        if let Some(value) = lookup(ENV_MAX_DELIVERY_COUNT) {
            config.max_delivery_count = parse_number(ENV_MAX_DELIVERY_COUNT, value)?;
        }

        Ok(config)
    }

    pub fn queue_policy(&self) -> QueuePolicy {
        QueuePolicy::new(
            Duration::from_secs(self.lock_duration_secs),
            self.max_delivery_count,
        )
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { key, value })
}
