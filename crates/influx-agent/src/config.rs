// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::client::InfluxDbClient;
use crate::constants::{
    DEFAULT_FLUSH_INTERVAL, DEFAULT_INFLUX_HOST, DEFAULT_INFLUX_PORT, DEFAULT_WRITE_TIMEOUT,
};
use crate::errors::Creation;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Settings shared by the agents and the forwarder binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// InfluxDB host
    pub host: String,
    /// InfluxDB HTTP port
    pub port: u16,
    /// Target database for writes
    pub database: String,
    /// Log file to tail, only needed by the file-tailing agent
    pub log_file: Option<PathBuf>,
    /// Time between two flush cycles
    pub flush_interval: Duration,
    /// Timeout of each write request
    pub timeout: Duration,
    /// Cap on records buffered by the memory agent, unbounded when `None`
    pub max_pending: Option<usize>,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_INFLUX_HOST.to_string(),
            port: DEFAULT_INFLUX_PORT,
            database: String::new(),
            log_file: None,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            timeout: DEFAULT_WRITE_TIMEOUT,
            max_pending: None,
            log_level: "info".to_string(),
        }
    }
}

impl AgentConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, Creation> {
        let host = env::var("INFLUX_HOST").unwrap_or_else(|_| DEFAULT_INFLUX_HOST.to_string());
        let port = parse_env::<u16>("INFLUX_PORT").unwrap_or(DEFAULT_INFLUX_PORT);
        let database = env::var("INFLUX_DATABASE").unwrap_or_default();
        let log_file = env::var("INFLUX_AGENT_LOG_FILE").ok().map(PathBuf::from);
        let flush_interval = parse_env::<u64>("INFLUX_AGENT_FLUSH_INTERVAL_SECS")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FLUSH_INTERVAL);
        let timeout = parse_env::<u64>("INFLUX_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_WRITE_TIMEOUT);
        let max_pending = parse_env::<usize>("INFLUX_AGENT_MAX_PENDING");
        let log_level = env::var("INFLUX_AGENT_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or_else(|_| "info".to_string());

        let config = Self {
            host,
            port,
            database,
            log_file,
            flush_interval,
            timeout,
            max_pending,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Creation> {
        if self.host.trim().is_empty() || self.port == 0 || self.database.trim().is_empty() {
            return Err(Creation::InvalidTarget {
                host: self.host.clone(),
                port: self.port,
                database: self.database.clone(),
            });
        }

        if self.flush_interval.is_zero() {
            return Err(Creation::InvalidConfig(
                "flush interval must be greater than 0".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(Creation::InvalidConfig(
                "write timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_pending == Some(0) {
            return Err(Creation::InvalidConfig(
                "max pending records must be greater than 0".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(Creation::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Builds the write client described by this configuration.
    pub fn client(&self) -> Result<InfluxDbClient, Creation> {
        InfluxDbClient::new(&self.host, self.port, &self.database, self.timeout)
    }
}

/// Reads and parses `name`. An unparseable value is ignored with a warning so the caller's
/// default applies.
fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring unparseable {name}={value:?}, using the default");
            None
        }
    }
}
