//! Configuration types for a simulation run.
//!
//! The on-disk format keeps the short field names the arbiter deployment
//! uses (`num_clients`, `server_ip`, `T`, `k`); the Rust fields carry
//! descriptive names. Everything past the first five fields is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors loading or validating a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Immutable configuration shared by all stations of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of stations to spawn.
    #[serde(rename = "num_clients", alias = "num_stations")]
    pub num_stations: u32,

    /// Arbiter host, dotted quad or resolvable name.
    #[serde(rename = "server_ip", alias = "server_address")]
    pub server_address: String,

    /// Arbiter TCP port.
    pub server_port: u16,

    /// Slot duration in milliseconds.
    #[serde(rename = "T", alias = "slot_duration_ms")]
    pub slot_duration_ms: u64,

    /// Per-protocol parameter `k`. Parsed and carried, not consumed by any policy.
    #[serde(rename = "k", alias = "alpha_param", default)]
    pub alpha_param: u32,

    /// Base seed for the per-station random sources. Clock-seeded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Attempts per data request before the station gives up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause after each failed attempt, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Upper bound of the BEB backoff exponent, at most 10.
    #[serde(default = "default_max_backoff_exponent")]
    pub max_backoff_exponent: u32,

    /// Carrier-sense poll interval in milliseconds. Defaults to the slot duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sense_interval_ms: Option<u64>,

    /// Longest accepted line from the arbiter, in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,

    /// Read timeout per line, in milliseconds. Blocks forever when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,

    /// Connect timeout, in milliseconds. OS default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_max_backoff_exponent() -> u32 {
    10
}

fn default_max_message_bytes() -> usize {
    1024
}

/// Largest allowed backoff exponent; the window never exceeds 1024 slots.
const BACKOFF_EXPONENT_LIMIT: u32 = 10;

impl SimulationConfig {
    /// Create a configuration with default tuning.
    pub fn new(num_stations: u32, server_address: impl Into<String>, server_port: u16) -> Self {
        Self {
            num_stations,
            server_address: server_address.into(),
            server_port,
            slot_duration_ms: 100,
            alpha_param: 0,
            seed: None,
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            max_backoff_exponent: default_max_backoff_exponent(),
            sense_interval_ms: None,
            max_message_bytes: default_max_message_bytes(),
            read_timeout_ms: None,
            connect_timeout_ms: None,
        }
    }

    /// Load and validate a configuration file.
    ///
    /// Files ending in `.toml` are parsed as TOML, everything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_stations == 0 {
            return Err(invalid("num_clients", "must be at least 1"));
        }
        if self.server_address.trim().is_empty() {
            return Err(invalid("server_ip", "must not be empty"));
        }
        if self.server_port == 0 {
            return Err(invalid("server_port", "must be in 1..=65535"));
        }
        if self.slot_duration_ms == 0 {
            return Err(invalid("T", "slot duration must be positive"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        if self.max_backoff_exponent > BACKOFF_EXPONENT_LIMIT {
            return Err(invalid(
                "max_backoff_exponent",
                format!("must be at most {BACKOFF_EXPONENT_LIMIT}"),
            ));
        }
        if self.sense_interval_ms == Some(0) {
            return Err(invalid("sense_interval_ms", "must be positive"));
        }
        if self.max_message_bytes == 0 {
            return Err(invalid("max_message_bytes", "must be positive"));
        }
        Ok(())
    }

    /// Set the slot duration in milliseconds.
    pub fn with_slot_duration_ms(mut self, slot_duration_ms: u64) -> Self {
        self.slot_duration_ms = slot_duration_ms;
        self
    }

    /// Set the base seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the attempts per data request.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the pause after a failed attempt.
    pub fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Set the carrier-sense poll interval.
    pub fn with_sense_interval_ms(mut self, sense_interval_ms: u64) -> Self {
        self.sense_interval_ms = Some(sense_interval_ms);
        self
    }

    /// Set the per-line read timeout.
    pub fn with_read_timeout_ms(mut self, read_timeout_ms: u64) -> Self {
        self.read_timeout_ms = Some(read_timeout_ms);
        self
    }

    /// Slot length.
    pub fn slot_duration(&self) -> Duration {
        Duration::from_millis(self.slot_duration_ms)
    }

    /// Pause after a failed attempt.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Carrier-sense poll interval, falling back to the slot length.
    pub fn sense_interval(&self) -> Duration {
        Duration::from_millis(self.sense_interval_ms.unwrap_or(self.slot_duration_ms))
    }

    /// Per-line read timeout, if any.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    /// Connect timeout, if any.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Slotted ALOHA transmission probability, `1 / num_stations`.
    pub fn transmit_probability(&self) -> f64 {
        1.0 / f64::from(self.num_stations.max(1))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
