//! Allocator configuration (normative defaults).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_INIT_VALUE: i64 = 1;
pub const DEFAULT_INCREMENT: i64 = 1000;
pub const MIN_INCREMENT: i64 = 10;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 100;
pub const DEFAULT_RETRY_JITTER_MAX_MS: u64 = 500;
pub const DEFAULT_TABLE: &str = "sequence_registry";

/// Tuning knobs for the sequence engine and its store adapter.
///
/// Values are intentionally explicit about their units to avoid confusion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// First value ever reserved for a brand-new key. The first value a
    /// caller receives is `init_value + 1`; `init_value` is the floor of
    /// the initial reservation.
    pub init_value: i64,
    /// Size of each extension batch. Must be at least [`MIN_INCREMENT`].
    pub increment: i64,
    /// Total `next_value` attempts before surfacing an error.
    pub retry_attempts: u32,
    /// Constant delay before each retry after the first attempt.
    pub retry_base_delay_ms: u64,
    /// Upper bound of the random jitter added to the base delay.
    pub retry_jitter_max_ms: u64,
    /// Registry table name.
    pub table: String,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            init_value: DEFAULT_INIT_VALUE,
            increment: DEFAULT_INCREMENT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            retry_jitter_max_ms: DEFAULT_RETRY_JITTER_MAX_MS,
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl SequenceConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist. Unknown keys are ignored; missing keys take
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Unparsable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), increment = config.increment, "loaded config");
        Ok(config)
    }

    /// Reject configurations the allocator cannot run with. Called by the
    /// engine at construction; a failure here is a setup bug, never retried.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.increment < MIN_INCREMENT {
            return Err(ConfigError::IncrementTooSmall {
                got: self.increment,
                min: MIN_INCREMENT,
            });
        }
        Ok(())
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}
