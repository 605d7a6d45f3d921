//! Scheduler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Poll period used when nothing else is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Environment variable read by [`SchedulerConfig::from_env`], holding a
/// humantime duration such as `10s` or `1m 30s`.
pub const POLL_INTERVAL_ENV: &str = "CADENZA_POLL_INTERVAL";

/// Errors returned while building a [`SchedulerConfig`].
#[derive(Debug, Error)]
pub enum SchedulerConfigError {
    /// A zero poll interval would spin the loop.
    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    /// The poll interval text is not a humantime duration.
    #[error("invalid poll interval '{value}': {source}")]
    InvalidDuration {
        /// Rejected text.
        value: String,
        /// Parser error.
        source: humantime::DurationError,
    },

    /// The environment variable is set but not valid Unicode.
    #[error("{POLL_INTERVAL_ENV} is not valid unicode")]
    NotUnicode,
}

/// Configuration for the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedulerConfig", into = "RawSchedulerConfig")]
pub struct SchedulerConfig {
    poll_interval: Duration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawSchedulerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    poll_interval: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SchedulerConfig {
    /// Creates a configuration with the given poll interval.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerConfigError::ZeroPollInterval`] for a zero interval.
    pub fn new(poll_interval: Duration) -> Result<Self, SchedulerConfigError> {
        if poll_interval.is_zero() {
            return Err(SchedulerConfigError::ZeroPollInterval);
        }
        Ok(Self { poll_interval })
    }

    /// Reads the poll interval from [`POLL_INTERVAL_ENV`], falling back to
    /// the default when the variable is unset.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerConfigError`] when the variable holds an invalid or
    /// zero duration.
    pub fn from_env() -> Result<Self, SchedulerConfigError> {
        match std::env::var(POLL_INTERVAL_ENV) {
            Ok(value) => Self::parse(&value),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(std::env::VarError::NotUnicode(_)) => Err(SchedulerConfigError::NotUnicode),
        }
    }

    /// Parses a humantime poll interval such as `"10s"`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerConfigError`] when the text is not a duration or
    /// is zero.
    pub fn parse(value: &str) -> Result<Self, SchedulerConfigError> {
        let poll_interval = humantime::parse_duration(value.trim()).map_err(|source| {
            SchedulerConfigError::InvalidDuration {
                value: value.to_owned(),
                source,
            }
        })?;
        Self::new(poll_interval)
    }

    /// Returns the poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl TryFrom<RawSchedulerConfig> for SchedulerConfig {
    type Error = SchedulerConfigError;

    fn try_from(raw: RawSchedulerConfig) -> Result<Self, Self::Error> {
        raw.poll_interval
            .as_deref()
            .map_or_else(|| Ok(Self::default()), Self::parse)
    }
}

impl From<SchedulerConfig> for RawSchedulerConfig {
    fn from(config: SchedulerConfig) -> Self {
        Self {
            poll_interval: Some(humantime::format_duration(config.poll_interval).to_string()),
        }
    }
}
