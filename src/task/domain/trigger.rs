//! Trigger computation for scheduled tasks.
//!
//! Everything here is a pure function of its inputs: the current instant is
//! always passed in by the caller, never read from a clock.

use super::{ParseTaskFieldError, TaskDomainError};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds in one minute.
pub const MINUTE_MS: u64 = 60_000;
/// Repeat interval for [`RepeatType::Hourly`].
pub const HOURLY_MS: u64 = 3_600_000;
/// Repeat interval for [`RepeatType::Daily`].
pub const DAILY_MS: u64 = 86_400_000;
/// Repeat interval for [`RepeatType::Weekly`].
pub const WEEKLY_MS: u64 = 604_800_000;

/// Delay applied by [`TriggerSpec::default_delay`].
pub const DEFAULT_DELAY_MINUTES: i64 = 30;
/// Custom repeat interval used when none is supplied.
pub const DEFAULT_CUSTOM_INTERVAL_MINUTES: i64 = 60;

/// Offset-less layouts accepted for datetime triggers, as produced by
/// `datetime-local` form inputs.
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// How the first due time of a task is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    /// Due as soon as it is created.
    Immediate,
    /// Due a number of minutes after creation.
    Delay,
    /// Due at an absolute instant.
    Datetime,
}

impl ScheduleType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Delay => "delay",
            Self::Datetime => "datetime",
        }
    }
}

impl TryFrom<&str> for ScheduleType {
    type Error = ParseTaskFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "delay" => Ok(Self::Delay),
            "datetime" => Ok(Self::Datetime),
            _ => Err(ParseTaskFieldError::new("schedule type", value)),
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repetition policy applied after a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatType {
    /// Run once.
    None,
    /// Run again one hour after each completion.
    Hourly,
    /// Run again one day after each completion.
    Daily,
    /// Run again one week after each completion.
    Weekly,
    /// Run again after a user-chosen number of minutes.
    Custom,
}

impl RepeatType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Custom => "custom",
        }
    }
}

impl TryFrom<&str> for RepeatType {
    type Error = ParseTaskFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "custom" => Ok(Self::Custom),
            _ => Err(ParseTaskFieldError::new("repeat type", value)),
        }
    }
}

impl fmt::Display for RepeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First-trigger configuration supplied when creating or rescheduling a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSpec {
    /// Due immediately.
    Immediate,
    /// Due after the given number of minutes.
    Delay {
        /// Minutes to wait; must be positive.
        minutes: i64,
    },
    /// Due at the instant described by the given text.
    Datetime(String),
}

impl TriggerSpec {
    /// Creates a delay trigger.
    #[must_use]
    pub const fn delay(minutes: i64) -> Self {
        Self::Delay { minutes }
    }

    /// Creates a delay trigger with the default half-hour wait.
    #[must_use]
    pub const fn default_delay() -> Self {
        Self::Delay {
            minutes: DEFAULT_DELAY_MINUTES,
        }
    }

    /// Creates an absolute datetime trigger.
    #[must_use]
    pub fn at(value: impl Into<String>) -> Self {
        Self::Datetime(value.into())
    }

    /// Returns the schedule type this trigger belongs to.
    #[must_use]
    pub const fn schedule_type(&self) -> ScheduleType {
        match self {
            Self::Immediate => ScheduleType::Immediate,
            Self::Delay { .. } => ScheduleType::Delay,
            Self::Datetime(_) => ScheduleType::Datetime,
        }
    }
}

/// Repeat configuration supplied when creating or updating a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatSpec {
    repeat_type: RepeatType,
    custom_minutes: Option<i64>,
}

impl RepeatSpec {
    /// No repetition.
    #[must_use]
    pub const fn none() -> Self {
        Self::of(RepeatType::None)
    }

    /// Repeat with one of the fixed intervals.
    ///
    /// [`RepeatType::Custom`] given here uses the default custom interval.
    #[must_use]
    pub const fn of(repeat_type: RepeatType) -> Self {
        Self {
            repeat_type,
            custom_minutes: None,
        }
    }

    /// Repeat every `minutes` minutes.
    #[must_use]
    pub const fn custom(minutes: i64) -> Self {
        Self {
            repeat_type: RepeatType::Custom,
            custom_minutes: Some(minutes),
        }
    }

    /// Returns the repeat type.
    #[must_use]
    pub const fn repeat_type(self) -> RepeatType {
        self.repeat_type
    }

    /// Returns the custom interval in minutes, if one was supplied.
    #[must_use]
    pub const fn custom_minutes(self) -> Option<i64> {
        self.custom_minutes
    }

    /// Resolves the repeat interval in milliseconds.
    ///
    /// # Errors
    ///
    /// See [`repeat_interval_ms`].
    pub fn interval_ms(self) -> Result<u64, TaskDomainError> {
        repeat_interval_ms(self.repeat_type, self.custom_minutes)
    }
}

impl Default for RepeatSpec {
    fn default() -> Self {
        Self::none()
    }
}

/// Computes the first due instant for a trigger.
///
/// Datetime triggers in the past are accepted and become due on the next
/// poll.
///
/// # Errors
///
/// Returns [`TaskDomainError::NonPositiveDelay`] for a delay of zero or
/// fewer minutes, [`TaskDomainError::InvalidDatetime`] for unparseable
/// datetime text, and [`TaskDomainError::ScheduleOutOfRange`] when the
/// result cannot be represented.
pub fn compute_initial(
    trigger: &TriggerSpec,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, TaskDomainError> {
    match trigger {
        TriggerSpec::Immediate => Ok(now),
        TriggerSpec::Delay { minutes } => {
            if *minutes <= 0 {
                return Err(TaskDomainError::NonPositiveDelay(*minutes));
            }
            let delay =
                TimeDelta::try_minutes(*minutes).ok_or(TaskDomainError::ScheduleOutOfRange)?;
            now.checked_add_signed(delay)
                .ok_or(TaskDomainError::ScheduleOutOfRange)
        }
        TriggerSpec::Datetime(value) => parse_datetime(value),
    }
}

/// Returns the repeat interval in milliseconds for a repeat type.
///
/// `custom_minutes` is only consulted for [`RepeatType::Custom`]; when it is
/// absent the default of 60 minutes applies.
///
/// # Errors
///
/// Returns [`TaskDomainError::NonPositiveInterval`] when a custom interval is
/// zero or negative, or [`TaskDomainError::ScheduleOutOfRange`] when it
/// overflows.
pub fn repeat_interval_ms(
    repeat_type: RepeatType,
    custom_minutes: Option<i64>,
) -> Result<u64, TaskDomainError> {
    match repeat_type {
        RepeatType::None => Ok(0),
        RepeatType::Hourly => Ok(HOURLY_MS),
        RepeatType::Daily => Ok(DAILY_MS),
        RepeatType::Weekly => Ok(WEEKLY_MS),
        RepeatType::Custom => {
            let minutes = custom_minutes.unwrap_or(DEFAULT_CUSTOM_INTERVAL_MINUTES);
            let positive = u64::try_from(minutes)
                .ok()
                .filter(|value| *value > 0)
                .ok_or(TaskDomainError::NonPositiveInterval(minutes))?;
            positive
                .checked_mul(MINUTE_MS)
                .ok_or(TaskDomainError::ScheduleOutOfRange)
        }
    }
}

/// Computes the next due instant after a run finished at `now`.
///
/// The next slot is measured from the completion time, not from the
/// previously scheduled slot, so long-running tasks drift later over time.
/// `_previous` is accepted so callers can switch policy without changing
/// call sites.
///
/// # Errors
///
/// Returns [`TaskDomainError::ScheduleOutOfRange`] when the result cannot be
/// represented.
pub fn compute_next(
    _previous: DateTime<Utc>,
    interval_ms: u64,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, TaskDomainError> {
    let interval = i64::try_from(interval_ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .ok_or(TaskDomainError::ScheduleOutOfRange)?;
    now.checked_add_signed(interval)
        .ok_or(TaskDomainError::ScheduleOutOfRange)
}

/// Parses datetime trigger text.
///
/// Accepts RFC 3339 with an explicit offset, or an offset-less
/// `YYYY-MM-DDTHH:MM[:SS[.fff]]` value which is read as UTC. The result is
/// truncated to millisecond precision.
///
/// # Errors
///
/// Returns [`TaskDomainError::InvalidDatetime`] when no layout matches.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, TaskDomainError> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(to_millisecond_precision(parsed.with_timezone(&Utc)));
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| to_millisecond_precision(naive.and_utc()))
        .ok_or_else(|| TaskDomainError::InvalidDatetime(value.to_owned()))
}

/// Reads the clock at millisecond precision.
#[must_use]
pub fn current_instant(clock: &impl Clock) -> DateTime<Utc> {
    to_millisecond_precision(clock.utc())
}

/// Drops sub-millisecond precision so instants survive an epoch-millisecond
/// round trip unchanged.
#[must_use]
pub fn to_millisecond_precision(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(instant.timestamp_millis()).unwrap_or(instant)
}
