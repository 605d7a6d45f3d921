//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyName,

    /// The task prompt is empty after trimming.
    #[error("task prompt must not be empty")]
    EmptyPrompt,

    /// A delay trigger was given a zero or negative number of minutes.
    #[error("invalid delay of {0} minutes, expected a positive integer")]
    NonPositiveDelay(i64),

    /// A custom repeat interval was given a zero or negative number of minutes.
    #[error("invalid repeat interval of {0} minutes, expected a positive integer")]
    NonPositiveInterval(i64),

    /// A datetime trigger could not be parsed.
    #[error("invalid schedule datetime '{0}'")]
    InvalidDatetime(String),

    /// Trigger arithmetic left the representable timestamp range.
    #[error("computed schedule time is out of range")]
    ScheduleOutOfRange,

    /// The requested lifecycle transition is not permitted.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidStateTransition {
        /// Task whose transition was rejected.
        task_id: TaskId,
        /// Status the task was in.
        from: TaskStatus,
        /// Status the caller asked for.
        to: TaskStatus,
    },

    /// The task cannot be deleted in its current status.
    #[error("task {task_id} cannot be deleted while {status}")]
    DeleteRejected {
        /// Task whose deletion was rejected.
        task_id: TaskId,
        /// Status that blocks deletion.
        status: TaskStatus,
    },
}

impl TaskDomainError {
    /// Returns `true` when the error reports an incompatible task status
    /// rather than malformed input.
    #[must_use]
    pub const fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            Self::InvalidStateTransition { .. } | Self::DeleteRejected { .. }
        )
    }
}

/// Error returned while parsing an enumerated task field from its storage
/// representation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {field}: {value}")]
pub struct ParseTaskFieldError {
    /// Name of the field being parsed.
    pub field: &'static str,
    /// Rejected raw value.
    pub value: String,
}

impl ParseTaskFieldError {
    pub(crate) fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_owned(),
        }
    }
}
