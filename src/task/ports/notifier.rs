//! Notification port for human-readable task events.

use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use std::fmt;

/// Task event reported to the notification sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// A task was created.
    Scheduled {
        /// Task identifier.
        task_id: TaskId,
        /// Task display name.
        name: String,
        /// First due instant.
        scheduled_time: DateTime<Utc>,
    },
    /// A run succeeded.
    Completed {
        /// Task identifier.
        task_id: TaskId,
        /// Task display name.
        name: String,
        /// Next due instant for repeating tasks.
        next_run: Option<DateTime<Utc>>,
    },
    /// A run failed.
    Failed {
        /// Task identifier.
        task_id: TaskId,
        /// Task display name.
        name: String,
        /// Failure reason reported by the executor.
        reason: String,
    },
    /// A task was deleted.
    Deleted {
        /// Task identifier.
        task_id: TaskId,
        /// Task display name.
        name: String,
    },
}

impl TaskEvent {
    /// Returns the task the event refers to.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        match self {
            Self::Scheduled { task_id, .. }
            | Self::Completed { task_id, .. }
            | Self::Failed { task_id, .. }
            | Self::Deleted { task_id, .. } => *task_id,
        }
    }
}

impl fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled { name, .. } => write!(f, "Task \"{name}\" scheduled"),
            Self::Completed { name, .. } => write!(f, "Task \"{name}\" completed"),
            Self::Failed { name, reason, .. } => write!(f, "Task \"{name}\" failed: {reason}"),
            Self::Deleted { name, .. } => write!(f, "Task \"{name}\" deleted"),
        }
    }
}

/// Fire-and-forget notification sink.
///
/// Implementations must not block and must swallow their own delivery
/// failures; the scheduler never waits on or inspects a notification.
#[cfg_attr(test, automock)]
pub trait TaskNotifier: Send + Sync {
    /// Delivers one event.
    fn notify(&self, event: TaskEvent);
}
