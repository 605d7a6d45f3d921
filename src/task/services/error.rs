//! Service-level errors shared by the store, lifecycle and scheduler.

use crate::task::{
    domain::{TaskDomainError, TaskId},
    ports::TaskPersistenceError,
};
use thiserror::Error;

/// Errors surfaced to callers of the task services.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation or a lifecycle guard failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// The persistence port failed.
    #[error(transparent)]
    Persistence(#[from] TaskPersistenceError),
}

/// Coarse classification of a [`TaskServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskErrorKind {
    /// Malformed input; nothing was stored.
    Validation,
    /// The referenced task does not exist.
    NotFound,
    /// The task's status does not allow the operation; it is unchanged.
    InvalidState,
    /// Storage failed; in-memory state is unchanged.
    Persistence,
}

impl TaskServiceError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> TaskErrorKind {
        match self {
            Self::Domain(err) if err.is_invalid_state() => TaskErrorKind::InvalidState,
            Self::Domain(_) => TaskErrorKind::Validation,
            Self::NotFound(_) => TaskErrorKind::NotFound,
            Self::Persistence(_) => TaskErrorKind::Persistence,
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;
