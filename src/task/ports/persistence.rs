//! Persistence port for the task list.

use crate::task::domain::Task;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task persistence operations.
pub type TaskPersistenceResult<T> = Result<T, TaskPersistenceError>;

/// Whole-list persistence contract.
///
/// Implementations must round-trip every task field without loss. The
/// scheduler always saves the complete list, in insertion order.
#[async_trait]
pub trait TaskPersistence: Send + Sync {
    /// Loads the saved task list, or an empty list when nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns [`TaskPersistenceError::Persistence`] when the backing store
    /// cannot be read or decoded.
    async fn load_tasks(&self) -> TaskPersistenceResult<Vec<Task>>;

    /// Replaces the saved task list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskPersistenceError::Persistence`] when the backing store
    /// cannot be written.
    async fn save_tasks(&self, tasks: &[Task]) -> TaskPersistenceResult<()>;
}

/// Errors returned by task persistence implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskPersistenceError {
    /// The saved document uses a schema this build does not understand.
    #[error("unsupported task list version {0}")]
    UnsupportedVersion(u8),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskPersistenceError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
