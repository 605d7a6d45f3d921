//! In-memory task list persistence.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::Task,
    ports::{TaskPersistence, TaskPersistenceError, TaskPersistenceResult},
};

/// Thread-safe in-memory task persistence.
///
/// Clones share the same saved list, so a test can keep one handle and give
/// another to the store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskPersistence {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: Vec<Task>,
    save_count: usize,
}

impl InMemoryTaskPersistence {
    /// Creates empty persistence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates persistence pre-seeded with a saved list.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState {
                tasks,
                save_count: 0,
            })),
        }
    }

    /// Returns a copy of the most recently saved list.
    #[must_use]
    pub fn saved_tasks(&self) -> Vec<Task> {
        self.state
            .read()
            .map(|state| state.tasks.clone())
            .unwrap_or_default()
    }

    /// Returns how many times the list has been saved.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.state.read().map(|state| state.save_count).unwrap_or_default()
    }
}

#[async_trait]
impl TaskPersistence for InMemoryTaskPersistence {
    async fn load_tasks(&self) -> TaskPersistenceResult<Vec<Task>> {
        let state = self.state.read().map_err(|err| {
            TaskPersistenceError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.tasks.clone())
    }

    async fn save_tasks(&self, tasks: &[Task]) -> TaskPersistenceResult<()> {
        let mut state = self.state.write().map_err(|err| {
            TaskPersistenceError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.tasks = tasks.to_vec();
        state.save_count = state.save_count.saturating_add(1);
        Ok(())
    }
}
