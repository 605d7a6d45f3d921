//! Executor port: the backend that performs a task's prompt.

use crate::task::domain::{Task, TaskId, TaskPriority};
use async_trait::async_trait;

/// Work handed to the executor for one dispatched run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Task being run.
    pub task_id: TaskId,
    /// Task display name.
    pub name: String,
    /// Instruction payload to perform.
    pub prompt: String,
    /// Advisory priority, passed through untouched.
    pub priority: TaskPriority,
}

impl ExecutionRequest {
    /// Builds the request for a dispatched task.
    #[must_use]
    pub fn for_task(task: &Task) -> Self {
        Self {
            task_id: task.id(),
            name: task.name().to_owned(),
            prompt: task.prompt().to_owned(),
            priority: task.priority(),
        }
    }
}

/// Report sent back by the executor for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The run succeeded.
    Success,
    /// The run failed.
    Failure {
        /// Human-readable failure reason.
        reason: String,
    },
}

impl ExecutionOutcome {
    /// Creates a failure report.
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }
}

/// Executor contract.
///
/// Each call reports exactly one outcome. The scheduler awaits the returned
/// future on its own tokio task, so an implementation may take as long as it
/// needs; no timeout is applied.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Performs one run of a task.
    async fn execute(&self, request: ExecutionRequest) -> ExecutionOutcome;
}
