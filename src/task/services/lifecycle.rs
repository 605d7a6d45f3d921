//! Lifecycle service: user actions and executor outcomes applied to tasks.

use crate::task::{
    domain::{CompletionOutcome, Task, TaskDraft, TaskId, TaskPatch, current_instant},
    ports::{ExecutionOutcome, TaskEvent, TaskNotifier, TaskPersistence},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{TaskCounts, TaskServiceError, TaskServiceResult, TaskStore};

/// Task lifecycle orchestration service.
///
/// All status changes go through here so that each one is persisted by the
/// store and reported to the notifier.
pub struct TaskLifecycleService<P, N, C>
where
    P: TaskPersistence,
    N: TaskNotifier,
    C: Clock + Send + Sync,
{
    store: Arc<TaskStore<P, C>>,
    notifier: Arc<N>,
}

impl<P, N, C> TaskLifecycleService<P, N, C>
where
    P: TaskPersistence,
    N: TaskNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(store: Arc<TaskStore<P, C>>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &TaskStore<P, C> {
        &self.store
    }

    /// Creates and schedules a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the draft is invalid or persistence
    /// fails; nothing is stored or reported in either case.
    pub async fn create(&self, draft: TaskDraft) -> TaskServiceResult<Task> {
        let task = self.store.create(draft).await?;
        info!(
            task_id = %task.id(),
            schedule_type = %task.schedule_type(),
            repeat_type = %task.repeat_type(),
            scheduled_time = %task.scheduled_time(),
            "task scheduled"
        );
        self.notifier.notify(TaskEvent::Scheduled {
            task_id: task.id(),
            name: task.name().to_owned(),
            scheduled_time: task.scheduled_time(),
        });
        Ok(task)
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// See [`TaskStore::update`].
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> TaskServiceResult<Task> {
        self.store.update(id, patch).await
    }

    /// Deletes a task that is not running.
    ///
    /// # Errors
    ///
    /// See [`TaskStore::delete`].
    pub async fn delete(&self, id: TaskId) -> TaskServiceResult<Task> {
        let removed = self.store.delete(id).await?;
        self.notifier.notify(TaskEvent::Deleted {
            task_id: removed.id(),
            name: removed.name().to_owned(),
        });
        Ok(removed)
    }

    /// Pauses a pending task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown ids or an invalid
    /// state error unless the task is pending.
    pub async fn pause(&self, id: TaskId) -> TaskServiceResult<Task> {
        let (task, ()) = self.store.modify(id, Task::pause).await?;
        debug!(task_id = %id, "task paused");
        Ok(task)
    }

    /// Resumes a paused task, keeping its scheduled time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown ids or an invalid
    /// state error unless the task is paused.
    pub async fn resume(&self, id: TaskId) -> TaskServiceResult<Task> {
        let (task, ()) = self.store.modify(id, Task::resume).await?;
        debug!(task_id = %id, "task resumed");
        Ok(task)
    }

    /// Moves a task straight to running with its scheduled time set to now.
    ///
    /// The caller is responsible for dispatching the returned task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown ids or an invalid
    /// state error when the task is already running.
    pub async fn run_now(&self, id: TaskId) -> TaskServiceResult<Task> {
        let now = current_instant(self.store.clock());
        let (task, ()) = self.store.modify(id, |task| task.run_now(now)).await?;
        debug!(task_id = %id, "task triggered manually");
        Ok(task)
    }

    /// Moves every due pending task to running in one atomic step and
    /// returns them for dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Persistence`] when saving fails; no task
    /// is claimed in that case.
    pub async fn claim_due(&self) -> TaskServiceResult<Vec<Task>> {
        let now = current_instant(self.store.clock());
        self.store
            .modify_where(|task| task.is_due(now), Task::start)
            .await
    }

    /// Applies an executor report to a running task.
    ///
    /// Returns `Ok(None)` when the task was deleted after dispatch. The report
    /// is kept even when saving fails; see [`TaskStore::record`].
    ///
    /// # Errors
    ///
    /// Returns an invalid state error when the task is no longer running.
    pub async fn record_outcome(
        &self,
        id: TaskId,
        outcome: ExecutionOutcome,
    ) -> TaskServiceResult<Option<Task>> {
        let now = current_instant(self.store.clock());
        let result = match outcome {
            ExecutionOutcome::Success => self.record_success(id, now).await,
            ExecutionOutcome::Failure { reason } => self.record_failure(id, now, reason).await,
        };

        match result {
            Ok(task) => Ok(Some(task)),
            Err(TaskServiceError::NotFound(missing)) => {
                debug!(task_id = %missing, "task removed before its run finished");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Returns all tasks in insertion order.
    pub async fn list(&self) -> Vec<Task> {
        self.store.list().await
    }

    /// Returns a task by identifier.
    pub async fn get(&self, id: TaskId) -> Option<Task> {
        self.store.get(id).await
    }

    /// Returns the number of tasks in each status.
    pub async fn counts(&self) -> TaskCounts {
        self.store.counts().await
    }

    /// Writes changes that an earlier report could not save.
    ///
    /// # Errors
    ///
    /// See [`TaskStore::flush`].
    pub async fn flush(&self) -> TaskServiceResult<bool> {
        self.store.flush().await
    }

    async fn record_success(&self, id: TaskId, now: DateTime<Utc>) -> TaskServiceResult<Task> {
        let (task, completion) = self.store.record(id, |task| task.complete(now)).await?;
        let next_run = match completion {
            CompletionOutcome::Rescheduled { next_run } => Some(next_run),
            CompletionOutcome::Finished => None,
        };
        info!(task_id = %id, run_count = task.run_count(), ?next_run, "task completed");
        self.notifier.notify(TaskEvent::Completed {
            task_id: id,
            name: task.name().to_owned(),
            next_run,
        });
        Ok(task)
    }

    async fn record_failure(
        &self,
        id: TaskId,
        now: DateTime<Utc>,
        reason: String,
    ) -> TaskServiceResult<Task> {
        let (task, ()) = self
            .store
            .record(id, |task| task.fail(now, reason.as_str()))
            .await?;
        warn!(task_id = %id, %reason, "task failed");
        self.notifier.notify(TaskEvent::Failed {
            task_id: id,
            name: task.name().to_owned(),
            reason,
        });
        Ok(task)
    }
}
