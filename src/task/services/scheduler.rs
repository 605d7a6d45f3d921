//! Scheduler loop: polls for due tasks and dispatches them to the executor.

use crate::task::{
    domain::{Task, TaskId},
    ports::{ExecutionRequest, TaskExecutor, TaskNotifier, TaskPersistence},
};
use mockable::Clock;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::{SchedulerConfig, TaskLifecycleService, TaskServiceResult};

/// Handle to one in-flight run.
///
/// The run keeps going when the handle is dropped; awaiting [`Self::join`]
/// waits until the executor has reported and the outcome is recorded.
#[derive(Debug)]
pub struct Dispatch {
    task_id: TaskId,
    handle: JoinHandle<()>,
}

impl Dispatch {
    /// Returns the dispatched task's identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Waits until the run's outcome has been recorded.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError`] when the run was aborted or panicked.
    pub async fn join(self) -> Result<(), JoinError> {
        self.handle.await
    }
}

/// Periodic driver that claims due tasks and hands them to the executor.
///
/// A tick claims every due task in one store mutation before any executor
/// call starts, so a task is never dispatched twice for one due time. Runs
/// execute concurrently on their own tokio tasks; a run that never reports
/// leaves its task running.
pub struct SchedulerLoop<P, N, C, E>
where
    P: TaskPersistence,
    N: TaskNotifier,
    C: Clock + Send + Sync,
    E: TaskExecutor,
{
    lifecycle: Arc<TaskLifecycleService<P, N, C>>,
    executor: Arc<E>,
    config: SchedulerConfig,
}

impl<P, N, C, E> SchedulerLoop<P, N, C, E>
where
    P: TaskPersistence + 'static,
    N: TaskNotifier + 'static,
    C: Clock + Send + Sync + 'static,
    E: TaskExecutor + 'static,
{
    /// Creates a scheduler loop.
    #[must_use]
    pub const fn new(
        lifecycle: Arc<TaskLifecycleService<P, N, C>>,
        executor: Arc<E>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            lifecycle,
            executor,
            config,
        }
    }

    /// Returns the loop configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the lifecycle service the loop reports outcomes to.
    #[must_use]
    pub fn lifecycle(&self) -> &TaskLifecycleService<P, N, C> {
        &self.lifecycle
    }

    /// Runs one poll: writes any unsaved executor reports, then claims every
    /// due pending task and dispatches each.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Persistence`] when the unsaved
    /// reports or the claim could not be saved; nothing is dispatched in that
    /// case.
    pub async fn tick(&self) -> TaskServiceResult<Vec<Dispatch>> {
        if self.lifecycle.flush().await? {
            info!("unsaved task reports written");
        }
        let claimed = self.lifecycle.claim_due().await?;
        if !claimed.is_empty() {
            debug!(count = claimed.len(), "dispatching due tasks");
        }
        Ok(claimed.iter().map(|task| self.dispatch(task)).collect())
    }

    /// Triggers a task immediately, bypassing its scheduled time.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::NotFound`] for unknown ids or an
    /// invalid state error when the task is already running.
    pub async fn run_now(&self, id: TaskId) -> TaskServiceResult<Dispatch> {
        let task = self.lifecycle.run_now(id).await?;
        Ok(self.dispatch(&task))
    }

    /// Starts the background polling loop.
    ///
    /// The first tick fires immediately. Tick errors are logged and the loop
    /// keeps polling; abort the returned handle to stop it.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.config.poll_interval();
            info!(poll_interval = ?period, "scheduler started");
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if let Err(err) = self.tick().await {
                    error!(error = %err, "scheduler tick failed");
                }
            }
        })
    }

    fn dispatch(&self, task: &Task) -> Dispatch {
        let task_id = task.id();
        let request = ExecutionRequest::for_task(task);
        let executor = Arc::clone(&self.executor);
        let lifecycle = Arc::clone(&self.lifecycle);

        let handle = tokio::spawn(async move {
            debug!(%task_id, "executing task");
            let outcome = executor.execute(request).await;
            if let Err(err) = lifecycle.record_outcome(task_id, outcome).await {
                error!(%task_id, error = %err, "cannot record task outcome");
            }
        });

        Dispatch { task_id, handle }
    }
}
