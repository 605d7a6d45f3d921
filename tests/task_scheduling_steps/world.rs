//! Shared world state for task scheduling BDD scenarios.

use std::sync::Arc;

use cadenza::task::{
    adapters::{
        channel::{ChannelExecutor, ExecutionJob},
        memory::{InMemoryTaskPersistence, RecordingNotifier},
    },
    domain::Task,
    services::{
        Dispatch, SchedulerConfig, SchedulerLoop, TaskLifecycleService, TaskServiceError,
        TaskStore,
    },
};
use rstest::fixture;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::test_helpers::ManualClock;

/// Scheduler type used by the BDD world.
pub type TestScheduler =
    SchedulerLoop<InMemoryTaskPersistence, RecordingNotifier, ManualClock, ChannelExecutor>;

/// Scenario world for task scheduling behaviour tests.
pub struct SchedulingWorld {
    pub clock: Arc<ManualClock>,
    pub scheduler: TestScheduler,
    pub jobs: UnboundedReceiver<ExecutionJob>,
    pub task: Option<Task>,
    pub dispatches: Vec<Dispatch>,
    pub received: Vec<ExecutionJob>,
    pub last_error: Option<TaskServiceError>,
}

impl SchedulingWorld {
    /// Creates a world with an empty store and the clock at the epoch.
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::at_millis(0));
        let store = TaskStore::new(
            Arc::new(InMemoryTaskPersistence::new()),
            Arc::clone(&clock),
        );
        let lifecycle =
            TaskLifecycleService::new(Arc::new(store), Arc::new(RecordingNotifier::new()));
        let (executor, jobs) = ChannelExecutor::new();
        let scheduler = SchedulerLoop::new(
            Arc::new(lifecycle),
            Arc::new(executor),
            SchedulerConfig::default(),
        );

        Self {
            clock,
            scheduler,
            jobs,
            task: None,
            dispatches: Vec::new(),
            received: Vec::new(),
            last_error: None,
        }
    }

    /// Returns the task the scenario is following.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been created yet.
    pub fn current_task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Reloads the followed task from the store.
    ///
    /// # Errors
    ///
    /// Returns an error when no task is being followed or it was removed.
    pub fn refresh_task(&mut self) -> Result<(), eyre::Report> {
        let id = self.current_task()?.id();
        let fresh = run_async(self.scheduler.lifecycle().get(id))
            .ok_or_else(|| eyre::eyre!("task {id} disappeared from the store"))?;
        self.task = Some(fresh);
        Ok(())
    }
}

impl Default for SchedulingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SchedulingWorld {
    SchedulingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
