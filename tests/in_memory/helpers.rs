//! Shared wiring for in-memory scheduler integration tests.

use std::sync::Arc;

use cadenza::task::{
    adapters::{
        channel::{ChannelExecutor, ExecutionJob},
        memory::{InMemoryTaskPersistence, RecordingNotifier},
    },
    services::{SchedulerConfig, SchedulerLoop, TaskLifecycleService, TaskStore},
};
use rstest::fixture;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::test_helpers::ManualClock;

/// Epoch milliseconds every scenario starts at.
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// Lifecycle service wired to in-memory adapters.
pub type MemoryLifecycle =
    TaskLifecycleService<InMemoryTaskPersistence, RecordingNotifier, ManualClock>;

/// Scheduler loop wired to in-memory adapters and a channel executor.
pub type MemoryScheduler =
    SchedulerLoop<InMemoryTaskPersistence, RecordingNotifier, ManualClock, ChannelExecutor>;

/// Everything a scenario needs to drive and observe the scheduler.
pub struct SchedulerRig {
    pub clock: Arc<ManualClock>,
    pub persistence: InMemoryTaskPersistence,
    pub notifier: RecordingNotifier,
    pub scheduler: MemoryScheduler,
    pub jobs: UnboundedReceiver<ExecutionJob>,
}

impl SchedulerRig {
    /// Builds a rig whose store starts from whatever `persistence` holds.
    pub async fn open(persistence: InMemoryTaskPersistence, clock: Arc<ManualClock>) -> Self {
        let store = TaskStore::open(Arc::new(persistence.clone()), Arc::clone(&clock))
            .await
            .expect("in-memory store opens");
        let notifier = RecordingNotifier::new();
        let lifecycle = TaskLifecycleService::new(Arc::new(store), Arc::new(notifier.clone()));
        let (executor, jobs) = ChannelExecutor::new();
        let scheduler = SchedulerLoop::new(
            Arc::new(lifecycle),
            Arc::new(executor),
            SchedulerConfig::default(),
        );
        Self {
            clock,
            persistence,
            notifier,
            scheduler,
            jobs,
        }
    }

    /// Returns the lifecycle service behind the loop.
    pub fn lifecycle(&self) -> &MemoryLifecycle {
        self.scheduler.lifecycle()
    }
}

/// Provides a clock parked at [`START_MILLIS`].
#[fixture]
pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at_millis(START_MILLIS))
}
