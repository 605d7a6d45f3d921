//! Reloading the saved task list into a fresh scheduler.

use std::sync::Arc;

use cadenza::task::{
    adapters::memory::InMemoryTaskPersistence,
    domain::{RepeatSpec, RepeatType, TaskDraft, TaskStatus, TriggerSpec},
    services::INTERRUPTED_RUN_REASON,
};
use rstest::rstest;

use super::helpers::{SchedulerRig, clock};
use crate::test_helpers::ManualClock;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopened_scheduler_sees_every_saved_field(clock: Arc<ManualClock>) {
    let persistence = InMemoryTaskPersistence::new();
    let first = SchedulerRig::open(persistence.clone(), Arc::clone(&clock)).await;
    let daily = first
        .lifecycle()
        .create(
            TaskDraft::new("Digest", "daily digest")
                .with_trigger(TriggerSpec::at("2030-01-01T08:00"))
                .with_repeat(RepeatSpec::of(RepeatType::Daily)),
        )
        .await
        .expect("task created");
    let paused = first
        .lifecycle()
        .create(TaskDraft::new("Held", "later"))
        .await
        .expect("task created");
    first.lifecycle().pause(paused.id()).await.expect("paused");
    let before = first.lifecycle().list().await;
    drop(first);

    let second = SchedulerRig::open(persistence, clock).await;

    assert_eq!(second.lifecycle().list().await, before);
    let restored = second.lifecycle().get(daily.id()).await.expect("daily kept");
    assert_eq!(restored.repeat_interval_ms(), 86_400_000);
    assert_eq!(
        second.lifecycle().get(paused.id()).await.map(|task| task.status()),
        Some(TaskStatus::Paused)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_left_running_is_failed_as_interrupted_after_reload(clock: Arc<ManualClock>) {
    let persistence = InMemoryTaskPersistence::new();
    let mut first = SchedulerRig::open(persistence.clone(), Arc::clone(&clock)).await;
    let task = first
        .lifecycle()
        .create(TaskDraft::new("Interrupted", "never reported"))
        .await
        .expect("task created");
    first.scheduler.tick().await.expect("tick");
    let unanswered = first.jobs.recv().await.expect("job sent");
    drop(first);

    let mut second = SchedulerRig::open(persistence, clock).await;
    second.clock.advance_minutes(120);

    assert!(second.scheduler.tick().await.expect("tick").is_empty());
    assert!(second.jobs.try_recv().is_err());
    let stored = second.lifecycle().get(task.id()).await.expect("task kept");
    assert_eq!(stored.status(), TaskStatus::Failed);
    assert_eq!(stored.last_error(), Some(INTERRUPTED_RUN_REASON));

    let rerun = second.scheduler.run_now(task.id()).await.expect("rerun dispatched");
    second.jobs.recv().await.expect("job sent").succeed();
    rerun.join().await.expect("run recorded");
    let done = second.lifecycle().get(task.id()).await.expect("task kept");
    assert_eq!(done.status(), TaskStatus::Completed);
    assert_eq!(done.last_error(), None);
    drop(unanswered);
}
