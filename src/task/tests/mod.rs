//! Unit tests for the task module.
//!
//! Tests drive time through [`ManualClock`] so that trigger arithmetic and
//! due checks are exact.


use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::task::{
    adapters::memory::InMemoryTaskPersistence,
    domain::Task,
    ports::{TaskPersistence, TaskPersistenceError, TaskPersistenceResult},
};

/// Clock that only moves when a test advances it.
#[derive(Debug)]
pub(super) struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub(super) const fn at_millis(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub(super) fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub(super) fn advance_minutes(&self, minutes: i64) {
        self.millis.fetch_add(minutes * 60_000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
            .expect("test clock within range")
    }
}

/// Instant `millis` milliseconds after the epoch.
pub(super) fn at(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).expect("test instant within range")
}

/// `base` shifted by `millis`.
pub(super) fn plus_millis(base: DateTime<Utc>, millis: i64) -> DateTime<Utc> {
    base + TimeDelta::milliseconds(millis)
}

/// Persistence that delegates to memory until told to fail.
#[derive(Debug, Default)]
pub(super) struct FlakyPersistence {
    pub(super) inner: InMemoryTaskPersistence,
    failing: AtomicBool,
}

impl FlakyPersistence {
    pub(super) fn fail_saves(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub(super) fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskPersistence for FlakyPersistence {
    async fn load_tasks(&self) -> TaskPersistenceResult<Vec<Task>> {
        self.inner.load_tasks().await
    }

    async fn save_tasks(&self, tasks: &[Task]) -> TaskPersistenceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TaskPersistenceError::persistence(std::io::Error::other(
                "disk full",
            )));
        }
        self.inner.save_tasks(tasks).await
    }
}
