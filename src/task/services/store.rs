//! Task store: the single source of truth for the task list.

use crate::task::{
    domain::{Task, TaskDomainError, TaskDraft, TaskId, TaskPatch, TaskStatus, current_instant},
    ports::TaskPersistence,
};
use mockable::Clock;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{TaskServiceError, TaskServiceResult};

/// Failure reason given to runs that were still in flight when the store was
/// last saved.
pub const INTERRUPTED_RUN_REASON: &str = "interrupted";

/// Number of tasks in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Tasks waiting for their scheduled time.
    pub pending: usize,
    /// Tasks awaiting an executor report.
    pub running: usize,
    /// Tasks held back by the user.
    pub paused: usize,
    /// Finished one-shot tasks.
    pub completed: usize,
    /// Tasks whose last run failed.
    pub failed: usize,
}

impl TaskCounts {
    /// Tallies a task list.
    #[must_use]
    pub fn of<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks
            .into_iter()
            .fold(Self::default(), |mut counts, task| {
                let slot = match task.status() {
                    TaskStatus::Pending => &mut counts.pending,
                    TaskStatus::Running => &mut counts.running,
                    TaskStatus::Paused => &mut counts.paused,
                    TaskStatus::Completed => &mut counts.completed,
                    TaskStatus::Failed => &mut counts.failed,
                };
                *slot = slot.saturating_add(1);
                counts
            })
    }

    /// Tasks that still have work ahead of them: pending plus running.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.pending.saturating_add(self.running)
    }
}

/// Insertion-ordered task list backed by a persistence port.
///
/// Every mutation runs under one async mutex: the new list is staged, saved
/// through the port, and only then committed in memory. A rejected or failed
/// mutation therefore leaves both copies untouched.
///
/// Executor reports are the exception: see [`Self::record`].
pub struct TaskStore<P, C>
where
    P: TaskPersistence,
    C: Clock + Send + Sync,
{
    persistence: Arc<P>,
    clock: Arc<C>,
    tasks: Mutex<Vec<Task>>,
    unsaved: AtomicBool,
}

impl<P, C> TaskStore<P, C>
where
    P: TaskPersistence,
    C: Clock + Send + Sync,
{
    /// Creates an empty store. Call [`Self::restore`] to load saved tasks.
    #[must_use]
    pub fn new(persistence: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            persistence,
            clock,
            tasks: Mutex::new(Vec::new()),
            unsaved: AtomicBool::new(false),
        }
    }

    /// Creates a store and loads the saved task list into it.
    ///
    /// No executor can still be working for a freshly opened store, so tasks
    /// saved as running are marked failed with [`INTERRUPTED_RUN_REASON`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Persistence`] when loading fails or the
    /// recovered runs cannot be saved.
    pub async fn open(persistence: Arc<P>, clock: Arc<C>) -> TaskServiceResult<Self> {
        let store = Self::new(persistence, clock);
        store.restore().await?;
        let now = current_instant(&*store.clock);
        let interrupted = store
            .modify_where(
                |task| task.status() == TaskStatus::Running,
                |task| task.fail(now, INTERRUPTED_RUN_REASON),
            )
            .await?;
        if !interrupted.is_empty() {
            warn!(count = interrupted.len(), "interrupted runs marked failed");
        }
        Ok(store)
    }

    /// Returns the clock used for all timestamps.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Validates a draft, appends the new pending task and persists.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] for invalid drafts and
    /// [`TaskServiceError::Persistence`] when saving fails.
    pub async fn create(&self, draft: TaskDraft) -> TaskServiceResult<Task> {
        let task = Task::schedule(draft, &*self.clock)?;
        let mut tasks = self.tasks.lock().await;
        let mut staged = tasks.clone();
        staged.push(task.clone());
        self.commit(&mut tasks, staged).await?;
        debug!(task_id = %task.id(), "task created");
        Ok(task)
    }

    /// Merges a patch into an existing task and persists.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown ids,
    /// [`TaskServiceError::Domain`] for invalid patch values, and
    /// [`TaskServiceError::Persistence`] when saving fails.
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> TaskServiceResult<Task> {
        let now = current_instant(&*self.clock);
        let (task, ()) = self.modify(id, |task| task.apply_patch(patch, now)).await?;
        Ok(task)
    }

    /// Removes a task permanently and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown ids (including a
    /// repeated delete), [`TaskDomainError::DeleteRejected`] while the task is
    /// running, and [`TaskServiceError::Persistence`] when saving fails.
    pub async fn delete(&self, id: TaskId) -> TaskServiceResult<Task> {
        let mut tasks = self.tasks.lock().await;
        let index = position_of(&tasks, id)?;
        let mut staged = tasks.clone();
        let removed = staged.remove(index);
        removed.ensure_deletable()?;
        self.commit(&mut tasks, staged).await?;
        debug!(task_id = %id, "task deleted");
        Ok(removed)
    }

    /// Returns all tasks in insertion order.
    pub async fn list(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    /// Returns a task by identifier.
    pub async fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks
            .lock()
            .await
            .iter()
            .find(|task| task.id() == id)
            .cloned()
    }

    /// Returns the number of tasks in each status.
    pub async fn counts(&self) -> TaskCounts {
        TaskCounts::of(self.tasks.lock().await.iter())
    }

    /// Saves the current list through the persistence port.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Persistence`] when saving fails.
    pub async fn persist(&self) -> TaskServiceResult<()> {
        let tasks = self.tasks.lock().await;
        self.persistence.save_tasks(&tasks).await?;
        self.unsaved.store(false, Ordering::Release);
        Ok(())
    }

    /// Saves the list only if a recorded change has not reached the
    /// persistence port yet. Returns whether a save happened.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Persistence`] when saving fails; the list
    /// stays marked unsaved.
    pub async fn flush(&self) -> TaskServiceResult<bool> {
        let tasks = self.tasks.lock().await;
        if !self.unsaved.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.persistence.save_tasks(&tasks).await?;
        self.unsaved.store(false, Ordering::Release);
        Ok(true)
    }

    /// Whether the in-memory list holds changes the port has not saved.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved.load(Ordering::Acquire)
    }

    /// Replaces the in-memory list with the saved one and returns how many
    /// tasks were loaded.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Persistence`] when loading fails; the
    /// in-memory list is kept in that case.
    pub async fn restore(&self) -> TaskServiceResult<usize> {
        let mut tasks = self.tasks.lock().await;
        let loaded = self.persistence.load_tasks().await?;
        let count = loaded.len();
        *tasks = loaded;
        self.unsaved.store(false, Ordering::Release);
        debug!(count, "task list restored");
        Ok(count)
    }

    /// Applies a fallible change to one task and persists the result.
    ///
    /// The change runs on a copy; nothing is stored when it fails.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown ids, the domain
    /// error produced by `change`, or [`TaskServiceError::Persistence`].
    pub async fn modify<T, F>(&self, id: TaskId, change: F) -> TaskServiceResult<(Task, T)>
    where
        F: FnOnce(&mut Task) -> Result<T, TaskDomainError>,
    {
        let mut tasks = self.tasks.lock().await;
        let index = position_of(&tasks, id)?;
        let mut staged = tasks.clone();
        let slot = staged.get_mut(index).ok_or(TaskServiceError::NotFound(id))?;
        let output = change(slot)?;
        let updated = slot.clone();
        self.commit(&mut tasks, staged).await?;
        Ok((updated, output))
    }

    /// Applies a change to one task in memory, then tries to save.
    ///
    /// Unlike [`Self::modify`], a failed save does not discard the change: it
    /// records something that already happened, such as an executor report.
    /// The list is marked unsaved and written by the next successful
    /// mutation, [`Self::persist`] or [`Self::flush`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown ids or the domain
    /// error produced by `change`; the task is unchanged in both cases.
    pub async fn record<T, F>(&self, id: TaskId, change: F) -> TaskServiceResult<(Task, T)>
    where
        F: FnOnce(&mut Task) -> Result<T, TaskDomainError>,
    {
        let mut tasks = self.tasks.lock().await;
        let index = position_of(&tasks, id)?;
        let slot = tasks.get_mut(index).ok_or(TaskServiceError::NotFound(id))?;
        let output = change(slot)?;
        let updated = slot.clone();
        match self.persistence.save_tasks(&tasks).await {
            Ok(()) => self.unsaved.store(false, Ordering::Release),
            Err(err) => {
                self.unsaved.store(true, Ordering::Release);
                warn!(task_id = %id, error = %err, "change kept in memory until the next save");
            }
        }
        Ok((updated, output))
    }

    /// Applies a change to every task matching `select` as one atomic,
    /// single-save mutation, and returns the changed tasks.
    ///
    /// # Errors
    ///
    /// Returns the first domain error produced by `change` (nothing is
    /// stored in that case) or [`TaskServiceError::Persistence`].
    pub async fn modify_where<S, F>(&self, select: S, mut change: F) -> TaskServiceResult<Vec<Task>>
    where
        S: Fn(&Task) -> bool,
        F: FnMut(&mut Task) -> Result<(), TaskDomainError>,
    {
        let mut tasks = self.tasks.lock().await;
        let mut staged = tasks.clone();
        let mut changed = Vec::new();
        for task in staged.iter_mut().filter(|task| select(task)) {
            change(task)?;
            changed.push(task.clone());
        }
        if changed.is_empty() {
            return Ok(changed);
        }
        self.commit(&mut tasks, staged).await?;
        Ok(changed)
    }

    async fn commit(&self, current: &mut Vec<Task>, staged: Vec<Task>) -> TaskServiceResult<()> {
        self.persistence.save_tasks(&staged).await?;
        *current = staged;
        self.unsaved.store(false, Ordering::Release);
        Ok(())
    }
}

fn position_of(tasks: &[Task], id: TaskId) -> TaskServiceResult<usize> {
    tasks
        .iter()
        .position(|task| task.id() == id)
        .ok_or(TaskServiceError::NotFound(id))
}
