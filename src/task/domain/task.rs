//! Task aggregate root and its lifecycle state machine.

use super::{
    ParseTaskFieldError, RepeatSpec, RepeatType, ScheduleType, TaskDomainError, TaskId,
    TriggerSpec, compute_initial, compute_next, current_instant,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for its scheduled time.
    Pending,
    /// Handed to the executor and awaiting its report.
    Running,
    /// Held back from dispatch by the user.
    Paused,
    /// Finished successfully and not scheduled again.
    Completed,
    /// The last run failed; not retried automatically.
    Failed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns whether the lifecycle permits moving from `self` to `next`.
    ///
    /// `Completed -> Pending` is the repeat reschedule applied inside a
    /// completion; every `-> Running` edge other than from `Pending` is a
    /// manual run-now.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Paused)
                | (Self::Running, Self::Completed | Self::Failed)
                | (Self::Paused, Self::Pending | Self::Running)
                | (Self::Completed, Self::Pending | Self::Running)
                | (Self::Failed, Self::Running)
        )
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseTaskFieldError::new("task status", value)),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory task priority. Dispatch order ignores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Normal priority.
    #[default]
    Normal,
    /// High priority.
    High,
    /// Urgent priority.
    Urgent,
}

impl TaskPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ParseTaskFieldError::new("task priority", value)),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    name: String,
    prompt: String,
    trigger: TriggerSpec,
    repeat: RepeatSpec,
    priority: TaskPriority,
}

impl TaskDraft {
    /// Creates an immediate, non-repeating, normal-priority draft.
    #[must_use]
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            trigger: TriggerSpec::Immediate,
            repeat: RepeatSpec::none(),
            priority: TaskPriority::Normal,
        }
    }

    /// Sets the first-trigger configuration.
    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerSpec) -> Self {
        self.trigger = trigger;
        self
    }

    /// Sets the repeat configuration.
    #[must_use]
    pub const fn with_repeat(mut self, repeat: RepeatSpec) -> Self {
        self.repeat = repeat;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the raw name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the trigger configuration.
    #[must_use]
    pub const fn trigger(&self) -> &TriggerSpec {
        &self.trigger
    }

    /// Returns the repeat configuration.
    #[must_use]
    pub const fn repeat(&self) -> RepeatSpec {
        self.repeat
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }
}

/// Partial update applied to an existing task.
///
/// Unset fields are left as they are. Status is never patched; it only moves
/// through the lifecycle transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    name: Option<String>,
    prompt: Option<String>,
    priority: Option<TaskPriority>,
    trigger: Option<TriggerSpec>,
    repeat: Option<RepeatSpec>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Reschedules the task with a new trigger, measured from the time the
    /// patch is applied.
    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerSpec) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Replaces the repeat configuration.
    #[must_use]
    pub const fn with_repeat(mut self, repeat: RepeatSpec) -> Self {
        self.repeat = Some(repeat);
        self
    }
}

/// Result of a successful completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The task is done and will not be dispatched again.
    Finished,
    /// The task repeats and is pending again.
    Rescheduled {
        /// Next due instant.
        next_run: DateTime<Utc>,
    },
}

/// Task aggregate root.
///
/// Deserialization goes through [`PersistedTaskData`], so a loaded task
/// derives its `repeat` flag the same way [`Task::from_persisted`] does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PersistedTaskData")]
pub struct Task {
    id: TaskId,
    name: String,
    prompt: String,
    schedule_type: ScheduleType,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    scheduled_time: DateTime<Utc>,
    repeat: bool,
    repeat_type: RepeatType,
    repeat_interval_ms: u64,
    priority: TaskPriority,
    status: TaskStatus,
    run_count: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    last_run: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Parameter object for reconstructing a persisted task aggregate.
///
/// This is also the serialized form read back by persistence adapters. A
/// stored `repeat` flag is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted display name.
    pub name: String,
    /// Persisted executor prompt.
    pub prompt: String,
    /// Persisted schedule type.
    pub schedule_type: ScheduleType,
    /// Persisted next due instant.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub scheduled_time: DateTime<Utc>,
    /// Persisted repeat type; `repeat` is derived from it.
    pub repeat_type: RepeatType,
    /// Persisted repeat interval.
    pub repeat_interval_ms: u64,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted successful run count.
    pub run_count: u64,
    /// Persisted creation timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Persisted last run timestamp.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_run: Option<DateTime<Utc>>,
    /// Persisted last failure reason.
    #[serde(default)]
    pub last_error: Option<String>,
}

impl From<PersistedTaskData> for Task {
    fn from(data: PersistedTaskData) -> Self {
        Self::from_persisted(data)
    }
}

impl Task {
    /// Creates a pending task from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns a validation [`TaskDomainError`] when the name or prompt is
    /// blank, or when the trigger or repeat configuration is invalid.
    pub fn schedule(draft: TaskDraft, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let TaskDraft {
            name: raw_name,
            prompt: raw_prompt,
            trigger,
            repeat,
            priority,
        } = draft;
        let now = current_instant(clock);
        let name = non_blank(&raw_name, TaskDomainError::EmptyName)?;
        let prompt = non_blank(&raw_prompt, TaskDomainError::EmptyPrompt)?;
        let scheduled_time = compute_initial(&trigger, now)?;
        let repeat_interval_ms = repeat.interval_ms()?;
        let repeat_type = repeat.repeat_type();

        Ok(Self {
            id: TaskId::new(),
            name,
            prompt,
            schedule_type: trigger.schedule_type(),
            scheduled_time,
            repeat: repeat_type != RepeatType::None,
            repeat_type,
            repeat_interval_ms,
            priority,
            status: TaskStatus::Pending,
            run_count: 0,
            created_at: now,
            last_run: None,
            last_error: None,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            prompt: data.prompt,
            schedule_type: data.schedule_type,
            scheduled_time: data.scheduled_time,
            repeat: data.repeat_type != RepeatType::None,
            repeat_type: data.repeat_type,
            repeat_interval_ms: data.repeat_interval_ms,
            priority: data.priority,
            status: data.status,
            run_count: data.run_count,
            created_at: data.created_at,
            last_run: data.last_run,
            last_error: data.last_error,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the prompt handed to the executor.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns how the first due time was computed.
    #[must_use]
    pub const fn schedule_type(&self) -> ScheduleType {
        self.schedule_type
    }

    /// Returns the next due instant.
    #[must_use]
    pub const fn scheduled_time(&self) -> DateTime<Utc> {
        self.scheduled_time
    }

    /// Returns whether the task repeats after a successful run.
    #[must_use]
    pub const fn repeat(&self) -> bool {
        self.repeat
    }

    /// Returns the repeat type.
    #[must_use]
    pub const fn repeat_type(&self) -> RepeatType {
        self.repeat_type
    }

    /// Returns the repeat interval in milliseconds, zero when not repeating.
    #[must_use]
    pub const fn repeat_interval_ms(&self) -> u64 {
        self.repeat_interval_ms
    }

    /// Returns the advisory priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the number of successful runs.
    #[must_use]
    pub const fn run_count(&self) -> u64 {
        self.run_count
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the most recent completed or failed run.
    #[must_use]
    pub const fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    /// Returns the failure reason of the most recent failed run.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns whether the scheduler should dispatch this task at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Pending && self.scheduled_time <= now
    }

    /// Marks a pending task as dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// pending.
    pub fn start(&mut self) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::Pending {
            return Err(self.rejected(TaskStatus::Running));
        }
        self.status = TaskStatus::Running;
        Ok(())
    }

    /// Makes the task due at `now` and marks it dispatched, bypassing its
    /// scheduled time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// already running.
    pub fn run_now(&mut self, now: DateTime<Utc>) -> Result<(), TaskDomainError> {
        self.ensure_transition(TaskStatus::Running)?;
        self.scheduled_time = now;
        self.status = TaskStatus::Running;
        Ok(())
    }

    /// Records a successful run finishing at `now`.
    ///
    /// Repeating tasks are rescheduled relative to `now` and return to
    /// pending within the same call.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// running, or [`TaskDomainError::ScheduleOutOfRange`] when the next slot
    /// cannot be represented. The task is unchanged on error.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<CompletionOutcome, TaskDomainError> {
        self.ensure_transition(TaskStatus::Completed)?;
        let next_run = if self.repeat && self.repeat_interval_ms > 0 {
            Some(compute_next(
                self.scheduled_time,
                self.repeat_interval_ms,
                now,
            )?)
        } else {
            None
        };

        self.status = TaskStatus::Completed;
        self.run_count = self.run_count.saturating_add(1);
        self.last_run = Some(now);
        self.last_error = None;

        match next_run {
            Some(next) => {
                self.scheduled_time = next;
                self.status = TaskStatus::Pending;
                Ok(CompletionOutcome::Rescheduled { next_run: next })
            }
            None => Ok(CompletionOutcome::Finished),
        }
    }

    /// Records a failed run finishing at `now`. Failed tasks are never
    /// rescheduled, whatever their repeat settings.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// running.
    pub fn fail(
        &mut self,
        now: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Result<(), TaskDomainError> {
        self.ensure_transition(TaskStatus::Failed)?;
        self.status = TaskStatus::Failed;
        self.last_run = Some(now);
        self.last_error = Some(reason.into());
        Ok(())
    }

    /// Holds a pending task back from dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// pending.
    pub fn pause(&mut self) -> Result<(), TaskDomainError> {
        self.ensure_transition(TaskStatus::Paused)?;
        self.status = TaskStatus::Paused;
        Ok(())
    }

    /// Returns a paused task to pending without touching its scheduled time.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] unless the task is
    /// paused.
    pub fn resume(&mut self) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::Paused {
            return Err(self.rejected(TaskStatus::Pending));
        }
        self.status = TaskStatus::Pending;
        Ok(())
    }

    /// Checks that the task may be removed from the store.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DeleteRejected`] while the task is running.
    pub fn ensure_deletable(&self) -> Result<(), TaskDomainError> {
        if self.status == TaskStatus::Running {
            return Err(TaskDomainError::DeleteRejected {
                task_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// Applies a partial update. Triggers in the patch are measured from
    /// `now`.
    ///
    /// # Errors
    ///
    /// Returns a validation [`TaskDomainError`] for blank text or an invalid
    /// trigger or repeat configuration. The task is unchanged on error.
    pub fn apply_patch(
        &mut self,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        let new_name = patch
            .name
            .map(|name| non_blank(&name, TaskDomainError::EmptyName))
            .transpose()?;
        let new_prompt = patch
            .prompt
            .map(|prompt| non_blank(&prompt, TaskDomainError::EmptyPrompt))
            .transpose()?;
        let rescheduled = patch
            .trigger
            .map(|trigger| {
                compute_initial(&trigger, now).map(|time| (trigger.schedule_type(), time))
            })
            .transpose()?;
        let repeat = patch
            .repeat
            .map(|spec| spec.interval_ms().map(|interval| (spec.repeat_type(), interval)))
            .transpose()?;

        if let Some(name) = new_name {
            self.name = name;
        }
        if let Some(prompt) = new_prompt {
            self.prompt = prompt;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some((schedule_type, scheduled_time)) = rescheduled {
            self.schedule_type = schedule_type;
            self.scheduled_time = scheduled_time;
        }
        if let Some((repeat_type, interval)) = repeat {
            self.repeat = repeat_type != RepeatType::None;
            self.repeat_type = repeat_type;
            self.repeat_interval_ms = interval;
        }
        Ok(())
    }

    fn ensure_transition(&self, to: TaskStatus) -> Result<(), TaskDomainError> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(self.rejected(to))
        }
    }

    const fn rejected(&self, to: TaskStatus) -> TaskDomainError {
        TaskDomainError::InvalidStateTransition {
            task_id: self.id,
            from: self.status,
            to,
        }
    }
}

fn non_blank(value: &str, empty_error: TaskDomainError) -> Result<String, TaskDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(empty_error);
    }
    Ok(trimmed.to_owned())
}
