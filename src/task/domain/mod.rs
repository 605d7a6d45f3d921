//! Domain model for scheduled tasks.
//!
//! The domain holds the task aggregate, its status state machine and the
//! pure trigger arithmetic. Clocks are injected; storage, execution and
//! notification stay outside the domain boundary.

mod error;
mod ids;
mod task;
pub mod trigger;

pub use error::{ParseTaskFieldError, TaskDomainError};
pub use ids::TaskId;
pub use task::{
    CompletionOutcome, PersistedTaskData, Task, TaskDraft, TaskPatch, TaskPriority, TaskStatus,
};
pub use trigger::{
    RepeatSpec, RepeatType, ScheduleType, TriggerSpec, compute_initial, compute_next,
    current_instant, repeat_interval_ms,
};
