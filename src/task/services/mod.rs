//! Application services for task scheduling.
//!
//! [`TaskStore`] owns the task list, [`TaskLifecycleService`] applies user
//! actions and executor reports to it, and [`SchedulerLoop`] drives due tasks
//! to the executor.

mod config;
mod error;
mod lifecycle;
mod scheduler;
mod store;

pub use config::{DEFAULT_POLL_INTERVAL, POLL_INTERVAL_ENV, SchedulerConfig, SchedulerConfigError};
pub use error::{TaskErrorKind, TaskServiceError, TaskServiceResult};
pub use lifecycle::TaskLifecycleService;
pub use scheduler::{Dispatch, SchedulerLoop};
pub use store::{INTERRUPTED_RUN_REASON, TaskCounts, TaskStore};
