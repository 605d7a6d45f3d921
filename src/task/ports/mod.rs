//! Port contracts for task scheduling.
//!
//! Ports define infrastructure-agnostic interfaces for the collaborators the
//! scheduler depends on: task persistence, the executor that performs a
//! task's prompt, and the notification sink.

pub mod executor;
pub mod notifier;
pub mod persistence;

pub use executor::{ExecutionOutcome, ExecutionRequest, TaskExecutor};
#[cfg(test)]
pub use notifier::MockTaskNotifier;
pub use notifier::{TaskEvent, TaskNotifier};
pub use persistence::{TaskPersistence, TaskPersistenceError, TaskPersistenceResult};
