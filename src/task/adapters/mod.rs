//! Adapter implementations of the task scheduling ports.

pub mod channel;
pub mod json_file;
pub mod memory;
pub mod tracing_notifier;
