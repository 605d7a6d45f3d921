//! Cadenza: a task scheduler engine for agent prompts.
//!
//! Users schedule prompts to run immediately, after a delay, or at a given
//! time, optionally repeating. A polling loop claims due tasks and hands them
//! to a pluggable executor; executor reports drive each task through its
//! lifecycle and are published to a notifier.
//!
//! # Architecture
//!
//! Cadenza follows hexagonal architecture principles:
//!
//! - **Domain**: Pure scheduling rules with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence, execution and
//!   notification
//! - **Adapters**: Concrete implementations of ports (in-memory, JSON file,
//!   channels, tracing)
//!
//! # Modules
//!
//! - [`task`]: Task model, trigger calculation, store, lifecycle and
//!   scheduler loop

pub mod task;
