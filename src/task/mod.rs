//! Task scheduling.
//!
//! Tasks carry a prompt for an agent backend, a trigger (immediately, after a
//! delay, or at a datetime) and an optional repeat rule. The module follows
//! hexagonal architecture:
//!
//! - Domain types and trigger arithmetic in [`domain`]
//! - Port contracts for persistence, execution and notification in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The task store, lifecycle service and scheduler loop in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
