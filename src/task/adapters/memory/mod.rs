//! In-memory adapters for tests and embedding hosts that need no durability.

mod notifier;
mod persistence;

pub use notifier::RecordingNotifier;
pub use persistence::InMemoryTaskPersistence;
