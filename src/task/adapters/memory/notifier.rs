//! Notifier that records every event it receives.

use std::sync::{Arc, Mutex};

use crate::task::ports::{TaskEvent, TaskNotifier};

/// Records delivered events in order. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<TaskEvent>>>,
}

impl RecordingNotifier {
    /// Creates a notifier with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events delivered so far.
    #[must_use]
    pub fn events(&self) -> Vec<TaskEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl TaskNotifier for RecordingNotifier {
    fn notify(&self, event: TaskEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
