//! Notifier that writes task events to the `tracing` log.

use tracing::{info, warn};

use crate::task::ports::{TaskEvent, TaskNotifier};

/// Logs each event at `info`, failures at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TaskNotifier for TracingNotifier {
    fn notify(&self, event: TaskEvent) {
        let task_id = event.task_id();
        match &event {
            TaskEvent::Failed { .. } => warn!(%task_id, "{event}"),
            TaskEvent::Scheduled { .. }
            | TaskEvent::Completed { .. }
            | TaskEvent::Deleted { .. } => info!(%task_id, "{event}"),
        }
    }
}
