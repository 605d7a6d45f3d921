//! Channel bridges between the scheduler and an application's agent backend.
//!
//! [`ChannelExecutor`] forwards each run as an [`ExecutionJob`] over an mpsc
//! channel and waits for the backend to answer on the job's oneshot reply.
//! [`ChannelNotifier`] forwards events for display.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::task::ports::{
    ExecutionOutcome, ExecutionRequest, TaskEvent, TaskExecutor, TaskNotifier,
};

/// One run waiting to be performed by the backend.
#[derive(Debug)]
pub struct ExecutionJob {
    request: ExecutionRequest,
    reply: oneshot::Sender<ExecutionOutcome>,
}

impl ExecutionJob {
    /// Returns the run request.
    #[must_use]
    pub const fn request(&self) -> &ExecutionRequest {
        &self.request
    }

    /// Reports the run outcome back to the scheduler.
    ///
    /// Delivery fails silently when the scheduler side has gone away.
    pub fn report(self, outcome: ExecutionOutcome) {
        if self.reply.send(outcome).is_err() {
            debug!(task_id = %self.request.task_id, "execution reply dropped by scheduler");
        }
    }

    /// Reports a successful run.
    pub fn succeed(self) {
        self.report(ExecutionOutcome::Success);
    }

    /// Reports a failed run.
    pub fn fail(self, reason: impl Into<String>) {
        self.report(ExecutionOutcome::failure(reason));
    }
}

/// Executor that hands runs to the backend over a channel.
#[derive(Debug, Clone)]
pub struct ChannelExecutor {
    job_tx: mpsc::UnboundedSender<ExecutionJob>,
}

impl ChannelExecutor {
    /// Creates an executor and the receiver the backend consumes jobs from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ExecutionJob>) {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        (Self { job_tx }, job_rx)
    }
}

#[async_trait]
impl TaskExecutor for ChannelExecutor {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionOutcome {
        let task_id = request.task_id;
        let (reply, outcome_rx) = oneshot::channel();
        if self.job_tx.send(ExecutionJob { request, reply }).is_err() {
            warn!(%task_id, "execution channel closed");
            return ExecutionOutcome::failure("execution channel closed");
        }

        outcome_rx.await.unwrap_or_else(|_| {
            warn!(%task_id, "backend dropped execution job without reporting");
            ExecutionOutcome::failure("executor dropped the run without reporting")
        })
    }
}

/// Notifier that forwards events over a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    event_tx: mpsc::UnboundedSender<TaskEvent>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiver the display side consumes.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TaskEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_tx }, event_rx)
    }
}

impl TaskNotifier for ChannelNotifier {
    fn notify(&self, event: TaskEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("task event channel closed, dropping notification");
        }
    }
}
