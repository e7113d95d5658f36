//! TokioScheduler - `Scheduler` backed by a tokio runtime.
//!
//! - `defer` spawns the job as its own tokio task
//! - `schedule` spawns a task that sleeps, then runs the job
//! - cancelling a timer aborts its task

use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::QueueError;
use crate::ports::{Job, Scheduler, TimerHandle};

#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler for the runtime the caller is running on.
    pub fn current() -> Result<Self, QueueError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| QueueError::NoRuntime)
    }
}

impl Scheduler for TokioScheduler {
    fn defer(&self, job: Job) {
        self.handle.spawn(async move { job() });
    }

    fn schedule(&self, delay: Duration, job: Job) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        });
        TimerHandle::new(move || join.abort())
    }
}
