//! Scheduler port - deferred execution and timers.
//!
//! The queue never runs continuations inline: the first task after an
//! Idle -> Busy transition and the advance triggered by a timeout are both
//! handed to a `Scheduler`. Any executor can back it (tokio, a single-threaded
//! actor, a test harness).

use std::fmt;
use std::time::Duration;

/// Unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Scheduler runs jobs on a later turn or after a delay.
///
/// # Contract
/// - `defer` never runs the job before returning.
/// - `schedule` runs the job once after `delay` unless the returned handle is
///   cancelled first.
pub trait Scheduler: Send + Sync {
    fn defer(&self, job: Job);

    fn schedule(&self, delay: Duration, job: Job) -> TimerHandle;
}

/// Handle to an armed timer. Exclusively owned by the queue.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TimerHandle {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the timer. Calling it on an already fired timer is harmless.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}
