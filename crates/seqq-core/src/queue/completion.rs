//! Completion handle handed to a running task.

use std::fmt;
use std::sync::Weak;

use tracing::debug;

use super::seq::Inner;
use crate::domain::{TaskId, TaskInfo};
use crate::error::{BoxError, TaskError};

/// Signals the end of one task attempt.
///
/// Cheap to clone; holds a weak reference to the queue and the attempt's
/// record. Only the attempt whose id is still the queue's current generation
/// can advance the queue, so calls after a timeout (or a second call) are
/// ignored.
#[derive(Clone)]
pub struct Completion {
    queue: Weak<Inner>,
    task: TaskInfo,
}

impl Completion {
    pub(crate) fn new(queue: Weak<Inner>, task: TaskInfo) -> Self {
        Self { queue, task }
    }

    pub fn id(&self) -> TaskId {
        self.task.id
    }

    pub fn task(&self) -> &TaskInfo {
        &self.task
    }

    /// Is this attempt still the one the queue is waiting on?
    pub fn is_current(&self) -> bool {
        self.queue
            .upgrade()
            .is_some_and(|queue| queue.is_current(self.task.id))
    }

    /// Mark the attempt finished and advance the queue.
    ///
    /// Returns `true` if this call advanced the queue, `false` if the attempt
    /// had already been timed out, completed, or the queue is gone. The check
    /// and the advance happen under one lock.
    pub fn done(&self) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            return false;
        };
        let advanced = queue.advance(self.task.id);
        if !advanced {
            debug!(task = %self.task, "ignoring late completion");
        }
        advanced
    }

    /// Report an asynchronous failure, then complete like `done`.
    ///
    /// A failure from an attempt that is no longer current (timed out, already
    /// completed, or discarded by a forced close) emits no `Error` event.
    pub fn fail(&self, source: BoxError) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            return false;
        };
        let failure = (TaskError::Failed(source), self.task.clone());
        let advanced = queue.advance_after(self.task.id, Some(failure));
        if !advanced {
            debug!(task = %self.task, "ignoring late failure");
        }
        advanced
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}
