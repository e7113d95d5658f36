//! Notifications emitted by a queue.
//!
//! The set of kinds is fixed, so they are a plain enum delivered on a
//! broadcast channel (see `SeqQueue::subscribe`).

use std::sync::Arc;

use super::TaskInfo;
use crate::error::TaskError;

#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// A graceful close was accepted. Emitted at most once.
    Closed,

    /// The queue reached its terminal state. Emitted at most once.
    Drained,

    /// The in-flight task's timer expired before it completed.
    Timeout(TaskInfo),

    /// The task's action failed.
    Error { error: Arc<TaskError>, task: TaskInfo },
}

impl QueueEvent {
    /// Short name of the event kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QueueEvent::Closed => "closed",
            QueueEvent::Drained => "drained",
            QueueEvent::Timeout(_) => "timeout",
            QueueEvent::Error { .. } => "error",
        }
    }

    /// The task record, for the task-scoped kinds.
    pub fn task(&self) -> Option<&TaskInfo> {
        match self {
            QueueEvent::Timeout(task) | QueueEvent::Error { task, .. } => Some(task),
            QueueEvent::Closed | QueueEvent::Drained => None,
        }
    }
}
