use thiserror::Error;

use crate::domain::QueueStatus;

/// Boxed error returned by task actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the queue's public operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is not accepting tasks (status={0})")]
    NotAccepting(QueueStatus),

    #[error("no tokio runtime available to schedule queue work")]
    NoRuntime,
}

/// Failure of a single task attempt. Reported through `QueueEvent::Error`.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task action failed: {0}")]
    Failed(#[source] BoxError),

    #[error("task action panicked: {0}")]
    Panicked(String),

    #[error("async task enqueued outside of a tokio runtime")]
    NoRuntime,
}

impl TaskError {
    /// Build from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        TaskError::Panicked(message)
    }
}
