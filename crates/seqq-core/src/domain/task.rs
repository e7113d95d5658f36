use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;

use super::TaskId;
use crate::error::{BoxError, TaskError};
use crate::queue::Completion;

/// Timeout applied when neither the task nor the queue supplies a positive one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

pub(crate) type Action = Box<dyn FnOnce(Completion) -> Result<(), BoxError> + Send + 'static>;
pub(crate) type TimeoutCallback = Box<dyn FnOnce() + Send + 'static>;

/// A unit of work submitted to a `SeqQueue`.
///
/// The action receives a `Completion` and must call `Completion::done` once its
/// work is finished, either before returning or later from spawned work.
/// Returning `Err` (or panicking) reports the attempt as failed and the queue
/// moves on.
///
/// ```ignore
/// let task = Task::new(|done| {
///     tokio::spawn(async move {
///         write_frame().await;
///         done.done();
///     });
///     Ok(())
/// })
/// .with_timeout(Duration::from_millis(500))
/// .on_timeout(|| tracing::warn!("write stalled"));
/// ```
pub struct Task {
    pub(crate) action: Action,
    pub(crate) on_timeout: Option<TimeoutCallback>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) label: Option<String>,
}

impl Task {
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce(Completion) -> Result<(), BoxError> + Send + 'static,
    {
        Self {
            action: Box::new(action),
            on_timeout: None,
            timeout: None,
            label: None,
        }
    }

    /// Task whose work is a future, spawned on the current tokio runtime.
    ///
    /// The attempt completes when the future resolves; an `Err` is reported as
    /// a `QueueEvent::Error` first.
    pub fn from_future<F, Fut>(make: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self::new(move |done: Completion| {
            let handle = Handle::try_current().map_err(|_| TaskError::NoRuntime)?;
            let work = make();
            handle.spawn(async move {
                match work.await {
                    Ok(()) => done.done(),
                    Err(source) => done.fail(source),
                };
            });
            Ok(())
        })
    }

    /// Callback invoked if this task is preempted by its timeout.
    pub fn on_timeout<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_timeout = Some(Box::new(callback));
        self
    }

    /// Per-task timeout. A zero duration falls back to the queue default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Name used in logs and in the `TaskInfo` carried by events.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Task override if positive, else queue default if positive, else `DEFAULT_TIMEOUT`.
    pub fn effective_timeout(&self, queue_default: Duration) -> Duration {
        [self.timeout.unwrap_or(Duration::ZERO), queue_default]
            .into_iter()
            .find(|d| !d.is_zero())
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label)
            .field("timeout", &self.timeout)
            .field("on_timeout", &self.on_timeout.is_some())
            .finish_non_exhaustive()
    }
}

/// Record of one started attempt. Carried by events and completion handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: TaskId,
    /// Effective timeout armed for this attempt.
    pub timeout: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl TaskInfo {
    pub(crate) fn start(id: TaskId, timeout: Duration, label: Option<String>) -> Self {
        Self {
            id,
            timeout,
            label,
            started_at: Utc::now(),
        }
    }
}

impl fmt::Display for TaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}({})", self.id, label),
            None => self.id.fmt(f),
        }
    }
}
