//! Task identifiers.
//!
//! A `TaskId` names one execution attempt. Ids come from the queue's
//! generation counter, so they double as an epoch token: any continuation
//! (timer fire, completion call) presents the id it was issued and is only
//! honored while that id is still the queue's current one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one task attempt.
///
/// Assigned exactly once, when the task is dequeued for execution.
/// Monotonically increasing over the queue's lifetime and never reused.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    /// Generation a fresh queue starts at (no task has run yet).
    pub const INITIAL: TaskId = TaskId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The following generation.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}
