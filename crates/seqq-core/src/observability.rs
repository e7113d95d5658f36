use serde::{Deserialize, Serialize};

use crate::domain::{QueueStatus, TaskId};

/// Point-in-time view of a queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub status: QueueStatus,
    /// Tasks waiting behind the in-flight one.
    pub pending: usize,
    pub current_id: TaskId,
    /// A task is running with its timer armed.
    pub in_flight: bool,
    pub default_timeout_ms: u64,
}
