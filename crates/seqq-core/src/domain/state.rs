//! Queue status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a sequential queue.
///
/// State transitions:
/// - Idle -> Busy (enqueue)
/// - Busy -> Idle (advance with nothing pending)
/// - Idle | Busy -> Closed (graceful close)
/// - Idle | Busy -> Drained (forced close)
/// - Closed -> Drained (advance with nothing pending)
///
/// Drained is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// Nothing running, nothing pending. Accepts tasks.
    Idle,

    /// A task is running or about to run. Accepts tasks.
    Busy,

    /// No new tasks; the rest of the pending list is still executed.
    Closed,

    /// No new tasks and nothing left to execute.
    Drained,
}

impl QueueStatus {
    /// Does this status accept `enqueue` and `close`?
    pub fn is_accepting(self) -> bool {
        matches!(self, QueueStatus::Idle | QueueStatus::Busy)
    }

    /// May the queue advance to the next task in this status?
    pub fn is_running(self) -> bool {
        matches!(self, QueueStatus::Busy | QueueStatus::Closed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, QueueStatus::Drained)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueueStatus::Idle => "idle",
            QueueStatus::Busy => "busy",
            QueueStatus::Closed => "closed",
            QueueStatus::Drained => "drained",
        };
        f.write_str(s)
    }
}
