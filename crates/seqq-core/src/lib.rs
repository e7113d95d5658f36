//! seqq-core
//!
//! A sequential task queue: tasks run strictly one at a time, in submission
//! order, each bounded by a timeout. A task that does not complete in time is
//! abandoned (soft cancellation) and its late completion is ignored.
//!
//! # Modules
//! - **domain**: task ids, queue status, `Task`, `TaskInfo`, `QueueEvent`
//! - **ports**: the `Scheduler` abstraction (deferred jobs and timers)
//! - **impls**: `TokioScheduler`
//! - **queue**: `SeqQueue`, its `Completion` handle, builder and config
//! - **observability**: `QueueSnapshot`
//! - **error**: `QueueError`, `TaskError`

pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use domain::{DEFAULT_TIMEOUT, QueueEvent, QueueStatus, Task, TaskId, TaskInfo};
pub use error::{BoxError, QueueError, TaskError};
pub use queue::{Completion, QueueBuilder, QueueConfig, SeqQueue};
