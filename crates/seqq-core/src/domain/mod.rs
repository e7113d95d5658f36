//! Domain model (ids, queue status, tasks, events).

pub mod events;
pub mod ids;
pub mod state;
pub mod task;

pub use self::events::QueueEvent;
pub use self::ids::TaskId;
pub use self::state::QueueStatus;
pub use self::task::{DEFAULT_TIMEOUT, Task, TaskInfo};
