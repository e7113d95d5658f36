//! Ports - abstractions the queue depends on.
//!
//! The queue only needs one outside capability: running work later. It is a
//! trait so the execution model can be swapped (see `impls` for tokio).

pub mod scheduler;

pub use self::scheduler::{Job, Scheduler, TimerHandle};
