//! Impls - port implementations.

pub mod tokio_scheduler;

pub use self::tokio_scheduler::TokioScheduler;
