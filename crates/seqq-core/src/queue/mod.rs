//! Queue module: the sequential queue, its completion handle and configuration.

mod builder;
mod completion;
mod config;
mod seq;

pub use builder::QueueBuilder;
pub use completion::Completion;
pub use config::QueueConfig;
pub use seq::SeqQueue;
