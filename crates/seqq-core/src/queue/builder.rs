//! QueueBuilder - constructs and wires a `SeqQueue`.

use std::sync::Arc;
use std::time::Duration;

use super::{QueueConfig, SeqQueue};
use crate::domain::DEFAULT_TIMEOUT;
use crate::error::QueueError;
use crate::impls::TokioScheduler;
use crate::ports::Scheduler;

/// Builds a `SeqQueue`.
///
/// ```ignore
/// let queue = SeqQueue::builder()
///     .default_timeout(Duration::from_millis(500))
///     .event_capacity(256)
///     .build()?;
/// ```
///
/// Without an explicit scheduler, `build()` binds to the tokio runtime it is
/// called on and fails with `QueueError::NoRuntime` outside of one.
pub struct QueueBuilder {
    default_timeout: Duration,
    event_capacity: usize,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl QueueBuilder {
    pub fn new() -> Self {
        Self::from_config(&QueueConfig::default())
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            default_timeout: config.default_timeout(),
            event_capacity: config.event_capacity,
            scheduler: None,
        }
    }

    /// Zero falls back to the built-in 3000 ms.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Events buffered per subscriber. A receiver that falls further behind
    /// lags and misses the oldest events. Zero is raised to one.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn build(self) -> Result<SeqQueue, QueueError> {
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::current()?),
        };
        let default_timeout = if self.default_timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.default_timeout
        };
        Ok(SeqQueue::from_parts(
            default_timeout,
            self.event_capacity.max(1),
            scheduler,
        ))
    }
}

impl Default for QueueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_runtime_fails() {
        let result = QueueBuilder::new().build();
        assert!(matches!(result, Err(QueueError::NoRuntime)));
    }

    #[tokio::test]
    async fn zero_timeout_uses_builtin_default() {
        let queue = QueueBuilder::new()
            .default_timeout(Duration::ZERO)
            .build()
            .unwrap();
        assert_eq!(queue.default_timeout(), DEFAULT_TIMEOUT);
    }

    #[tokio::test]
    async fn from_config_applies_timeout() {
        let config = QueueConfig {
            default_timeout_ms: 250,
            event_capacity: 0,
        };
        let queue = QueueBuilder::from_config(&config).build().unwrap();
        assert_eq!(queue.default_timeout(), Duration::from_millis(250));
    }
}
