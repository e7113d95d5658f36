//! Queue configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::DEFAULT_TIMEOUT;
use crate::domain::task::millis;

/// Deserializable queue settings.
///
/// Missing fields take their defaults, so an empty table is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Timeout for tasks without their own. Zero means the built-in default.
    pub default_timeout_ms: u64,

    /// Capacity of the event broadcast channel. A subscriber more than this many
    /// events behind is lagged and misses the oldest ones, `timeout` and `error`
    /// included.
    pub event_capacity: usize,
}

impl QueueConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: millis(DEFAULT_TIMEOUT),
            event_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_builtin_timeout() {
        let config = QueueConfig::default();
        assert_eq!(config.default_timeout(), Duration::from_millis(3000));
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: QueueConfig =
            serde_json::from_value(serde_json::json!({ "default_timeout_ms": 50 })).unwrap();
        assert_eq!(config.default_timeout_ms, 50);
        assert_eq!(config.event_capacity, 64);
    }
}
