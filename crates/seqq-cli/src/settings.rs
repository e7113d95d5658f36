use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use seqq_core::QueueConfig;

/// Demo settings: the queue itself plus the shape of the demo workload.
///
/// Sources, later ones winning: built-in defaults, the optional config file,
/// `SEQQ__*` environment variables (e.g. `SEQQ__QUEUE__DEFAULT_TIMEOUT_MS=50`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub queue: QueueConfig,
    pub demo: DemoSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Number of tasks to enqueue.
    pub tasks: usize,
    /// How long a well-behaved task works before completing.
    pub work_ms: u64,
    /// Every n-th task overruns its timeout (0 disables).
    pub stall_every: usize,
    /// Every n-th task fails outright (0 disables).
    pub fail_every: usize,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            tasks: 6,
            work_ms: 20,
            stall_every: 3,
            fail_every: 5,
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(
                Environment::with_prefix("SEQQ")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
