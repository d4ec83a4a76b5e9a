use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::codec::MAX_GENERATION_CAPACITY;
use crate::error::HarnessError;
use crate::rng::DEFAULT_SEED;

/// Environment variable naming the YAML config file
pub const CONFIG_ENV: &str = "RINGBUF_STRESS_CONFIG";

/// Config file used when [`CONFIG_ENV`] is unset and the file exists
pub const DEFAULT_CONFIG_PATH: &str = "config/stress.yaml";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StressConfig {
    /// Wall-clock length of the run
    pub duration_secs: u64,
    /// Total worker threads (1 consumer + producers).
    /// Defaults to available parallelism + 1.
    pub workers: Option<usize>,
    /// Shared region size in bytes
    pub capacity: usize,
    /// Producer generation buffer size; must not exceed `capacity`
    pub generation_capacity: usize,
    pub seed: u32,
    /// Abort the process on the first violation
    pub fail_fast: bool,

    pub log_level: String,
    /// Directory for the log file; console only when unset
    pub log_dir: Option<String>,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10,
            workers: None,
            capacity: 512,
            generation_capacity: 255,
            seed: DEFAULT_SEED,
            fail_fast: true,
            log_level: "info".to_string(),
            log_dir: None,
            log_file: "ringbuf_stress.log".to_string(),
            use_json: false,
            rotation: "never".to_string(),
        }
    }
}

impl StressConfig {
    /// Load from `$RINGBUF_STRESS_CONFIG`, else `config/stress.yaml` if
    /// present, else defaults.
    pub fn load() -> Result<Self, HarnessError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &str) -> Result<Self, HarnessError> {
        let content = fs::read_to_string(path)?;
        let config: StressConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.capacity < 3 {
            return Err(HarnessError::Config(format!(
                "capacity must be at least 3 bytes, got {}",
                self.capacity
            )));
        }
        if !(3..=MAX_GENERATION_CAPACITY).contains(&self.generation_capacity) {
            return Err(HarnessError::Config(format!(
                "generation_capacity must be in 3..={}, got {}",
                MAX_GENERATION_CAPACITY, self.generation_capacity
            )));
        }
        if self.generation_capacity > self.capacity {
            return Err(HarnessError::Config(format!(
                "generation_capacity {} exceeds capacity {}",
                self.generation_capacity, self.capacity
            )));
        }
        if let Some(workers) = self.workers {
            if workers < 2 {
                return Err(HarnessError::Config(format!(
                    "need at least one producer and one consumer, got {} workers",
                    workers
                )));
            }
        }
        Ok(())
    }

    /// Configured worker count, or available parallelism + 1
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                + 1
        })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}
