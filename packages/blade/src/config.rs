//! Per-call configuration
//!
//! Parallelism switches travel with each digest call instead of living in
//! process-wide state.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Padded inputs above this size use the worker pool by default (128 KiB)
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 128 * 1024;

/// Environment variable forcing the worker pool on
pub const ENV_FORCE_PARALLEL: &str = "BLADE_FORCE_PARALLEL";
/// Environment variable keeping the worker pool off
pub const ENV_BLOCK_PARALLEL: &str = "BLADE_BLOCK_PARALLEL";
/// Environment variable overriding the parallel threshold, in bytes
pub const ENV_PARALLEL_THRESHOLD: &str = "BLADE_PARALLEL_THRESHOLD";

/// Knobs for one digest computation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BladeConfig {
    /// Always compress through the worker pool; wins over `block_parallel`
    #[serde(default)]
    pub force_parallel: bool,
    /// Never compress through the worker pool
    #[serde(default)]
    pub block_parallel: bool,
    /// Padded input size above which the pool is used automatically
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

impl Default for BladeConfig {
    fn default() -> Self {
        Self {
            force_parallel: false,
            block_parallel: false,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl BladeConfig {
    /// Default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always use the worker pool
    #[must_use]
    pub fn force_parallel(mut self, enabled: bool) -> Self {
        self.force_parallel = enabled;
        self
    }

    /// Never use the worker pool (ignored when parallelism is forced)
    #[must_use]
    pub fn block_parallel(mut self, enabled: bool) -> Self {
        self.block_parallel = enabled;
        self
    }

    /// Set the automatic parallelism threshold in bytes
    #[must_use]
    pub fn parallel_threshold(mut self, bytes: usize) -> Self {
        self.parallel_threshold = bytes;
        self
    }

    /// Defaults overridden by `BLADE_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_FORCE_PARALLEL) {
            match parse_flag(&value) {
                Some(flag) => config.force_parallel = flag,
                None => warn!(key = ENV_FORCE_PARALLEL, %value, "Ignoring invalid flag"),
            }
        }
        if let Some(value) = lookup(ENV_BLOCK_PARALLEL) {
            match parse_flag(&value) {
                Some(flag) => config.block_parallel = flag,
                None => warn!(key = ENV_BLOCK_PARALLEL, %value, "Ignoring invalid flag"),
            }
        }
        if let Some(value) = lookup(ENV_PARALLEL_THRESHOLD) {
            match value.trim().parse() {
                Ok(bytes) => config.parallel_threshold = bytes,
                Err(e) => warn!(key = ENV_PARALLEL_THRESHOLD, %value, error = %e, "Ignoring invalid threshold"),
            }
        }
        config
    }

    /// Whether a call whose padded input is `padded_len` bytes, on a pool of
    /// `workers` workers, should use the pool
    ///
    /// `workers` is only consulted when the other conditions already hold.
    pub fn wants_pool(&self, padded_len: usize, workers: impl FnOnce() -> usize) -> bool {
        if self.force_parallel {
            return true;
        }
        !self.block_parallel && padded_len > self.parallel_threshold && workers() > 1
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
