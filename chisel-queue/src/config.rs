//! Edit-queue configuration.

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Tunables for the edit queue and its buffer pool.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of recycled chunk buffers kept parked between edits.
    pub pool_capacity: usize,
    /// Lowest section index a fresh buffer spans before expansion.
    pub min_section_index: i32,
    /// Highest section index a fresh buffer spans before expansion
    /// (inclusive).
    pub max_section_index: i32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 64,
            min_section_index: 0,
            max_section_index: 15,
        }
    }
}

impl QueueConfig {
    /// Reads the config from disk. A missing file or an invalid one falls
    /// back to the defaults (with a warning for the latter).
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        let Ok(raw) = fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json5::from_str::<Self>(&raw) {
            Ok(config) => match config.validate() {
                Ok(()) => config,
                Err(reason) => {
                    log::warn!("queue config {path:?} rejected: {reason}");
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("queue config {path:?} unreadable: {err}");
                Self::default()
            }
        }
    }

    /// Checks the invariants the queue relies on.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pool_capacity == 0 {
            return Err("pool_capacity must be non-zero");
        }
        if self.min_section_index > self.max_section_index {
            return Err("min_section_index must not exceed max_section_index");
        }
        Ok(())
    }
}
