//! History configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for classification history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// JSON-lines file to persist records to; in-memory only when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Maximum entries returned by the history listing
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Characters of input text shown in the listing
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Records kept in memory
    #[serde(default = "default_retention")]
    pub retention: usize,

    /// How long a rendered listing is reused (0 disables)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Flush to disk after this many records
    #[serde(default = "default_flush_interval")]
    pub flush_interval: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            limit: default_limit(),
            preview_chars: default_preview_chars(),
            retention: default_retention(),
            cache_ttl_secs: default_cache_ttl_secs(),
            flush_interval: default_flush_interval(),
        }
    }
}

fn default_limit() -> usize {
    50
}

fn default_preview_chars() -> usize {
    100
}

fn default_retention() -> usize {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_flush_interval() -> usize {
    1
}
