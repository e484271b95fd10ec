//! Prediction cache keyed by exact raw text.
//!
//! Uses `moka::sync::Cache`, bounded by entry count with an optional TTL.
//! Racing misses on the same key may compute twice; both results are
//! identical so the later insert is harmless.

use moka::sync::Cache;
use spamcheck_core::{PredictionResult, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Bounded, thread-safe memoization of prediction results
pub struct PredictionCache {
    cache: Cache<String, PredictionResult>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PredictionCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// `ttl` of `None` keeps entries until they are evicted for space.
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            cache: builder.build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached result for `text`, computing and storing it on a miss.
    ///
    /// Errors from `compute` are returned and not cached.
    pub fn get_or_compute<F>(&self, text: &str, compute: F) -> Result<PredictionResult>
    where
        F: FnOnce(&str) -> Result<PredictionResult>,
    {
        if let Some(hit) = self.cache.get(text) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("spamcheck_cache_hits_total").increment(1);
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("spamcheck_cache_misses_total").increment(1);

        let result = compute(text)?;
        self.cache.insert(text.to_string(), result.clone());
        Ok(result)
    }

    pub fn get(&self, text: &str) -> Option<PredictionResult> {
        self.cache.get(text)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Approximate number of entries (moka applies writes lazily)
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invalidate all entries.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
