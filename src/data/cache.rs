//! Time-bounded cache for adapter results.
//!
//! Keys are the adapter name plus its arguments. Each entry carries its own
//! time-to-live, so hourly API results and day-long workbook tables share one
//! cache. Only successful fetches are stored; a failed source is retried on
//! the next render.

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;
use tracing::debug;

pub const DEFAULT_MAX_ENTRIES: u64 = 64;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    ttl: Duration,
}

/// Expire each entry after the TTL it was inserted with.
struct PerEntryTtl;

impl<V> Expiry<String, Entry<V>> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry<V>, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }
}

#[derive(Clone)]
pub struct TtlCache<V> {
    inner: Cache<String, Entry<V>>,
}

impl<V: Clone + Send + Sync + 'static> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn new(max_entries: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries.max(1))
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).map(|e| e.value)
    }

    /// Store `value` for `ttl`. A zero TTL stores nothing.
    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.inner.insert(key.into(), Entry { value, ttl });
    }

    /// Return the cached value for `key`, or run `fetch` and cache its `Ok` result.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(key) {
            debug!(key, "cache hit");
            return Ok(hit);
        }
        debug!(key, "cache miss");
        let value = fetch()?;
        self.insert(key, value.clone(), ttl);
        Ok(value)
    }

    /// Live entries, after pending expirations and evictions have run.
    pub fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        self.inner.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
