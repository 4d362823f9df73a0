//! In-memory order cache using DashMap.
//!
//! Maps `order_uid` to the canonical JSON bytes of the order. DashMap shards
//! the key space across reader/writer locks, so concurrent reads proceed in
//! parallel and a write only excludes readers of its own shard.
//!
//! The cache is derived state: it is never authoritative, has no TTL or
//! eviction, and is rebuilt from durable storage on restart.

use bytes::Bytes;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Concurrent `order_uid -> canonical bytes` map.
///
/// Cloning is cheap; clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct OrderCache {
    inner: Arc<OrderCacheInner>,
}

#[derive(Debug, Default)]
struct OrderCacheInner {
    entries: DashMap<String, Bytes>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl OrderCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an order. Absence is never cached.
    pub fn get(&self, id: &str) -> Option<Bytes> {
        match self.inner.entries.get(id) {
            Some(value) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            None => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or overwrite an entry. Last write wins.
    pub fn set(&self, id: impl Into<String>, value: Bytes) {
        self.inner.entries.insert(id.into(), value);
    }

    /// Bulk insert used for startup warm-up.
    ///
    /// Each key is written atomically, but readers may observe a partially
    /// loaded set of keys while this runs.
    pub fn load_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, Bytes)>,
    {
        for (id, value) in entries {
            self.inner.entries.insert(id, value);
        }
    }

    /// Number of cached orders.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
        }
    }
}
