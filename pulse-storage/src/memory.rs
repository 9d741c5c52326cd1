//! In-memory cache store backed by a sharded concurrent map.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use pulse_core::{CacheKey, Timestamp};

use crate::entry::{CacheEntry, CacheValue};
use crate::traits::{CacheStats, CacheStore};

/// Process-local cache store.
///
/// Each key maps to an `Arc<CacheEntry>`; a write swaps the `Arc`, so readers
/// either see the old entry or the new one, never a mix. Shard locks are held
/// only for the pointer swap or clone.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: DashMap<CacheKey, Arc<CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stale_hits: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write with an explicit timestamp. Used to stage aged entries.
    pub fn set_at(&self, key: CacheKey, value: CacheValue, ttl: Duration, written_at: Timestamp) {
        trace!(key = %key, kind = value.kind(), ttl_secs = ttl.as_secs(), "cache set");
        let entry = Arc::new(CacheEntry::new(key, value, written_at, ttl));
        self.entries.insert(key, entry);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys currently held, in no particular order.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.iter().map(|entry| *entry.key()).collect()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        // Clone the Arc out so the shard guard is released before returning.
        let entry = self.entries.get(key).map(|guard| Arc::clone(guard.value()));
        match &entry {
            Some(found) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                if found.is_expired_at(Utc::now()) {
                    self.stale_hits.fetch_add(1, Ordering::Relaxed);
                }
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        entry
    }

    fn set(&self, key: CacheKey, value: CacheValue, ttl: Duration) {
        self.set_at(key, value, ttl, Utc::now());
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
        }
    }
}
