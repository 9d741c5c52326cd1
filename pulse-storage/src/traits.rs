//! Cache store trait and statistics.

use std::sync::Arc;
use std::time::Duration;

use pulse_core::{CacheKey, DataCategory, ExchangeRate, ExportRow, Region, Snapshot, Timestamp};

use crate::entry::{CacheEntry, CacheValue};
use crate::freshness::CacheRead;

/// Key-value store with advisory per-entry TTL.
///
/// Implementations must be safe for one writer and any number of concurrent
/// readers without readers blocking on writers. A `set` replaces the entry for
/// its key atomically from a reader's point of view; nothing is guaranteed
/// across keys.
///
/// `get` returns the last written value even after its TTL has elapsed. Only a
/// later `set` for the same key replaces it.
pub trait CacheStore: Send + Sync {
    /// Latest entry for `key`, or `None` if it was never written.
    fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>>;

    /// Publish `value` under `key`, stamped with the current time.
    fn set(&self, key: CacheKey, value: CacheValue, ttl: Duration);

    /// Usage statistics.
    fn stats(&self) -> CacheStats;

    // ------------------------------------------------------------------------
    // Typed reads
    // ------------------------------------------------------------------------

    /// Snapshot for a category and region.
    fn get_snapshot(
        &self,
        category: DataCategory,
        region: Region,
    ) -> Option<CacheRead<Arc<Snapshot>>> {
        let entry = self.get(&CacheKey::Snapshot(category, region))?;
        let snapshot = entry.value.as_snapshot()?.clone();
        Some(CacheRead::from_entry(snapshot, &entry))
    }

    /// Processed export rows for a category and region.
    fn get_export(
        &self,
        category: DataCategory,
        region: Region,
    ) -> Option<CacheRead<Arc<Vec<ExportRow>>>> {
        let entry = self.get(&CacheKey::Export(category, region))?;
        let rows = entry.value.as_export()?.clone();
        Some(CacheRead::from_entry(rows, &entry))
    }

    /// Shared CAD to USD rate.
    fn get_rate(&self) -> Option<CacheRead<ExchangeRate>> {
        let entry = self.get(&CacheKey::ExchangeRate)?;
        let rate = entry.value.as_rate()?.clone();
        Some(CacheRead::from_entry(rate, &entry))
    }

    /// Last successful refresh of a category.
    fn get_last_updated(&self, category: DataCategory) -> Option<Timestamp> {
        self.get(&CacheKey::LastUpdated(category))?
            .value
            .as_timestamp()
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that found an entry.
    pub hits: u64,
    /// Reads of a never-written key.
    pub misses: u64,
    /// Hits on an entry past its TTL.
    pub stale_hits: u64,
    /// Completed writes.
    pub writes: u64,
    /// Number of keys currently held.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
