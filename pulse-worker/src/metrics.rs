//! Refresh counters.
//!
//! Lock-free counters shared by the coordinator, the cache reader and the
//! scheduler. They are logged at shutdown; there is no exporter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for refresh activity since startup.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
    /// Group refreshes attempted
    pub refresh_cycles: AtomicU64,

    /// Members whose fetch succeeded and were written
    pub member_successes: AtomicU64,

    /// Members whose fetch failed; their entries were left untouched
    pub member_failures: AtomicU64,

    /// Exchange rate refreshes that fell back to the default rate
    pub rate_fallbacks: AtomicU64,

    /// Synchronous refreshes triggered by a cold read
    pub cold_refreshes: AtomicU64,

    /// Cold reads that waited on another reader's refresh
    pub coalesced_waits: AtomicU64,

    /// Scheduled ticks skipped for firing past their grace time
    pub misfires: AtomicU64,
}

impl RefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> RefreshMetricsSnapshot {
        RefreshMetricsSnapshot {
            refresh_cycles: self.refresh_cycles.load(Ordering::Relaxed),
            member_successes: self.member_successes.load(Ordering::Relaxed),
            member_failures: self.member_failures.load(Ordering::Relaxed),
            rate_fallbacks: self.rate_fallbacks.load(Ordering::Relaxed),
            cold_refreshes: self.cold_refreshes.load(Ordering::Relaxed),
            coalesced_waits: self.coalesced_waits.load(Ordering::Relaxed),
            misfires: self.misfires.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of refresh metrics at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshMetricsSnapshot {
    pub refresh_cycles: u64,
    pub member_successes: u64,
    pub member_failures: u64,
    pub rate_fallbacks: u64,
    pub cold_refreshes: u64,
    pub coalesced_waits: u64,
    pub misfires: u64,
}
