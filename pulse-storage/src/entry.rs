//! Cache entries and the values they hold.

use std::sync::Arc;
use std::time::Duration;

use pulse_core::{CacheKey, ExchangeRate, ExportRow, Snapshot, Timestamp};

/// A value stored under a [`CacheKey`].
///
/// Large payloads are behind `Arc` so readers clone a pointer, never the
/// snapshot itself.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Snapshot(Arc<Snapshot>),
    Export(Arc<Vec<ExportRow>>),
    Rate(ExchangeRate),
    Timestamp(Timestamp),
}

impl CacheValue {
    /// Short name of the variant, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Snapshot(_) => "snapshot",
            CacheValue::Export(_) => "export",
            CacheValue::Rate(_) => "rate",
            CacheValue::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            CacheValue::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn as_export(&self) -> Option<&Arc<Vec<ExportRow>>> {
        match self {
            CacheValue::Export(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_rate(&self) -> Option<&ExchangeRate> {
        match self {
            CacheValue::Rate(rate) => Some(rate),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            CacheValue::Timestamp(at) => Some(*at),
            _ => None,
        }
    }
}

impl From<Snapshot> for CacheValue {
    fn from(snapshot: Snapshot) -> Self {
        CacheValue::Snapshot(Arc::new(snapshot))
    }
}

impl From<Vec<ExportRow>> for CacheValue {
    fn from(rows: Vec<ExportRow>) -> Self {
        CacheValue::Export(Arc::new(rows))
    }
}

impl From<ExchangeRate> for CacheValue {
    fn from(rate: ExchangeRate) -> Self {
        CacheValue::Rate(rate)
    }
}

impl From<Timestamp> for CacheValue {
    fn from(at: Timestamp) -> Self {
        CacheValue::Timestamp(at)
    }
}

/// One published value with its write time and advisory TTL.
///
/// Entries are immutable. A write replaces the whole entry, so a reader
/// holding an `Arc<CacheEntry>` keeps a consistent view.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: CacheValue,
    pub written_at: Timestamp,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(key: CacheKey, value: CacheValue, written_at: Timestamp, ttl: Duration) -> Self {
        Self {
            key,
            value,
            written_at,
            ttl,
        }
    }

    /// Age of the entry at `now`. Clock skew into the past counts as zero.
    pub fn age_at(&self, now: Timestamp) -> Duration {
        (now - self.written_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether `written_at + ttl` has elapsed at `now`.
    ///
    /// Expired entries are still served; expiry only informs logging.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.age_at(now) >= self.ttl
    }
}
