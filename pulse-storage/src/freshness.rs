//! Staleness-carrying cache reads.
//!
//! The store never hides how old a value is: typed reads return a
//! [`CacheRead<T>`] so callers can log or display staleness.

use chrono::Utc;
use std::time::Duration;

use pulse_core::Timestamp;

use crate::entry::CacheEntry;

/// Result of a cache hit, carrying write time and TTL.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead<T> {
    value: T,
    written_at: Timestamp,
    ttl: Duration,
}

impl<T> CacheRead<T> {
    pub fn new(value: T, written_at: Timestamp, ttl: Duration) -> Self {
        Self {
            value,
            written_at,
            ttl,
        }
    }

    /// Wrap a value extracted from `entry`.
    pub fn from_entry(value: T, entry: &CacheEntry) -> Self {
        Self::new(value, entry.written_at, entry.ttl)
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn written_at(&self) -> Timestamp {
        self.written_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// How long ago the value was written.
    pub fn staleness(&self) -> Duration {
        self.staleness_at(Utc::now())
    }

    pub fn staleness_at(&self, now: Timestamp) -> Duration {
        (now - self.written_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the value has outlived its TTL. It is still usable.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.staleness_at(now) >= self.ttl
    }

    /// Map the inner value to a new type.
    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            written_at: self.written_at,
            ttl: self.ttl,
        }
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_staleness_and_expiry() {
        let written = Utc::now() - TimeDelta::seconds(120);
        let read = CacheRead::new(7u32, written, Duration::from_secs(60));
        assert!(read.staleness() >= Duration::from_secs(120));
        assert!(read.is_expired());
        assert_eq!(*read.value(), 7);
    }

    #[test]
    fn test_future_write_is_not_stale() {
        let now = Utc::now();
        let read = CacheRead::new((), now + TimeDelta::seconds(5), Duration::from_secs(60));
        assert_eq!(read.staleness_at(now), Duration::ZERO);
        assert!(!read.is_expired_at(now));
    }

    #[test]
    fn test_map_keeps_metadata() {
        let written = Utc::now();
        let read = CacheRead::new(2u32, written, Duration::from_secs(10)).map(|v| v * 21);
        assert_eq!(read.into_value(), 42);
        assert_eq!(
            CacheRead::new("x", written, Duration::from_secs(10)).written_at(),
            written
        );
    }
}
