//! Cache Reader
//!
//! Read path used by request handlers. Reads are plain cache lookups; an
//! expired entry is still served and only logged. A key that was never
//! written triggers one synchronous refresh of its group, coalesced across
//! concurrent readers, followed by a single retry.
//!
//! A read that still finds nothing yields [`ReadOutcome::Unavailable`], which
//! is distinct from a legitimately empty snapshot.

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use pulse_aggregate::{usd_view_for, UsdView};
use pulse_core::{
    DataCategory, ExchangeRate, ExportRow, RefreshGroup, Region, Snapshot, Timestamp,
};
use pulse_storage::{CacheRead, CacheStore};

use crate::coalesce::{Flight, RefreshCoalescer};
use crate::coordinator::RefreshCoordinator;
use crate::metrics::RefreshMetrics;

/// Result of a read: a cached value, or "no data available".
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome<T> {
    Ready(CacheRead<T>),
    Unavailable,
}

impl<T> ReadOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadOutcome::Ready(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, ReadOutcome::Unavailable)
    }

    pub fn ready(&self) -> Option<&CacheRead<T>> {
        match self {
            ReadOutcome::Ready(read) => Some(read),
            ReadOutcome::Unavailable => None,
        }
    }

    /// The value itself, dropping freshness metadata.
    pub fn into_value(self) -> Option<T> {
        match self {
            ReadOutcome::Ready(read) => Some(read.into_value()),
            ReadOutcome::Unavailable => None,
        }
    }
}

impl<T> From<Option<CacheRead<T>>> for ReadOutcome<T> {
    fn from(read: Option<CacheRead<T>>) -> Self {
        match read {
            Some(read) => ReadOutcome::Ready(read),
            None => ReadOutcome::Unavailable,
        }
    }
}

/// Everything a dashboard page needs for one category.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub category: DataCategory,
    pub us: ReadOutcome<Arc<Snapshot>>,
    pub ca: ReadOutcome<Arc<Snapshot>>,
    pub last_updated: Option<Timestamp>,
    /// Cached rate, or the configured default when none was ever cached.
    pub rate: ExchangeRate,
    /// USD projection of the CA snapshot.
    pub ca_usd: Option<UsdView>,
}

impl DashboardView {
    /// Both regions have no data.
    pub fn is_unavailable(&self) -> bool {
        self.us.is_unavailable() && self.ca.is_unavailable()
    }

    pub fn region(&self, region: Region) -> &ReadOutcome<Arc<Snapshot>> {
        match region {
            Region::Us => &self.us,
            Region::Ca => &self.ca,
        }
    }
}

/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct CacheReader {
    store: Arc<dyn CacheStore>,
    coordinator: Arc<RefreshCoordinator>,
    coalescer: Arc<RefreshCoalescer>,
    metrics: Arc<RefreshMetrics>,
}

impl CacheReader {
    pub fn new(coordinator: Arc<RefreshCoordinator>) -> Self {
        Self {
            store: Arc::clone(coordinator.store()),
            metrics: Arc::clone(coordinator.metrics()),
            coalescer: Arc::new(RefreshCoalescer::new()),
            coordinator,
        }
    }

    pub fn coalescer(&self) -> &Arc<RefreshCoalescer> {
        &self.coalescer
    }

    /// Snapshot for a category and region.
    pub async fn read_snapshot(
        &self,
        category: DataCategory,
        region: Region,
    ) -> ReadOutcome<Arc<Snapshot>> {
        if let Some(read) = self.lookup_snapshot(category, region) {
            return ReadOutcome::Ready(read);
        }

        self.cold_refresh(RefreshGroup::from(category), || {
            self.store.get_snapshot(category, region).is_none()
        })
        .await;

        let outcome = ReadOutcome::from(self.lookup_snapshot(category, region));
        if outcome.is_unavailable() {
            warn!(%category, %region, "No snapshot available after cold refresh");
        }
        outcome
    }

    /// Processed export rows; empty when nothing could be loaded.
    pub async fn read_export(&self, category: DataCategory, region: Region) -> Arc<Vec<ExportRow>> {
        if let Some(read) = self.store.get_export(category, region) {
            return read.into_value();
        }

        self.cold_refresh(RefreshGroup::from(category), || {
            self.store.get_export(category, region).is_none()
        })
        .await;

        match self.store.get_export(category, region) {
            Some(read) => read.into_value(),
            None => {
                warn!(%category, %region, "No export rows available after cold refresh");
                Arc::new(Vec::new())
            }
        }
    }

    /// Cached exchange rate, or the configured default.
    pub fn exchange_rate(&self) -> ExchangeRate {
        match self.store.get_rate() {
            Some(read) => read.into_value(),
            None => ExchangeRate::fallback(self.coordinator.settings().default_cad_to_usd),
        }
    }

    /// Both regional snapshots plus rate and freshness for one category.
    pub async fn read_dashboard(&self, category: DataCategory) -> DashboardView {
        let mut us = self.lookup_snapshot(category, Region::Us);
        let mut ca = self.lookup_snapshot(category, Region::Ca);

        if us.is_none() && ca.is_none() {
            self.cold_refresh(RefreshGroup::from(category), || {
                self.store.get_snapshot(category, Region::Us).is_none()
                    && self.store.get_snapshot(category, Region::Ca).is_none()
            })
            .await;
            us = self.lookup_snapshot(category, Region::Us);
            ca = self.lookup_snapshot(category, Region::Ca);
        }

        let rate = self.exchange_rate();
        let ca_usd = ca
            .as_ref()
            .and_then(|read| usd_view_for(read.value(), rate.rate));

        DashboardView {
            category,
            us: us.into(),
            ca: ca.into(),
            last_updated: self.store.get_last_updated(category),
            rate,
            ca_usd,
        }
    }

    fn lookup_snapshot(
        &self,
        category: DataCategory,
        region: Region,
    ) -> Option<CacheRead<Arc<Snapshot>>> {
        let read = self.store.get_snapshot(category, region)?;
        if read.is_expired() {
            debug!(
                %category,
                %region,
                age_secs = read.staleness().as_secs(),
                ttl_secs = read.ttl().as_secs(),
                "Serving stale snapshot"
            );
        }
        Some(read)
    }

    /// Refresh `group` once on behalf of every concurrent cold reader.
    ///
    /// The leader re-checks `still_missing` first: a flight that completed
    /// just before it joined may already have filled the cache. A follower
    /// whose leader was dropped mid-refresh joins again, so it returns only
    /// after some refresh attempt has completed.
    async fn cold_refresh<F>(&self, group: RefreshGroup, still_missing: F)
    where
        F: Fn() -> bool,
    {
        loop {
            match self.coalescer.join(group) {
                Flight::Leader(guard) => {
                    if !still_missing() {
                        guard.complete(true);
                        return;
                    }
                    RefreshMetrics::incr(&self.metrics.cold_refreshes);
                    info!(group = %group, "Cache cold, refreshing synchronously");
                    let report = self.coordinator.refresh_group(group).await;
                    guard.complete(report.any_succeeded());
                    return;
                }
                Flight::Follower(mut rx) => {
                    RefreshMetrics::incr(&self.metrics.coalesced_waits);
                    match rx.recv().await {
                        Ok(_) | Err(RecvError::Lagged(_)) => return,
                        Err(RecvError::Closed) => {
                            debug!(group = %group, "Leader abandoned cold refresh, rejoining");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn test_read_outcome_from_option() {
        let ready: ReadOutcome<u8> =
            Some(CacheRead::new(3, Utc::now(), Duration::from_secs(1))).into();
        assert!(ready.is_ready());
        assert_eq!(ready.ready().map(|r| *r.value()), Some(3));
        assert_eq!(ready.into_value(), Some(3));

        let missing: ReadOutcome<u8> = None.into();
        assert!(missing.is_unavailable());
        assert_eq!(missing.into_value(), None);
    }
}
