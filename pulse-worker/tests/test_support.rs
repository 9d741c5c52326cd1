#![allow(dead_code)]

use std::sync::Arc;

use pulse_core::DataCategory;
use pulse_storage::InMemoryCacheStore;
use pulse_test_utils::{ScriptedDataSource, ScriptedRateProvider};
use pulse_worker::{CacheReader, RefreshCoordinator, RefreshSettings};

/// Coordinator wired to scripted upstreams, with handles to inspect them.
pub struct Harness {
    pub store: Arc<InMemoryCacheStore>,
    pub bookings: Arc<ScriptedDataSource>,
    pub open_orders: Arc<ScriptedDataSource>,
    pub coordinator: Arc<RefreshCoordinator>,
}

impl Harness {
    pub fn new(
        bookings: ScriptedDataSource,
        open_orders: ScriptedDataSource,
        providers: Vec<ScriptedRateProvider>,
        settings: RefreshSettings,
    ) -> Self {
        let store = Arc::new(InMemoryCacheStore::new());
        let bookings = Arc::new(bookings);
        let open_orders = Arc::new(open_orders);

        let mut coordinator = RefreshCoordinator::new(store.clone(), settings)
            .with_source(bookings.clone())
            .with_source(open_orders.clone());
        for provider in providers {
            coordinator = coordinator.with_rate_provider(Arc::new(provider));
        }

        Self {
            store,
            bookings,
            open_orders,
            coordinator: Arc::new(coordinator),
        }
    }

    /// Healthy, empty upstreams and default settings.
    pub fn healthy() -> Self {
        Self::new(
            ScriptedDataSource::healthy(DataCategory::Bookings),
            ScriptedDataSource::healthy(DataCategory::OpenOrders),
            Vec::new(),
            RefreshSettings::default(),
        )
    }

    pub fn with_bookings(bookings: ScriptedDataSource) -> Self {
        Self::new(
            bookings,
            ScriptedDataSource::healthy(DataCategory::OpenOrders),
            Vec::new(),
            RefreshSettings::default(),
        )
    }

    pub fn reader(&self) -> CacheReader {
        CacheReader::new(Arc::clone(&self.coordinator))
    }
}
