//! Worker lifecycle: eager refresh, scheduled refreshes, shutdown.

use std::sync::Arc;
use tracing::info;

use pulse_core::{DataSource, ExchangeRateProvider, PulseResult};
use pulse_storage::CacheStore;

use crate::config::WorkerConfig;
use crate::coordinator::{RefreshCoordinator, RefreshReport, RefreshSettings};
use crate::jobs::{register_default_jobs, Scheduler};
use crate::metrics::{RefreshMetrics, RefreshMetricsSnapshot};
use crate::reader::CacheReader;

/// Owns the coordinator, the scheduler and the shared cache reader.
pub struct Worker {
    config: WorkerConfig,
    coordinator: Arc<RefreshCoordinator>,
    scheduler: Scheduler,
    reader: CacheReader,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn CacheStore>,
        sources: Vec<Arc<dyn DataSource>>,
        rate_providers: Vec<Arc<dyn ExchangeRateProvider>>,
    ) -> Self {
        let mut coordinator = RefreshCoordinator::new(store, RefreshSettings::from(&config));
        for source in sources {
            coordinator = coordinator.with_source(source);
        }
        for provider in rate_providers {
            coordinator = coordinator.with_rate_provider(provider);
        }
        Self::from_coordinator(config, Arc::new(coordinator))
    }

    pub fn from_coordinator(config: WorkerConfig, coordinator: Arc<RefreshCoordinator>) -> Self {
        let scheduler = Scheduler::new(Arc::clone(coordinator.metrics()));
        let reader = CacheReader::new(Arc::clone(&coordinator));
        Self {
            config,
            coordinator,
            scheduler,
            reader,
        }
    }

    /// Refresh everything once, then start the periodic jobs.
    ///
    /// The eager refresh completes before any timer is armed, so the first
    /// read finds a warm cache whenever the upstreams were reachable.
    pub async fn start(&self) -> PulseResult<RefreshReport> {
        info!("Running startup refresh");
        let report = self.coordinator.refresh_all().await;
        info!(
            groups = report.outcomes.len(),
            failures = report.failure_count(),
            "Startup refresh completed"
        );

        register_default_jobs(&self.scheduler, &self.coordinator, &self.config)?;
        self.scheduler.start()?;
        Ok(report)
    }

    /// Stop the scheduler, waiting up to the configured shutdown timeout.
    pub async fn shutdown(&self) -> PulseResult<RefreshMetricsSnapshot> {
        self.scheduler.stop(self.config.shutdown_timeout).await?;
        Ok(self.coordinator.metrics().snapshot())
    }

    /// Handle for request handlers; cheap to clone.
    pub fn reader(&self) -> &CacheReader {
        &self.reader
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn metrics(&self) -> &Arc<RefreshMetrics> {
        self.coordinator.metrics()
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }
}
