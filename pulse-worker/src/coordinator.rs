//! Refresh Coordinator
//!
//! Pulls rows from the upstream sources, aggregates them and publishes the
//! results into the cache store.
//!
//! Every member fetch of a group yields a `Result`; only the `Ok` arm reaches
//! [`CacheStore::set`]. A failed member therefore leaves its previous entry
//! untouched, and a group whose members all failed leaves its "last updated"
//! key untouched too.
//!
//! # Groups and members
//!
//! | Group | Members |
//! |---|---|
//! | `Bookings` / `OpenOrders` | snapshot US, snapshot CA, export US, export CA |
//! | `ExchangeRate` | the shared CAD to USD rate |
//! | `All` | exchange rate, then bookings, then open orders |

use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use pulse_aggregate::{aggregate_today, process_export_rows};
use pulse_core::{
    new_cycle_id, CacheKey, CycleId, DataCategory, DataSource, ExchangeRate,
    ExchangeRateProvider, ExportRow, FetchError, RefreshGroup, Region, Snapshot,
};
use pulse_storage::{CacheStore, CacheValue};

use crate::config::WorkerConfig;
use crate::metrics::RefreshMetrics;

// ============================================================================
// SETTINGS
// ============================================================================

/// TTLs and timeouts applied by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshSettings {
    pub bookings_ttl: Duration,
    pub open_orders_ttl: Duration,
    pub rate_ttl: Duration,
    pub fetch_timeout: Duration,
    pub rate_timeout: Duration,
    pub default_cad_to_usd: f64,
}

impl RefreshSettings {
    pub fn ttl_for(&self, category: DataCategory) -> Duration {
        match category {
            DataCategory::Bookings => self.bookings_ttl,
            DataCategory::OpenOrders => self.open_orders_ttl,
        }
    }
}

impl From<&WorkerConfig> for RefreshSettings {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            bookings_ttl: config.bookings_ttl,
            open_orders_ttl: config.open_orders_ttl,
            rate_ttl: config.rate_ttl,
            fetch_timeout: config.fetch_timeout,
            rate_timeout: config.rate_timeout,
            default_cad_to_usd: config.default_cad_to_usd,
        }
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self::from(&WorkerConfig::default())
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// A member whose fetch failed. Its cache entry was not touched.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberFailure {
    pub key: CacheKey,
    pub error: FetchError,
}

/// Result of refreshing one concrete group.
#[derive(Debug, Clone)]
pub struct GroupOutcome {
    pub group: RefreshGroup,
    pub cycle_id: CycleId,
    /// Keys written during this refresh.
    pub succeeded: Vec<CacheKey>,
    pub failed: Vec<MemberFailure>,
    /// Rate published by an exchange rate refresh.
    pub rate: Option<ExchangeRate>,
    pub elapsed: Duration,
}

impl GroupOutcome {
    fn new(group: RefreshGroup, cycle_id: CycleId) -> Self {
        Self {
            group,
            cycle_id,
            succeeded: Vec::new(),
            failed: Vec::new(),
            rate: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Whether at least one member was written.
    pub fn any_succeeded(&self) -> bool {
        !self.succeeded.is_empty()
    }

    /// Whether nothing was written.
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty()
    }
}

/// Outcomes of one `refresh_group` call, one per concrete group.
#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    pub outcomes: Vec<GroupOutcome>,
}

impl RefreshReport {
    pub fn any_succeeded(&self) -> bool {
        self.outcomes.iter().any(GroupOutcome::any_succeeded)
    }

    pub fn outcome(&self, group: RefreshGroup) -> Option<&GroupOutcome> {
        self.outcomes.iter().find(|o| o.group == group)
    }

    /// Total failed members across all groups.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.failed.len()).sum()
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

/// Orchestrates upstream fetches, aggregation and cache writes.
pub struct RefreshCoordinator {
    store: Arc<dyn CacheStore>,
    sources: HashMap<DataCategory, Arc<dyn DataSource>>,
    rate_providers: Vec<Arc<dyn ExchangeRateProvider>>,
    settings: RefreshSettings,
    metrics: Arc<RefreshMetrics>,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<dyn CacheStore>, settings: RefreshSettings) -> Self {
        Self {
            store,
            sources: HashMap::new(),
            rate_providers: Vec::new(),
            settings,
            metrics: Arc::new(RefreshMetrics::new()),
        }
    }

    /// Register the source of a data category, replacing any previous one.
    pub fn with_source(mut self, source: Arc<dyn DataSource>) -> Self {
        self.sources.insert(source.category(), source);
        self
    }

    /// Append a rate provider. Providers are tried in registration order.
    pub fn with_rate_provider(mut self, provider: Arc<dyn ExchangeRateProvider>) -> Self {
        self.rate_providers.push(provider);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<RefreshMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<RefreshMetrics> {
        &self.metrics
    }

    /// Refresh every group: exchange rate, bookings, open orders.
    pub async fn refresh_all(&self) -> RefreshReport {
        self.refresh_group(RefreshGroup::All).await
    }

    /// Refresh a group. Never fails; failures are reported per member.
    pub async fn refresh_group(&self, group: RefreshGroup) -> RefreshReport {
        let mut report = RefreshReport::default();
        for concrete in group.expand() {
            let cycle_id = new_cycle_id();
            let outcome = match concrete.category() {
                Some(category) => self.refresh_category(category, cycle_id).await,
                None => self.refresh_exchange_rate(cycle_id).await,
            };
            report.outcomes.push(outcome);
        }
        report
    }

    async fn refresh_category(&self, category: DataCategory, cycle_id: CycleId) -> GroupOutcome {
        let started = Instant::now();
        let group = RefreshGroup::from(category);
        let ttl = self.settings.ttl_for(category);
        let mut outcome = GroupOutcome::new(group, cycle_id);
        RefreshMetrics::incr(&self.metrics.refresh_cycles);

        let members = match self.sources.get(&category) {
            Some(source) => {
                debug!(%cycle_id, %category, source = source.name(), "Refreshing group");
                let source = source.as_ref();
                let (snapshot_us, snapshot_ca, export_us, export_ca) = tokio::join!(
                    self.fetch_snapshot(source, category, Region::Us),
                    self.fetch_snapshot(source, category, Region::Ca),
                    self.fetch_export(source, category, Region::Us),
                    self.fetch_export(source, category, Region::Ca),
                );
                vec![
                    (
                        CacheKey::Snapshot(category, Region::Us),
                        snapshot_us.map(CacheValue::from),
                    ),
                    (
                        CacheKey::Snapshot(category, Region::Ca),
                        snapshot_ca.map(CacheValue::from),
                    ),
                    (
                        CacheKey::Export(category, Region::Us),
                        export_us.map(CacheValue::from),
                    ),
                    (
                        CacheKey::Export(category, Region::Ca),
                        export_ca.map(CacheValue::from),
                    ),
                ]
            }
            None => {
                error!(%cycle_id, %category, "No data source registered");
                let missing = FetchError::Connection {
                    source_name: category.to_string(),
                    reason: "no data source registered".to_string(),
                };
                Region::ALL
                    .iter()
                    .flat_map(|&region| {
                        [
                            CacheKey::Snapshot(category, region),
                            CacheKey::Export(category, region),
                        ]
                    })
                    .map(|key| (key, Err(missing.clone())))
                    .collect()
            }
        };

        for (key, result) in members {
            match result {
                Ok(value) => {
                    debug!(%cycle_id, key = %key, kind = value.kind(), "Publishing entry");
                    self.store.set(key, value, ttl);
                    RefreshMetrics::incr(&self.metrics.member_successes);
                    outcome.succeeded.push(key);
                }
                Err(error) => {
                    warn!(
                        %cycle_id,
                        key = %key,
                        error = %error,
                        "Refresh failed, keeping previous entry"
                    );
                    RefreshMetrics::incr(&self.metrics.member_failures);
                    outcome.failed.push(MemberFailure { key, error });
                }
            }
        }

        if outcome.any_succeeded() {
            self.store
                .set(CacheKey::LastUpdated(category), Utc::now().into(), ttl);
        } else {
            error!(
                %cycle_id,
                %category,
                "Every member failed, last updated timestamp left unchanged"
            );
        }

        outcome.elapsed = started.elapsed();
        info!(
            %cycle_id,
            %category,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Group refresh completed"
        );
        outcome
    }

    async fn fetch_snapshot(
        &self,
        source: &dyn DataSource,
        category: DataCategory,
        region: Region,
    ) -> Result<Snapshot, FetchError> {
        let name = member_name(source, region);
        let records = bounded(&name, self.settings.fetch_timeout, source.fetch_raw(region)).await?;
        Ok(aggregate_today(&records, category, region))
    }

    async fn fetch_export(
        &self,
        source: &dyn DataSource,
        category: DataCategory,
        region: Region,
    ) -> Result<Vec<ExportRow>, FetchError> {
        let name = member_name(source, region);
        let rows = bounded(&name, self.settings.fetch_timeout, source.fetch_export(region)).await?;
        Ok(process_export_rows(rows, category, region))
    }

    async fn refresh_exchange_rate(&self, cycle_id: CycleId) -> GroupOutcome {
        let started = Instant::now();
        let mut outcome = GroupOutcome::new(RefreshGroup::ExchangeRate, cycle_id);
        RefreshMetrics::incr(&self.metrics.refresh_cycles);

        let (rate, provider_errors) = self.resolve_exchange_rate(cycle_id).await;
        self.store.set(
            CacheKey::ExchangeRate,
            rate.clone().into(),
            self.settings.rate_ttl,
        );
        RefreshMetrics::incr(&self.metrics.member_successes);

        outcome.succeeded.push(CacheKey::ExchangeRate);
        outcome.failed = provider_errors
            .into_iter()
            .map(|error| MemberFailure {
                key: CacheKey::ExchangeRate,
                error,
            })
            .collect();
        outcome.rate = Some(rate);
        outcome.elapsed = started.elapsed();
        outcome
    }

    /// First provider quote inside the sanity range, else the default rate.
    async fn resolve_exchange_rate(&self, cycle_id: CycleId) -> (ExchangeRate, Vec<FetchError>) {
        let mut errors = Vec::new();
        for provider in &self.rate_providers {
            let result = bounded(
                provider.name(),
                self.settings.rate_timeout,
                provider.fetch_rate(),
            )
            .await
            .and_then(|quote| ExchangeRate::checked(quote, provider.name()));

            match result {
                Ok(rate) => {
                    info!(
                        %cycle_id,
                        provider = provider.name(),
                        rate = rate.rate,
                        "Exchange rate updated"
                    );
                    return (rate, errors);
                }
                Err(error) => {
                    warn!(
                        %cycle_id,
                        provider = provider.name(),
                        error = %error,
                        "Rate provider failed"
                    );
                    errors.push(error);
                }
            }
        }

        RefreshMetrics::incr(&self.metrics.rate_fallbacks);
        let rate = ExchangeRate::fallback(self.settings.default_cad_to_usd);
        warn!(%cycle_id, rate = rate.rate, "All rate providers failed, using default rate");
        (rate, errors)
    }
}

fn member_name(source: &dyn DataSource, region: Region) -> String {
    format!("{}/{}", source.name(), region.key_suffix())
}

/// Run an upstream call with a deadline; elapsing counts as a fetch failure.
async fn bounded<T, F>(source_name: &str, after: Duration, fetch: F) -> Result<T, FetchError>
where
    F: Future<Output = Result<T, FetchError>>,
{
    match tokio::time::timeout(after, fetch).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            source_name: source_name.to_string(),
            after,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_maps_elapsed_to_timeout() {
        let result: Result<(), FetchError> = bounded("slow/us", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.source_name(), "slow/us");
    }

    #[tokio::test]
    async fn test_bounded_passes_through() {
        let ok: Result<u8, FetchError> =
            bounded("fast", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }

    #[test]
    fn test_outcome_flags() {
        let mut outcome = GroupOutcome::new(RefreshGroup::Bookings, new_cycle_id());
        assert!(outcome.all_failed());
        outcome.succeeded.push(CacheKey::LastUpdated(DataCategory::Bookings));
        assert!(outcome.any_succeeded());

        let report = RefreshReport {
            outcomes: vec![outcome],
        };
        assert!(report.any_succeeded());
        assert!(report.outcome(RefreshGroup::Bookings).is_some());
        assert!(report.outcome(RefreshGroup::OpenOrders).is_none());
        assert_eq!(report.failure_count(), 0);
    }

    #[test]
    fn test_settings_from_config() {
        let settings = RefreshSettings::from(&WorkerConfig::default());
        assert_eq!(settings.ttl_for(DataCategory::Bookings), Duration::from_secs(900));
        assert_eq!(settings.ttl_for(DataCategory::OpenOrders), Duration::from_secs(3900));
        assert_eq!(settings.default_cad_to_usd, 0.72);
    }
}
