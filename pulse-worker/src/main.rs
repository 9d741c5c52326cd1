//! Pulse Worker Entry Point
//!
//! Loads configuration, warms the cache, runs the refresh jobs until Ctrl-C,
//! then stops the scheduler.

use std::sync::Arc;

use pulse_core::{DataCategory, DataSource, PulseError, PulseResult, Region};
use pulse_worker::{
    default_rate_providers, init_tracing, CacheStore, DashboardView, FileDataSource,
    InMemoryCacheStore, ReadOutcome, Worker, WorkerConfig,
};

#[tokio::main]
async fn main() -> PulseResult<()> {
    let config = WorkerConfig::from_env();
    init_tracing(config.log_format)?;
    config.validate()?;

    tracing::info!(
        data_dir = %config.data_dir.display(),
        bookings_interval_secs = config.bookings_interval.as_secs(),
        open_orders_interval_secs = config.open_orders_interval.as_secs(),
        "Starting Pulse worker"
    );

    let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
    let sources: Vec<Arc<dyn DataSource>> = DataCategory::ALL
        .iter()
        .map(|&category| {
            let source: Arc<dyn DataSource> =
                Arc::new(FileDataSource::new(category, &config.data_dir));
            source
        })
        .collect();
    let providers = default_rate_providers(config.rate_timeout)?;

    let worker = Worker::new(config, store, sources, providers);
    worker.start().await?;

    for category in DataCategory::ALL {
        let view = worker.reader().read_dashboard(category).await;
        log_dashboard(&view);
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| PulseError::Init {
            reason: format!("Failed to listen for Ctrl-C: {}", e),
        })?;
    tracing::info!("Shutdown signal received");

    worker.shutdown().await?;
    Ok(())
}

fn log_dashboard(view: &DashboardView) {
    for region in Region::ALL {
        match view.region(region) {
            ReadOutcome::Ready(read) => {
                let snapshot = read.value();
                tracing::info!(
                    category = %view.category,
                    %region,
                    total_amount = snapshot.summary.total_amount,
                    total_orders = snapshot.summary.total_orders,
                    territories = snapshot.summary.total_territories,
                    stale = read.is_expired(),
                    "Dashboard snapshot"
                );
            }
            ReadOutcome::Unavailable => {
                tracing::warn!(category = %view.category, %region, "Dashboard data unavailable");
            }
        }
    }
    if let Some(usd) = &view.ca_usd {
        tracing::info!(
            category = %view.category,
            rate = usd.rate,
            provider = %view.rate.provider,
            total_amount_usd = usd.total_amount,
            "CA totals in USD"
        );
    }
}
