//! Worker lifecycle and scheduled refreshes, on paused time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pulse_core::{
    DataCategory, DataSource, ExchangeRateProvider, PulseError, Region, SchedulerError,
};
use pulse_storage::CacheStore;
use pulse_test_utils::fixtures::billing_and_tax_records;
use pulse_test_utils::{ScriptedDataSource, ScriptedRateProvider};
use pulse_worker::{
    InMemoryCacheStore, JobFn, PeriodicJob, RefreshMetrics, Scheduler, SchedulerState, Worker,
    WorkerConfig,
};

struct Upstreams {
    store: Arc<InMemoryCacheStore>,
    bookings: Arc<ScriptedDataSource>,
    open_orders: Arc<ScriptedDataSource>,
    rates: Arc<ScriptedRateProvider>,
}

fn worker(config: WorkerConfig) -> (Worker, Upstreams) {
    let bookings = ScriptedDataSource::new(DataCategory::Bookings);
    bookings.push_all(Ok(billing_and_tax_records()));
    let upstreams = Upstreams {
        store: Arc::new(InMemoryCacheStore::new()),
        bookings: Arc::new(bookings),
        open_orders: Arc::new(ScriptedDataSource::healthy(DataCategory::OpenOrders)),
        rates: Arc::new(ScriptedRateProvider::returning("primary", 0.74)),
    };

    let bookings: Arc<dyn DataSource> = upstreams.bookings.clone();
    let open_orders: Arc<dyn DataSource> = upstreams.open_orders.clone();
    let rates: Arc<dyn ExchangeRateProvider> = upstreams.rates.clone();
    let worker = Worker::new(
        config,
        upstreams.store.clone(),
        vec![bookings, open_orders],
        vec![rates],
    );
    (worker, upstreams)
}

#[tokio::test(start_paused = true)]
async fn test_start_warms_cache_before_scheduling() {
    let (worker, upstreams) = worker(WorkerConfig::default());

    let report = worker.start().await.unwrap();
    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(worker.scheduler().state(), SchedulerState::Running);
    assert_eq!(worker.scheduler().jobs().len(), 2);

    assert_eq!(upstreams.store.len(), 11);
    assert_eq!(upstreams.store.get_rate().unwrap().value().rate, 0.74);

    // Served from cache, no extra upstream traffic.
    let snapshot = worker
        .reader()
        .read_snapshot(DataCategory::Bookings, Region::Us)
        .await;
    assert_eq!(snapshot.into_value().unwrap().summary.total_amount, 1000);
    assert_eq!(upstreams.bookings.raw_calls(), 2);

    worker.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_jobs_refresh_on_their_own_cadence() {
    let config = WorkerConfig {
        bookings_interval: Duration::from_secs(10),
        open_orders_interval: Duration::from_secs(60),
        ..WorkerConfig::default()
    };
    let (worker, upstreams) = worker(config);
    worker.start().await.unwrap();

    tokio::time::sleep(Duration::from_secs(25)).await;

    // Startup refresh plus two bookings ticks; open orders not yet due.
    assert_eq!(upstreams.bookings.raw_calls(), 6);
    assert_eq!(upstreams.open_orders.raw_calls(), 2);
    assert_eq!(upstreams.rates.calls(), 3);

    tokio::time::sleep(Duration::from_secs(40)).await;
    assert_eq!(upstreams.open_orders.raw_calls(), 4);

    let metrics = worker.shutdown().await.unwrap();
    assert_eq!(metrics.misfires, 0);
    assert!(worker
        .scheduler()
        .job("bookings_and_rate")
        .unwrap()
        .last_run_at
        .is_some());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_is_terminal() {
    let (worker, upstreams) = worker(WorkerConfig::default());
    worker.start().await.unwrap();
    worker.shutdown().await.unwrap();

    assert!(matches!(
        worker.shutdown().await,
        Err(PulseError::Scheduler(SchedulerError::Stopped))
    ));

    tokio::time::sleep(Duration::from_secs(7200)).await;
    assert_eq!(upstreams.bookings.raw_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_late_tick_is_skipped_as_misfire() {
    let metrics = Arc::new(RefreshMetrics::new());
    let scheduler = Scheduler::new(Arc::clone(&metrics));
    let runs = Arc::new(AtomicUsize::new(0));

    let job_runs = Arc::clone(&runs);
    let job: Arc<dyn PeriodicJob> = Arc::new(JobFn(move || {
        let runs = Arc::clone(&job_runs);
        async move {
            // The first run overruns two periods.
            if runs.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(25)).await;
            }
        }
    }));
    scheduler
        .register_periodic("slow", Duration::from_secs(10), Duration::from_secs(1), job)
        .unwrap();
    scheduler.start().unwrap();

    // First run: 10s..35s. The tick due at 20s arrives at 35s and is skipped.
    tokio::time::sleep(Duration::from_secs(37)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(metrics.snapshot().misfires, 1);

    // Back on schedule at 40s.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    scheduler.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_registration_is_idempotent_while_running() {
    let metrics = Arc::new(RefreshMetrics::new());
    let scheduler = Scheduler::new(metrics);
    let runs = Arc::new(AtomicUsize::new(0));

    let make_job = |runs: Arc<AtomicUsize>| -> Arc<dyn PeriodicJob> {
        Arc::new(JobFn(move || {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
            }
        }))
    };

    let every = Duration::from_secs(10);
    scheduler
        .register_periodic("tick", every, every, make_job(Arc::clone(&runs)))
        .unwrap();
    scheduler.start().unwrap();
    assert!(!scheduler
        .register_periodic("tick", every, every, make_job(Arc::clone(&runs)))
        .unwrap());

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 3);

    scheduler.stop(Duration::from_secs(1)).await.unwrap();
}
