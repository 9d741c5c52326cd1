//! Periodic job scheduler.
//!
//! Each registered job runs in its own task on its own timer, so a slow run
//! of one job never delays another. Runs of the same job are sequential and
//! never overlap.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──register──► Registered ──start──► Running ──stop──► Stopped
//! ```
//!
//! `Stopped` is terminal. Registering while `Running` spawns the job
//! immediately; registering an id that already exists is a no-op.
//!
//! # Misfires
//!
//! A tick delivered more than `misfire_grace` after its scheduled instant
//! (because the runtime was busy or the previous run overran) is skipped and
//! counted in [`RefreshMetrics::misfires`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use pulse_core::{SchedulerError, Timestamp};

use crate::metrics::RefreshMetrics;

const NEVER_RAN: i64 = i64::MIN;

/// Work invoked on every accepted tick.
#[async_trait]
pub trait PeriodicJob: Send + Sync {
    async fn run(&self);
}

/// Adapts an async closure into a [`PeriodicJob`].
pub struct JobFn<F>(pub F);

#[async_trait]
impl<F, Fut> PeriodicJob for JobFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(&self) {
        (self.0)().await
    }
}

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Created,
    Registered,
    Running,
    Stopped,
}

/// Registered job as seen from outside the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInfo {
    pub id: String,
    pub interval: Duration,
    pub misfire_grace: Duration,
    pub last_run_at: Option<Timestamp>,
}

#[derive(Clone)]
struct RegisteredJob {
    id: String,
    interval: Duration,
    misfire_grace: Duration,
    job: Arc<dyn PeriodicJob>,
    last_run_ms: Arc<AtomicI64>,
}

impl RegisteredJob {
    fn info(&self) -> JobInfo {
        let millis = self.last_run_ms.load(Ordering::Relaxed);
        JobInfo {
            id: self.id.clone(),
            interval: self.interval,
            misfire_grace: self.misfire_grace,
            last_run_at: if millis == NEVER_RAN {
                None
            } else {
                DateTime::from_timestamp_millis(millis)
            },
        }
    }
}

struct Inner {
    state: SchedulerState,
    jobs: Vec<RegisteredJob>,
    handles: Vec<(String, JoinHandle<()>)>,
}

/// Runs registered jobs on independent fixed intervals.
pub struct Scheduler {
    inner: Mutex<Inner>,
    shutdown_tx: watch::Sender<bool>,
    metrics: Arc<RefreshMetrics>,
}

impl Scheduler {
    pub fn new(metrics: Arc<RefreshMetrics>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Mutex::new(Inner {
                state: SchedulerState::Created,
                jobs: Vec::new(),
                handles: Vec::new(),
            }),
            shutdown_tx,
            metrics,
        }
    }

    // A panicking job cannot poison this lock: it is never held across a run.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> SchedulerState {
        self.lock().state
    }

    pub fn jobs(&self) -> Vec<JobInfo> {
        self.lock().jobs.iter().map(RegisteredJob::info).collect()
    }

    pub fn job(&self, id: &str) -> Option<JobInfo> {
        self.lock().jobs.iter().find(|j| j.id == id).map(RegisteredJob::info)
    }

    /// Register a periodic job.
    ///
    /// Returns `Ok(false)` when `id` is already registered; the existing job
    /// keeps its timer. Must be called from within a tokio runtime once the
    /// scheduler is running.
    pub fn register_periodic(
        &self,
        id: impl Into<String>,
        interval: Duration,
        misfire_grace: Duration,
        job: Arc<dyn PeriodicJob>,
    ) -> Result<bool, SchedulerError> {
        let id = id.into();
        if interval.is_zero() {
            return Err(SchedulerError::ZeroInterval { id });
        }

        let mut inner = self.lock();
        if inner.state == SchedulerState::Stopped {
            return Err(SchedulerError::Stopped);
        }
        if inner.jobs.iter().any(|j| j.id == id) {
            debug!(job_id = %id, "Job already registered");
            return Ok(false);
        }

        let entry = RegisteredJob {
            id: id.clone(),
            interval,
            misfire_grace,
            job,
            last_run_ms: Arc::new(AtomicI64::new(NEVER_RAN)),
        };
        inner.jobs.push(entry.clone());

        match inner.state {
            SchedulerState::Running => {
                let handle = self.spawn(entry);
                inner.handles.push((id.clone(), handle));
            }
            _ => inner.state = SchedulerState::Registered,
        }

        info!(
            job_id = %id,
            interval_secs = interval.as_secs(),
            misfire_grace_secs = misfire_grace.as_secs(),
            "Registered periodic job"
        );
        Ok(true)
    }

    /// Spawn every registered job. Must be called from within a tokio runtime.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut inner = self.lock();
        match inner.state {
            SchedulerState::Running => return Err(SchedulerError::AlreadyStarted),
            SchedulerState::Stopped => return Err(SchedulerError::Stopped),
            SchedulerState::Created | SchedulerState::Registered => {}
        }
        if inner.jobs.is_empty() {
            return Err(SchedulerError::NoJobs);
        }

        let handles: Vec<(String, JoinHandle<()>)> = inner
            .jobs
            .iter()
            .map(|entry| (entry.id.clone(), self.spawn(entry.clone())))
            .collect();
        inner.handles = handles;
        inner.state = SchedulerState::Running;

        info!(jobs = inner.jobs.len(), "Scheduler started");
        Ok(())
    }

    /// Signal every job to stop and wait up to `timeout` for them.
    ///
    /// A job in the middle of a run is allowed to finish it; jobs still busy
    /// at the deadline are aborted.
    pub async fn stop(&self, timeout: Duration) -> Result<(), SchedulerError> {
        let handles = {
            let mut inner = self.lock();
            if inner.state == SchedulerState::Stopped {
                return Err(SchedulerError::Stopped);
            }
            inner.state = SchedulerState::Stopped;
            std::mem::take(&mut inner.handles)
        };

        self.shutdown_tx.send_replace(true);
        let deadline = Instant::now() + timeout;

        for (id, mut handle) in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => debug!(job_id = %id, "Job stopped"),
                Ok(Err(e)) => warn!(job_id = %id, error = %e, "Job task ended abnormally"),
                Err(_) => {
                    warn!(job_id = %id, "Job did not stop in time, aborting");
                    handle.abort();
                }
            }
        }

        let snapshot = self.metrics.snapshot();
        info!(
            refresh_cycles = snapshot.refresh_cycles,
            member_successes = snapshot.member_successes,
            member_failures = snapshot.member_failures,
            rate_fallbacks = snapshot.rate_fallbacks,
            cold_refreshes = snapshot.cold_refreshes,
            coalesced_waits = snapshot.coalesced_waits,
            misfires = snapshot.misfires,
            "Scheduler stopped"
        );
        Ok(())
    }

    fn spawn(&self, entry: RegisteredJob) -> JoinHandle<()> {
        let shutdown_rx = self.shutdown_tx.subscribe();
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(run_job(entry, shutdown_rx, metrics))
    }
}

async fn run_job(
    entry: RegisteredJob,
    mut shutdown_rx: watch::Receiver<bool>,
    metrics: Arc<RefreshMetrics>,
) {
    let mut ticker = interval_at(Instant::now() + entry.interval, entry.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(job_id = %entry.id, "Periodic job started");

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!(job_id = %entry.id, "Periodic job shutting down");
                    break;
                }
            }

            scheduled = ticker.tick() => {
                let lateness = Instant::now().saturating_duration_since(scheduled);
                if lateness > entry.misfire_grace {
                    warn!(
                        job_id = %entry.id,
                        late_ms = lateness.as_millis() as u64,
                        grace_ms = entry.misfire_grace.as_millis() as u64,
                        "Skipping misfired run"
                    );
                    RefreshMetrics::incr(&metrics.misfires);
                    continue;
                }

                entry.job.run().await;
                entry.last_run_ms.store(Utc::now().timestamp_millis(), Ordering::Relaxed);
            }
        }
    }
}
