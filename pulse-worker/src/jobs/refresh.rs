//! Scheduled cache refresh jobs.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use pulse_core::{RefreshGroup, SchedulerError};

use crate::config::WorkerConfig;
use crate::constants::{BOOKINGS_JOB_ID, OPEN_ORDERS_JOB_ID};
use crate::coordinator::RefreshCoordinator;
use crate::jobs::scheduler::{PeriodicJob, Scheduler};

/// Refreshes a fixed list of groups, in order, on every run.
pub struct RefreshJob {
    id: &'static str,
    groups: Vec<RefreshGroup>,
    coordinator: Arc<RefreshCoordinator>,
}

impl RefreshJob {
    pub fn new(
        id: &'static str,
        groups: Vec<RefreshGroup>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            id,
            groups,
            coordinator,
        }
    }

    /// Exchange rate first, so the bookings dashboard converts at a fresh rate.
    pub fn bookings_and_rate(coordinator: Arc<RefreshCoordinator>) -> Self {
        Self::new(
            BOOKINGS_JOB_ID,
            vec![RefreshGroup::ExchangeRate, RefreshGroup::Bookings],
            coordinator,
        )
    }

    pub fn open_orders(coordinator: Arc<RefreshCoordinator>) -> Self {
        Self::new(OPEN_ORDERS_JOB_ID, vec![RefreshGroup::OpenOrders], coordinator)
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn groups(&self) -> &[RefreshGroup] {
        &self.groups
    }
}

#[async_trait]
impl PeriodicJob for RefreshJob {
    async fn run(&self) {
        debug!(job_id = self.id, "Running scheduled refresh");
        for group in &self.groups {
            self.coordinator.refresh_group(*group).await;
        }
    }
}

/// Register the two standard refresh jobs. Returns how many were newly added.
pub fn register_default_jobs(
    scheduler: &Scheduler,
    coordinator: &Arc<RefreshCoordinator>,
    config: &WorkerConfig,
) -> Result<usize, SchedulerError> {
    let bookings = scheduler.register_periodic(
        BOOKINGS_JOB_ID,
        config.bookings_interval,
        config.bookings_misfire_grace,
        Arc::new(RefreshJob::bookings_and_rate(Arc::clone(coordinator))),
    )?;
    let open_orders = scheduler.register_periodic(
        OPEN_ORDERS_JOB_ID,
        config.open_orders_interval,
        config.open_orders_misfire_grace,
        Arc::new(RefreshJob::open_orders(Arc::clone(coordinator))),
    )?;
    Ok(usize::from(bookings) + usize::from(open_orders))
}
