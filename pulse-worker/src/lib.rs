//! Pulse Worker - Scheduled Cache Refresh
//!
//! Keeps the dashboard cache warm. Two periodic jobs pull bookings, open
//! orders and the CAD to USD rate from their upstreams, aggregate them, and
//! publish the results into a [`CacheStore`]. Request handlers read through a
//! [`CacheReader`], which only reaches upstream when a key was never written.
//!
//! ```text
//! Scheduler ──► RefreshCoordinator ──► DataSource ──► aggregate ──► CacheStore
//!                                                                     ▲
//! request ──► CacheReader ────────────────────────────────────────────┘
//!                  └── cold miss ──► RefreshCoalescer ──► RefreshCoordinator
//! ```
//!
//! A failed upstream call never clears a cache entry: the previous value
//! stays readable and only its age grows.

pub mod coalesce;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod jobs;
pub mod metrics;
pub mod reader;
pub mod source;
pub mod telemetry;
pub mod worker;

// Re-export commonly used types
pub use coalesce::{CoalescerStats, Flight, FlightGuard, RefreshCoalescer};
pub use config::{LogFormat, WorkerConfig};
pub use coordinator::{
    GroupOutcome, MemberFailure, RefreshCoordinator, RefreshReport, RefreshSettings,
};
pub use jobs::{
    register_default_jobs, JobFn, JobInfo, PeriodicJob, RefreshJob, Scheduler, SchedulerState,
};
pub use metrics::{RefreshMetrics, RefreshMetricsSnapshot};
pub use reader::{CacheReader, DashboardView, ReadOutcome};
pub use source::{default_rate_providers, FileDataSource, HttpRateProvider};
pub use telemetry::init_tracing;
pub use worker::Worker;

pub use pulse_storage::{CacheStore, InMemoryCacheStore};
