//! Background jobs
//!
//! - `scheduler`: independent fixed-interval timers with misfire handling
//! - `refresh`: the `bookings_and_rate` and `open_orders` refresh jobs
//!
//! # Usage
//!
//! ```ignore
//! use pulse_worker::jobs::{register_default_jobs, Scheduler};
//!
//! let scheduler = Scheduler::new(metrics);
//! register_default_jobs(&scheduler, &coordinator, &config)?;
//! scheduler.start()?;
//!
//! // On shutdown
//! scheduler.stop(config.shutdown_timeout).await?;
//! ```

pub mod refresh;
pub mod scheduler;

pub use refresh::{register_default_jobs, RefreshJob};
pub use scheduler::{JobFn, JobInfo, PeriodicJob, Scheduler, SchedulerState};
