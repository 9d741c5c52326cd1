//! Pulse Core - Data Types
//!
//! Pure data structures shared by every Pulse crate: upstream rows, cached
//! snapshots, the exchange rate, the cache key namespace, the error
//! taxonomy and the upstream contracts. This crate contains no I/O and no
//! aggregation logic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod error;
pub mod keys;
pub mod rate;
pub mod record;
pub mod region;
pub mod snapshot;
pub mod source;

pub use error::{ConfigError, FetchError, PulseError, PulseResult, SchedulerError};
pub use keys::{CacheKey, RefreshGroup, EXCHANGE_RATE_KEY};
pub use rate::{
    is_plausible_rate, ExchangeRate, DEFAULT_CAD_TO_USD, DEFAULT_RATE_PROVIDER, RATE_LOWER_BOUND,
    RATE_UPPER_BOUND,
};
pub use record::{ExportRow, RawRecord};
pub use region::{
    is_excluded_customer, is_tax_product_line, resolve_territory_code, Region,
    BILLING_OVERRIDE_CODE, OTHERS_TERRITORY, TAX_PRODUCT_LINE, UNASSIGNED_SALESPERSON,
};
pub use snapshot::{DataCategory, RankingEntry, Snapshot, Summary};
pub use source::{DataSource, ExchangeRateProvider};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Identifier of one refresh cycle, used to correlate log lines.
pub type CycleId = Uuid;

/// Generate a new UUIDv7 cycle id (timestamp-sortable).
pub fn new_cycle_id() -> CycleId {
    Uuid::now_v7()
}
