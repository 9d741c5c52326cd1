//! Constants for the Pulse worker
//!
//! Every tunable default lives here so configuration, jobs and tests agree on
//! the same values.

// ============================================================================
// SCHEDULE
// ============================================================================

/// Bookings (and exchange rate) refresh cadence in seconds (10 minutes)
pub const DEFAULT_BOOKINGS_INTERVAL_SECS: u64 = 600;

/// Open orders refresh cadence in seconds (1 hour)
pub const DEFAULT_OPEN_ORDERS_INTERVAL_SECS: u64 = 3600;

/// How late a bookings tick may fire before it is skipped
pub const DEFAULT_BOOKINGS_MISFIRE_GRACE_SECS: u64 = 60;

/// How late an open orders tick may fire before it is skipped
pub const DEFAULT_OPEN_ORDERS_MISFIRE_GRACE_SECS: u64 = 120;

/// Job id of the bookings and exchange rate refresh
pub const BOOKINGS_JOB_ID: &str = "bookings_and_rate";

/// Job id of the open orders refresh
pub const OPEN_ORDERS_JOB_ID: &str = "open_orders";

// ============================================================================
// CACHE TTL
// ============================================================================

/// Bookings entries TTL in seconds (15 minutes, outlives one missed cycle)
pub const DEFAULT_BOOKINGS_TTL_SECS: u64 = 900;

/// Open orders entries TTL in seconds (65 minutes)
pub const DEFAULT_OPEN_ORDERS_TTL_SECS: u64 = 3900;

/// Exchange rate TTL in seconds (65 minutes)
pub const DEFAULT_RATE_TTL_SECS: u64 = 3900;

// ============================================================================
// TIMEOUTS
// ============================================================================

/// Upper bound for one upstream fetch, connection plus query
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Upper bound for one exchange rate request
pub const DEFAULT_RATE_TIMEOUT_SECS: u64 = 10;

/// How long shutdown waits for in-flight refreshes before aborting them
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// EXCHANGE RATE PROVIDERS
// ============================================================================

/// Primary CAD to USD provider
pub const FRANKFURTER_URL: &str = "https://api.frankfurter.app/latest?from=CAD&to=USD";

/// Fallback CAD to USD provider
pub const OPEN_ER_API_URL: &str = "https://open.er-api.com/v6/latest/CAD";

/// User agent sent to rate providers
pub const RATE_USER_AGENT: &str = concat!("pulse-worker/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// MISC
// ============================================================================

/// Directory of the file-backed data source when none is configured
pub const DEFAULT_DATA_DIR: &str = "data";

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "pulse_worker=info,info";
