//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use pulse_core::{is_plausible_rate, ConfigError, DEFAULT_CAD_TO_USD};

use crate::constants::{
    DEFAULT_BOOKINGS_INTERVAL_SECS, DEFAULT_BOOKINGS_MISFIRE_GRACE_SECS,
    DEFAULT_BOOKINGS_TTL_SECS, DEFAULT_DATA_DIR, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_OPEN_ORDERS_INTERVAL_SECS, DEFAULT_OPEN_ORDERS_MISFIRE_GRACE_SECS,
    DEFAULT_OPEN_ORDERS_TTL_SECS, DEFAULT_RATE_TIMEOUT_SECS, DEFAULT_RATE_TTL_SECS,
    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Configuration for the refresh worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Bookings and exchange rate cadence (default: 10 minutes)
    pub bookings_interval: Duration,

    /// Open orders cadence (default: 1 hour)
    pub open_orders_interval: Duration,

    pub bookings_ttl: Duration,
    pub open_orders_ttl: Duration,
    pub rate_ttl: Duration,

    /// Late-tick tolerance of the bookings job (default: 60 seconds)
    pub bookings_misfire_grace: Duration,

    /// Late-tick tolerance of the open orders job (default: 120 seconds)
    pub open_orders_misfire_grace: Duration,

    /// Bound on one upstream fetch
    pub fetch_timeout: Duration,

    /// Bound on one exchange rate request
    pub rate_timeout: Duration,

    /// Best-effort join window when stopping the scheduler
    pub shutdown_timeout: Duration,

    /// Rate published when every provider fails
    pub default_cad_to_usd: f64,

    /// Directory read by the file-backed data source
    pub data_dir: PathBuf,

    pub log_format: LogFormat,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            bookings_interval: Duration::from_secs(DEFAULT_BOOKINGS_INTERVAL_SECS),
            open_orders_interval: Duration::from_secs(DEFAULT_OPEN_ORDERS_INTERVAL_SECS),
            bookings_ttl: Duration::from_secs(DEFAULT_BOOKINGS_TTL_SECS),
            open_orders_ttl: Duration::from_secs(DEFAULT_OPEN_ORDERS_TTL_SECS),
            rate_ttl: Duration::from_secs(DEFAULT_RATE_TTL_SECS),
            bookings_misfire_grace: Duration::from_secs(DEFAULT_BOOKINGS_MISFIRE_GRACE_SECS),
            open_orders_misfire_grace: Duration::from_secs(DEFAULT_OPEN_ORDERS_MISFIRE_GRACE_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            rate_timeout: Duration::from_secs(DEFAULT_RATE_TIMEOUT_SECS),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            default_cad_to_usd: DEFAULT_CAD_TO_USD,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_format: LogFormat::Pretty,
        }
    }
}

impl WorkerConfig {
    /// Create WorkerConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `PULSE_BOOKINGS_INTERVAL_SECS`: Bookings cadence (default: 600)
    /// - `PULSE_OPEN_ORDERS_INTERVAL_SECS`: Open orders cadence (default: 3600)
    /// - `PULSE_BOOKINGS_TTL_SECS`: Bookings entry TTL (default: 900)
    /// - `PULSE_OPEN_ORDERS_TTL_SECS`: Open orders entry TTL (default: 3900)
    /// - `PULSE_RATE_TTL_SECS`: Exchange rate TTL (default: 3900)
    /// - `PULSE_MISFIRE_GRACE_SECS`: Late-tick tolerance for both jobs
    ///   (default: 60 for bookings, 120 for open orders)
    /// - `PULSE_FETCH_TIMEOUT_SECS`: Upstream fetch bound (default: 30)
    /// - `PULSE_RATE_TIMEOUT_SECS`: Rate request bound (default: 10)
    /// - `PULSE_SHUTDOWN_TIMEOUT_SECS`: Shutdown join window (default: 15)
    /// - `PULSE_DEFAULT_CAD_TO_USD`: Fallback rate (default: 0.72)
    /// - `PULSE_DATA_DIR`: File data source directory (default: `data`)
    /// - `PULSE_LOG_FORMAT`: `json` for JSON log lines
    ///
    /// Unparseable values fall back to the default; call [`validate`](Self::validate)
    /// before use.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |name: &str, default: u64| {
            Duration::from_secs(
                lookup(name)
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        let misfire_override = lookup("PULSE_MISFIRE_GRACE_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let default_cad_to_usd = lookup("PULSE_DEFAULT_CAD_TO_USD")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_CAD_TO_USD);

        let data_dir = lookup("PULSE_DATA_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let log_format = lookup("PULSE_LOG_FORMAT")
            .map(|s| {
                if s.trim().eq_ignore_ascii_case("json") {
                    LogFormat::Json
                } else {
                    LogFormat::Pretty
                }
            })
            .unwrap_or_default();

        Self {
            bookings_interval: secs("PULSE_BOOKINGS_INTERVAL_SECS", DEFAULT_BOOKINGS_INTERVAL_SECS),
            open_orders_interval: secs(
                "PULSE_OPEN_ORDERS_INTERVAL_SECS",
                DEFAULT_OPEN_ORDERS_INTERVAL_SECS,
            ),
            bookings_ttl: secs("PULSE_BOOKINGS_TTL_SECS", DEFAULT_BOOKINGS_TTL_SECS),
            open_orders_ttl: secs("PULSE_OPEN_ORDERS_TTL_SECS", DEFAULT_OPEN_ORDERS_TTL_SECS),
            rate_ttl: secs("PULSE_RATE_TTL_SECS", DEFAULT_RATE_TTL_SECS),
            bookings_misfire_grace: misfire_override
                .unwrap_or(Duration::from_secs(DEFAULT_BOOKINGS_MISFIRE_GRACE_SECS)),
            open_orders_misfire_grace: misfire_override
                .unwrap_or(Duration::from_secs(DEFAULT_OPEN_ORDERS_MISFIRE_GRACE_SECS)),
            fetch_timeout: secs("PULSE_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS),
            rate_timeout: secs("PULSE_RATE_TIMEOUT_SECS", DEFAULT_RATE_TIMEOUT_SECS),
            shutdown_timeout: secs("PULSE_SHUTDOWN_TIMEOUT_SECS", DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            default_cad_to_usd,
            data_dir,
            log_format,
        }
    }

    /// Create a configuration for local development with short cadences.
    pub fn development() -> Self {
        Self {
            bookings_interval: Duration::from_secs(30),
            open_orders_interval: Duration::from_secs(120),
            bookings_ttl: Duration::from_secs(45),
            open_orders_ttl: Duration::from_secs(180),
            rate_ttl: Duration::from_secs(180),
            bookings_misfire_grace: Duration::from_secs(10),
            open_orders_misfire_grace: Duration::from_secs(20),
            fetch_timeout: Duration::from_secs(5),
            rate_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }

    /// Reject zero durations and an implausible fallback rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("PULSE_BOOKINGS_INTERVAL_SECS", self.bookings_interval),
            ("PULSE_OPEN_ORDERS_INTERVAL_SECS", self.open_orders_interval),
            ("PULSE_BOOKINGS_TTL_SECS", self.bookings_ttl),
            ("PULSE_OPEN_ORDERS_TTL_SECS", self.open_orders_ttl),
            ("PULSE_RATE_TTL_SECS", self.rate_ttl),
            ("PULSE_FETCH_TIMEOUT_SECS", self.fetch_timeout),
            ("PULSE_RATE_TIMEOUT_SECS", self.rate_timeout),
            ("PULSE_SHUTDOWN_TIMEOUT_SECS", self.shutdown_timeout),
        ];
        for (field, value) in durations {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        }

        if !is_plausible_rate(self.default_cad_to_usd) {
            return Err(ConfigError::InvalidValue {
                field: "PULSE_DEFAULT_CAD_TO_USD".to_string(),
                value: self.default_cad_to_usd.to_string(),
                reason: "must lie strictly between 0.5 and 1.0".to_string(),
            });
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "PULSE_DATA_DIR".to_string(),
            });
        }

        Ok(())
    }
}
