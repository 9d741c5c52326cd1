//! Error types for Pulse operations

use std::time::Duration;
use thiserror::Error;

/// Upstream fetch errors.
///
/// Every variant is recoverable by the refresh coordinator: the failure is
/// logged and the previously cached value stays readable.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("Fetch from {source_name} timed out after {after:?}")]
    Timeout { source_name: String, after: Duration },

    #[error("Connection to {source_name} failed: {reason}")]
    Connection { source_name: String, reason: String },

    #[error("Query against {source_name} failed: {reason}")]
    Query { source_name: String, reason: String },

    #[error("Malformed response from {source_name}: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("Exchange rate {rate} from {provider} is outside the accepted range")]
    OutOfRange { provider: String, rate: f64 },
}

impl FetchError {
    /// Name of the upstream that produced the failure.
    pub fn source_name(&self) -> &str {
        match self {
            FetchError::Timeout { source_name, .. }
            | FetchError::Connection { source_name, .. }
            | FetchError::Query { source_name, .. }
            | FetchError::Malformed { source_name, .. } => source_name,
            FetchError::OutOfRange { provider, .. } => provider,
        }
    }

    /// Returns true if the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Scheduler lifecycle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler is already running")]
    AlreadyStarted,

    #[error("Scheduler has been stopped")]
    Stopped,

    #[error("Scheduler has no registered jobs")]
    NoJobs,

    #[error("Job {id} has a zero interval")]
    ZeroInterval { id: String },
}

/// Master error type for all Pulse errors.
#[derive(Debug, Clone, Error)]
pub enum PulseError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Initialization failed: {reason}")]
    Init { reason: String },
}

/// Result type alias for Pulse operations.
pub type PulseResult<T> = Result<T, PulseError>;

// =============================================================================
// TESTS
// =============================================================================
