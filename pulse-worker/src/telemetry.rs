//! Tracing subscriber initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pulse_core::{PulseError, PulseResult};

use crate::config::LogFormat;
use crate::constants::DEFAULT_LOG_FILTER;

/// Install the global tracing subscriber.
///
/// Should be called once at startup, before any refresh runs. The filter comes
/// from `RUST_LOG`, defaulting to [`DEFAULT_LOG_FILTER`].
pub fn init_tracing(format: LogFormat) -> PulseResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    result.map_err(|e| PulseError::Init {
        reason: format!("Failed to init subscriber: {}", e),
    })?;

    tracing::info!(format = ?format, "Telemetry initialized");
    Ok(())
}
