//! CAD to USD exchange rate.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{FetchError, Timestamp};

/// Exclusive lower bound of a plausible CAD to USD quote.
pub const RATE_LOWER_BOUND: f64 = 0.5;

/// Exclusive upper bound of a plausible CAD to USD quote.
pub const RATE_UPPER_BOUND: f64 = 1.0;

/// Rate published when every provider fails.
pub const DEFAULT_CAD_TO_USD: f64 = 0.72;

/// Provider name recorded on the hardcoded fallback rate.
pub const DEFAULT_RATE_PROVIDER: &str = "default";

/// Returns true if `rate` lies strictly inside the sanity range.
pub fn is_plausible_rate(rate: f64) -> bool {
    rate.is_finite() && rate > RATE_LOWER_BOUND && rate < RATE_UPPER_BOUND
}

/// A CAD to USD quote shared by every region that needs conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub rate: f64,
    /// Provider that produced the quote, or [`DEFAULT_RATE_PROVIDER`].
    pub provider: String,
    pub fetched_at: Timestamp,
}

impl ExchangeRate {
    /// Validate a provider quote against the sanity range.
    pub fn checked(rate: f64, provider: impl Into<String>) -> Result<Self, FetchError> {
        let provider = provider.into();
        if !is_plausible_rate(rate) {
            return Err(FetchError::OutOfRange { provider, rate });
        }
        Ok(Self {
            rate,
            provider,
            fetched_at: Utc::now(),
        })
    }

    /// The hardcoded fallback quote.
    pub fn fallback(rate: f64) -> Self {
        Self {
            rate,
            provider: DEFAULT_RATE_PROVIDER.to_string(),
            fetched_at: Utc::now(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.provider == DEFAULT_RATE_PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_exclusive() {
        assert!(!is_plausible_rate(0.5));
        assert!(!is_plausible_rate(1.0));
        assert!(is_plausible_rate(0.73));
        assert!(!is_plausible_rate(f64::NAN));
    }

    #[test]
    fn test_checked_rejects_out_of_range() {
        let err = ExchangeRate::checked(0.3, "frankfurter").unwrap_err();
        assert_eq!(
            err,
            FetchError::OutOfRange {
                provider: "frankfurter".to_string(),
                rate: 0.3
            }
        );

        let ok = ExchangeRate::checked(0.73, "open-er-api").unwrap();
        assert_eq!(ok.rate, 0.73);
        assert!(!ok.is_fallback());
    }

    #[test]
    fn test_fallback_is_marked() {
        let rate = ExchangeRate::fallback(DEFAULT_CAD_TO_USD);
        assert!(rate.is_fallback());
        assert_eq!(rate.rate, 0.72);
    }
}
