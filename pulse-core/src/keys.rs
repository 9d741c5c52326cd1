//! Cache key namespace and refresh groups.
//!
//! The rendered key strings are read by the presentation layer and must stay
//! stable across releases.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DataCategory, Region};

/// Rendered key of the shared exchange rate entry.
pub const EXCHANGE_RATE_KEY: &str = "cad_to_usd_rate";

/// Typed cache key. Rendering via [`fmt::Display`] gives the stable string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CacheKey {
    /// Aggregated snapshot, e.g. `bookings_snapshot_us`.
    Snapshot(DataCategory, Region),
    /// Processed export rows, e.g. `open_orders_raw_ca`.
    Export(DataCategory, Region),
    /// Last successful refresh of a category, e.g. `bookings_last_updated`.
    LastUpdated(DataCategory),
    /// Shared CAD to USD rate.
    ExchangeRate,
}

impl CacheKey {
    /// Every key in the namespace.
    pub fn all() -> Vec<CacheKey> {
        let mut keys = Vec::with_capacity(11);
        for category in DataCategory::ALL {
            for region in Region::ALL {
                keys.push(CacheKey::Snapshot(category, region));
            }
            for region in Region::ALL {
                keys.push(CacheKey::Export(category, region));
            }
            keys.push(CacheKey::LastUpdated(category));
        }
        keys.push(CacheKey::ExchangeRate);
        keys
    }

    /// The refresh group that writes this key.
    pub fn group(&self) -> RefreshGroup {
        match self {
            CacheKey::Snapshot(category, _)
            | CacheKey::Export(category, _)
            | CacheKey::LastUpdated(category) => RefreshGroup::from(*category),
            CacheKey::ExchangeRate => RefreshGroup::ExchangeRate,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Snapshot(category, region) => {
                write!(f, "{}_snapshot_{}", category.key_prefix(), region.key_suffix())
            }
            CacheKey::Export(category, region) => {
                write!(f, "{}_raw_{}", category.key_prefix(), region.key_suffix())
            }
            CacheKey::LastUpdated(category) => {
                write!(f, "{}_last_updated", category.key_prefix())
            }
            CacheKey::ExchangeRate => f.write_str(EXCHANGE_RATE_KEY),
        }
    }
}

/// Set of cache keys refreshed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RefreshGroup {
    Bookings,
    OpenOrders,
    ExchangeRate,
    /// Exchange rate, then bookings, then open orders.
    All,
}

impl RefreshGroup {
    /// The data category behind a snapshot group.
    pub fn category(&self) -> Option<DataCategory> {
        match self {
            RefreshGroup::Bookings => Some(DataCategory::Bookings),
            RefreshGroup::OpenOrders => Some(DataCategory::OpenOrders),
            RefreshGroup::ExchangeRate | RefreshGroup::All => None,
        }
    }

    /// Concrete groups this group expands to, in refresh order.
    pub fn expand(&self) -> Vec<RefreshGroup> {
        match self {
            RefreshGroup::All => vec![
                RefreshGroup::ExchangeRate,
                RefreshGroup::Bookings,
                RefreshGroup::OpenOrders,
            ],
            other => vec![*other],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshGroup::Bookings => "bookings",
            RefreshGroup::OpenOrders => "open_orders",
            RefreshGroup::ExchangeRate => "exchange_rate",
            RefreshGroup::All => "all",
        }
    }
}

impl From<DataCategory> for RefreshGroup {
    fn from(category: DataCategory) -> Self {
        match category {
            DataCategory::Bookings => RefreshGroup::Bookings,
            DataCategory::OpenOrders => RefreshGroup::OpenOrders,
        }
    }
}

impl fmt::Display for RefreshGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rendered_keys_are_stable() {
        let rendered: Vec<String> = CacheKey::all().iter().map(|k| k.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "bookings_snapshot_us",
                "bookings_snapshot_ca",
                "bookings_raw_us",
                "bookings_raw_ca",
                "bookings_last_updated",
                "open_orders_snapshot_us",
                "open_orders_snapshot_ca",
                "open_orders_raw_us",
                "open_orders_raw_ca",
                "open_orders_last_updated",
                "cad_to_usd_rate",
            ]
        );
    }

    #[test]
    fn test_rendered_keys_are_unique() {
        let keys = CacheKey::all();
        let unique: HashSet<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn test_key_groups() {
        assert_eq!(
            CacheKey::Snapshot(DataCategory::Bookings, Region::Ca).group(),
            RefreshGroup::Bookings
        );
        assert_eq!(
            CacheKey::LastUpdated(DataCategory::OpenOrders).group(),
            RefreshGroup::OpenOrders
        );
        assert_eq!(CacheKey::ExchangeRate.group(), RefreshGroup::ExchangeRate);
    }

    #[test]
    fn test_all_group_expands_in_order() {
        assert_eq!(
            RefreshGroup::All.expand(),
            vec![
                RefreshGroup::ExchangeRate,
                RefreshGroup::Bookings,
                RefreshGroup::OpenOrders
            ]
        );
        assert_eq!(RefreshGroup::Bookings.expand(), vec![RefreshGroup::Bookings]);
        assert_eq!(RefreshGroup::All.category(), None);
    }
}
