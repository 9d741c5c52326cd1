//! Aggregated snapshot types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Region;

/// Kind of sales data a snapshot summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataCategory {
    /// Lines booked today. Refreshed frequently.
    Bookings,
    /// All currently open lines. Refreshed hourly.
    OpenOrders,
}

impl DataCategory {
    pub const ALL: [DataCategory; 2] = [DataCategory::Bookings, DataCategory::OpenOrders];

    /// Prefix used in cache keys and file names.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            DataCategory::Bookings => "bookings",
            DataCategory::OpenOrders => "open_orders",
        }
    }

    /// Whether this category ranks salespeople in addition to territories.
    pub fn ranks_salespeople(&self) -> bool {
        matches!(self, DataCategory::OpenOrders)
    }

    /// Whether line discounts reduce the aggregated amount.
    pub fn applies_discount(&self) -> bool {
        matches!(self, DataCategory::OpenOrders)
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

/// Headline totals of a snapshot. Monetary values are whole units, rounded up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub order_date: NaiveDate,
    pub total_amount: i64,
    pub total_units: i64,
    /// Count of distinct order ids among surviving lines.
    pub total_orders: usize,
    /// Count of distinct territory groups.
    pub total_territories: usize,
    /// Count of surviving lines.
    pub total_lines: usize,
}

impl Summary {
    /// All-zero summary for a day without data.
    pub fn empty(order_date: NaiveDate) -> Self {
        Self {
            order_date,
            total_amount: 0,
            total_units: 0,
            total_orders: 0,
            total_territories: 0,
            total_lines: 0,
        }
    }
}

/// One ranked group (territory or salesperson).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub name: String,
    pub total: i64,
    /// 1-based, gap-free.
    pub rank: u32,
}

/// Immutable cached output of one aggregation.
///
/// A refresh always builds a new snapshot; published snapshots are shared
/// behind `Arc` and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub category: DataCategory,
    pub region: Region,
    pub summary: Summary,
    pub territory_ranking: Vec<RankingEntry>,
    /// Present for open orders only.
    pub salesman_ranking: Option<Vec<RankingEntry>>,
}

impl Snapshot {
    /// Returns true when no line survived filtering.
    pub fn is_empty(&self) -> bool {
        self.summary.total_lines == 0
    }
}
