//! Pulse Aggregate - Snapshot Builder
//!
//! Pure, synchronous transformation of upstream rows into ranked snapshots.
//! No I/O and no shared state: identical input in identical order always
//! yields an identical [`Snapshot`].

use chrono::{Local, NaiveDate};
use std::collections::HashSet;

use pulse_core::{DataCategory, RawRecord, Region, Snapshot, Summary, UNASSIGNED_SALESPERSON};

pub mod convert;
pub mod export;
pub mod filter;
pub mod ranking;
pub mod rounding;

pub use convert::{convert_to_usd, usd_view_for, UsdView};
pub use export::process_export_rows;
pub use filter::{is_retained, territory_of};
pub use ranking::GroupTotals;
pub use rounding::{ceil_amount, convert_ceil};

// ============================================================================
// AGGREGATION
// ============================================================================

/// Aggregate rows of one category and region into a snapshot dated `as_of`.
///
/// Rows from excluded customers and tax lines are skipped. Missing amounts and
/// quantities count as zero, and missing text fields as empty strings. Empty
/// input produces an all-zero summary with empty rankings.
pub fn aggregate(
    records: &[RawRecord],
    category: DataCategory,
    region: Region,
    as_of: NaiveDate,
) -> Snapshot {
    let mut total_amount = 0.0_f64;
    let mut total_units = 0_i64;
    let mut total_lines = 0_usize;
    let mut orders: HashSet<&str> = HashSet::new();
    let mut territories = GroupTotals::new();
    let mut salespeople = GroupTotals::new();

    for record in records.iter().filter(|r| is_retained(r)) {
        let amount = line_amount(record, category);

        total_amount += amount;
        total_units = total_units.saturating_add(record.quantity_or_zero());
        total_lines += 1;
        orders.insert(record.order_id.as_deref().unwrap_or_default());
        territories.add(territory_of(record, region), amount);

        if category.ranks_salespeople() {
            salespeople.add(salesperson_of(record), amount);
        }
    }

    let summary = Summary {
        order_date: as_of,
        total_amount: ceil_amount(total_amount),
        total_units,
        total_orders: orders.len(),
        total_territories: territories.len(),
        total_lines,
    };

    Snapshot {
        category,
        region,
        summary,
        territory_ranking: territories.into_ranking(),
        salesman_ranking: category
            .ranks_salespeople()
            .then(|| salespeople.into_ranking()),
    }
}

/// [`aggregate`] dated with the local calendar day.
pub fn aggregate_today(records: &[RawRecord], category: DataCategory, region: Region) -> Snapshot {
    aggregate(records, category, region, Local::now().date_naive())
}

/// Amount a line contributes. Open orders are reduced by the line discount.
pub fn line_amount(record: &RawRecord, category: DataCategory) -> f64 {
    let gross = record.amount_or_zero();
    if category.applies_discount() {
        gross * (1.0 - record.discount_or_zero() / 100.0)
    } else {
        gross
    }
}

fn salesperson_of(record: &RawRecord) -> &str {
    match record.salesperson.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => UNASSIGNED_SALESPERSON,
    }
}
