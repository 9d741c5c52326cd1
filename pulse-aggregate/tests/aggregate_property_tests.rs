//! Property-Based Tests for Snapshot Aggregation
//!
//! Properties:
//! - Aggregation is deterministic for identical input
//! - Excluded customers and tax lines never contribute
//! - Ranks are a gap-free permutation of 1..N with non-increasing totals
//! - Grand totals equal the ceiling of the raw sum

use proptest::prelude::*;
use pulse_aggregate::{aggregate, ceil_amount, line_amount, GroupTotals};
use pulse_core::RawRecord;
use pulse_test_utils::fixtures::as_of;
use pulse_test_utils::generators::{arb_category, arb_raw_record, arb_region};

// ============================================================================
// HELPERS
// ============================================================================

fn is_excluded(record: &RawRecord) -> bool {
    let customer = record
        .customer_id
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    let product_line = record
        .product_line
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    ["W1VAN", "W1TOR", "W1MON", "MISC", "TWGMARKET", "EMP-US", "TEST123"]
        .contains(&customer.as_str())
        || product_line == "TAX"
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Identical input yields an identical snapshot.
    #[test]
    fn prop_aggregate_is_deterministic(
        records in prop::collection::vec(arb_raw_record(), 0..40),
        category in arb_category(),
        region in arb_region(),
    ) {
        let first = aggregate(&records, category, region, as_of());
        let second = aggregate(&records, category, region, as_of());
        prop_assert_eq!(first, second);
    }

    /// Adding excluded rows anywhere in the input changes nothing.
    #[test]
    fn prop_excluded_rows_never_contribute(
        records in prop::collection::vec(arb_raw_record(), 0..40),
        category in arb_category(),
        region in arb_region(),
    ) {
        let kept: Vec<RawRecord> = records.iter().filter(|r| !is_excluded(r)).cloned().collect();
        let with_excluded = aggregate(&records, category, region, as_of());
        let without = aggregate(&kept, category, region, as_of());
        prop_assert_eq!(with_excluded, without);
    }

    /// Ranks are 1..N in order with non-increasing totals.
    #[test]
    fn prop_ranking_is_gap_free_and_sorted(
        records in prop::collection::vec(arb_raw_record(), 0..40),
        category in arb_category(),
        region in arb_region(),
    ) {
        let snapshot = aggregate(&records, category, region, as_of());
        let mut rankings = vec![snapshot.territory_ranking.clone()];
        if let Some(salespeople) = snapshot.salesman_ranking.clone() {
            rankings.push(salespeople);
        }

        for ranking in rankings {
            for (position, entry) in ranking.iter().enumerate() {
                prop_assert_eq!(entry.rank as usize, position + 1);
            }
            for pair in ranking.windows(2) {
                prop_assert!(pair[0].total >= pair[1].total);
            }
        }
        prop_assert_eq!(snapshot.summary.total_territories, snapshot.territory_ranking.len());
    }

    /// The grand total is the ceiling of the raw sum of retained amounts.
    #[test]
    fn prop_grand_total_is_ceiling_of_sum(
        records in prop::collection::vec(arb_raw_record(), 0..40),
        category in arb_category(),
        region in arb_region(),
    ) {
        let raw_sum: f64 = records
            .iter()
            .filter(|r| !is_excluded(r))
            .map(|r| line_amount(r, category))
            .sum();
        let snapshot = aggregate(&records, category, region, as_of());
        prop_assert_eq!(snapshot.summary.total_amount, ceil_amount(raw_sum));
    }

    /// Published group totals are the ceiling of the raw subtotal.
    #[test]
    fn prop_group_totals_round_up(
        amounts in prop::collection::vec((0usize..5, 0u32..100_000), 1..30),
    ) {
        let names = ["A", "B", "C", "D", "E"];
        let mut totals = GroupTotals::new();
        for (group, cents) in &amounts {
            totals.add(names[*group], *cents as f64 / 100.0);
        }
        let raw: Vec<(String, f64)> = names
            .iter()
            .filter_map(|n| totals.subtotal(n).map(|s| (n.to_string(), s)))
            .collect();

        for entry in totals.into_ranking() {
            let subtotal = raw.iter().find(|(n, _)| *n == entry.name).map(|(_, s)| *s).unwrap();
            prop_assert_eq!(entry.total, subtotal.ceil() as i64);
            prop_assert!(entry.total as f64 >= subtotal);
        }
    }
}
