//! USD views of CAD snapshots.

use serde::{Deserialize, Serialize};

use pulse_core::{RankingEntry, Snapshot};

use crate::rounding::convert_ceil;

/// USD projection of a snapshot's monetary figures.
///
/// Conversion is applied to the already-rounded CAD totals and rounded up
/// again; ranks are carried over unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsdView {
    pub rate: f64,
    pub total_amount: i64,
    pub territory_ranking: Vec<RankingEntry>,
    pub salesman_ranking: Option<Vec<RankingEntry>>,
}

/// Convert a snapshot to USD at `rate`.
pub fn convert_to_usd(snapshot: &Snapshot, rate: f64) -> UsdView {
    UsdView {
        rate,
        total_amount: convert_ceil(snapshot.summary.total_amount, rate),
        territory_ranking: convert_ranking(&snapshot.territory_ranking, rate),
        salesman_ranking: snapshot
            .salesman_ranking
            .as_ref()
            .map(|ranking| convert_ranking(ranking, rate)),
    }
}

/// Convert only when the snapshot's region is quoted in CAD.
pub fn usd_view_for(snapshot: &Snapshot, rate: f64) -> Option<UsdView> {
    snapshot
        .region
        .needs_usd_conversion()
        .then(|| convert_to_usd(snapshot, rate))
}

fn convert_ranking(ranking: &[RankingEntry], rate: f64) -> Vec<RankingEntry> {
    ranking
        .iter()
        .map(|entry| RankingEntry {
            name: entry.name.clone(),
            total: convert_ceil(entry.total, rate),
            rank: entry.rank,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pulse_core::{DataCategory, Region, Summary};

    fn snapshot(region: Region) -> Snapshot {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        Snapshot {
            category: DataCategory::OpenOrders,
            region,
            summary: Summary {
                total_amount: 1001,
                ..Summary::empty(date)
            },
            territory_ranking: vec![RankingEntry {
                name: "Toronto".to_string(),
                total: 1001,
                rank: 1,
            }],
            salesman_ranking: Some(vec![RankingEntry {
                name: "Unassigned".to_string(),
                total: 3,
                rank: 1,
            }]),
        }
    }

    #[test]
    fn test_convert_rounds_up() {
        let view = convert_to_usd(&snapshot(Region::Ca), 0.72);
        assert_eq!(view.total_amount, 721);
        assert_eq!(view.territory_ranking[0].total, 721);
        assert_eq!(view.territory_ranking[0].rank, 1);
        assert_eq!(view.salesman_ranking.unwrap()[0].total, 3);
    }

    #[test]
    fn test_only_cad_regions_convert() {
        assert!(usd_view_for(&snapshot(Region::Us), 0.72).is_none());
        assert!(usd_view_for(&snapshot(Region::Ca), 0.72).is_some());
    }
}
