//! Group accumulation and ranking.

use std::collections::HashMap;

use pulse_core::RankingEntry;

use crate::rounding::ceil_amount;

/// Running subtotals per group name, remembering first-encounter order.
///
/// Encounter order is what breaks ties when ranking, so iteration must be
/// deterministic for identical input.
#[derive(Debug, Clone, Default)]
pub struct GroupTotals {
    groups: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl GroupTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the subtotal of `name`, creating the group if new.
    pub fn add(&mut self, name: &str, amount: f64) {
        match self.index.get(name) {
            Some(&position) => self.groups[position].1 += amount,
            None => {
                self.index.insert(name.to_string(), self.groups.len());
                self.groups.push((name.to_string(), amount));
            }
        }
    }

    /// Number of distinct groups seen.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Raw subtotal of a group, if it exists.
    pub fn subtotal(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&position| self.groups[position].1)
    }

    /// Rank groups by raw subtotal, descending, ties in encounter order.
    ///
    /// Ranks are 1..N without gaps; each published total is rounded up.
    pub fn into_ranking(self) -> Vec<RankingEntry> {
        let mut groups = self.groups;
        // -0.0 and 0.0 must tie under `total_cmp`.
        for group in &mut groups {
            group.1 += 0.0;
        }
        // `sort_by` is stable, which preserves encounter order on ties.
        groups.sort_by(|a, b| b.1.total_cmp(&a.1));
        groups
            .into_iter()
            .enumerate()
            .map(|(position, (name, total))| RankingEntry {
                name,
                total: ceil_amount(total),
                rank: position as u32 + 1,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_keep_encounter_order() {
        let mut totals = GroupTotals::new();
        totals.add("A", 500.0);
        totals.add("B", 1500.0);
        totals.add("C", 500.0);

        let ranking = totals.into_ranking();
        let summary: Vec<(&str, i64, u32)> = ranking
            .iter()
            .map(|e| (e.name.as_str(), e.total, e.rank))
            .collect();
        assert_eq!(summary, vec![("B", 1500, 1), ("A", 500, 2), ("C", 500, 3)]);
    }

    #[test]
    fn test_add_accumulates() {
        let mut totals = GroupTotals::new();
        totals.add("Atlanta", 10.25);
        totals.add("Dallas", 3.0);
        totals.add("Atlanta", 0.5);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals.subtotal("Atlanta"), Some(10.75));
        assert_eq!(totals.subtotal("Denver"), None);
    }

    #[test]
    fn test_subtotals_rounded_up_independently() {
        let mut totals = GroupTotals::new();
        totals.add("X", 10.2);
        totals.add("Y", 10.1);
        let ranking = totals.into_ranking();
        assert_eq!(ranking[0].total, 11);
        assert_eq!(ranking[1].total, 11);
        assert_eq!(ranking[0].name, "X");
    }

    #[test]
    fn test_signed_zero_subtotals_tie() {
        let mut totals = GroupTotals::new();
        totals.add("A", -0.0);
        totals.add("B", 0.0);
        let ranking = totals.into_ranking();
        let names: Vec<&str> = ranking.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(ranking[0].total, 0);
        assert_eq!(ranking[1].rank, 2);
    }

    #[test]
    fn test_empty_ranking() {
        assert!(GroupTotals::new().into_ranking().is_empty());
    }
}
