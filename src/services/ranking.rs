//! Ranking and table emission
//!
//! Sorting is always stable, so equal values keep their input order, and
//! top-N truncation always happens after the sort.

use std::cmp::Ordering;

use crate::types::{ratio, BucketTotals, RankedRow};

/// Field of [`BucketTotals`] used as the sort criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Count,
    Cost,
    Distance,
    OnTime,
    UniqueMembers,
}

impl SortField {
    pub fn value(self, totals: &BucketTotals) -> f64 {
        match self {
            Self::Count => totals.count as f64,
            Self::Cost => totals.cost_sum,
            Self::Distance => totals.distance_sum,
            Self::OnTime => totals.on_time as f64,
            Self::UniqueMembers => totals.unique_members as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Sort criterion, direction and optional row limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: Direction,
    pub limit: Option<usize>,
}

impl SortSpec {
    /// Largest `limit` values of `field`, descending
    pub fn top(field: SortField, limit: usize) -> Self {
        Self {
            field,
            direction: Direction::Descending,
            limit: Some(limit),
        }
    }

    /// Every row, descending by `field`
    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            direction: Direction::Descending,
            limit: None,
        }
    }
}

/// `value / total`, 0 when the total is 0
pub fn share_of_total(value: f64, total: f64) -> f64 {
    ratio(value, total)
}

/// Sort finalized groups by `spec`, then truncate and number them.
///
/// Shares are computed against the sum over all groups, before
/// truncation.
pub fn rank<K>(groups: Vec<(K, BucketTotals)>, spec: &SortSpec) -> Vec<RankedRow<K>> {
    let total: f64 = groups.iter().map(|(_, t)| spec.field.value(t)).sum();

    let mut groups = groups;
    groups.sort_by(|(_, a), (_, b)| {
        compare(spec.field.value(a), spec.field.value(b), spec.direction)
    });

    let limit = spec.limit.unwrap_or(groups.len());
    groups
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, (key, totals))| RankedRow {
            rank: idx + 1,
            share: share_of_total(spec.field.value(&totals), total),
            key,
            totals,
        })
        .collect()
}

/// Stable descending top-N of arbitrary items by a numeric key
pub fn top_n_by<T, F>(items: &[T], n: usize, key: F) -> Vec<&T>
where
    F: Fn(&T) -> f64,
{
    let mut refs: Vec<&T> = items.iter().collect();
    refs.sort_by(|a, b| compare(key(a), key(b), Direction::Descending));
    refs.truncate(n);
    refs
}

/// Stable ascending sort by a chronological sort key
pub fn chronological<T, F>(items: &mut [T], sort_key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| sort_key(a).cmp(sort_key(b)));
}

fn compare(a: f64, b: f64, direction: Direction) -> Ordering {
    let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    match direction {
        Direction::Ascending => ord,
        Direction::Descending => ord.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(count: u64, cost: f64) -> BucketTotals {
        BucketTotals {
            count,
            cost_sum: cost,
            ..Default::default()
        }
    }

    // ========== rank ==========

    #[test]
    fn test_top_10_of_25_distinct() {
        // totals in scrambled order: (i * 7) % 25 gives a permutation
        let groups: Vec<(String, BucketTotals)> = (0..25u64)
            .map(|i| {
                let v = (i * 7) % 25;
                (format!("g{}", v), totals(v, 0.0))
            })
            .collect();

        let rows = rank(groups, &SortSpec::top(SortField::Count, 10));
        assert_eq!(rows.len(), 10);
        let counts: Vec<u64> = rows.iter().map(|r| r.totals.count).collect();
        assert_eq!(counts, (15..25).rev().collect::<Vec<u64>>());
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[9].rank, 10);
        assert_eq!(rows[0].key, "g24");
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let groups = vec![
            ("first".to_string(), totals(5, 0.0)),
            ("big".to_string(), totals(9, 0.0)),
            ("second".to_string(), totals(5, 0.0)),
            ("third".to_string(), totals(5, 0.0)),
        ];
        let rows = rank(groups, &SortSpec::top(SortField::Count, 3));
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["big", "first", "second"]);
    }

    #[test]
    fn test_ascending() {
        let groups = vec![
            ("b".to_string(), totals(2, 0.0)),
            ("a".to_string(), totals(1, 0.0)),
        ];
        let spec = SortSpec {
            field: SortField::Count,
            direction: Direction::Ascending,
            limit: None,
        };
        let rows = rank(groups, &spec);
        assert_eq!(rows[0].key, "a");
    }

    #[test]
    fn test_rank_empty() {
        let rows: Vec<RankedRow<String>> = rank(Vec::new(), &SortSpec::top(SortField::Count, 10));
        assert!(rows.is_empty());
    }

    // ========== share_of_total ==========

    #[test]
    fn test_share_uses_total_before_truncation() {
        let groups = vec![
            ("a".to_string(), totals(0, 50.0)),
            ("b".to_string(), totals(0, 30.0)),
            ("c".to_string(), totals(0, 20.0)),
        ];
        let rows = rank(groups, &SortSpec::top(SortField::Cost, 1));
        assert_eq!(rows.len(), 1);
        assert!((rows[0].share - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_share_zero_total() {
        let groups = vec![("a".to_string(), totals(0, 0.0))];
        let rows = rank(groups, &SortSpec::descending(SortField::Cost));
        assert_eq!(rows[0].share, 0.0);
        assert_eq!(share_of_total(3.0, 0.0), 0.0);
    }

    // ========== top_n_by ==========

    #[test]
    fn test_top_n_by() {
        let items = vec![("a", 3.0), ("b", 7.0), ("c", 7.0), ("d", 1.0)];
        let top = top_n_by(&items, 2, |(_, v)| *v);
        assert_eq!(top, vec![&("b", 7.0), &("c", 7.0)]);
    }

    // ========== chronological ==========

    #[test]
    fn test_chronological() {
        let mut items = vec![("202503", "x"), ("99999999", "bad"), ("202501", "y")];
        chronological(&mut items, |(k, _)| *k);
        let keys: Vec<&str> = items.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["202501", "202503", "99999999"]);
    }
}
