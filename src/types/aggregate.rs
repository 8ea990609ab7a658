//! Aggregation accumulators and emitted rows

use serde::Serialize;
use std::collections::HashSet;

use super::record::{present, ShipmentRecord};

/// Running accumulator for one group key.
///
/// Counts and sums only grow during a pass. `members` holds the distinct
/// mitra names seen for the group so repeated mitras are counted once.
#[derive(Debug, Clone, Default)]
pub struct AggregateBucket {
    pub count: u64,
    pub cost_sum: f64,
    pub distance_sum: f64,
    pub on_time: u64,
    pub members: HashSet<String>,
}

impl AggregateBucket {
    pub fn add(&mut self, record: &ShipmentRecord) {
        self.count = self.count.saturating_add(1);
        self.cost_sum += record.cost;
        self.distance_sum += record.distance_km;
        if record.is_on_time() {
            self.on_time = self.on_time.saturating_add(1);
        }
        if let Some(mitra) = present(&record.mitra_name) {
            self.members.insert(mitra.to_string());
        }
    }

    /// Convert the member set to its cardinality
    pub fn finalize(self) -> BucketTotals {
        BucketTotals {
            count: self.count,
            cost_sum: self.cost_sum,
            distance_sum: self.distance_sum,
            on_time: self.on_time,
            unique_members: self.members.len(),
        }
    }
}

/// Read-only totals of a finalized bucket
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BucketTotals {
    pub count: u64,
    pub cost_sum: f64,
    pub distance_sum: f64,
    pub on_time: u64,
    pub unique_members: usize,
}

impl BucketTotals {
    pub fn avg_cost(&self) -> f64 {
        ratio(self.cost_sum, self.count as f64)
    }

    pub fn avg_distance(&self) -> f64 {
        ratio(self.distance_sum, self.count as f64)
    }

    pub fn on_time_rate(&self) -> f64 {
        ratio(self.on_time as f64, self.count as f64)
    }
}

/// `numerator / denominator`, 0 when the denominator is 0
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// One emitted, ranked output row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow<K> {
    /// 1-based position after sorting
    pub rank: usize,
    pub key: K,
    pub totals: BucketTotals,
    /// Share of the sort field against the sum over all groups
    pub share: f64,
}

/// Client, hub and delivery year of a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProjectKey {
    pub client: String,
    pub hub: String,
    pub year: i32,
}

/// A period column of the project table, ordered by `sort_key`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PeriodColumn {
    pub label: String,
    pub sort_key: String,
}

/// Unique-mitra counts of one project across period columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPeriodRow {
    pub key: ProjectKey,
    /// `(period label, unique mitras)` in first-seen order
    pub periods: Vec<(String, usize)>,
    /// Unique mitras across all periods
    pub total: usize,
}

impl ProjectPeriodRow {
    pub fn count_for(&self, label: &str) -> usize {
        self.periods
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }
}

/// Finalized project-analysis aggregates
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProjectAnalysis {
    /// Rows sorted by project key
    pub rows: Vec<ProjectPeriodRow>,
    /// Chronological period columns
    pub columns: Vec<PeriodColumn>,
    /// `(hub, unique mitras)` in first-seen order
    pub hub_totals: Vec<(String, usize)>,
    /// `(client, unique mitras)` in first-seen order
    pub client_totals: Vec<(String, usize)>,
    /// `(period label, unique mitras)` in column order
    pub period_totals: Vec<(String, usize)>,
    pub unique_mitras: usize,
    pub unique_projects: usize,
    pub unique_hubs: usize,
    pub unique_years: usize,
    pub total_records: u64,
}

impl ProjectAnalysis {
    pub fn avg_mitras_per_project(&self) -> f64 {
        let avg = self.unique_mitras as f64 / self.unique_projects.max(1) as f64;
        (avg * 100.0).round() / 100.0
    }
}

/// Mitra, client, hub and delivery year of one partner combination
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PartnerKey {
    pub mitra: String,
    pub client: String,
    pub hub: String,
    pub year: i32,
}

/// Deliveries of one partner combination across period columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartnerPeriodRow {
    pub key: PartnerKey,
    /// `(period label, deliveries)` in column order, non-zero cells only
    pub periods: Vec<(String, u64)>,
    pub total: u64,
}

impl PartnerPeriodRow {
    pub fn count_for(&self, label: &str) -> u64 {
        self.periods
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }
}

/// Finalized delivery counts per partner combination and period
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PartnerAnalysis {
    /// Rows sorted by partner key
    pub rows: Vec<PartnerPeriodRow>,
    /// Chronological period columns
    pub columns: Vec<PeriodColumn>,
    /// `(mitra, deliveries)` in first-seen order
    pub mitra_totals: Vec<(String, u64)>,
    /// `(hub, deliveries)` for named hubs in first-seen order
    pub hub_totals: Vec<(String, u64)>,
    /// `(period label, deliveries)` in column order
    pub period_totals: Vec<(String, u64)>,
    pub unique_mitras: usize,
    pub unique_clients: usize,
    pub unique_hubs: usize,
    pub total_deliveries: u64,
}

impl PartnerAnalysis {
    pub fn avg_deliveries_per_mitra(&self) -> f64 {
        ratio(self.total_deliveries as f64, self.unique_mitras as f64)
    }
}

/// Direction of a period-over-period change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendStatus {
    Baseline,
    Increasing,
    Growth,
    Stable,
    Decreasing,
}

impl TrendStatus {
    pub fn from_growth(growth: f64) -> Self {
        if growth > 0.1 {
            Self::Increasing
        } else if growth > 0.0 {
            Self::Growth
        } else if growth < -0.1 {
            Self::Decreasing
        } else {
            Self::Stable
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Baseline => "Baseline",
            Self::Increasing => "↑ Increasing",
            Self::Growth => "↗ Growth",
            Self::Stable => "→ Stable",
            Self::Decreasing => "↓ Decreasing",
        }
    }
}

/// One chronological row of the delivery trend table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTrend {
    pub label: String,
    pub sort_key: String,
    pub deliveries: u64,
    pub cost: f64,
    pub cumulative: u64,
    /// Change against the previous period; 0 for the first row
    pub growth: f64,
    pub status: TrendStatus,
}

/// Totals over every shipment of a report run
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PerformanceTotals {
    pub deliveries: u64,
    pub on_time: u64,
    pub total_cost: f64,
    pub total_distance: f64,
    /// Mean over shipments with a positive distance
    pub avg_distance: f64,
    pub unique_projects: usize,
    pub unique_hubs: usize,
    pub unique_mitras: usize,
}

impl PerformanceTotals {
    pub fn on_time_rate(&self) -> f64 {
        ratio(self.on_time as f64, self.deliveries as f64)
    }

    pub fn avg_cost(&self) -> f64 {
        ratio(self.total_cost, self.deliveries as f64)
    }

    pub fn cost_per_km(&self) -> f64 {
        ratio(self.total_cost, self.total_distance)
    }
}

/// Per-hub roll-up of mitra summaries
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HubFleetStats {
    pub hub: String,
    pub mitra_count: u64,
    pub deliveries: u64,
    pub avg_on_time_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(mitra: &str, cost: f64, sla: &str) -> ShipmentRecord {
        ShipmentRecord {
            mitra_name: mitra.into(),
            cost,
            distance_km: 2.0,
            sla: sla.into(),
            ..Default::default()
        }
    }

    // ========== BucketTotals ==========

    #[test]
    fn test_bucket_counts_unique_members_once() {
        let mut bucket = AggregateBucket::default();
        bucket.add(&record("Budi", 10.0, "On Time"));
        bucket.add(&record("Budi", 5.0, "Late"));
        bucket.add(&record("Sari", 1.0, "ontime"));

        let totals = bucket.finalize();
        assert_eq!(totals.count, 3);
        assert_eq!(totals.unique_members, 2);
        assert_eq!(totals.on_time, 2);
        assert!((totals.cost_sum - 16.0).abs() < f64::EPSILON);
        assert!((totals.distance_sum - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bucket_ignores_missing_member() {
        let mut bucket = AggregateBucket::default();
        bucket.add(&record("-", 10.0, "-"));
        let totals = bucket.finalize();
        assert_eq!(totals.count, 1);
        assert_eq!(totals.unique_members, 0);
    }

    // ========== ratio ==========

    #[test]
    fn test_ratio_zero_denominator() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(BucketTotals::default().on_time_rate(), 0.0);
        assert_eq!(PerformanceTotals::default().cost_per_km(), 0.0);
    }

    // ========== TrendStatus ==========

    #[test]
    fn test_trend_status_thresholds() {
        assert_eq!(TrendStatus::from_growth(0.25), TrendStatus::Increasing);
        assert_eq!(TrendStatus::from_growth(0.05), TrendStatus::Growth);
        assert_eq!(TrendStatus::from_growth(0.0), TrendStatus::Stable);
        assert_eq!(TrendStatus::from_growth(-0.05), TrendStatus::Stable);
        assert_eq!(TrendStatus::from_growth(-0.5), TrendStatus::Decreasing);
    }

    // ========== PartnerAnalysis ==========

    #[test]
    fn test_partner_row_count_for() {
        let row = PartnerPeriodRow {
            key: PartnerKey {
                mitra: "Budi".into(),
                client: "Sayurbox".into(),
                hub: "Cakung".into(),
                year: 2025,
            },
            periods: vec![("January".into(), 3)],
            total: 3,
        };
        assert_eq!(row.count_for("January"), 3);
        assert_eq!(row.count_for("February"), 0);
    }

    #[test]
    fn test_avg_deliveries_per_mitra() {
        let analysis = PartnerAnalysis {
            unique_mitras: 4,
            total_deliveries: 10,
            ..Default::default()
        };
        assert!((analysis.avg_deliveries_per_mitra() - 2.5).abs() < 1e-9);
        assert_eq!(PartnerAnalysis::default().avg_deliveries_per_mitra(), 0.0);
    }

    // ========== ProjectAnalysis ==========

    #[test]
    fn test_avg_mitras_per_project_rounds() {
        let analysis = ProjectAnalysis {
            unique_mitras: 10,
            unique_projects: 3,
            ..Default::default()
        };
        assert!((analysis.avg_mitras_per_project() - 3.33).abs() < 1e-9);

        let empty = ProjectAnalysis::default();
        assert_eq!(empty.avg_mitras_per_project(), 0.0);
    }
}
