//! Pre-summarized rows of the analytics dashboards: `summaryData`,
//! `performanceData` and `insightsData`

use serde::Serialize;

use super::aggregate::ratio;

/// One `summaryData` row
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SummaryMetric {
    pub metric: String,
    pub value: f64,
    pub unit: String,
    pub description: String,
}

impl SummaryMetric {
    pub fn is_percentage(&self) -> bool {
        self.unit.eq_ignore_ascii_case("percentage")
    }
}

/// Value of the first metric called `name`, 0 when absent
pub fn metric_value(metrics: &[SummaryMetric], name: &str) -> f64 {
    metrics
        .iter()
        .find(|m| m.metric == name)
        .map(|m| m.value)
        .unwrap_or(0.0)
}

/// One user row of the task analytics `performanceData`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TaskPerformance {
    /// Upstream rank; rows without one sort last
    pub rank: Option<u64>,
    pub user_name: String,
    pub total_tasks: u64,
    pub eligible: u64,
    pub not_eligible: u64,
    pub invited: u64,
    pub changed_mind: u64,
    pub no_response: u64,
    pub projects: String,
    pub cities: String,
}

impl TaskPerformance {
    /// Eligible share of all tasks
    pub fn success_rate(&self) -> f64 {
        ratio(self.eligible as f64, self.total_tasks as f64)
    }

    /// Tasks that got any answer, over all tasks
    pub fn response_rate(&self) -> f64 {
        let responded = self.invited + self.changed_mind + self.no_response;
        ratio(responded as f64, self.total_tasks as f64)
    }

    /// Eligible share of invited tasks
    pub fn conversion_rate(&self) -> f64 {
        ratio(self.eligible as f64, self.invited as f64)
    }
}

/// One location row of the delivery `performanceData`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LocationPerformance {
    pub short_name: String,
    pub category: String,
    pub total_shipments: u64,
    pub late_shipments: u64,
    /// Percentage in `0.0..=100.0`
    pub on_time_pct: f64,
    /// Percentage in `0.0..=100.0`
    pub late_pct: f64,
    pub performance_level: String,
}

/// Section of an `insightsData` row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InsightCategory {
    TopPerformer,
    PriorityArea,
    VolumeLeader,
    Other,
}

impl InsightCategory {
    pub const SECTIONS: [InsightCategory; 3] =
        [Self::TopPerformer, Self::PriorityArea, Self::VolumeLeader];

    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Top Performer" => Self::TopPerformer,
            "Priority Area" => Self::PriorityArea,
            "Volume Leader" => Self::VolumeLeader,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopPerformer => "Top Performer",
            Self::PriorityArea => "Priority Area",
            Self::VolumeLeader => "Volume Leader",
            Self::Other => "Other",
        }
    }

    /// Follow-up priority of users in this section
    pub fn priority(self) -> &'static str {
        match self {
            Self::PriorityArea => "High",
            Self::VolumeLeader => "Medium",
            Self::TopPerformer | Self::Other => "Normal",
        }
    }
}

/// One `insightsData` row; task and delivery dashboards fill different
/// fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub category: InsightCategory,
    /// `User` for tasks, `Short Name` for locations
    pub name: String,
    pub location: String,
    /// `Total Tasks` for tasks, `Value` for locations
    pub volume: f64,
    /// On-time percentage of a location
    pub percentage: f64,
    pub rank: String,
    pub issues: String,
    pub performance_level: String,
    /// Position of the user in the unsorted `performanceData`
    pub original_index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(total: u64, eligible: u64, invited: u64) -> TaskPerformance {
        TaskPerformance {
            total_tasks: total,
            eligible,
            invited,
            changed_mind: 1,
            no_response: 1,
            ..Default::default()
        }
    }

    // ========== TaskPerformance ==========

    #[test]
    fn test_task_rates() {
        let row = task(20, 10, 8);
        assert!((row.success_rate() - 0.5).abs() < 1e-9);
        assert!((row.response_rate() - 0.5).abs() < 1e-9);
        assert!((row.conversion_rate() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_task_rates_without_tasks() {
        let row = task(0, 0, 0);
        assert_eq!(row.success_rate(), 0.0);
        assert_eq!(row.response_rate(), 0.0);
        assert_eq!(row.conversion_rate(), 0.0);
    }

    // ========== SummaryMetric ==========

    #[test]
    fn test_metric_value_lookup() {
        let metrics = vec![
            SummaryMetric {
                metric: "Total Tasks".into(),
                value: 120.0,
                ..Default::default()
            },
            SummaryMetric {
                metric: "Success Rate".into(),
                value: 61.5,
                unit: "Percentage".into(),
                ..Default::default()
            },
        ];
        assert_eq!(metric_value(&metrics, "Total Tasks"), 120.0);
        assert_eq!(metric_value(&metrics, "Total Invited"), 0.0);
        assert!(metrics[1].is_percentage());
        assert!(!metrics[0].is_percentage());
    }

    // ========== InsightCategory ==========

    #[test]
    fn test_insight_category_parse() {
        assert_eq!(InsightCategory::parse(" Top Performer "), InsightCategory::TopPerformer);
        assert_eq!(InsightCategory::parse("Volume Leader"), InsightCategory::VolumeLeader);
        assert_eq!(InsightCategory::parse("top performer"), InsightCategory::Other);
        assert_eq!(InsightCategory::PriorityArea.priority(), "High");
        assert_eq!(InsightCategory::TopPerformer.priority(), "Normal");
    }
}
