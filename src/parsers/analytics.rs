//! Title Case rows of the analytics dashboards: `summaryData`,
//! `performanceData` and `insightsData`

use crate::services::normalizer::{
    clean_count, clean_number, clean_percent, clean_string, optional_number,
};
use crate::types::{
    Insight, InsightCategory, LocationPerformance, RawRecord, SummaryMetric, TaskPerformance,
};

impl SummaryMetric {
    /// Normalize one `summaryData` row; percentage values may carry a `%`
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            metric: clean_string(raw.get("Metric")),
            value: clean_percent(raw.get("Value"), 0.0),
            unit: clean_string(raw.get("Unit")),
            description: clean_string(raw.get("Description")),
        }
    }
}

impl TaskPerformance {
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            rank: optional_number(raw.get("Rank"))
                .filter(|r| *r >= 0.0)
                .map(|r| r as u64),
            user_name: clean_string(raw.get("User Name")),
            total_tasks: clean_count(raw.get("Total Tasks")),
            eligible: clean_count(raw.get("Eligible")),
            not_eligible: clean_count(raw.get("Not Eligible")),
            invited: clean_count(raw.get("Invited")),
            changed_mind: clean_count(raw.get("Changed Mind")),
            no_response: clean_count(raw.get("No Response")),
            projects: clean_string(raw.get("Projects")),
            cities: clean_string(raw.get("Cities")),
        }
    }
}

impl LocationPerformance {
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            short_name: clean_string(raw.get("Short Name")),
            category: clean_string(raw.get("Category")),
            total_shipments: clean_count(raw.get("Total Shipments")),
            late_shipments: clean_count(raw.get("Late Shipments")),
            on_time_pct: clean_percent(raw.get("On Time Percentage"), 0.0),
            late_pct: clean_percent(raw.get("Late Percentage"), 0.0),
            performance_level: clean_string(raw.get("Performance Level")),
        }
    }
}

impl Insight {
    /// Normalize one `insightsData` row of either dashboard.
    ///
    /// The volume is `Total Tasks` when present, else `Value`.
    pub fn from_raw(raw: &RawRecord) -> Self {
        let name = match clean_string(raw.get("User")).as_str() {
            "-" => clean_string(raw.get("Short Name")),
            user => user.to_string(),
        };
        let volume = optional_number(raw.get("Total Tasks"))
            .unwrap_or_else(|| clean_number(raw.get("Value"), 0.0));

        Self {
            category: InsightCategory::parse(&clean_string(raw.get("Category"))),
            name,
            location: clean_string(raw.get("Location")),
            volume,
            percentage: clean_percent(raw.get("Percentage"), 0.0),
            rank: clean_string(raw.get("Rank")),
            issues: clean_string(raw.get("Issues")),
            performance_level: clean_string(raw.get("Performance Level")),
            original_index: optional_number(raw.get("OriginalIndex"))
                .filter(|i| *i >= 0.0)
                .map(|i| i as usize),
        }
    }
}

pub fn parse_summary_metrics(raws: &[RawRecord]) -> Vec<SummaryMetric> {
    raws.iter().map(SummaryMetric::from_raw).collect()
}

pub fn parse_task_performance(raws: &[RawRecord]) -> Vec<TaskPerformance> {
    raws.iter().map(TaskPerformance::from_raw).collect()
}

pub fn parse_location_performance(raws: &[RawRecord]) -> Vec<LocationPerformance> {
    raws.iter().map(LocationPerformance::from_raw).collect()
}

pub fn parse_insights(raws: &[RawRecord]) -> Vec<Insight> {
    raws.iter().map(Insight::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_summary_metric_percentage_string() {
        let metric = SummaryMetric::from_raw(&raw(json!({
            "Metric": "On Time Rate",
            "Value": "97,5%",
            "Unit": "percentage",
            "Description": "Share of on-time shipments"
        })));
        assert_eq!(metric.metric, "On Time Rate");
        assert_eq!(metric.value, 97.5);
        assert!(metric.is_percentage());
    }

    #[test]
    fn test_task_performance_from_raw() {
        let row = TaskPerformance::from_raw(&raw(json!({
            "Rank": "3",
            "User Name": "dewi",
            "Total Tasks": 40,
            "Eligible": "22",
            "Not Eligible": 18,
            "Invited": 30,
            "Projects": "Sayurbox, Lazada"
        })));
        assert_eq!(row.rank, Some(3));
        assert_eq!(row.user_name, "dewi");
        assert_eq!(row.eligible, 22);
        assert_eq!(row.changed_mind, 0);
        assert_eq!(row.cities, "-");
    }

    #[test]
    fn test_task_performance_without_rank() {
        let row = TaskPerformance::from_raw(&raw(json!({"Rank": "n/a"})));
        assert_eq!(row.rank, None);
    }

    #[test]
    fn test_location_performance_from_raw() {
        let row = LocationPerformance::from_raw(&raw(json!({
            "Short Name": "CKG",
            "Category": "Hub",
            "Total Shipments": 1200,
            "Late Shipments": 18,
            "On Time Percentage": "98.5",
            "Late Percentage": 1.5,
            "Performance Level": "Excellent"
        })));
        assert_eq!(row.short_name, "CKG");
        assert_eq!(row.total_shipments, 1200);
        assert_eq!(row.on_time_pct, 98.5);
        assert_eq!(row.late_pct, 1.5);
    }

    #[test]
    fn test_insight_task_and_location_rows() {
        let task = Insight::from_raw(&raw(json!({
            "Category": "Priority Area",
            "User": "dewi",
            "Total Tasks": 12,
            "Issues": "Low success rate",
            "OriginalIndex": 4
        })));
        assert_eq!(task.category, InsightCategory::PriorityArea);
        assert_eq!(task.name, "dewi");
        assert_eq!(task.volume, 12.0);
        assert_eq!(task.original_index, Some(4));

        let location = Insight::from_raw(&raw(json!({
            "Category": "Volume Leader",
            "Location": "Cakung Hub",
            "Short Name": "CKG",
            "Value": 5400,
            "Percentage": "99.1"
        })));
        assert_eq!(location.name, "CKG");
        assert_eq!(location.location, "Cakung Hub");
        assert_eq!(location.volume, 5400.0);
        assert_eq!(location.percentage, 99.1);
        assert_eq!(location.original_index, None);
    }
}
