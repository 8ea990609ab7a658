//! camelCase blocks of the mitra status dashboard export

use serde_json::Value;

use crate::services::normalizer::{clean_count, clean_percent, clean_string, optional_number};
use crate::types::{LifecyclePeriod, RawRecord, StatusCount, StatusSummary};

impl StatusSummary {
    /// Merge the `summary` and `riderMetrics` blocks
    pub fn from_raw(summary: &RawRecord, rider_metrics: &RawRecord) -> Self {
        Self {
            total_mitras: clean_count(summary.get("totalMitras")),
            training: clean_count(summary.get("trainingCount")),
            pending: clean_count(summary.get("pendingCount")),
            active_riders: clean_count(rider_metrics.get("currentActiveRiders")),
            inactive_riders: clean_count(rider_metrics.get("currentInactiveRiders")),
            week_active_riders: clean_count(rider_metrics.get("currentWeekActiveRiders")),
            week_inactive_riders: clean_count(rider_metrics.get("currentWeekInactiveRiders")),
        }
    }
}

impl StatusCount {
    pub fn from_raw(raw: &RawRecord) -> Self {
        Self {
            status: clean_string(raw.get("status")),
            count: clean_count(raw.get("count")),
            percentage: clean_percent(raw.get("percentage"), 0.0),
        }
    }
}

/// Which lifecycle table a row comes from; the rider count keys differ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleGrain {
    Monthly,
    Weekly,
}

impl LifecyclePeriod {
    pub fn from_raw(raw: &RawRecord, grain: LifecycleGrain) -> Self {
        let (active_key, inactive_key) = match grain {
            LifecycleGrain::Monthly => ("riderActiveCount", "riderInactiveCount"),
            LifecycleGrain::Weekly => ("activeCount", "inactiveCount"),
        };
        let status = |name: &str| {
            clean_count(
                raw.get("statusCounts")
                    .and_then(Value::as_object)
                    .and_then(|counts| counts.get(name)),
            )
        };

        Self {
            week: match grain {
                LifecycleGrain::Monthly => String::new(),
                LifecycleGrain::Weekly => clean_string(raw.get("week")),
            },
            month: clean_string(raw.get("month")),
            year: clean_string(raw.get("year")),
            active: clean_count(raw.get(active_key)),
            inactive: clean_count(raw.get(inactive_key)),
            status_active: status("Active"),
            status_new: status("New"),
            status_training: status("Driver Training"),
            status_registered: status("Registered"),
            total: clean_count(raw.get("total")),
            new_joining: clean_count(raw.get("gettingValue")),
            retention: optional_number(raw.get("retentionRate")),
            churn: optional_number(raw.get("churnRate")),
        }
    }
}

pub fn parse_status_counts(raws: &[RawRecord]) -> Vec<StatusCount> {
    raws.iter().map(StatusCount::from_raw).collect()
}

pub fn parse_lifecycle(raws: &[RawRecord], grain: LifecycleGrain) -> Vec<LifecyclePeriod> {
    raws.iter()
        .map(|raw| LifecyclePeriod::from_raw(raw, grain))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_status_summary_merges_blocks() {
        let summary = StatusSummary::from_raw(
            &raw(json!({"totalMitras": 250, "trainingCount": 12, "pendingCount": "7"})),
            &raw(json!({"currentActiveRiders": 140, "currentWeekInactiveRiders": 9})),
        );
        assert_eq!(summary.total_mitras, 250);
        assert_eq!(summary.pending, 7);
        assert_eq!(summary.active_riders, 140);
        assert_eq!(summary.inactive_riders, 0);
        assert_eq!(summary.week_inactive_riders, 9);
    }

    #[test]
    fn test_lifecycle_monthly_and_weekly_keys() {
        let monthly = LifecyclePeriod::from_raw(
            &raw(json!({
                "month": "January",
                "year": 2025,
                "riderActiveCount": 60,
                "activeCount": 999,
                "statusCounts": {"Active": 50, "Driver Training": 4},
                "total": 80,
                "gettingValue": 6,
                "retentionRate": 82.5,
                "churnRate": null
            })),
            LifecycleGrain::Monthly,
        );
        assert_eq!(monthly.week, "");
        assert_eq!(monthly.year, "2025");
        assert_eq!(monthly.active, 60);
        assert_eq!(monthly.status_training, 4);
        assert_eq!(monthly.status_new, 0);
        assert_eq!(monthly.new_joining, 6);
        assert_eq!(monthly.retention, Some(82.5));
        assert_eq!(monthly.churn, None);

        let weekly = LifecyclePeriod::from_raw(
            &raw(json!({"week": "W3", "month": "January", "activeCount": 12})),
            LifecycleGrain::Weekly,
        );
        assert_eq!(weekly.week, "W3");
        assert_eq!(weekly.active, 12);
        assert_eq!(weekly.total, 0);
    }

    #[test]
    fn test_status_counts_keep_order() {
        let rows = vec![
            raw(json!({"status": "New", "count": 3, "percentage": 10})),
            raw(json!({"status": "Active", "count": 27, "percentage": "90%"})),
        ];
        let counts = parse_status_counts(&rows);
        assert_eq!(counts[0].status, "New");
        assert_eq!(counts[1].percentage, 90.0);
    }
}
