//! Mitra lifecycle rows of the status dashboard export

use serde::Serialize;

use super::aggregate::ratio;

/// Headline counts from the `summary` and `riderMetrics` blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusSummary {
    pub total_mitras: u64,
    pub training: u64,
    pub pending: u64,
    pub active_riders: u64,
    pub inactive_riders: u64,
    pub week_active_riders: u64,
    pub week_inactive_riders: u64,
}

/// One `statusDistribution` row
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
    /// Percentage in `0.0..=100.0`
    pub percentage: f64,
}

/// Lifecycle stage of a mitra status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusStage {
    Operational,
    Onboarding,
    Inactive,
}

impl StatusStage {
    pub fn of(status: &str) -> Self {
        match status {
            "Active" => Self::Operational,
            "Driver Training" | "New" | "Registered" => Self::Onboarding,
            _ => Self::Inactive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operational => "Operational",
            Self::Onboarding => "Onboarding",
            Self::Inactive => "Inactive",
        }
    }
}

/// One `monthlyData` or `weeklyData` row
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LifecyclePeriod {
    /// Empty for monthly rows
    pub week: String,
    pub month: String,
    pub year: String,
    pub active: u64,
    pub inactive: u64,
    pub status_active: u64,
    pub status_new: u64,
    pub status_training: u64,
    pub status_registered: u64,
    pub total: u64,
    pub new_joining: u64,
    /// Percentage; `None` when the exporter could not compute it
    pub retention: Option<f64>,
    pub churn: Option<f64>,
}

impl LifecyclePeriod {
    /// Change of `total` against the previous period; `None` for the first
    /// row, 0 when the previous total was 0
    pub fn growth_from(&self, previous: Option<&LifecyclePeriod>) -> Option<f64> {
        let previous = previous?;
        let base = previous.total as f64;
        Some(ratio(self.total as f64 - base, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(total: u64) -> LifecyclePeriod {
        LifecyclePeriod {
            total,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_stage() {
        assert_eq!(StatusStage::of("Active"), StatusStage::Operational);
        assert_eq!(StatusStage::of("Driver Training"), StatusStage::Onboarding);
        assert_eq!(StatusStage::of("Registered"), StatusStage::Onboarding);
        assert_eq!(StatusStage::of("Resigned"), StatusStage::Inactive);
    }

    #[test]
    fn test_growth_from_previous() {
        assert_eq!(period(10).growth_from(None), None);
        let growth = period(15).growth_from(Some(&period(10))).unwrap();
        assert!((growth - 0.5).abs() < 1e-9);
        assert_eq!(period(15).growth_from(Some(&period(0))), Some(0.0));
    }
}
