//! Performance score profiles
//!
//! The fleet and single-mitra reports weight their score components
//! differently. Each weighting is kept as its own named profile instead of
//! being merged into one formula.

use serde::{Deserialize, Serialize};

use crate::types::{ReportError, Result};

/// Component weights of a performance score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub delivery_rate: f64,
    pub on_time_rate: f64,
    pub activity: f64,
    pub consistency: f64,
    #[serde(default)]
    pub growth: f64,
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.delivery_rate + self.on_time_rate + self.activity + self.consistency + self.growth
    }
}

/// Named set of score targets and weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreProfile {
    pub name: String,
    /// Target delivery success rate, percent
    pub delivery_rate_target: f64,
    /// Target on-time rate, percent
    pub on_time_rate_target: f64,
    /// Deliveries that count as a full activity score
    pub activity_baseline: f64,
    pub weights: ScoreWeights,
    /// Growth score at 0% growth
    pub growth_baseline: f64,
    pub max_score: f64,
    /// Score points lost per unit of cancellation fraction
    pub cancel_penalty_multiplier: f64,
}

impl ScoreProfile {
    pub const FLEET: &'static str = "fleet";
    pub const PERFORMANCE: &'static str = "performance";

    /// Weighting used by the all-mitra fleet report
    pub fn fleet() -> Self {
        Self {
            name: Self::FLEET.into(),
            delivery_rate_target: 95.0,
            on_time_rate_target: 90.0,
            activity_baseline: 100.0,
            weights: ScoreWeights {
                delivery_rate: 0.40,
                on_time_rate: 0.30,
                activity: 0.20,
                consistency: 0.10,
                growth: 0.0,
            },
            growth_baseline: 50.0,
            max_score: 100.0,
            cancel_penalty_multiplier: 10.0,
        }
    }

    /// Weighting used by the single-mitra performance report
    pub fn performance() -> Self {
        Self {
            name: Self::PERFORMANCE.into(),
            weights: ScoreWeights {
                delivery_rate: 0.30,
                on_time_rate: 0.25,
                activity: 0.20,
                consistency: 0.15,
                growth: 0.10,
            },
            ..Self::fleet()
        }
    }

    /// Built-in profile by name
    pub fn named(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            Self::FLEET => Ok(Self::fleet()),
            Self::PERFORMANCE => Ok(Self::performance()),
            other => Err(ReportError::Config(format!(
                "unknown score profile '{}' (expected '{}' or '{}')",
                other,
                Self::FLEET,
                Self::PERFORMANCE
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("delivery_rate_target", self.delivery_rate_target),
            ("on_time_rate_target", self.on_time_rate_target),
            ("activity_baseline", self.activity_baseline),
            ("max_score", self.max_score),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ReportError::Config(format!(
                    "score profile '{}': {} must be positive",
                    self.name, field
                )));
            }
        }
        if (self.weights.sum() - 1.0).abs() > 1e-6 {
            return Err(ReportError::Config(format!(
                "score profile '{}': weights sum to {:.2}, expected 1.00",
                self.name,
                self.weights.sum()
            )));
        }
        Ok(())
    }

    /// Score one mitra; every component is clamped to `0..=max_score`
    pub fn score(&self, inputs: &ScoreInputs) -> ScoreBreakdown {
        let max = self.max_score;
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, max) } else { 0.0 };

        let delivery_rate = clamp(inputs.delivery_rate * 100.0 / self.delivery_rate_target * 100.0);
        let on_time_rate = clamp(inputs.on_time_rate * 100.0 / self.on_time_rate_target * 100.0);
        let activity = clamp(inputs.deliveries as f64 / self.activity_baseline * 100.0);
        let consistency = clamp(max - inputs.cancel_rate * self.cancel_penalty_multiplier);
        let growth = clamp(self.growth_baseline + inputs.growth_rate * 100.0);

        let w = &self.weights;
        let total = delivery_rate * w.delivery_rate
            + on_time_rate * w.on_time_rate
            + activity * w.activity
            + consistency * w.consistency
            + growth * w.growth;

        ScoreBreakdown {
            delivery_rate,
            on_time_rate,
            activity,
            consistency,
            growth,
            total,
        }
    }

    /// `(name, value, description)` rows for a constants table
    pub fn constants(&self) -> Vec<(&'static str, f64, String)> {
        let pct = |v: f64| format!("{:.0}%", v * 100.0);
        vec![
            ("DELIVERY_RATE_TARGET", self.delivery_rate_target, format!("Target delivery success rate ({}%)", self.delivery_rate_target)),
            ("ONTIME_RATE_TARGET", self.on_time_rate_target, format!("Target on-time delivery rate ({}%)", self.on_time_rate_target)),
            ("ACTIVITY_BASELINE", self.activity_baseline, "Baseline for activity level calculation".into()),
            ("WEIGHT_DELIVERY_RATE", self.weights.delivery_rate, format!("Weight for delivery rate in score ({})", pct(self.weights.delivery_rate))),
            ("WEIGHT_ONTIME_RATE", self.weights.on_time_rate, format!("Weight for on-time rate in score ({})", pct(self.weights.on_time_rate))),
            ("WEIGHT_ACTIVITY", self.weights.activity, format!("Weight for activity level in score ({})", pct(self.weights.activity))),
            ("WEIGHT_CONSISTENCY", self.weights.consistency, format!("Weight for consistency in score ({})", pct(self.weights.consistency))),
            ("WEIGHT_GROWTH", self.weights.growth, format!("Weight for growth in score ({})", pct(self.weights.growth))),
            ("GROWTH_BASELINE", self.growth_baseline, format!("Baseline score for growth calculation ({})", self.growth_baseline)),
            ("MAX_SCORE", self.max_score, format!("Maximum performance score ({})", self.max_score)),
            ("CANCEL_PENALTY_MULTIPLIER", self.cancel_penalty_multiplier, "Multiplier for cancellation penalty".into()),
        ]
    }
}

impl Default for ScoreProfile {
    fn default() -> Self {
        Self::performance()
    }
}

/// Raw measurements fed into a score; rates are fractions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreInputs {
    pub delivery_rate: f64,
    pub on_time_rate: f64,
    pub deliveries: u64,
    pub cancel_rate: f64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub delivery_rate: f64,
    pub on_time_rate: f64,
    pub activity: f64,
    pub consistency: f64,
    pub growth: f64,
    pub total: f64,
}

/// Project tier by unique mitra count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectTier {
    Key,
    Growing,
    Standard,
}

impl ProjectTier {
    /// Unique mitras above which a project is a key project
    pub const KEY_THRESHOLD: usize = 50;
    /// Unique mitras above which a project is growing
    pub const GROWING_THRESHOLD: usize = 25;

    pub fn from_unique_mitras(count: usize) -> Self {
        if count > Self::KEY_THRESHOLD {
            Self::Key
        } else if count > Self::GROWING_THRESHOLD {
            Self::Growing
        } else {
            Self::Standard
        }
    }

    pub fn strategic_value(self) -> &'static str {
        match self {
            Self::Key => "Key Project",
            Self::Growing => "Growing Project",
            Self::Standard => "Standard Project",
        }
    }

    pub fn investment_priority(self) -> &'static str {
        match self {
            Self::Key => "High",
            Self::Growing => "Medium",
            Self::Standard => "Low",
        }
    }

    pub fn action_plan(self) -> &'static str {
        match self {
            Self::Key => "Increase mitra allocation and optimize delivery routes",
            Self::Growing => "Provide additional support and monitor mitra satisfaction",
            Self::Standard => "Evaluate project viability and improve mitra retention",
        }
    }
}

/// Hub capacity band by unique mitra count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubCapacity {
    High,
    Medium,
    Low,
}

impl HubCapacity {
    pub const HIGH_THRESHOLD: usize = 100;
    pub const MEDIUM_THRESHOLD: usize = 50;

    pub fn from_unique_mitras(count: usize) -> Self {
        if count > Self::HIGH_THRESHOLD {
            Self::High
        } else if count > Self::MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn status(self) -> &'static str {
        match self {
            Self::High => "High Capacity Hub",
            Self::Medium => "Medium Capacity Hub",
            Self::Low => "Low Capacity Hub",
        }
    }

    pub fn resource_allocation(self) -> &'static str {
        match self {
            Self::High => "Optimize mitra distribution and expand capacity",
            Self::Medium => "Maintain current allocation level",
            Self::Low => "Consolidate routes and improve efficiency",
        }
    }

    pub fn priority(self) -> &'static str {
        match self {
            Self::High => "Critical",
            Self::Medium | Self::Low => "Standard",
        }
    }
}

/// Partner category of a mitra/client/hub combination by deliveries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerTier {
    Key,
    Growing,
    Standard,
}

impl PartnerTier {
    pub const KEY_THRESHOLD: u64 = 100;
    pub const GROWING_THRESHOLD: u64 = 50;

    pub fn from_deliveries(deliveries: u64) -> Self {
        if deliveries > Self::KEY_THRESHOLD {
            Self::Key
        } else if deliveries > Self::GROWING_THRESHOLD {
            Self::Growing
        } else {
            Self::Standard
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            Self::Key => "Key Partner",
            Self::Growing => "Growing Partner",
            Self::Standard => "Standard Partner",
        }
    }

    pub fn priority(self) -> &'static str {
        match self {
            Self::Key => "High",
            Self::Growing => "Medium",
            Self::Standard => "Low",
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            Self::Key => "Negotiate long-term contracts and increase allocation",
            Self::Growing => "Provide growth incentives and training programs",
            Self::Standard => "Monitor performance closely and set improvement targets",
        }
    }
}

/// Hub band by delivery volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubVolume {
    High,
    Medium,
    Low,
}

impl HubVolume {
    pub const HIGH_THRESHOLD: u64 = 200;
    pub const MEDIUM_THRESHOLD: u64 = 100;

    pub fn from_deliveries(deliveries: u64) -> Self {
        if deliveries > Self::HIGH_THRESHOLD {
            Self::High
        } else if deliveries > Self::MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn status(self) -> &'static str {
        match self {
            Self::High => "High Volume Hub",
            Self::Medium => "Medium Volume Hub",
            Self::Low => "Low Volume Hub",
        }
    }

    pub fn resource_action(self) -> &'static str {
        match self {
            Self::High => "Increase capacity and allocate more mitras",
            Self::Medium => "Maintain current resource level",
            Self::Low => "Optimize resources and consolidate routes",
        }
    }

    pub fn priority(self) -> &'static str {
        match self {
            Self::High => "Critical",
            Self::Medium | Self::Low => "Standard",
        }
    }
}

/// Task performance level by success rate (a fraction)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskLevel {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl TaskLevel {
    pub const ALL: [TaskLevel; 4] = [
        Self::Excellent,
        Self::Good,
        Self::Fair,
        Self::NeedsImprovement,
    ];
    /// Lower bound of each level above `NeedsImprovement`
    pub const EXCELLENT_FROM: f64 = 0.7;
    pub const GOOD_FROM: f64 = 0.5;
    pub const FAIR_FROM: f64 = 0.3;

    pub fn from_success_rate(rate: f64) -> Self {
        if rate >= Self::EXCELLENT_FROM {
            Self::Excellent
        } else if rate >= Self::GOOD_FROM {
            Self::Good
        } else if rate >= Self::FAIR_FROM {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Status of a percentage KPI on the executive summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricStatus {
    Excellent,
    Good,
    NeedsAttention,
}

impl MetricStatus {
    /// `percentage` in `0.0..=100.0`
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 98.0 {
            Self::Excellent
        } else if percentage >= 95.0 {
            Self::Good
        } else {
            Self::NeedsAttention
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsAttention => "Needs Attention",
        }
    }
}

/// Monthly rider activity band
pub fn activity_level(active_riders: u64) -> &'static str {
    if active_riders > 50 {
        "High Activity"
    } else if active_riders > 20 {
        "Moderate"
    } else {
        "Low Activity"
    }
}

/// Weekly performance band by retention percentage
pub fn retention_level(retention: Option<f64>) -> &'static str {
    match retention {
        Some(r) if r > 80.0 => "Excellent",
        Some(r) if r > 60.0 => "Good",
        _ => "Needs Improvement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== ScoreProfile ==========

    #[test]
    fn test_builtin_profiles_are_valid() {
        ScoreProfile::fleet().validate().unwrap();
        ScoreProfile::performance().validate().unwrap();
    }

    #[test]
    fn test_profiles_keep_distinct_weights() {
        let fleet = ScoreProfile::fleet();
        let perf = ScoreProfile::performance();
        assert_eq!(fleet.weights.delivery_rate, 0.40);
        assert_eq!(fleet.weights.growth, 0.0);
        assert_eq!(perf.weights.delivery_rate, 0.30);
        assert_eq!(perf.weights.growth, 0.10);
    }

    #[test]
    fn test_named_profiles() {
        assert_eq!(ScoreProfile::named("Fleet").unwrap().name, "fleet");
        assert_eq!(ScoreProfile::named("performance").unwrap().name, "performance");
        let err = ScoreProfile::named("legacy").unwrap_err();
        assert!(err.to_string().contains("unknown score profile"));
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let mut profile = ScoreProfile::fleet();
        profile.weights.growth = 0.5;
        assert!(profile.validate().is_err());

        let mut profile = ScoreProfile::fleet();
        profile.activity_baseline = 0.0;
        assert!(profile.validate().is_err());
    }

    // ========== score ==========

    #[test]
    fn test_perfect_score() {
        let profile = ScoreProfile::fleet();
        let breakdown = profile.score(&ScoreInputs {
            delivery_rate: 1.0,
            on_time_rate: 1.0,
            deliveries: 500,
            cancel_rate: 0.0,
            growth_rate: 0.0,
        });
        assert_eq!(breakdown.delivery_rate, 100.0);
        assert_eq!(breakdown.on_time_rate, 100.0);
        assert_eq!(breakdown.activity, 100.0);
        assert_eq!(breakdown.consistency, 100.0);
        assert!((breakdown.total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_score_components() {
        let profile = ScoreProfile::performance();
        let breakdown = profile.score(&ScoreInputs {
            delivery_rate: 0.95,
            on_time_rate: 0.45,
            deliveries: 50,
            cancel_rate: 0.05,
            growth_rate: 0.2,
        });
        assert!((breakdown.delivery_rate - 100.0).abs() < 1e-9);
        assert!((breakdown.on_time_rate - 50.0).abs() < 1e-9);
        assert!((breakdown.activity - 50.0).abs() < 1e-9);
        assert!((breakdown.consistency - 99.5).abs() < 1e-9);
        assert!((breakdown.growth - 70.0).abs() < 1e-9);
        let expected = 100.0 * 0.30 + 50.0 * 0.25 + 50.0 * 0.20 + 99.5 * 0.15 + 70.0 * 0.10;
        assert!((breakdown.total - expected).abs() < 1e-9);
    }

    #[test]
    fn test_score_clamps_components() {
        let profile = ScoreProfile::performance();
        let breakdown = profile.score(&ScoreInputs {
            delivery_rate: 0.0,
            on_time_rate: 0.0,
            deliveries: 0,
            cancel_rate: 20.0,
            growth_rate: -3.0,
        });
        assert_eq!(breakdown.delivery_rate, 0.0);
        assert_eq!(breakdown.consistency, 0.0);
        assert_eq!(breakdown.growth, 0.0);
        assert_eq!(breakdown.total, 0.0);
    }

    #[test]
    fn test_constants_table() {
        let rows = ScoreProfile::fleet().constants();
        assert_eq!(rows.len(), 11);
        assert_eq!(rows[3].0, "WEIGHT_DELIVERY_RATE");
        assert!(rows[3].2.contains("40%"));
    }

    // ========== bands ==========

    #[test]
    fn test_project_tiers() {
        assert_eq!(ProjectTier::from_unique_mitras(51), ProjectTier::Key);
        assert_eq!(ProjectTier::from_unique_mitras(50), ProjectTier::Growing);
        assert_eq!(ProjectTier::from_unique_mitras(26), ProjectTier::Growing);
        assert_eq!(ProjectTier::from_unique_mitras(25), ProjectTier::Standard);
        assert_eq!(ProjectTier::Key.investment_priority(), "High");
        assert_eq!(ProjectTier::Standard.strategic_value(), "Standard Project");
    }

    #[test]
    fn test_hub_capacity_bands() {
        assert_eq!(HubCapacity::from_unique_mitras(101), HubCapacity::High);
        assert_eq!(HubCapacity::from_unique_mitras(100), HubCapacity::Medium);
        assert_eq!(HubCapacity::from_unique_mitras(51), HubCapacity::Medium);
        assert_eq!(HubCapacity::from_unique_mitras(50), HubCapacity::Low);
        assert_eq!(HubCapacity::High.priority(), "Critical");
        assert_eq!(HubCapacity::Low.priority(), "Standard");
    }

    #[test]
    fn test_partner_tiers() {
        assert_eq!(PartnerTier::from_deliveries(101), PartnerTier::Key);
        assert_eq!(PartnerTier::from_deliveries(100), PartnerTier::Growing);
        assert_eq!(PartnerTier::from_deliveries(51), PartnerTier::Growing);
        assert_eq!(PartnerTier::from_deliveries(50), PartnerTier::Standard);
        assert_eq!(PartnerTier::Key.category(), "Key Partner");
        assert_eq!(PartnerTier::Standard.priority(), "Low");
    }

    #[test]
    fn test_hub_volume_bands() {
        assert_eq!(HubVolume::from_deliveries(201), HubVolume::High);
        assert_eq!(HubVolume::from_deliveries(200), HubVolume::Medium);
        assert_eq!(HubVolume::from_deliveries(100), HubVolume::Low);
        assert_eq!(HubVolume::High.priority(), "Critical");
        assert_eq!(HubVolume::Low.status(), "Low Volume Hub");
    }

    #[test]
    fn test_task_levels_are_inclusive() {
        assert_eq!(TaskLevel::from_success_rate(0.7), TaskLevel::Excellent);
        assert_eq!(TaskLevel::from_success_rate(0.69), TaskLevel::Good);
        assert_eq!(TaskLevel::from_success_rate(0.5), TaskLevel::Good);
        assert_eq!(TaskLevel::from_success_rate(0.3), TaskLevel::Fair);
        assert_eq!(TaskLevel::from_success_rate(0.0), TaskLevel::NeedsImprovement);
        assert_eq!(TaskLevel::NeedsImprovement.label(), "Needs Improvement");
    }

    #[test]
    fn test_metric_status() {
        assert_eq!(MetricStatus::from_percentage(98.0), MetricStatus::Excellent);
        assert_eq!(MetricStatus::from_percentage(96.5), MetricStatus::Good);
        assert_eq!(MetricStatus::from_percentage(80.0), MetricStatus::NeedsAttention);
    }

    #[test]
    fn test_lifecycle_levels() {
        assert_eq!(activity_level(51), "High Activity");
        assert_eq!(activity_level(21), "Moderate");
        assert_eq!(activity_level(20), "Low Activity");
        assert_eq!(retention_level(Some(85.0)), "Excellent");
        assert_eq!(retention_level(Some(61.0)), "Good");
        assert_eq!(retention_level(Some(60.0)), "Needs Improvement");
        assert_eq!(retention_level(None), "Needs Improvement");
    }
}
