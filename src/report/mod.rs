//! Report generators that turn a report input into an xlsx workbook

mod delivery_performance;
mod fleet;
pub mod formula;
mod mitra_analysis;
mod performance;
mod project;
pub(crate) mod raw;
mod status_dashboard;
pub mod style;
mod task_analytics;
pub mod workbook;

pub use delivery_performance::DeliveryPerformanceReport;
pub use fleet::FleetReport;
pub use mitra_analysis::MitraAnalysisReport;
pub use performance::PerformanceReport;
pub use project::ProjectReport;
pub use status_dashboard::StatusDashboardReport;
pub use task_analytics::TaskAnalyticsReport;
pub use style::{NumberFormat, StyleConfig};

use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use crate::config::ReportSettings;
use crate::services::{ReportInput, ScoreProfile};
use crate::types::Result;
use workbook::SheetWriter;

/// Success message and extra status-line fields of a generated report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub message: String,
    /// Merged into the JSON status line next to `success`, `output_path`
    /// and `message`
    pub metadata: Map<String, Value>,
}

/// Trait implemented by every report
pub trait ReportGenerator: Send + Sync {
    /// Report name used on the command line (e.g., "fleet")
    fn name(&self) -> &str;

    /// Reject inputs the report cannot be built from
    fn validate(&self, input: &ReportInput) -> Result<()>;

    /// Write the workbook to `output`
    fn build(
        &self,
        input: &ReportInput,
        settings: &ReportSettings,
        output: &Path,
    ) -> Result<ReportOutcome>;

    /// Validate, then build
    fn generate(
        &self,
        input: &ReportInput,
        settings: &ReportSettings,
        output: &Path,
    ) -> Result<ReportOutcome> {
        self.validate(input)?;
        info!(
            report = self.name(),
            period_type = %input.period_type,
            mode = %settings.mode,
            "building report"
        );
        let outcome = self.build(input, settings, output)?;
        info!(report = self.name(), output = %output.display(), "report written");
        Ok(outcome)
    }
}

/// Hidden sheet listing the score profile constants.
///
/// Values start at row 4 (`Constants!B4`) so formulas can reference them
/// by fixed cell.
pub(crate) fn constants_sheet<'a>(
    profile: &ScoreProfile,
    style: &'a StyleConfig,
) -> Result<SheetWriter<'a>> {
    let mut sheet = SheetWriter::new(CONSTANTS_SHEET, style)?;
    sheet.hide();
    sheet.title(0, "SYSTEM CONSTANTS", 14.0, 0)?;
    sheet.header_row(2, 0, &["Constant Name", "Value", "Description"])?;
    for (idx, (name, value, description)) in profile.constants().into_iter().enumerate() {
        let row = 3 + idx as u32;
        sheet.label(row, 0, name)?;
        sheet.number(row, 1, value, NumberFormat::Decimal)?;
        sheet.note(row, 2, &description)?;
    }
    sheet.widths(&[30.0, 15.0, 50.0])?;
    Ok(sheet)
}

/// Name of the hidden constants sheet
pub(crate) const CONSTANTS_SHEET: &str = "Constants";

/// Registry of available reports
pub struct ReportRegistry {
    reports: Vec<Box<dyn ReportGenerator>>,
}

impl ReportRegistry {
    /// Create a new registry with the built-in reports
    pub fn new() -> Self {
        Self {
            reports: vec![
                Box::new(PerformanceReport::default()),
                Box::new(ProjectReport::default()),
                Box::new(FleetReport::default()),
                Box::new(MitraAnalysisReport::default()),
                Box::new(TaskAnalyticsReport::default()),
                Box::new(DeliveryPerformanceReport::default()),
                Box::new(StatusDashboardReport::default()),
            ],
        }
    }

    /// Get all registered reports
    pub fn reports(&self) -> &[Box<dyn ReportGenerator>] {
        &self.reports
    }

    /// Registered report names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.reports.iter().map(|r| r.name()).collect()
    }

    /// Find a report by name
    pub fn get(&self, name: &str) -> Option<&dyn ReportGenerator> {
        self.reports
            .iter()
            .find(|r| r.name() == name)
            .map(|r| r.as_ref())
    }
}

impl Default for ReportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_default_reports() {
        let registry = ReportRegistry::new();
        assert_eq!(registry.reports().len(), 7);
        assert_eq!(
            registry.names(),
            vec![
                "performance",
                "project",
                "fleet",
                "mitra-analysis",
                "task-analytics",
                "delivery-performance",
                "status-dashboard"
            ]
        );
        assert!(registry.get("fleet").is_some());
        assert!(registry.get("task-analytics").is_some());
    }

    #[test]
    fn test_registry_get_unknown() {
        let registry = ReportRegistry::new();
        assert!(registry.get("dashboard").is_none());
    }
}
