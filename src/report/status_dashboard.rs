//! Mitra lifecycle dashboard from the camelCase status export

use std::path::Path;

use serde_json::{json, Map};

use super::workbook::{ReportWorkbook, SheetWriter};
use super::{NumberFormat, ReportGenerator, ReportOutcome, StyleConfig};
use crate::config::{ReportMode, ReportSettings};
use crate::parsers::{parse_lifecycle, parse_status_counts, LifecycleGrain};
use crate::services::normalizer::clean_string;
use crate::services::{activity_level, retention_level, ReportInput};
use crate::types::{
    present, LifecyclePeriod, RawRecord, ReportError, Result, StatusCount, StatusStage,
    StatusSummary, MISSING,
};

const NO_STATUS: &str = "No status data available. Cannot generate dashboard without status data.";

const MONTHLY_HEADERS: [&str; 14] = [
    "Month",
    "Year",
    "Active Riders",
    "Inactive Riders",
    "Active Status",
    "New",
    "Training",
    "Registered",
    "Total",
    "New Joining",
    "Retention %",
    "Churn %",
    "Growth Rate",
    "Status",
];

const WEEKLY_HEADERS: [&str; 15] = [
    "Week",
    "Month",
    "Year",
    "Active Riders",
    "Inactive Riders",
    "Active Status",
    "New",
    "Training",
    "Registered",
    "Total",
    "New Joining",
    "Retention %",
    "Churn %",
    "Week Status",
    "Performance",
];

/// Applied filter value, or `fallback` when the filter is unset
fn filter_text(filters: &RawRecord, key: &str, fallback: &str) -> String {
    let value = clean_string(filters.get(key));
    present(&value).unwrap_or(fallback).to_string()
}

/// Normalized blocks of the status dashboard
#[derive(Debug, Clone)]
pub(crate) struct StatusModel {
    pub summary: StatusSummary,
    /// Largest count first
    pub distribution: Vec<StatusCount>,
    pub monthly: Vec<LifecyclePeriod>,
    pub weekly: Vec<LifecyclePeriod>,
    /// `(year, month, week)` filter labels
    pub filters: [String; 3],
}

impl StatusModel {
    pub fn build(input: &ReportInput) -> Self {
        let mut distribution = parse_status_counts(&input.status_distribution);
        distribution.sort_by(|a, b| b.count.cmp(&a.count));

        let filters = &input.applied_filters;
        Self {
            summary: StatusSummary::from_raw(&input.status_summary, &input.rider_metrics),
            distribution,
            monthly: parse_lifecycle(&input.monthly_data, LifecycleGrain::Monthly),
            weekly: parse_lifecycle(&input.weekly_data, LifecycleGrain::Weekly),
            filters: [
                filter_text(filters, "year", "All Years"),
                filter_text(filters, "month", "All Months"),
                filter_text(filters, "week", "All Weeks"),
            ],
        }
    }
}

/// Mitra status dashboard
#[derive(Default)]
pub struct StatusDashboardReport {
    style: StyleConfig,
}

impl StatusDashboardReport {
    pub fn new(style: StyleConfig) -> Self {
        Self { style }
    }

    fn summary_sheet(&self, model: &StatusModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Executive Summary", &self.style)?;
        sheet.activate();

        sheet.title(1, "MITRA LIFECYCLE DASHBOARD - EXECUTIVE SUMMARY", 18.0, 6)?;
        sheet.note(2, 1, "Comprehensive Partner Journey Analytics")?;

        sheet.section(4, 1, "REPORT INFORMATION")?;
        let [year, month, week] = &model.filters;
        for (idx, (label, value)) in [("Filter Year:", year), ("Filter Month:", month), ("Filter Week:", week)]
            .iter()
            .enumerate()
        {
            let row = 6 + idx as u32;
            sheet.label(row, 1, label)?;
            sheet.text(row, 2, value)?;
        }

        sheet.section(10, 1, "KEY METRICS")?;
        let summary = &model.summary;
        let metrics = [
            ("Total Partners", summary.total_mitras, "partners"),
            ("Active Riders", summary.active_riders, "riders"),
            ("In Training", summary.training, "partners"),
            ("Pending Verification", summary.pending, "partners"),
        ];
        for (idx, (label, value, unit)) in metrics.iter().enumerate() {
            let row = 12 + idx as u32;
            sheet.label(row, 1, label)?;
            sheet.kpi(row, 2, *value as f64, NumberFormat::Integer)?;
            sheet.note(row, 3, unit)?;
        }

        sheet.widths(&[2.0, 25.0, 20.0, 15.0])?;
        Ok(sheet)
    }

    fn distribution_sheet(&self, model: &StatusModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Status Distribution", &self.style)?;
        sheet.title(0, "MITRA STATUS DISTRIBUTION", 16.0, 4)?;
        sheet.header_row(2, 0, &["Status", "Count", "Percentage", "Category", "Notes"])?;

        for (idx, item) in model.distribution.iter().enumerate() {
            let row = 3 + idx as u32;
            sheet.label(row, 0, &item.status)?;
            sheet.number(row, 1, item.count as f64, NumberFormat::Integer)?;
            sheet.number(row, 2, item.percentage, NumberFormat::Points)?;
            sheet.text(row, 3, StatusStage::of(&item.status).as_str())?;
            if idx == 0 {
                sheet.note(row, 4, "Primary status")?;
            }
        }

        sheet.widths(&[22.0, 12.0, 12.0, 15.0, 20.0])?;
        Ok(sheet)
    }

    fn monthly_sheet(&self, model: &StatusModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Monthly Trends", &self.style)?;
        sheet.title(0, "MONTHLY LIFECYCLE TRENDS", 16.0, 13)?;
        sheet.header_row(2, 0, &MONTHLY_HEADERS)?;

        for (idx, period) in model.monthly.iter().enumerate() {
            let row = 3 + idx as u32;
            sheet.label(row, 0, &period.month)?;
            sheet.text(row, 1, &period.year)?;
            lifecycle_counts(&mut sheet, row, 2, period)?;

            let previous = idx.checked_sub(1).map(|p| &model.monthly[p]);
            match period.growth_from(previous) {
                Some(growth) => sheet.number(row, 12, growth, NumberFormat::Percent)?,
                None => sheet.text(row, 12, MISSING)?,
            }
            sheet.text(row, 13, activity_level(period.active))?;
        }

        sheet.uniform_width(MONTHLY_HEADERS.len() as u16, 13.0)?;
        Ok(sheet)
    }

    fn weekly_sheet(&self, model: &StatusModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Weekly Trends", &self.style)?;
        sheet.title(0, "WEEKLY LIFECYCLE TRENDS", 16.0, 14)?;
        sheet.header_row(2, 0, &WEEKLY_HEADERS)?;

        for (idx, period) in model.weekly.iter().enumerate() {
            let row = 3 + idx as u32;
            sheet.label(row, 0, &period.week)?;
            sheet.text(row, 1, &period.month)?;
            sheet.text(row, 2, &period.year)?;
            lifecycle_counts(&mut sheet, row, 3, period)?;

            let week_status = if period.active > 0 { "Active Week" } else { "Inactive" };
            sheet.text(row, 13, week_status)?;
            sheet.text(row, 14, retention_level(period.retention))?;
        }

        sheet.uniform_width(WEEKLY_HEADERS.len() as u16, 13.0)?;
        Ok(sheet)
    }

    fn rider_sheet(&self, model: &StatusModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Rider Metrics", &self.style)?;
        sheet.title(0, "RIDER PERFORMANCE METRICS", 16.0, 3)?;

        let summary = &model.summary;
        let blocks = [
            (
                "MONTHLY METRICS",
                [
                    ("Current Active Riders", summary.active_riders),
                    ("Current Inactive Riders", summary.inactive_riders),
                ],
            ),
            (
                "WEEKLY METRICS",
                [
                    ("Current Week Active Riders", summary.week_active_riders),
                    ("Current Week Inactive Riders", summary.week_inactive_riders),
                ],
            ),
        ];

        let mut row = 2;
        for (title, metrics) in blocks {
            sheet.section(row, 0, title)?;
            row += 2;
            for (label, value) in metrics {
                sheet.label(row, 0, label)?;
                sheet.kpi(row, 1, value as f64, NumberFormat::Integer)?;
                row += 1;
            }
            row += 2;
        }

        sheet.widths(&[30.0, 15.0])?;
        Ok(sheet)
    }
}

/// Rider and status counts, then retention and churn, from `first_col`
fn lifecycle_counts(
    sheet: &mut SheetWriter<'_>,
    row: u32,
    first_col: u16,
    period: &LifecyclePeriod,
) -> Result<()> {
    let counts = [
        period.active,
        period.inactive,
        period.status_active,
        period.status_new,
        period.status_training,
        period.status_registered,
        period.total,
        period.new_joining,
    ];
    for (offset, count) in counts.iter().enumerate() {
        sheet.number(row, first_col + offset as u16, *count as f64, NumberFormat::Integer)?;
    }

    let rates_col = first_col + counts.len() as u16;
    for (offset, rate) in [period.retention, period.churn].iter().enumerate() {
        let col = rates_col + offset as u16;
        match rate {
            Some(value) => sheet.number(row, col, *value, NumberFormat::Points)?,
            None => sheet.text(row, col, MISSING)?,
        }
    }
    Ok(())
}

impl ReportGenerator for StatusDashboardReport {
    fn name(&self) -> &str {
        "status-dashboard"
    }

    fn validate(&self, input: &ReportInput) -> Result<()> {
        if input.status_summary.is_empty()
            && input.status_distribution.is_empty()
            && input.monthly_data.is_empty()
            && input.weekly_data.is_empty()
        {
            return Err(ReportError::EmptyDataset(NO_STATUS.into()));
        }
        Ok(())
    }

    fn build(
        &self,
        input: &ReportInput,
        _settings: &ReportSettings,
        output: &Path,
    ) -> Result<ReportOutcome> {
        let model = StatusModel::build(input);

        let mut workbook = ReportWorkbook::new();
        workbook.push(self.summary_sheet(&model)?);
        if !model.distribution.is_empty() {
            workbook.push(self.distribution_sheet(&model)?);
        }
        if !model.monthly.is_empty() {
            workbook.push(self.monthly_sheet(&model)?);
        }
        if !model.weekly.is_empty() {
            workbook.push(self.weekly_sheet(&model)?);
        }
        if !input.rider_metrics.is_empty() {
            workbook.push(self.rider_sheet(&model)?);
        }
        let sheets = workbook.sheet_names().to_vec();
        workbook.save(output)?;

        let mut metadata = Map::new();
        metadata.insert("mode".into(), json!(ReportMode::Static.as_str()));
        metadata.insert("sheets".into(), json!(sheets));
        metadata.insert(
            "data_summary".into(),
            json!({
                "total_mitras": model.summary.total_mitras,
                "statuses": model.distribution.len(),
                "months": model.monthly.len(),
                "weeks": model.weekly.len(),
            }),
        );

        Ok(ReportOutcome {
            message: "Mitra status dashboard exported successfully".into(),
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn input() -> ReportInput {
        ReportInput {
            status_summary: raw(json!({"totalMitras": 250, "trainingCount": 12, "pendingCount": 7})),
            rider_metrics: raw(json!({"currentActiveRiders": 140, "currentInactiveRiders": 30})),
            applied_filters: raw(json!({"year": "2025", "month": ""})),
            status_distribution: vec![
                raw(json!({"status": "New", "count": 20, "percentage": 8})),
                raw(json!({"status": "Active", "count": 180, "percentage": 72})),
                raw(json!({"status": "Resigned", "count": 50, "percentage": 20})),
            ],
            monthly_data: vec![
                raw(json!({"month": "January", "year": 2025, "riderActiveCount": 60, "total": 200})),
                raw(json!({"month": "February", "year": 2025, "riderActiveCount": 40, "total": 250})),
            ],
            weekly_data: vec![raw(json!({"week": "W1", "activeCount": 0, "retentionRate": 90}))],
            ..Default::default()
        }
    }

    // ========== validate ==========

    #[test]
    fn test_validate_needs_any_block() {
        let err = StatusDashboardReport::default()
            .validate(&ReportInput::default())
            .unwrap_err();
        assert_eq!(err.to_string(), NO_STATUS);
        assert!(err.details().unwrap().contains("status data"));

        let only_weekly = ReportInput {
            weekly_data: vec![raw(json!({"week": "W1"}))],
            ..Default::default()
        };
        assert!(StatusDashboardReport::default().validate(&only_weekly).is_ok());
    }

    // ========== model ==========

    #[test]
    fn test_distribution_sorted_by_count() {
        let model = StatusModel::build(&input());
        let statuses: Vec<&str> = model.distribution.iter().map(|s| s.status.as_str()).collect();
        assert_eq!(statuses, vec!["Active", "Resigned", "New"]);
    }

    #[test]
    fn test_filters_fall_back_to_all() {
        let model = StatusModel::build(&input());
        assert_eq!(
            model.filters,
            [
                "2025".to_string(),
                "All Months".to_string(),
                "All Weeks".to_string()
            ]
        );
    }

    #[test]
    fn test_monthly_growth_and_activity() {
        let model = StatusModel::build(&input());
        assert_eq!(model.monthly[0].growth_from(None), None);
        let growth = model.monthly[1].growth_from(Some(&model.monthly[0])).unwrap();
        assert!((growth - 0.25).abs() < 1e-9);
        assert_eq!(activity_level(model.monthly[0].active), "High Activity");
        assert_eq!(activity_level(model.monthly[1].active), "Moderate");
    }

    // ========== build ==========

    #[test]
    fn test_build_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.xlsx");
        let outcome = StatusDashboardReport::default()
            .generate(&input(), &ReportSettings::default(), &path)
            .unwrap();

        assert!(path.exists());
        assert_eq!(outcome.message, "Mitra status dashboard exported successfully");
        assert_eq!(
            outcome.metadata["sheets"],
            json!([
                "Executive Summary",
                "Status Distribution",
                "Monthly Trends",
                "Weekly Trends",
                "Rider Metrics"
            ])
        );
        assert_eq!(outcome.metadata["data_summary"]["total_mitras"], 250);
    }

    #[test]
    fn test_build_skips_missing_blocks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.xlsx");
        let input = ReportInput {
            status_summary: raw(json!({"totalMitras": 3})),
            ..Default::default()
        };
        let outcome = StatusDashboardReport::default()
            .generate(&input, &ReportSettings::default(), &path)
            .unwrap();
        assert_eq!(outcome.metadata["sheets"], json!(["Executive Summary"]));
    }
}
