//! Delivery performance dashboard over pre-summarized location rows.
//!
//! The upstream export already carries every percentage, so the workbook
//! holds values only.

use std::path::Path;

use serde_json::{json, Map};

use super::task_analytics::section_title;
use super::workbook::{ReportWorkbook, SheetWriter};
use super::{NumberFormat, ReportGenerator, ReportOutcome, StyleConfig};
use crate::config::{ReportMode, ReportSettings};
use crate::parsers::{parse_insights, parse_location_performance, parse_summary_metrics};
use crate::services::{top_n_by, MetricStatus, ReportInput};
use crate::types::{Insight, InsightCategory, LocationPerformance, ReportError, Result, SummaryMetric};

const NO_PERFORMANCE: &str =
    "No performance data available. Cannot generate report without performance data.";

/// Pre-computed tables of the delivery dashboard
#[derive(Debug, Clone)]
pub(crate) struct DeliveryModel {
    pub metrics: Vec<SummaryMetric>,
    /// Best on-time percentage first
    pub locations: Vec<LocationPerformance>,
    /// `(level, locations)` in order of first appearance
    pub levels: Vec<(String, usize)>,
    /// Insight sections in display order, each sorted for its section
    pub sections: Vec<(InsightCategory, Vec<Insight>)>,
}

impl DeliveryModel {
    pub fn build(input: &ReportInput) -> Self {
        let parsed = parse_location_performance(&input.performance_data);
        let locations: Vec<LocationPerformance> =
            top_n_by(&parsed, parsed.len(), |l| l.on_time_pct)
                .into_iter()
                .cloned()
                .collect();

        let mut levels: Vec<(String, usize)> = Vec::new();
        for location in &locations {
            match levels.iter_mut().find(|(level, _)| *level == location.performance_level) {
                Some((_, count)) => *count += 1,
                None => levels.push((location.performance_level.clone(), 1)),
            }
        }

        let insights = parse_insights(&input.insights_data);
        let sections: Vec<(InsightCategory, Vec<Insight>)> = InsightCategory::SECTIONS
            .into_iter()
            .map(|category| {
                let items: Vec<Insight> = insights
                    .iter()
                    .filter(|i| i.category == category)
                    .cloned()
                    .collect();
                let sorted = match category {
                    InsightCategory::PriorityArea => top_n_by(&items, items.len(), |i| -i.percentage),
                    InsightCategory::VolumeLeader => top_n_by(&items, items.len(), |i| i.volume),
                    _ => top_n_by(&items, items.len(), |i| i.percentage),
                };
                let sorted: Vec<Insight> = sorted.into_iter().cloned().collect();
                (category, sorted)
            })
            .collect();

        Self {
            metrics: parse_summary_metrics(&input.summary_data),
            locations,
            levels,
            sections,
        }
    }
}

/// Status of a summary metric; only percentages are graded
fn metric_status(metric: &SummaryMetric) -> &'static str {
    if metric.is_percentage() {
        MetricStatus::from_percentage(metric.value).label()
    } else {
        MetricStatus::Excellent.label()
    }
}

/// Delivery performance dashboard
#[derive(Default)]
pub struct DeliveryPerformanceReport {
    style: StyleConfig,
}

impl DeliveryPerformanceReport {
    pub fn new(style: StyleConfig) -> Self {
        Self { style }
    }

    fn overview_sheet(&self, model: &DeliveryModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Dashboard Overview", &self.style)?;
        sheet.activate();

        sheet.title(1, "PERFORMANCE ANALYTICS DASHBOARD", 20.0, 6)?;
        sheet.note(2, 1, "Comprehensive Delivery Performance Report")?;
        sheet.label(5, 1, "Report Period:")?;
        sheet.text(5, 2, "Current Month")?;
        sheet.label(6, 1, "Department:")?;
        sheet.text(6, 2, "Operations & Logistics")?;

        if !model.metrics.is_empty() {
            sheet.section(8, 1, "KEY METRICS OVERVIEW")?;
            for (idx, metric) in model.metrics.iter().take(4).enumerate() {
                let row = 10 + 2 * idx as u32;
                sheet.label(row, 1, &metric.metric)?;
                let format = if metric.is_percentage() {
                    NumberFormat::Points
                } else {
                    NumberFormat::Integer
                };
                sheet.kpi(row, 2, metric.value, format)?;
                sheet.note(row, 3, &metric.unit)?;
            }
        }

        sheet.section(19, 1, "REPORT SECTIONS")?;
        let sections = [
            ("Executive Summary", "High-level overview and key insights"),
            ("Performance Analysis", "Detailed performance metrics by location"),
            ("Strategic Insights", "Top performers and improvement areas"),
        ];
        for (idx, (name, description)) in sections.iter().enumerate() {
            let row = 21 + idx as u32;
            sheet.label(row, 1, &format!("• {}", name))?;
            sheet.note(row, 2, description)?;
        }

        sheet.widths(&[2.0, 25.0, 30.0, 15.0, 15.0, 15.0, 15.0])?;
        Ok(sheet)
    }

    fn executive_sheet(&self, model: &DeliveryModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Executive Summary", &self.style)?;
        sheet.title(0, "EXECUTIVE SUMMARY", 16.0, 4)?;
        sheet.header_row(3, 0, &["Metric", "Value", "Unit", "Status", "Description"])?;

        for (idx, metric) in model.metrics.iter().enumerate() {
            let row = 4 + idx as u32;
            sheet.label(row, 0, &metric.metric)?;
            let format = if metric.is_percentage() {
                NumberFormat::Points
            } else {
                NumberFormat::Integer
            };
            sheet.number(row, 1, metric.value, format)?;
            sheet.text(row, 2, &metric.unit)?;
            let status = metric_status(metric);
            if status == MetricStatus::NeedsAttention.label() {
                sheet.alert(row, 3, status)?;
            } else {
                sheet.text(row, 3, status)?;
            }
            sheet.note(row, 4, &metric.description)?;
        }

        sheet.widths(&[28.0, 16.0, 12.0, 18.0, 50.0])?;
        Ok(sheet)
    }

    fn performance_sheet(&self, model: &DeliveryModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Performance Analysis", &self.style)?;
        sheet.title(0, "PERFORMANCE ANALYSIS BY LOCATION", 16.0, 7)?;
        sheet.note(1, 0, &format!("Total Locations: {}", model.locations.len()))?;
        sheet.header_row(
            3,
            0,
            &[
                "Rank",
                "Location",
                "Category",
                "Total Shipments",
                "Late Shipments",
                "On Time %",
                "Late %",
                "Performance Level",
            ],
        )?;

        for (idx, location) in model.locations.iter().enumerate() {
            let row = 4 + idx as u32;
            sheet.number(row, 0, (idx + 1) as f64, NumberFormat::Count)?;
            sheet.label(row, 1, &location.short_name)?;
            sheet.text(row, 2, &location.category)?;
            sheet.number(row, 3, location.total_shipments as f64, NumberFormat::Integer)?;
            sheet.number(row, 4, location.late_shipments as f64, NumberFormat::Integer)?;
            sheet.number(row, 5, location.on_time_pct, NumberFormat::Points)?;
            sheet.number(row, 6, location.late_pct, NumberFormat::Points)?;
            sheet.text(row, 7, &location.performance_level)?;
        }

        let section = 4 + model.locations.len() as u32 + 2;
        sheet.section(section, 0, "PERFORMANCE LEVEL DISTRIBUTION")?;
        sheet.header_row(section + 1, 0, &["Level", "Locations"])?;
        for (idx, (level, count)) in model.levels.iter().enumerate() {
            let row = section + 2 + idx as u32;
            sheet.text(row, 0, level)?;
            sheet.number(row, 1, *count as f64, NumberFormat::Count)?;
        }

        sheet.widths(&[8.0, 30.0, 18.0, 16.0, 14.0, 12.0, 12.0, 20.0])?;
        Ok(sheet)
    }

    fn insights_sheet(&self, model: &DeliveryModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Strategic Insights", &self.style)?;
        sheet.title(0, "STRATEGIC INSIGHTS & RECOMMENDATIONS", 16.0, 6)?;
        sheet.header_row(
            2,
            0,
            &["Category", "Location", "Short Name", "Volume", "On Time %", "Late %", "Performance"],
        )?;

        let mut row = 3;
        for (category, items) in &model.sections {
            if items.is_empty() {
                continue;
            }
            if *category == InsightCategory::PriorityArea {
                sheet.alert(row, 0, &section_title(*category))?;
            } else {
                sheet.section(row, 0, &section_title(*category))?;
            }
            row += 1;
            for item in items {
                sheet.text(row, 0, category.as_str())?;
                sheet.text(row, 1, &item.location)?;
                sheet.label(row, 2, &item.name)?;
                sheet.number(row, 3, item.volume, NumberFormat::Integer)?;
                sheet.number(row, 4, item.percentage, NumberFormat::Points)?;
                sheet.number(row, 5, 100.0 - item.percentage, NumberFormat::Points)?;
                sheet.text(row, 6, &item.performance_level)?;
                row += 1;
            }
            row += 1;
        }

        sheet.widths(&[22.0, 30.0, 24.0, 14.0, 12.0, 12.0, 20.0])?;
        Ok(sheet)
    }
}

impl ReportGenerator for DeliveryPerformanceReport {
    fn name(&self) -> &str {
        "delivery-performance"
    }

    fn validate(&self, input: &ReportInput) -> Result<()> {
        if input.performance_data.is_empty() {
            return Err(ReportError::EmptyDataset(NO_PERFORMANCE.into()));
        }
        Ok(())
    }

    fn build(
        &self,
        input: &ReportInput,
        _settings: &ReportSettings,
        output: &Path,
    ) -> Result<ReportOutcome> {
        let model = DeliveryModel::build(input);

        let mut workbook = ReportWorkbook::new();
        workbook.push(self.overview_sheet(&model)?);
        if !model.metrics.is_empty() {
            workbook.push(self.executive_sheet(&model)?);
        }
        workbook.push(self.performance_sheet(&model)?);
        if model.sections.iter().any(|(_, items)| !items.is_empty()) {
            workbook.push(self.insights_sheet(&model)?);
        }
        workbook.save(output)?;

        let mut metadata = Map::new();
        metadata.insert("mode".into(), json!(ReportMode::Static.as_str()));
        metadata.insert(
            "data_summary".into(),
            json!({
                "locations": model.locations.len(),
                "metrics": model.metrics.len(),
                "insights": model.sections.iter().map(|(_, items)| items.len()).sum::<usize>(),
            }),
        );

        Ok(ReportOutcome {
            message: "Professional dashboard created successfully".into(),
            metadata,
        })
    }
}
