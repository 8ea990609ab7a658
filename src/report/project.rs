//! Project analysis report: unique mitras per project (client, hub, year)
//! and period, built from Title Case `shipmentData` rows.
//!
//! Static mode writes pre-aggregated values and keeps only a capped,
//! hidden sample of the raw rows. Formula mode writes every raw row and
//! computes each count with distinct-count formulas against them.

use std::path::Path;

use serde_json::{json, Map, Value};

use super::formula::{banded, Criterion};
use super::raw::{
    counted_rows, raw_range, raw_sheet, RAW_CLIENT, RAW_HUB, RAW_MITRA, RAW_PERIOD, RAW_YEAR,
};
use super::workbook::{cell_ref, column_letter, sheet_ref, DataRange, ReportWorkbook, SheetWriter};
use super::{NumberFormat, ReportGenerator, ReportOutcome, StyleConfig};
use crate::config::{ReportMode, ReportSettings};
use crate::parsers::{LayoutRegistry, RecordLayout};
use crate::services::{top_n_by, Aggregator, HubCapacity, ProjectTier, ReportInput};
use crate::types::{present, PeriodType, ProjectAnalysis, ReportError, Result, ShipmentRecord, MISSING};

const NO_SHIPMENTS: &str =
    "No shipment data available. Cannot generate report without shipment data.";

const LAYOUT: &str = "title_case";

const SUMMARY_SHEET: &str = "Analysis Summary";
const PERIODS_SHEET: &str = "Project Periods";
const PERIODS_HEADER_ROW: u32 = 5;
/// Key metrics on the summary sheet start here (0-based, column B)
const SUMMARY_METRICS_ROW: u32 = 5;

/// Pre-computed tables of the project workbook
#[derive(Debug, Clone)]
pub(crate) struct ProjectModel {
    pub period_type: PeriodType,
    /// Input order
    pub records: Vec<ShipmentRecord>,
    pub analysis: ProjectAnalysis,
    /// `(client, unique mitras)`, largest first
    pub top_clients: Vec<(String, usize)>,
    /// Indices into `analysis.rows`, largest total first
    pub top_rows: Vec<usize>,
    /// `(hub, unique mitras)` for named hubs, largest first
    pub hubs: Vec<(String, usize)>,
    pub top_hubs: usize,
    /// Raw rows written to the workbook
    pub raw_rows: usize,
}

impl ProjectModel {
    pub fn build(
        input: &ReportInput,
        settings: &ReportSettings,
        layout: &dyn RecordLayout,
    ) -> Self {
        let records = layout.parse_all(&input.shipments);
        let analysis = Aggregator::project_analysis(&records, input.period_type);
        let top = &settings.top_n;

        let top_clients = top_n_by(&analysis.client_totals, top.top_projects, |(_, c)| *c as f64)
            .into_iter()
            .cloned()
            .collect();

        let totals: Vec<(usize, usize)> = analysis
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (idx, row.total))
            .collect();
        let top_rows = top_n_by(&totals, top.project_rows, |(_, t)| *t as f64)
            .into_iter()
            .map(|(idx, _)| *idx)
            .collect();

        let named_hubs: Vec<(String, usize)> = analysis
            .hub_totals
            .iter()
            .filter(|(hub, _)| present(hub).is_some())
            .cloned()
            .collect();
        let hubs = top_n_by(&named_hubs, named_hubs.len(), |(_, c)| *c as f64)
            .into_iter()
            .cloned()
            .collect();

        let raw_rows = match settings.mode {
            ReportMode::Static => records.len().min(settings.raw_row_cap),
            ReportMode::Formula => records.len(),
        };

        Self {
            period_type: input.period_type,
            records,
            analysis,
            top_clients,
            top_rows,
            hubs,
            top_hubs: top.top_hubs,
            raw_rows,
        }
    }

    /// 1-based range of the raw sheet data rows
    fn raw_range(&self) -> DataRange {
        raw_range(self.raw_rows)
    }

    /// Column of the per-project total on the periods sheet
    fn total_col(&self) -> u16 {
        3 + self.analysis.columns.len() as u16
    }
}

fn metadata_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Project analysis workbook
pub struct ProjectReport {
    style: StyleConfig,
    layouts: LayoutRegistry,
}

impl Default for ProjectReport {
    fn default() -> Self {
        Self::new(StyleConfig::default(), LayoutRegistry::new())
    }
}

impl ProjectReport {
    pub fn new(style: StyleConfig, layouts: LayoutRegistry) -> Self {
        Self { style, layouts }
    }

    fn metadata_sheet(
        &self,
        input: &ReportInput,
        model: &ProjectModel,
        settings: &ReportSettings,
    ) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Metadata", &self.style)?;
        sheet.activate();

        let (title, subtitle) = match settings.mode {
            ReportMode::Static => (
                "PROJECT ANALYSIS - PRE-AGGREGATED REPORT",
                "Optimized with Pre-calculated Aggregations",
            ),
            ReportMode::Formula => (
                "PROJECT ANALYSIS - FORMULA-BASED REPORT",
                "Dynamic Excel Formulas",
            ),
        };
        sheet.title(0, title, 18.0, 5)?;
        sheet.note(
            1,
            0,
            &format!("Period Type: {} | {}", model.period_type.title(), subtitle),
        )?;
        sheet.section(3, 0, "REPORT INFORMATION")?;

        let mut row = 5;
        for (key, value) in &input.metadata {
            sheet.label(row, 0, &format!("{}:", key))?;
            sheet.text(row, 1, &metadata_value(value))?;
            row += 1;
        }

        row += 2;
        let notes: Vec<String> = match settings.mode {
            ReportMode::Static => vec![
                "Unique counts are calculated while the report is generated".into(),
                "Sheets hold static values, so the file opens without recalculation".into(),
                format!(
                    "Raw data sheet is hidden and limited to {} rows",
                    settings.raw_row_cap
                ),
            ],
            ReportMode::Formula => vec![
                "Every count is an Excel formula over the raw data sheet".into(),
                "Values recalculate when raw rows change".into(),
                "Distinct mitras are counted with SUMPRODUCT and COUNTIFS".into(),
            ],
        };
        sheet.section(row, 0, "REPORT NOTES")?;
        for note in notes {
            row += 1;
            sheet.text(row, 0, &note)?;
        }

        sheet.uniform_width(6, 25.0)?;
        Ok(sheet)
    }

    fn summary_sheet(&self, model: &ProjectModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let analysis = &model.analysis;
        let range = model.raw_range();
        let mut sheet = SheetWriter::new(SUMMARY_SHEET, &self.style)?;

        sheet.title(0, &format!("ANALYSIS SUMMARY - {}", period), 16.0, 5)?;
        sheet.section(3, 0, "KEY METRICS")?;

        let avg_formula = format!(
            "=IF({p}=0,0,ROUND({m}/{p},2))",
            p = cell_ref(SUMMARY_METRICS_ROW, 1),
            m = cell_ref(SUMMARY_METRICS_ROW + 2, 1)
        );
        let metrics = [
            (
                "Total Projects",
                analysis.unique_projects as f64,
                counted_rows(&range).distinct_count(RAW_CLIENT)?,
                NumberFormat::Integer,
            ),
            (
                "Total Hubs",
                analysis.unique_hubs as f64,
                counted_rows(&range)
                    .with(RAW_HUB, Criterion::NotText(MISSING.into()))
                    .distinct_count(RAW_HUB)?,
                NumberFormat::Integer,
            ),
            (
                "Total Unique Mitras",
                analysis.unique_mitras as f64,
                counted_rows(&range).distinct_count(RAW_MITRA)?,
                NumberFormat::Integer,
            ),
            (
                "Total Records",
                analysis.total_records as f64,
                counted_rows(&range).count()?,
                NumberFormat::Integer,
            ),
            (
                "Avg Mitras per Project",
                analysis.avg_mitras_per_project(),
                avg_formula,
                NumberFormat::Decimal,
            ),
        ];
        for (idx, (label, value, formula, format)) in metrics.iter().enumerate() {
            let row = SUMMARY_METRICS_ROW + idx as u32;
            sheet.label(row, 0, &format!("{}:", label))?;
            match mode {
                ReportMode::Static => sheet.kpi(row, 1, *value, *format)?,
                ReportMode::Formula => sheet.kpi_formula(row, 1, formula, *format)?,
            }
        }

        let mut row = SUMMARY_METRICS_ROW + metrics.len() as u32 + 2;
        sheet.section(row, 0, "TOP PERFORMING PROJECTS")?;
        row += 1;
        sheet.header_row(row, 0, &["Rank", "Project", "Total Unique Mitras"])?;
        for (idx, (client, count)) in model.top_clients.iter().enumerate() {
            row += 1;
            sheet.number(row, 0, (idx + 1) as f64, NumberFormat::Count)?;
            sheet.label(row, 1, client)?;
            match mode {
                ReportMode::Static => sheet.number(row, 2, *count as f64, NumberFormat::Count)?,
                ReportMode::Formula => {
                    let formula = counted_rows(&range)
                        .with(RAW_CLIENT, Criterion::EqualsCell(format!("$B{}", row + 1)))
                        .with(RAW_PERIOD, Criterion::NotText(MISSING.into()))
                        .distinct_count(RAW_MITRA)?;
                    sheet.formula(row, 2, &formula, NumberFormat::Count)?;
                }
            }
        }

        row += 3;
        sheet.section(row, 0, "UNIQUE MITRAS BY PERIOD")?;
        row += 1;
        sheet.header_row(row, 0, &["Period", "Unique Mitras"])?;
        for (label, count) in &analysis.period_totals {
            row += 1;
            sheet.text(row, 0, label)?;
            match mode {
                ReportMode::Static => sheet.number(row, 1, *count as f64, NumberFormat::Count)?,
                ReportMode::Formula => {
                    let formula = counted_rows(&range)
                        .with(RAW_PERIOD, Criterion::EqualsCell(format!("$A{}", row + 1)))
                        .distinct_count(RAW_MITRA)?;
                    sheet.formula(row, 1, &formula, NumberFormat::Count)?;
                }
            }
        }

        sheet.uniform_width(6, 20.0)?;
        Ok(sheet)
    }

    fn periods_sheet(&self, model: &ProjectModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let analysis = &model.analysis;
        let range = &model.raw_range();
        let total_col = model.total_col();
        let mut sheet = SheetWriter::new(PERIODS_SHEET, &self.style)?;

        sheet.title(0, &format!("PROJECT PERIODS - {}", period), 16.0, total_col.max(5))?;
        sheet.note(1, 0, "Unique mitras per project, hub and year")?;
        sheet.section(3, 0, "COMPLETE PROJECT ANALYSIS")?;

        let mut headers: Vec<&str> = vec!["Project", "Hub", "Year"];
        headers.extend(analysis.columns.iter().map(|c| c.label.as_str()));
        headers.push("Total");
        sheet.header_row(PERIODS_HEADER_ROW, 0, &headers)?;

        for (idx, project) in analysis.rows.iter().enumerate() {
            let row = PERIODS_HEADER_ROW + 1 + idx as u32;
            let excel_row = row + 1;
            sheet.text(row, 0, &project.key.client)?;
            sheet.text(row, 1, &project.key.hub)?;
            sheet.number(row, 2, f64::from(project.key.year), NumberFormat::Count)?;

            let key_filter = || {
                counted_rows(range)
                    .with(RAW_CLIENT, Criterion::EqualsCell(format!("$A{}", excel_row)))
                    .with(RAW_HUB, Criterion::EqualsCell(format!("$B{}", excel_row)))
                    .with(RAW_YEAR, Criterion::EqualsCell(format!("$C{}", excel_row)))
            };

            for (offset, column) in analysis.columns.iter().enumerate() {
                let col = 3 + offset as u16;
                match mode {
                    ReportMode::Static => {
                        let count = project.count_for(&column.label);
                        sheet.number(row, col, count as f64, NumberFormat::Count)?;
                    }
                    ReportMode::Formula => {
                        let header = format!("{}${}", column_letter(col), PERIODS_HEADER_ROW + 1);
                        let formula = key_filter()
                            .with(RAW_PERIOD, Criterion::EqualsCell(header))
                            .distinct_count(RAW_MITRA)?;
                        sheet.formula(row, col, &formula, NumberFormat::Count)?;
                    }
                }
            }

            match mode {
                ReportMode::Static => {
                    sheet.kpi(row, total_col, project.total as f64, NumberFormat::Count)?
                }
                ReportMode::Formula => {
                    let formula = key_filter()
                        .with(RAW_PERIOD, Criterion::NotText(MISSING.into()))
                        .distinct_count(RAW_MITRA)?;
                    sheet.kpi_formula(row, total_col, &formula, NumberFormat::Count)?;
                }
            }
        }

        sheet.uniform_width(headers.len() as u16, 12.0)?;
        sheet.widths(&[22.0, 18.0])?;
        Ok(sheet)
    }

    fn top_projects_sheet(&self, model: &ProjectModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let analysis = &model.analysis;
        let mut sheet = SheetWriter::new("Top Projects", &self.style)?;

        sheet.title(0, &format!("TOP PROJECTS - {}", period), 16.0, 6)?;
        sheet.note(1, 0, "Strategic categorization by unique mitras")?;
        sheet.section(3, 0, "EXECUTIVE SUMMARY")?;

        let summary = [
            ("Total Projects:", analysis.unique_projects as f64, NumberFormat::Integer),
            ("Total Hubs:", analysis.unique_hubs as f64, NumberFormat::Integer),
            ("Total Unique Mitras:", analysis.unique_mitras as f64, NumberFormat::Integer),
            ("Total Records:", analysis.total_records as f64, NumberFormat::Integer),
            ("Avg Mitras per Project:", analysis.avg_mitras_per_project(), NumberFormat::Decimal),
        ];
        for (idx, (label, value, format)) in summary.into_iter().enumerate() {
            let row = 5 + idx as u32;
            sheet.label(row, 0, label)?;
            match mode {
                ReportMode::Static => sheet.kpi(row, 1, value, format)?,
                ReportMode::Formula => {
                    let source = cell_ref(SUMMARY_METRICS_ROW + idx as u32, 1);
                    let formula = format!("={}!{}", sheet_ref(SUMMARY_SHEET), source);
                    sheet.kpi_formula(row, 1, &formula, format)?
                }
            }
        }

        sheet.section(12, 0, "PROJECT PERFORMANCE WITH STRATEGIC CATEGORIZATION")?;
        sheet.header_row(
            14,
            0,
            &[
                "Project",
                "Hub",
                "Year",
                "Total Unique Mitras",
                "Strategic Value",
                "Investment Priority",
                "Action Plan",
            ],
        )?;

        let total_letter = column_letter(model.total_col());
        let high = ProjectTier::KEY_THRESHOLD;
        let mid = ProjectTier::GROWING_THRESHOLD;
        let (key, growing, standard) = (ProjectTier::Key, ProjectTier::Growing, ProjectTier::Standard);

        for (idx, &source_idx) in model.top_rows.iter().enumerate() {
            let row = 15 + idx as u32;
            let project = &analysis.rows[source_idx];
            sheet.text(row, 0, &project.key.client)?;
            sheet.text(row, 1, &project.key.hub)?;
            sheet.number(row, 2, f64::from(project.key.year), NumberFormat::Count)?;

            match mode {
                ReportMode::Static => {
                    let tier = ProjectTier::from_unique_mitras(project.total);
                    sheet.kpi(row, 3, project.total as f64, NumberFormat::Count)?;
                    sheet.text(row, 4, tier.strategic_value())?;
                    sheet.text(row, 5, tier.investment_priority())?;
                    sheet.note(row, 6, tier.action_plan())?;
                }
                ReportMode::Formula => {
                    let source_row = PERIODS_HEADER_ROW + 2 + source_idx as u32;
                    let total = format!("={}!{}{}", sheet_ref(PERIODS_SHEET), total_letter, source_row);
                    sheet.kpi_formula(row, 3, &total, NumberFormat::Count)?;

                    let d = cell_ref(row, 3);
                    let bands = [
                        (key.strategic_value(), growing.strategic_value(), standard.strategic_value()),
                        (
                            key.investment_priority(),
                            growing.investment_priority(),
                            standard.investment_priority(),
                        ),
                        (key.action_plan(), growing.action_plan(), standard.action_plan()),
                    ];
                    for (offset, (h, m, l)) in bands.into_iter().enumerate() {
                        let formula = banded(&d, (high, h), (mid, m), l);
                        sheet.text_formula(row, 4 + offset as u16, &formula)?;
                    }
                }
            }
        }

        sheet.uniform_width(7, 20.0)?;
        sheet.widths(&[24.0, 18.0, 10.0, 18.0, 18.0, 18.0, 55.0])?;
        Ok(sheet)
    }

    fn hub_sheet(&self, model: &ProjectModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let range = model.raw_range();
        let mut sheet = SheetWriter::new("Hub Summary", &self.style)?;

        sheet.title(0, &format!("HUB SUMMARY - {}", period), 16.0, 6)?;
        sheet.section(3, 0, "HUB PERFORMANCE ANALYSIS")?;
        sheet.header_row(5, 0, &["Hub", "Total Unique Mitras"])?;

        for (idx, (hub, count)) in model.hubs.iter().enumerate() {
            let row = 6 + idx as u32;
            sheet.label(row, 0, hub)?;
            match mode {
                ReportMode::Static => sheet.number(row, 1, *count as f64, NumberFormat::Count)?,
                ReportMode::Formula => {
                    let formula = counted_rows(&range)
                        .with(RAW_HUB, Criterion::EqualsCell(format!("$A{}", row + 1)))
                        .with(RAW_PERIOD, Criterion::NotText(MISSING.into()))
                        .distinct_count(RAW_MITRA)?;
                    sheet.formula(row, 1, &formula, NumberFormat::Count)?;
                }
            }
        }

        let section = 6 + model.hubs.len() as u32 + 2;
        sheet.section(section, 0, "OPERATIONAL INSIGHTS")?;
        let header = section + 2;
        sheet.header_row(
            header,
            0,
            &[
                "Hub",
                "Total Unique Mitras",
                "Operational Status",
                "Resource Allocation",
                "Priority",
            ],
        )?;

        let high = HubCapacity::HIGH_THRESHOLD;
        let mid = HubCapacity::MEDIUM_THRESHOLD;
        let (h, m, l) = (HubCapacity::High, HubCapacity::Medium, HubCapacity::Low);

        for (idx, (hub, count)) in model.hubs.iter().take(model.top_hubs).enumerate() {
            let row = header + 1 + idx as u32;
            sheet.text(row, 0, hub)?;
            match mode {
                ReportMode::Static => {
                    let capacity = HubCapacity::from_unique_mitras(*count);
                    sheet.number(row, 1, *count as f64, NumberFormat::Count)?;
                    sheet.text(row, 2, capacity.status())?;
                    sheet.text(row, 3, capacity.resource_allocation())?;
                    sheet.text(row, 4, capacity.priority())?;
                }
                ReportMode::Formula => {
                    let source = cell_ref(6 + idx as u32, 1);
                    sheet.formula(row, 1, &format!("={}", source), NumberFormat::Count)?;
                    let b = cell_ref(row, 1);
                    let bands = [
                        (h.status(), m.status(), l.status()),
                        (h.resource_allocation(), m.resource_allocation(), l.resource_allocation()),
                        (h.priority(), m.priority(), l.priority()),
                    ];
                    for (offset, (hi, me, lo)) in bands.into_iter().enumerate() {
                        let formula = banded(&b, (high, hi), (mid, me), lo);
                        sheet.text_formula(row, 2 + offset as u16, &formula)?;
                    }
                }
            }
        }

        sheet.uniform_width(5, 20.0)?;
        sheet.widths(&[20.0, 20.0, 22.0, 45.0, 12.0])?;
        Ok(sheet)
    }
}

impl ReportGenerator for ProjectReport {
    fn name(&self) -> &str {
        "project"
    }

    fn validate(&self, input: &ReportInput) -> Result<()> {
        if input.shipments.is_empty() {
            return Err(ReportError::EmptyDataset(NO_SHIPMENTS.into()));
        }
        Ok(())
    }

    fn build(
        &self,
        input: &ReportInput,
        settings: &ReportSettings,
        output: &Path,
    ) -> Result<ReportOutcome> {
        let layout = self.layouts.resolve(settings.layout_name(LAYOUT))?;
        let model = ProjectModel::build(input, settings, layout);
        let mode = settings.mode;

        let mut workbook = ReportWorkbook::new();
        workbook.push(self.metadata_sheet(input, &model, settings)?);
        workbook.push(self.summary_sheet(&model, mode)?);
        workbook.push(self.periods_sheet(&model, mode)?);
        workbook.push(self.top_projects_sheet(&model, mode)?);
        workbook.push(self.hub_sheet(&model, mode)?);
        workbook.push(raw_sheet(
            &self.style,
            &model.records,
            model.raw_rows,
            model.period_type,
            mode == ReportMode::Static,
        )?);
        workbook.save(output)?;

        let message = match mode {
            ReportMode::Static => "Optimized project analysis created successfully",
            ReportMode::Formula => "Formula-based project analysis created successfully",
        };

        let mut metadata = Map::new();
        metadata.insert("mode".into(), json!(mode.as_str()));
        metadata.insert("period_type".into(), json!(model.period_type.as_str()));
        metadata.insert(
            "optimization".into(),
            json!({
                "technique": match mode {
                    ReportMode::Static => "Pre-aggregation",
                    ReportMode::Formula => "Excel formulas",
                },
                "raw_rows_written": model.raw_rows,
                "raw_rows_total": model.records.len(),
                "raw_sheet_hidden": mode == ReportMode::Static,
                "project_combinations": model.analysis.rows.len(),
            }),
        );

        Ok(ReportOutcome {
            message: message.to_string(),
            metadata,
        })
    }
}
