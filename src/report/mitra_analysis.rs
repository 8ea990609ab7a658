//! Mitra analysis report: deliveries per mitra, client, hub and year across
//! periods, built from Title Case `shipmentData` rows.
//!
//! Counts are plain row counts (deliveries), unlike the project report's
//! distinct mitra counts. Static mode writes the aggregated values;
//! formula mode recomputes every count from the raw sheet.

use std::path::Path;

use serde_json::{json, Map, Value};

use super::formula::{banded, Criterion, RowFilter};
use super::raw::{
    counted_rows, raw_range, raw_sheet, RAW_CLIENT, RAW_HUB, RAW_MITRA, RAW_PERIOD, RAW_YEAR,
};
use super::workbook::{cell_ref, column_letter, sheet_ref, DataRange, ReportWorkbook, SheetWriter};
use super::{NumberFormat, ReportGenerator, ReportOutcome, StyleConfig};
use crate::config::{ReportMode, ReportSettings};
use crate::parsers::{LayoutRegistry, RecordLayout};
use crate::services::{top_n_by, Aggregator, HubVolume, PartnerTier, ReportInput};
use crate::types::{PartnerAnalysis, PeriodType, ReportError, Result, ShipmentRecord, MISSING};

const NO_SHIPMENTS: &str =
    "No shipment data available. Cannot generate report without shipment data.";

const LAYOUT: &str = "title_case";

const SUMMARY_SHEET: &str = "Analysis Summary";
const PERIODS_SHEET: &str = "Period Aggregation";
/// Key metrics on the summary sheet start here (0-based, column B)
const SUMMARY_METRICS_ROW: u32 = 5;
const PERIODS_HEADER_ROW: u32 = 5;
/// Mitra, Client, Hub, Year
const PERIODS_FIRST_COL: u16 = 4;

/// Pre-computed tables of the mitra analysis workbook
#[derive(Debug, Clone)]
pub(crate) struct MitraAnalysisModel {
    pub period_type: PeriodType,
    /// Input order
    pub records: Vec<ShipmentRecord>,
    pub analysis: PartnerAnalysis,
    /// `(mitra, deliveries)`, largest first
    pub top_mitras: Vec<(String, u64)>,
    /// `(hub, deliveries)` for named hubs, largest first
    pub hubs: Vec<(String, u64)>,
    pub top_hubs: usize,
    /// Raw rows written to the workbook
    pub raw_rows: usize,
}

impl MitraAnalysisModel {
    pub fn build(
        input: &ReportInput,
        settings: &ReportSettings,
        layout: &dyn RecordLayout,
    ) -> Self {
        let records = layout.parse_all(&input.shipments);
        let analysis = Aggregator::partner_deliveries(&records, input.period_type);
        let top = &settings.top_n;

        let top_mitras = top_n_by(&analysis.mitra_totals, top.top_performers, |(_, c)| *c as f64)
            .into_iter()
            .cloned()
            .collect();
        let hubs = top_n_by(&analysis.hub_totals, analysis.hub_totals.len(), |(_, c)| *c as f64)
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
            top_mitras,
            hubs,
            top_hubs: top.top_hubs,
            raw_rows,
        }
    }

    fn raw_range(&self) -> DataRange {
        raw_range(self.raw_rows)
    }

    /// Column of the per-combination total on the periods sheet
    fn total_col(&self) -> u16 {
        PERIODS_FIRST_COL + self.analysis.columns.len() as u16
    }

    /// Number of combinations per partner tier, highest tier first
    fn tier_counts(&self) -> [(PartnerTier, usize); 3] {
        let mut counts = [
            (PartnerTier::Key, 0),
            (PartnerTier::Growing, 0),
            (PartnerTier::Standard, 0),
        ];
        for row in &self.analysis.rows {
            let tier = PartnerTier::from_deliveries(row.total);
            if let Some(entry) = counts.iter_mut().find(|(t, _)| *t == tier) {
                entry.1 += 1;
            }
        }
        counts
    }
}

/// Rows that land in a period column
fn delivered_rows(range: &DataRange) -> RowFilter<'_> {
    counted_rows(range).with(RAW_PERIOD, Criterion::NotText(MISSING.into()))
}

/// Mitra analysis workbook
pub struct MitraAnalysisReport {
    style: StyleConfig,
    layouts: LayoutRegistry,
}

impl Default for MitraAnalysisReport {
    fn default() -> Self {
        Self::new(StyleConfig::default(), LayoutRegistry::new())
    }
}

impl MitraAnalysisReport {
    pub fn new(style: StyleConfig, layouts: LayoutRegistry) -> Self {
        Self { style, layouts }
    }

    fn metadata_sheet(
        &self,
        input: &ReportInput,
        model: &MitraAnalysisModel,
        mode: ReportMode,
    ) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Metadata", &self.style)?;
        sheet.activate();

        let (title, subtitle) = match mode {
            ReportMode::Static => (
                "MITRA ANALYSIS - PRE-AGGREGATED REPORT",
                "Values calculated while the report is generated",
            ),
            ReportMode::Formula => (
                "MITRA ANALYSIS - FORMULA-BASED REPORT",
                "All Values Calculated with Excel Formulas",
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
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            sheet.label(row, 0, &format!("{}:", key))?;
            sheet.text(row, 1, &value)?;
            row += 1;
        }

        row += 2;
        sheet.section(row, 0, "CALCULATION NOTES")?;
        let notes = match mode {
            ReportMode::Static => [
                "Delivery counts are aggregated per mitra, client, hub and year",
                "Rows without a mitra, client or valid delivery date are not counted",
                "Raw data sheet is hidden and holds a capped sample",
            ],
            ReportMode::Formula => [
                "Every delivery count is a SUMPRODUCT over the raw data sheet",
                "Rows without a mitra, client or valid delivery date are not counted",
                "Values recalculate when raw rows change",
            ],
        };
        for note in notes {
            row += 1;
            sheet.text(row, 0, note)?;
        }

        sheet.uniform_width(6, 25.0)?;
        Ok(sheet)
    }

    fn summary_sheet(&self, model: &MitraAnalysisModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let analysis = &model.analysis;
        let range = model.raw_range();
        let mut sheet = SheetWriter::new(SUMMARY_SHEET, &self.style)?;

        sheet.title(0, &format!("ANALYSIS SUMMARY - {}", period), 16.0, 5)?;
        sheet.section(3, 0, "KEY METRICS")?;

        let avg_formula = format!(
            "=IF({m}=0,0,ROUND({d}/{m},2))",
            m = cell_ref(SUMMARY_METRICS_ROW, 1),
            d = cell_ref(SUMMARY_METRICS_ROW + 3, 1)
        );
        let metrics = [
            (
                "Unique Mitras",
                analysis.unique_mitras as f64,
                delivered_rows(&range).distinct_count(RAW_MITRA)?,
                NumberFormat::Integer,
            ),
            (
                "Total Clients",
                analysis.unique_clients as f64,
                delivered_rows(&range).distinct_count(RAW_CLIENT)?,
                NumberFormat::Integer,
            ),
            (
                "Total Hubs",
                analysis.unique_hubs as f64,
                delivered_rows(&range)
                    .with(RAW_HUB, Criterion::NotText(MISSING.into()))
                    .distinct_count(RAW_HUB)?,
                NumberFormat::Integer,
            ),
            (
                "Total Deliveries",
                analysis.total_deliveries as f64,
                delivered_rows(&range).count()?,
                NumberFormat::Integer,
            ),
            (
                "Avg Deliveries per Mitra",
                analysis.avg_deliveries_per_mitra(),
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
        sheet.section(row, 0, "TOP MITRAS BY DELIVERIES")?;
        row += 1;
        sheet.header_row(row, 0, &["Rank", "Mitra Name", "Total Deliveries"])?;
        for (idx, (mitra, deliveries)) in model.top_mitras.iter().enumerate() {
            row += 1;
            sheet.number(row, 0, (idx + 1) as f64, NumberFormat::Count)?;
            sheet.label(row, 1, mitra)?;
            match mode {
                ReportMode::Static => {
                    sheet.number(row, 2, *deliveries as f64, NumberFormat::Integer)?
                }
                ReportMode::Formula => {
                    let formula = delivered_rows(&range)
                        .with(RAW_MITRA, Criterion::EqualsCell(format!("$B{}", row + 1)))
                        .count()?;
                    sheet.formula(row, 2, &formula, NumberFormat::Integer)?;
                }
            }
        }

        sheet.uniform_width(6, 22.0)?;
        Ok(sheet)
    }

    fn periods_sheet(&self, model: &MitraAnalysisModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let analysis = &model.analysis;
        let range = &model.raw_range();
        let total_col = model.total_col();
        let mut sheet = SheetWriter::new(PERIODS_SHEET, &self.style)?;

        sheet.title(0, &format!("PERIOD AGGREGATION - {}", period), 16.0, total_col.max(5))?;
        sheet.note(1, 0, "Deliveries per mitra, client, hub and year")?;
        sheet.section(3, 0, "DATA ANALYSIS DIVISION")?;

        let mut headers: Vec<&str> = vec!["Mitra Name", "Client", "Hub", "Year"];
        headers.extend(analysis.columns.iter().map(|c| c.label.as_str()));
        headers.push("Total");
        sheet.header_row(PERIODS_HEADER_ROW, 0, &headers)?;

        let first_data_row = PERIODS_HEADER_ROW + 1;
        for (idx, partner) in analysis.rows.iter().enumerate() {
            let row = first_data_row + idx as u32;
            let excel_row = row + 1;
            sheet.text(row, 0, &partner.key.mitra)?;
            sheet.text(row, 1, &partner.key.client)?;
            sheet.text(row, 2, &partner.key.hub)?;
            sheet.number(row, 3, f64::from(partner.key.year), NumberFormat::Count)?;

            for (offset, column) in analysis.columns.iter().enumerate() {
                let col = PERIODS_FIRST_COL + offset as u16;
                match mode {
                    ReportMode::Static => {
                        let count = partner.count_for(&column.label);
                        sheet.number(row, col, count as f64, NumberFormat::Integer)?;
                    }
                    ReportMode::Formula => {
                        let header = format!("{}${}", column_letter(col), PERIODS_HEADER_ROW + 1);
                        let formula = counted_rows(range)
                            .with(RAW_MITRA, Criterion::EqualsCell(format!("$A{}", excel_row)))
                            .with(RAW_CLIENT, Criterion::EqualsCell(format!("$B{}", excel_row)))
                            .with(RAW_HUB, Criterion::EqualsCell(format!("$C{}", excel_row)))
                            .with(RAW_YEAR, Criterion::EqualsCell(format!("$D{}", excel_row)))
                            .with(RAW_PERIOD, Criterion::EqualsCell(header))
                            .count()?;
                        sheet.formula(row, col, &formula, NumberFormat::Integer)?;
                    }
                }
            }

            match mode {
                ReportMode::Static => {
                    sheet.kpi(row, total_col, partner.total as f64, NumberFormat::Integer)?
                }
                ReportMode::Formula => {
                    let formula = format!(
                        "=SUM({}:{})",
                        cell_ref(row, PERIODS_FIRST_COL),
                        cell_ref(row, total_col - 1)
                    );
                    sheet.kpi_formula(row, total_col, &formula, NumberFormat::Integer)?;
                }
            }
        }

        let totals_row = first_data_row + analysis.rows.len() as u32;
        sheet.total_label(totals_row, 0, "Total")?;
        for (offset, (_, deliveries)) in analysis.period_totals.iter().enumerate() {
            let col = PERIODS_FIRST_COL + offset as u16;
            self.column_total(&mut sheet, mode, totals_row, col, *deliveries)?;
        }
        self.column_total(&mut sheet, mode, totals_row, total_col, analysis.total_deliveries)?;

        sheet.uniform_width(headers.len() as u16, 12.0)?;
        sheet.widths(&[20.0, 18.0, 16.0])?;
        Ok(sheet)
    }

    /// Totals row cell: the static value or a SUM over the data rows above
    fn column_total(
        &self,
        sheet: &mut SheetWriter<'_>,
        mode: ReportMode,
        totals_row: u32,
        col: u16,
        value: u64,
    ) -> Result<()> {
        match mode {
            ReportMode::Static => sheet.kpi(totals_row, col, value as f64, NumberFormat::Integer),
            ReportMode::Formula => {
                let first = PERIODS_HEADER_ROW + 1;
                let formula = if totals_row > first {
                    format!("=SUM({}:{})", cell_ref(first, col), cell_ref(totals_row - 1, col))
                } else {
                    "=0".to_string()
                };
                sheet.kpi_formula(totals_row, col, &formula, NumberFormat::Integer)
            }
        }
    }

    fn management_sheet(
        &self,
        model: &MitraAnalysisModel,
        mode: ReportMode,
    ) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let analysis = &model.analysis;
        let mut sheet = SheetWriter::new("Management Division", &self.style)?;

        sheet.title(0, &format!("MANAGEMENT DIVISION - {}", period), 16.0, 7)?;
        sheet.note(1, 0, "Strategic categorization by delivery volume")?;
        sheet.section(3, 0, "EXECUTIVE SUMMARY")?;

        let summary = [
            ("Unique Mitras:", analysis.unique_mitras as f64, NumberFormat::Integer),
            ("Total Clients:", analysis.unique_clients as f64, NumberFormat::Integer),
            ("Total Hubs:", analysis.unique_hubs as f64, NumberFormat::Integer),
            ("Total Deliveries:", analysis.total_deliveries as f64, NumberFormat::Integer),
            ("Avg Deliveries per Mitra:", analysis.avg_deliveries_per_mitra(), NumberFormat::Decimal),
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

        sheet.section(12, 0, "PARTNER PERFORMANCE WITH STRATEGIC CATEGORIZATION")?;
        let header = 14;
        sheet.header_row(
            header,
            0,
            &[
                "Mitra Name",
                "Client",
                "Hub",
                "Year",
                "Total Deliveries",
                "Strategic Value",
                "Investment Priority",
                "Action Plan",
            ],
        )?;

        let total_letter = column_letter(model.total_col());
        let high = PartnerTier::KEY_THRESHOLD;
        let mid = PartnerTier::GROWING_THRESHOLD;
        let (key, growing, standard) = (PartnerTier::Key, PartnerTier::Growing, PartnerTier::Standard);

        for (idx, partner) in analysis.rows.iter().enumerate() {
            let row = header + 1 + idx as u32;
            sheet.text(row, 0, &partner.key.mitra)?;
            sheet.text(row, 1, &partner.key.client)?;
            sheet.text(row, 2, &partner.key.hub)?;
            sheet.number(row, 3, f64::from(partner.key.year), NumberFormat::Count)?;

            match mode {
                ReportMode::Static => {
                    let tier = PartnerTier::from_deliveries(partner.total);
                    sheet.kpi(row, 4, partner.total as f64, NumberFormat::Integer)?;
                    sheet.text(row, 5, tier.category())?;
                    sheet.text(row, 6, tier.priority())?;
                    sheet.note(row, 7, tier.action())?;
                }
                ReportMode::Formula => {
                    let source_row = PERIODS_HEADER_ROW + 2 + idx as u32;
                    let total = format!("={}!{}{}", sheet_ref(PERIODS_SHEET), total_letter, source_row);
                    sheet.kpi_formula(row, 4, &total, NumberFormat::Integer)?;

                    let e = cell_ref(row, 4);
                    let bands = [
                        (key.category(), growing.category(), standard.category()),
                        (key.priority(), growing.priority(), standard.priority()),
                        (key.action(), growing.action(), standard.action()),
                    ];
                    for (offset, (h, m, l)) in bands.into_iter().enumerate() {
                        let formula = banded(&e, (high, h), (mid, m), l);
                        sheet.text_formula(row, 5 + offset as u16, &formula)?;
                    }
                }
            }
        }

        sheet.widths(&[20.0, 18.0, 16.0, 8.0, 16.0, 18.0, 18.0, 55.0])?;
        Ok(sheet)
    }

    fn operational_sheet(
        &self,
        model: &MitraAnalysisModel,
        mode: ReportMode,
    ) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let range = model.raw_range();
        let mut sheet = SheetWriter::new("Operational Division", &self.style)?;

        sheet.title(0, &format!("OPERATIONAL DIVISION - {}", period), 16.0, 4)?;
        sheet.note(1, 0, "Field operations by hub delivery volume")?;
        sheet.header_row(5, 0, &["Hub", "Total Deliveries"])?;

        for (idx, (hub, deliveries)) in model.hubs.iter().enumerate() {
            let row = 6 + idx as u32;
            sheet.label(row, 0, hub)?;
            match mode {
                ReportMode::Static => {
                    sheet.number(row, 1, *deliveries as f64, NumberFormat::Integer)?
                }
                ReportMode::Formula => {
                    let formula = delivered_rows(&range)
                        .with(RAW_HUB, Criterion::EqualsCell(format!("$A{}", row + 1)))
                        .count()?;
                    sheet.formula(row, 1, &formula, NumberFormat::Integer)?;
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
                "Total Deliveries",
                "Operational Status",
                "Resource Allocation",
                "Priority",
            ],
        )?;

        let high = HubVolume::HIGH_THRESHOLD;
        let mid = HubVolume::MEDIUM_THRESHOLD;
        let (h, m, l) = (HubVolume::High, HubVolume::Medium, HubVolume::Low);

        for (idx, (hub, deliveries)) in model.hubs.iter().take(model.top_hubs).enumerate() {
            let row = header + 1 + idx as u32;
            sheet.text(row, 0, hub)?;
            match mode {
                ReportMode::Static => {
                    let volume = HubVolume::from_deliveries(*deliveries);
                    sheet.number(row, 1, *deliveries as f64, NumberFormat::Integer)?;
                    sheet.text(row, 2, volume.status())?;
                    sheet.text(row, 3, volume.resource_action())?;
                    sheet.text(row, 4, volume.priority())?;
                }
                ReportMode::Formula => {
                    let source = cell_ref(6 + idx as u32, 1);
                    sheet.formula(row, 1, &format!("={}", source), NumberFormat::Integer)?;
                    let b = cell_ref(row, 1);
                    let bands = [
                        (h.status(), m.status(), l.status()),
                        (h.resource_action(), m.resource_action(), l.resource_action()),
                        (h.priority(), m.priority(), l.priority()),
                    ];
                    for (offset, (hi, me, lo)) in bands.into_iter().enumerate() {
                        let formula = banded(&b, (high, hi), (mid, me), lo);
                        sheet.text_formula(row, 2 + offset as u16, &formula)?;
                    }
                }
            }
        }

        sheet.widths(&[20.0, 18.0, 22.0, 45.0, 12.0])?;
        Ok(sheet)
    }

    fn period_deliveries_sheet(
        &self,
        model: &MitraAnalysisModel,
        mode: ReportMode,
    ) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let range = model.raw_range();
        let mut sheet = SheetWriter::new("Period Deliveries", &self.style)?;

        sheet.title(0, &format!("DELIVERIES BY PERIOD - {}", period), 16.0, 3)?;
        sheet.header_row(4, 0, &["Period", "Deliveries"])?;
        for (idx, (label, deliveries)) in model.analysis.period_totals.iter().enumerate() {
            let row = 5 + idx as u32;
            sheet.text(row, 0, label)?;
            match mode {
                ReportMode::Static => {
                    sheet.number(row, 1, *deliveries as f64, NumberFormat::Integer)?
                }
                ReportMode::Formula => {
                    let formula = counted_rows(&range)
                        .with(RAW_PERIOD, Criterion::EqualsCell(format!("$A{}", row + 1)))
                        .count()?;
                    sheet.formula(row, 1, &formula, NumberFormat::Integer)?;
                }
            }
        }

        sheet.widths(&[22.0, 16.0])?;
        Ok(sheet)
    }

    fn insights_sheet(&self, model: &MitraAnalysisModel) -> Result<SheetWriter<'_>> {
        let analysis = &model.analysis;
        let mut sheet = SheetWriter::new("Insights & Recommendations", &self.style)?;

        sheet.title(0, "COMPREHENSIVE INSIGHTS & RECOMMENDATIONS", 16.0, 7)?;
        sheet.note(
            1,
            0,
            &format!("Action plans for the {} period", model.period_type.as_str()),
        )?;

        let mut row = 3;
        sheet.section(row, 0, "KEY FINDINGS")?;
        let mut findings = Vec::new();
        if let Some((mitra, deliveries)) = model.top_mitras.first() {
            findings.push(format!("Top mitra: {} with {} deliveries", mitra, deliveries));
        }
        if let Some((hub, deliveries)) = model.hubs.first() {
            findings.push(format!("Busiest hub: {} with {} deliveries", hub, deliveries));
        }
        findings.push(format!(
            "{} deliveries across {} partner combinations",
            analysis.total_deliveries,
            analysis.rows.len()
        ));
        for (tier, count) in model.tier_counts() {
            findings.push(format!("{}: {} combinations", tier.category(), count));
        }
        for finding in findings {
            row += 1;
            sheet.text(row, 0, &format!("• {}", finding))?;
        }

        row += 2;
        sheet.section(row, 0, "MANAGEMENT DIVISION")?;
        let management = [
            format!(
                "Key Partner above {} deliveries, Growing Partner above {}, Standard otherwise",
                PartnerTier::KEY_THRESHOLD,
                PartnerTier::GROWING_THRESHOLD
            ),
            format!("Key Partner: {}", PartnerTier::Key.action()),
            format!("Growing Partner: {}", PartnerTier::Growing.action()),
            format!("Standard Partner: {}", PartnerTier::Standard.action()),
        ];
        for line in management {
            row += 1;
            sheet.text(row, 0, &format!("• {}", line))?;
        }

        row += 2;
        sheet.section(row, 0, "OPERATIONAL DIVISION")?;
        let operational = [
            format!(
                "High Volume Hub above {} deliveries, Medium above {}, Low otherwise",
                HubVolume::HIGH_THRESHOLD,
                HubVolume::MEDIUM_THRESHOLD
            ),
            format!("High volume: {}", HubVolume::High.resource_action()),
            format!("Medium volume: {}", HubVolume::Medium.resource_action()),
            format!("Low volume: {}", HubVolume::Low.resource_action()),
        ];
        for line in operational {
            row += 1;
            sheet.text(row, 0, &format!("• {}", line))?;
        }

        sheet.widths(&[90.0])?;
        Ok(sheet)
    }
}

impl ReportGenerator for MitraAnalysisReport {
    fn name(&self) -> &str {
        "mitra-analysis"
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
        let model = MitraAnalysisModel::build(input, settings, layout);
        let mode = settings.mode;

        let mut workbook = ReportWorkbook::new();
        workbook.push(self.metadata_sheet(input, &model, mode)?);
        workbook.push(self.summary_sheet(&model, mode)?);
        workbook.push(self.periods_sheet(&model, mode)?);
        workbook.push(self.management_sheet(&model, mode)?);
        workbook.push(self.operational_sheet(&model, mode)?);
        workbook.push(self.period_deliveries_sheet(&model, mode)?);
        workbook.push(self.insights_sheet(&model)?);
        workbook.push(raw_sheet(
            &self.style,
            &model.records,
            model.raw_rows,
            model.period_type,
            mode == ReportMode::Static,
        )?);
        workbook.save(output)?;

        let message = match mode {
            ReportMode::Static => "Mitra analysis created successfully",
            ReportMode::Formula => "Complete mitra analysis created with 100% Excel formulas",
        };

        let mut metadata = Map::new();
        metadata.insert("mode".into(), json!(mode.as_str()));
        metadata.insert("period_type".into(), json!(model.period_type.as_str()));
        metadata.insert(
            "analysis".into(),
            json!({
                "partner_combinations": model.analysis.rows.len(),
                "total_deliveries": model.analysis.total_deliveries,
                "unique_mitras": model.analysis.unique_mitras,
                "raw_rows_written": model.raw_rows,
                "raw_rows_total": model.records.len(),
            }),
        );

        Ok(ReportOutcome {
            message: message.to_string(),
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::TitleCaseLayout;
    use crate::types::RawRecord;
    use serde_json::json;
    use tempfile::TempDir;

    fn shipment(mitra: &str, client: &str, hub: &str, date: &str) -> RawRecord {
        json!({
            "Mitra Name": mitra,
            "Client Name": client,
            "Hub": hub,
            "Delivery Date": date,
            "Weekly": "January W1",
            "Cost": 12000,
            "SLA": "On Time",
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn input() -> ReportInput {
        ReportInput {
            period_type: PeriodType::Monthly,
            shipments: vec![
                shipment("Budi", "Sayurbox", "Cakung", "03/01/2025"),
                shipment("Budi", "Sayurbox", "Cakung", "04/01/2025"),
                shipment("Budi", "Sayurbox", "Cakung", "05/02/2025"),
                shipment("Sari", "Lazada", "Bekasi", "06/02/2025"),
                shipment("Sari", "Lazada", "Bekasi", "not a date"),
                shipment("-", "Lazada", "Bekasi", "07/02/2025"),
            ],
            ..Default::default()
        }
    }

    fn model(settings: &ReportSettings) -> MitraAnalysisModel {
        MitraAnalysisModel::build(&input(), settings, &TitleCaseLayout)
    }

    // ========== validate ==========

    #[test]
    fn test_validate_empty_shipments() {
        let err = MitraAnalysisReport::default()
            .validate(&ReportInput::default())
            .unwrap_err();
        assert_eq!(err.to_string(), NO_SHIPMENTS);
    }

    // ========== model ==========

    #[test]
    fn test_model_counts_deliveries() {
        let model = model(&ReportSettings::default());
        assert_eq!(model.analysis.total_deliveries, 4);
        assert_eq!(model.analysis.rows.len(), 2);
        assert_eq!(model.top_mitras[0], ("Budi".to_string(), 3));
        assert_eq!(model.hubs[0], ("Cakung".to_string(), 3));
        // Mitra, Client, Hub, Year, January, February
        assert_eq!(model.total_col(), 6);
    }

    #[test]
    fn test_tier_counts() {
        let mut model = model(&ReportSettings::default());
        model.analysis.rows[0].total = 120;
        let counts = model.tier_counts();
        assert_eq!(counts[0], (PartnerTier::Key, 1));
        assert_eq!(counts[1], (PartnerTier::Growing, 0));
        assert_eq!(counts[2], (PartnerTier::Standard, 1));
    }

    #[test]
    fn test_raw_rows_follow_mode() {
        let settings = ReportSettings {
            raw_row_cap: 2,
            ..Default::default()
        };
        assert_eq!(model(&settings).raw_rows, 2);

        let settings = ReportSettings {
            mode: ReportMode::Formula,
            raw_row_cap: 2,
            ..Default::default()
        };
        assert_eq!(model(&settings).raw_rows, 6);
    }

    #[test]
    fn test_delivered_rows_skip_missing_period() {
        let range = raw_range(6);
        let mask = delivered_rows(&range).mask();
        assert!(mask.ends_with("('Raw Shipment Data'!$M$3:$M$8<>\"-\")"));
    }

    // ========== build ==========

    #[test]
    fn test_build_static_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mitra.xlsx");
        let outcome = MitraAnalysisReport::default()
            .generate(&input(), &ReportSettings::default(), &path)
            .unwrap();

        assert!(path.exists());
        assert_eq!(outcome.message, "Mitra analysis created successfully");
        assert_eq!(outcome.metadata["mode"], "static");
        assert_eq!(outcome.metadata["analysis"]["total_deliveries"], 4);
        assert_eq!(outcome.metadata["analysis"]["unique_mitras"], 2);
    }

    #[test]
    fn test_build_formula_weekly_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mitra.xlsx");
        let settings = ReportSettings {
            mode: ReportMode::Formula,
            ..Default::default()
        };
        let mut weekly = input();
        weekly.period_type = PeriodType::Weekly;

        let outcome = MitraAnalysisReport::default()
            .generate(&weekly, &settings, &path)
            .unwrap();
        assert!(path.exists());
        assert_eq!(
            outcome.message,
            "Complete mitra analysis created with 100% Excel formulas"
        );
        assert_eq!(outcome.metadata["period_type"], "weekly");
        assert_eq!(outcome.metadata["analysis"]["raw_rows_written"], 6);
    }
}
