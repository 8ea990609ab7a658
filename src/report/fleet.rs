//! All-mitra fleet performance report, built from the `mitras` summaries

use std::path::Path;

use serde_json::{json, Map};

use super::workbook::{ReportWorkbook, SheetWriter};
use super::{constants_sheet, NumberFormat, ReportGenerator, ReportOutcome, StyleConfig};
use crate::config::ReportSettings;
use crate::parsers::parse_mitras;
use crate::services::ranking::top_n_by;
use crate::services::{Aggregator, ReportInput, ScoreBreakdown, ScoreInputs, ScoreProfile};
use crate::types::{HubFleetStats, MitraSummary, PeriodType, ReportError, Result};

const NO_MITRAS: &str = "No mitra data available. Cannot generate report without mitra data.";

/// Hubs listed on the city distribution sheet
const CITY_ROWS: usize = 20;

/// Pre-computed tables of the fleet workbook
#[derive(Debug, Clone)]
pub(crate) struct FleetModel {
    pub period_type: PeriodType,
    pub profile: ScoreProfile,
    /// Input order
    pub mitras: Vec<MitraSummary>,
    pub total_deliveries: u64,
    pub total_cost: f64,
    pub avg_on_time_rate: f64,
    pub top_performers: Vec<(MitraSummary, ScoreBreakdown)>,
    pub cities: Vec<HubFleetStats>,
    pub trends: Vec<MitraSummary>,
}

impl FleetModel {
    pub fn build(input: &ReportInput, settings: &ReportSettings) -> Result<Self> {
        let profile = settings.score_profile(ScoreProfile::FLEET)?;
        let mitras = parse_mitras(&input.mitras);
        let top = &settings.top_n;

        let total_deliveries = mitras
            .iter()
            .fold(0u64, |acc, m| acc.saturating_add(m.total_deliveries));
        let total_cost = mitras.iter().map(|m| m.total_cost).sum();
        let avg_on_time_rate = if mitras.is_empty() {
            0.0
        } else {
            mitras.iter().map(|m| m.on_time_rate).sum::<f64>() / mitras.len() as f64
        };

        let by_deliveries = |m: &MitraSummary| m.total_deliveries as f64;
        let top_performers = top_n_by(&mitras, top.top_performers, by_deliveries)
            .into_iter()
            .map(|m| (m.clone(), profile.score(&score_inputs(m))))
            .collect();
        let trends = top_n_by(&mitras, top.trend_rows, by_deliveries)
            .into_iter()
            .cloned()
            .collect();

        let hub_stats = Aggregator::fleet_by_hub(&mitras);
        let cities = top_n_by(&hub_stats, CITY_ROWS, |h| h.deliveries as f64)
            .into_iter()
            .cloned()
            .collect();

        Ok(Self {
            period_type: input.period_type,
            profile,
            mitras,
            total_deliveries,
            total_cost,
            avg_on_time_rate,
            top_performers,
            cities,
            trends,
        })
    }
}

fn score_inputs(mitra: &MitraSummary) -> ScoreInputs {
    let cancel_fraction = mitra.cancel_rate / 100.0;
    ScoreInputs {
        delivery_rate: 1.0 - cancel_fraction,
        on_time_rate: mitra.on_time_rate,
        deliveries: mitra.total_deliveries,
        cancel_rate: cancel_fraction,
        growth_rate: 0.0,
    }
}

/// Fleet-wide mitra performance workbook
#[derive(Default)]
pub struct FleetReport {
    style: StyleConfig,
}

impl FleetReport {
    pub fn new(style: StyleConfig) -> Self {
        Self { style }
    }

    fn overview_sheet(&self, model: &FleetModel) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let mut sheet = SheetWriter::new("Overview", &self.style)?;
        sheet.activate();
        sheet.title(1, &format!("ALL MITRA PERFORMANCE OVERVIEW - {}", period), 20.0, 7)?;
        sheet.note(2, 1, "Comprehensive Performance Analytics for All Mitra Partners")?;
        sheet.section(4, 1, "KEY PERFORMANCE INDICATORS")?;

        let kpis = [
            ("Total Mitra Partners", model.mitras.len() as f64, NumberFormat::Integer, "partners"),
            ("Total Deliveries", model.total_deliveries as f64, NumberFormat::Integer, "deliveries"),
            ("Total Cost", model.total_cost, NumberFormat::Integer, "IDR"),
            ("Average On-Time Rate", model.avg_on_time_rate, NumberFormat::Percent, "%"),
        ];
        for (idx, (label, value, format, unit)) in kpis.into_iter().enumerate() {
            let row = 6 + idx as u32;
            sheet.label(row, 1, label)?;
            sheet.kpi(row, 2, value, format)?;
            sheet.note(row, 3, unit)?;
        }
        sheet.widths(&[4.0, 25.0, 18.0, 12.0])?;
        Ok(sheet)
    }

    fn metrics_sheet(&self, model: &FleetModel) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let mut sheet = SheetWriter::new("Performance Metrics", &self.style)?;
        sheet.title(0, &format!("PERFORMANCE METRICS - {}", period), 16.0, 5)?;
        sheet.header_row(
            2,
            0,
            &["Mitra Name", "Total Deliveries", "On-Time Rate", "Avg Cost", "Avg Distance", "Cost per Km"],
        )?;
        for (idx, mitra) in model.mitras.iter().enumerate() {
            let row = 3 + idx as u32;
            sheet.text(row, 0, &mitra.name)?;
            sheet.number(row, 1, mitra.total_deliveries as f64, NumberFormat::Integer)?;
            sheet.number(row, 2, mitra.on_time_rate, NumberFormat::Percent)?;
            sheet.number(row, 3, mitra.avg_cost, NumberFormat::Integer)?;
            sheet.number(row, 4, mitra.avg_distance, NumberFormat::Decimal)?;
            sheet.number(row, 5, mitra.cost_per_km, NumberFormat::Integer)?;
        }
        sheet.uniform_width(6, 20.0)?;
        Ok(sheet)
    }

    fn cost_sheet(&self, model: &FleetModel) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let mut sheet = SheetWriter::new("Cost Analysis", &self.style)?;
        sheet.title(0, &format!("COST ANALYSIS - {}", period), 16.0, 5)?;
        sheet.header_row(
            2,
            0,
            &["Mitra Name", "Total Cost", "Avg Cost", "Total Distance", "Avg Distance", "Cost per Km"],
        )?;
        for (idx, mitra) in model.mitras.iter().enumerate() {
            let row = 3 + idx as u32;
            sheet.text(row, 0, &mitra.name)?;
            sheet.number(row, 1, mitra.total_cost, NumberFormat::Integer)?;
            sheet.number(row, 2, mitra.avg_cost, NumberFormat::Integer)?;
            sheet.number(row, 3, mitra.total_distance, NumberFormat::Decimal)?;
            sheet.number(row, 4, mitra.avg_distance, NumberFormat::Decimal)?;
            sheet.number(row, 5, mitra.cost_per_km, NumberFormat::Integer)?;
        }
        sheet.uniform_width(6, 20.0)?;
        Ok(sheet)
    }

    fn top_performers_sheet(&self, model: &FleetModel) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let mut sheet = SheetWriter::new("Top Performers", &self.style)?;
        sheet.title(0, &format!("TOP PERFORMERS - {}", period), 16.0, 6)?;
        sheet.header_row(
            2,
            0,
            &["Rank", "Mitra Name", "Total Deliveries", "On-Time Rate", "Total Cost", "Avg Cost", "Score"],
        )?;
        for (idx, (mitra, score)) in model.top_performers.iter().enumerate() {
            let row = 3 + idx as u32;
            sheet.number(row, 0, (idx + 1) as f64, NumberFormat::Count)?;
            sheet.text(row, 1, &mitra.name)?;
            sheet.number(row, 2, mitra.total_deliveries as f64, NumberFormat::Integer)?;
            sheet.number(row, 3, mitra.on_time_rate, NumberFormat::Percent)?;
            sheet.number(row, 4, mitra.total_cost, NumberFormat::Integer)?;
            sheet.number(row, 5, mitra.avg_cost, NumberFormat::Integer)?;
            sheet.number(row, 6, score.total, NumberFormat::Decimal)?;
        }
        sheet.uniform_width(7, 20.0)?;
        Ok(sheet)
    }

    fn city_sheet(&self, model: &FleetModel) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let mut sheet = SheetWriter::new("City Distribution", &self.style)?;
        sheet.title(0, &format!("CITY DISTRIBUTION - {}", period), 16.0, 3)?;
        sheet.header_row(2, 0, &["City", "Mitra Count", "Total Deliveries", "Avg On-Time Rate"])?;
        for (idx, city) in model.cities.iter().enumerate() {
            let row = 3 + idx as u32;
            sheet.text(row, 0, &city.hub)?;
            sheet.number(row, 1, city.mitra_count as f64, NumberFormat::Integer)?;
            sheet.number(row, 2, city.deliveries as f64, NumberFormat::Integer)?;
            sheet.number(row, 3, city.avg_on_time_rate, NumberFormat::Percent)?;
        }
        sheet.uniform_width(4, 20.0)?;
        Ok(sheet)
    }

    fn trends_sheet(&self, model: &FleetModel) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let mut sheet = SheetWriter::new("Performance Trends", &self.style)?;
        sheet.title(0, &format!("PERFORMANCE TRENDS - {}", period), 16.0, 5)?;
        sheet.header_row(
            2,
            0,
            &["Mitra Name", "Total Deliveries", "On-Time Rate", "Total Cost", "Avg Cost", "Cost per Km"],
        )?;
        for (idx, mitra) in model.trends.iter().enumerate() {
            let row = 3 + idx as u32;
            sheet.text(row, 0, &mitra.name)?;
            sheet.number(row, 1, mitra.total_deliveries as f64, NumberFormat::Integer)?;
            sheet.number(row, 2, mitra.on_time_rate, NumberFormat::Percent)?;
            sheet.number(row, 3, mitra.total_cost, NumberFormat::Integer)?;
            sheet.number(row, 4, mitra.avg_cost, NumberFormat::Integer)?;
            sheet.number(row, 5, mitra.cost_per_km, NumberFormat::Integer)?;
        }
        sheet.uniform_width(6, 20.0)?;
        Ok(sheet)
    }
}

impl ReportGenerator for FleetReport {
    fn name(&self) -> &str {
        "fleet"
    }

    fn validate(&self, input: &ReportInput) -> Result<()> {
        if input.mitras.is_empty() {
            return Err(ReportError::EmptyDataset(NO_MITRAS.into()));
        }
        Ok(())
    }

    fn build(
        &self,
        input: &ReportInput,
        settings: &ReportSettings,
        output: &Path,
    ) -> Result<ReportOutcome> {
        let model = FleetModel::build(input, settings)?;

        let mut workbook = ReportWorkbook::new();
        workbook.push(constants_sheet(&model.profile, &self.style)?);
        workbook.push(self.overview_sheet(&model)?);
        workbook.push(self.metrics_sheet(&model)?);
        workbook.push(self.cost_sheet(&model)?);
        workbook.push(self.top_performers_sheet(&model)?);
        workbook.push(self.city_sheet(&model)?);
        workbook.push(self.trends_sheet(&model)?);
        workbook.save(output)?;

        let period = model.period_type.as_str();
        let mut metadata = Map::new();
        metadata.insert(
            "data_summary".into(),
            json!({
                "total_mitras": model.mitras.len(),
                "period_type": period,
            }),
        );

        Ok(ReportOutcome {
            message: format!(
                "All mitra performance chart with {} data created successfully",
                period
            ),
            metadata,
        })
    }
}
