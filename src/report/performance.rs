//! Mitra performance report, built from the snake_case `shipmentData` rows
//!
//! Every table is computed up front by [`PerformanceModel`]. In formula
//! mode the same tables are written as spreadsheet formulas against the
//! "Shipment Data" and "Constants" sheets, so the workbook recalculates
//! when the raw rows are edited.

use std::path::Path;

use chrono::{DateTime, NaiveDate};
use serde_json::{json, Map};

use super::formula::{Criterion, RowFilter};
use super::workbook::{cell_ref, DataRange, ReportWorkbook, SheetWriter};
use super::{
    constants_sheet, NumberFormat, ReportGenerator, ReportOutcome, StyleConfig, CONSTANTS_SHEET,
};
use crate::config::{ReportMode, ReportSettings};
use crate::parsers::{LayoutRegistry, RecordLayout};
use crate::services::normalizer::clean_number;
use crate::services::period::{classify, sort_key_or_last};
use crate::services::ranking::chronological;
use crate::services::{
    rank, Aggregator, DataQuality, ReportInput, ScoreBreakdown, ScoreInputs, ScoreProfile,
    SortField, SortSpec,
};
use crate::types::{
    PeriodKey, PeriodTrend, PeriodType, PerformanceTotals, RankedRow, ReportError, Result,
    ShipmentRecord, TrendStatus,
};

const NO_SHIPMENTS: &str =
    "No shipment data available. Cannot generate report without shipment data.";

/// Periods needed before trends are meaningful
const MIN_TREND_PERIODS: u64 = 2;
/// Shipment rows are exported with snake_case keys
const LAYOUT: &str = "snake_case";

const DATA_SHEET: &str = "Shipment Data";
const METRICS_SHEET: &str = "Performance Metrics";
const TRENDS_SHEET: &str = "Delivery Trends";

/// First data row of the shipment sheet, 0-based
const DATA_FIRST_ROW: u32 = 3;

// Shipment sheet columns referenced by formulas
const COL_PROJECT: u16 = 1;
const COL_HUB: u16 = 4;
const COL_DISTANCE: u16 = 7;
const COL_COST: u16 = 12;
const COL_ON_TIME: u16 = 15;
const COL_PERIOD: u16 = 16;

const DATA_HEADERS: [&str; 20] = [
    "Client Name",
    "Project Name",
    "Delivery Date",
    "Drop Point",
    "Hub",
    "Order Code",
    "Weight",
    "Distance (km)",
    "Mitra Code",
    "Mitra Name",
    "Receiving Date",
    "Vehicle Type",
    "Cost",
    "SLA",
    "Weekly",
    "Is On-Time",
    "Display Period",
    "Month",
    "Year",
    "Sort Key",
];

// Performance Metrics cells (1-based, column B)
const CELL_DELIVERIES: &str = "B4";
const CELL_ON_TIME: &str = "B5";
const CELL_ON_TIME_RATE: &str = "B6";
const CELL_DELIVERY_RATE: &str = "B10";
const CELL_CANCEL_RATE: &str = "B11";
const CELL_GROWTH_RATE: &str = "B12";

/// Score table rows, 0-based
const SCORE_HEADER_ROW: u32 = 16;

/// Delivery trend table header row, 0-based
const TREND_HEADER_ROW: u32 = 4;

/// One shipment with its classified period
#[derive(Debug, Clone)]
pub(crate) struct ShipmentRow {
    pub record: ShipmentRecord,
    pub period: Option<PeriodKey>,
}

impl ShipmentRow {
    /// Period label, or the raw date when the date does not classify
    fn display_period(&self) -> &str {
        self.period
            .as_ref()
            .map(|p| p.label.as_str())
            .unwrap_or(self.record.delivery_date.as_str())
    }
}

/// Pre-computed tables of the performance workbook
#[derive(Debug, Clone)]
pub(crate) struct PerformanceModel {
    pub period_type: PeriodType,
    pub profile: ScoreProfile,
    /// Chronological; unclassifiable dates last
    pub rows: Vec<ShipmentRow>,
    pub totals: PerformanceTotals,
    pub trend: Vec<PeriodTrend>,
    pub growth_rate: f64,
    /// Fraction of cancelled orders
    pub cancel_rate: f64,
    pub score: ScoreBreakdown,
    pub cost_by_project: Vec<RankedRow<String>>,
    pub cost_by_hub: Vec<RankedRow<String>>,
    pub top_projects: Vec<RankedRow<String>>,
    pub project_table: Vec<RankedRow<String>>,
    pub data_quality: DataQuality,
}

impl PerformanceModel {
    pub fn build(
        input: &ReportInput,
        settings: &ReportSettings,
        layout: &dyn RecordLayout,
    ) -> Result<Self> {
        let profile = settings.score_profile(ScoreProfile::PERFORMANCE)?;
        let records = layout.parse_all(&input.shipments);
        let top = &settings.top_n;

        let totals = Aggregator::overall(&records);
        let trend = Aggregator::period_trend(&records, input.period_type);
        let growth_rate = Aggregator::growth_rate(&trend);
        let cancel_rate = clean_number(input.metrics.get("cancelRate"), 0.0) / 100.0;

        let score = profile.score(&ScoreInputs {
            delivery_rate: 1.0 - cancel_rate,
            on_time_rate: totals.on_time_rate(),
            deliveries: totals.deliveries,
            cancel_rate,
            growth_rate,
        });

        let projects = Aggregator::by_project(&records).finalize();
        let hubs = Aggregator::by_hub(&records).finalize();
        let cost_by_project = rank(
            projects.clone(),
            &SortSpec::top(SortField::Cost, top.top_projects),
        );
        let cost_by_hub = rank(hubs, &SortSpec::top(SortField::Cost, top.top_hubs));
        let top_projects = rank(
            projects.clone(),
            &SortSpec::top(SortField::Count, top.top_projects),
        );
        let project_table = rank(projects, &SortSpec::top(SortField::Count, top.project_rows));

        let data_quality = input.data_quality.unwrap_or(DataQuality {
            has_valid_trends: trend.len() as u64 >= MIN_TREND_PERIODS,
            trend_count: trend.len() as u64,
            shipment_count: records.len() as u64,
        });

        let mut rows: Vec<ShipmentRow> = records
            .into_iter()
            .map(|record| ShipmentRow {
                period: classify(&record.delivery_date, input.period_type),
                record,
            })
            .collect();
        chronological(&mut rows, |row| sort_key_or_last(row.period.as_ref()));

        Ok(Self {
            period_type: input.period_type,
            profile,
            rows,
            totals,
            trend,
            growth_rate,
            cancel_rate,
            score,
            cost_by_project,
            cost_by_hub,
            top_projects,
            project_table,
            data_quality,
        })
    }

    /// 1-based range of the shipment sheet data rows
    fn data_range(&self) -> DataRange {
        let first = DATA_FIRST_ROW + 1;
        DataRange::new(DATA_SHEET, first, first + self.rows.len() as u32 - 1)
    }

    fn delivery_rate(&self) -> f64 {
        if self.totals.deliveries == 0 {
            0.0
        } else {
            1.0 - self.cancel_rate
        }
    }

    fn has_valid_trends(&self) -> bool {
        self.data_quality.has_valid_trends
    }
}

/// One value row of a metrics table
struct Metric {
    label: &'static str,
    value: f64,
    formula: String,
    format: NumberFormat,
    unit: &'static str,
}

/// Writes either the computed value or its formula
fn write_metrics(
    sheet: &mut SheetWriter<'_>,
    first_row: u32,
    metrics: &[Metric],
    mode: ReportMode,
) -> Result<()> {
    for (idx, metric) in metrics.iter().enumerate() {
        let row = first_row + idx as u32;
        sheet.label(row, 0, metric.label)?;
        match mode {
            ReportMode::Static => sheet.number(row, 1, metric.value, metric.format)?,
            ReportMode::Formula => sheet.formula(row, 1, &metric.formula, metric.format)?,
        }
        sheet.note(row, 2, metric.unit)?;
    }
    Ok(())
}

/// Mitra performance workbook
pub struct PerformanceReport {
    style: StyleConfig,
    layouts: LayoutRegistry,
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new(StyleConfig::default(), LayoutRegistry::new())
    }
}

impl PerformanceReport {
    pub fn new(style: StyleConfig, layouts: LayoutRegistry) -> Self {
        Self { style, layouts }
    }

    fn data_quality_sheet(
        &self,
        input: &ReportInput,
        model: &PerformanceModel,
    ) -> Result<SheetWriter<'_>> {
        let dq = &model.data_quality;
        let ok = model.has_valid_trends();
        let mut sheet = SheetWriter::new("Data Quality", &self.style)?;
        if !ok {
            sheet.activate();
        }

        let banner = if ok {
            "DATA QUALITY: COMPLETE ANALYSIS"
        } else {
            "DATA QUALITY: LIMITED ANALYSIS"
        };
        sheet.status(1, banner, ok, 7)?;
        sheet.section(3, 1, "CURRENT DATA STATUS")?;

        sheet.label(5, 1, "Analysis Period Type")?;
        sheet.text(5, 3, model.period_type.title())?;
        sheet.label(6, 1, "Delivery Periods Available")?;
        sheet.kpi(6, 3, dq.trend_count as f64, NumberFormat::Integer)?;
        sheet.note(6, 4, "periods")?;
        sheet.label(7, 1, "Total Shipment Records")?;
        sheet.kpi(7, 3, dq.shipment_count as f64, NumberFormat::Integer)?;
        sheet.note(7, 4, "records")?;
        sheet.label(8, 1, "Minimum Required Periods")?;
        sheet.kpi(8, 3, MIN_TREND_PERIODS as f64, NumberFormat::Integer)?;
        sheet.note(8, 4, "periods")?;
        sheet.label(9, 1, "Analysis Status")?;
        sheet.text(9, 3, if ok { "COMPLETE" } else { "LIMITED" })?;

        sheet.section(11, 1, "BUSINESS IMPACT ASSESSMENT")?;
        let impact: [(&str, &str, &str); 5] = [
            (
                "Strategic Planning",
                "Multi-period trends enable forecasting and resource planning",
                "Limited to single period, insufficient for forecasting",
            ),
            (
                "Performance Evaluation",
                "Complete trend analysis supports performance reviews",
                "Unable to assess performance trends",
            ),
            (
                "Cost Optimization",
                "Historical data shows cost patterns across periods",
                "Cannot identify cost patterns across periods",
            ),
            (
                "Risk Management",
                "Trend analysis helps identify operational risks",
                "Limited ability to identify operational risks",
            ),
            (
                "Growth Analysis",
                "Period-over-period comparisons support growth assessment",
                "Cannot assess period-over-period growth",
            ),
        ];
        let mut row = 13;
        for (feature, available, missing) in impact {
            if ok {
                sheet.label(row, 1, feature)?;
                sheet.note(row, 3, available)?;
            } else {
                sheet.alert(row, 1, feature)?;
                sheet.note(row, 3, missing)?;
            }
            row += 1;
        }

        if !ok {
            row += 1;
            sheet.section(row, 1, "RECOMMENDATIONS FOR FULL ANALYSIS")?;
            let recommendations = [
                "1. Ensure delivery data spans at least 2 different periods for trend analysis",
                "2. Each period should have enough delivery records to be representative",
                "3. Delivery dates must be formatted as DD/MM/YYYY for period grouping",
                "4. Re-export the report after adding more delivery data",
            ];
            for text in recommendations {
                row += 1;
                sheet.text(row, 1, text)?;
            }
        }

        row += 2;
        sheet.section(row, 1, "MITRA PROFILE")?;
        let profile = [
            ("Name:", input.profile_text("name")),
            ("Driver ID:", input.profile_text("driverId")),
            ("Phone:", input.profile_text("phone")),
            ("City:", input.profile_text("city")),
            ("Status:", input.profile_text("status")),
            ("Joined:", joined_date(&input.profile_text("joinedDate"))),
        ];
        for (label, value) in profile {
            row += 1;
            sheet.label(row, 1, label)?;
            sheet.text(row, 3, &value)?;
        }

        sheet.uniform_width(8, 20.0)?;
        Ok(sheet)
    }

    fn shipment_sheet(&self, model: &PerformanceModel) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let mut sheet = SheetWriter::new(DATA_SHEET, &self.style)?;
        sheet.title(
            0,
            &format!("RAW SHIPMENT DATA - {} (CHRONOLOGICAL)", period),
            16.0,
            DATA_HEADERS.len() as u16 - 1,
        )?;
        sheet.note(1, 0, "Sorted: oldest deliveries first | Calculations reference this data")?;
        sheet.header_row(DATA_FIRST_ROW - 1, 0, &DATA_HEADERS)?;

        for (idx, item) in model.rows.iter().enumerate() {
            let row = DATA_FIRST_ROW + idx as u32;
            let r = &item.record;
            sheet.text(row, 0, &r.client_name)?;
            sheet.text(row, 1, &r.project_name)?;
            sheet.text(row, 2, &r.delivery_date)?;
            sheet.text(row, 3, &r.drop_point)?;
            sheet.text(row, 4, &r.hub)?;
            sheet.text(row, 5, &r.order_code)?;
            sheet.text(row, 6, &r.weight)?;
            sheet.number(row, COL_DISTANCE, r.distance_km, NumberFormat::Decimal)?;
            sheet.text(row, 8, &r.mitra_code)?;
            sheet.text(row, 9, &r.mitra_name)?;
            sheet.text(row, 10, &r.receiving_date)?;
            sheet.text(row, 11, &r.vehicle_type)?;
            sheet.number(row, COL_COST, r.cost, NumberFormat::Integer)?;
            sheet.text(row, 13, &r.sla)?;
            sheet.text(row, 14, &r.weekly)?;
            sheet.boolean(row, COL_ON_TIME, r.is_on_time())?;
            sheet.text(row, COL_PERIOD, item.display_period())?;
            if let Some(key) = &item.period {
                if let Some(month) = key.month {
                    sheet.number(row, 17, f64::from(month), NumberFormat::Count)?;
                }
                if let Some(year) = key.year {
                    sheet.number(row, 18, f64::from(year), NumberFormat::Count)?;
                }
            }
            sheet.text(row, 19, sort_key_or_last(item.period.as_ref()))?;
        }

        sheet.uniform_width(DATA_HEADERS.len() as u16, 15.0)?;
        Ok(sheet)
    }

    fn metrics_sheet(&self, model: &PerformanceModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let range = model.data_range();
        let mut sheet = SheetWriter::new(METRICS_SHEET, &self.style)?;
        if model.has_valid_trends() {
            sheet.activate();
        }

        sheet.title(0, &format!("PERFORMANCE METRICS - {}", period), 16.0, 5)?;
        if mode == ReportMode::Formula {
            sheet.note(1, 0, "Calculations use formulas referencing the Shipment Data and Constants sheets")?;
        }
        sheet.header_row(2, 0, &["Metric", "Value", "Unit"])?;

        let distance = range.column(COL_DISTANCE);
        let growth_formula = match (model.has_valid_trends(), model.trend.len()) {
            (true, n) if n >= 2 => {
                let first = format!("'{}'!B{}", TRENDS_SHEET, TREND_HEADER_ROW + 2);
                let last = format!("'{}'!B{}", TRENDS_SHEET, TREND_HEADER_ROW + 1 + n as u32);
                format!("=IFERROR(({}-{})/{},0)", last, first, first)
            }
            _ => format!("={}", model.growth_rate),
        };

        let metrics = [
            Metric {
                label: "Total Deliveries",
                value: model.totals.deliveries as f64,
                formula: format!("=COUNTA({})", range.column(0)),
                format: NumberFormat::Integer,
                unit: "deliveries",
            },
            Metric {
                label: "On-Time Deliveries",
                value: model.totals.on_time as f64,
                formula: format!("=COUNTIF({},TRUE)", range.column(COL_ON_TIME)),
                format: NumberFormat::Integer,
                unit: "deliveries",
            },
            Metric {
                label: "On-Time Rate",
                value: model.totals.on_time_rate(),
                formula: format!(
                    "=IF({d}=0,0,{o}/{d})",
                    d = CELL_DELIVERIES,
                    o = CELL_ON_TIME
                ),
                format: NumberFormat::Percent,
                unit: "percentage",
            },
            Metric {
                label: "Average Distance",
                value: model.totals.avg_distance,
                formula: format!(
                    "=IFERROR(SUMIF({d},\">0\")/COUNTIF({d},\">0\"),0)",
                    d = distance
                ),
                format: NumberFormat::Decimal,
                unit: "km",
            },
            Metric {
                label: "Unique Projects",
                value: model.totals.unique_projects as f64,
                formula: RowFilter::new(&range)
                    .with(COL_PROJECT, Criterion::NotText("-".into()))
                    .distinct_count(COL_PROJECT)?,
                format: NumberFormat::Integer,
                unit: "projects",
            },
            Metric {
                label: "Unique Hubs",
                value: model.totals.unique_hubs as f64,
                formula: RowFilter::new(&range)
                    .with(COL_HUB, Criterion::NotText("-".into()))
                    .distinct_count(COL_HUB)?,
                format: NumberFormat::Integer,
                unit: "hubs",
            },
            Metric {
                label: "Delivery Success Rate",
                value: model.delivery_rate(),
                formula: format!("=IF({}=0,0,1-{})", CELL_DELIVERIES, model.cancel_rate),
                format: NumberFormat::Percent,
                unit: "percentage",
            },
            Metric {
                label: "Cancellation Rate",
                value: if model.totals.deliveries == 0 { 0.0 } else { model.cancel_rate },
                formula: format!("=IF({}=0,0,1-{})", CELL_DELIVERIES, CELL_DELIVERY_RATE),
                format: NumberFormat::Percent,
                unit: "percentage",
            },
            Metric {
                label: "Growth Rate",
                value: model.growth_rate,
                formula: growth_formula,
                format: NumberFormat::Percent,
                unit: "first to last period",
            },
        ];
        write_metrics(&mut sheet, 3, &metrics, mode)?;

        self.write_score_table(&mut sheet, model, mode)?;

        sheet.section(SCORE_HEADER_ROW + 8, 0, "NOTES ON CONSTANTS:")?;
        sheet.note(
            SCORE_HEADER_ROW + 9,
            0,
            "Weights and thresholds are defined in the hidden 'Constants' sheet",
        )?;
        sheet.note(
            SCORE_HEADER_ROW + 10,
            0,
            &format!("Score profile: {}", model.profile.name),
        )?;

        sheet.widths(&[30.0, 18.0, 18.0, 18.0])?;
        Ok(sheet)
    }

    fn write_score_table(
        &self,
        sheet: &mut SheetWriter<'_>,
        model: &PerformanceModel,
        mode: ReportMode,
    ) -> Result<()> {
        sheet.section(SCORE_HEADER_ROW - 2, 0, "PERFORMANCE SCORE CALCULATION")?;
        sheet.header_row(
            SCORE_HEADER_ROW,
            0,
            &["Component", "Weight", "Score", "Weighted Score"],
        )?;

        let c = |cell: &str| format!("{}!${}", CONSTANTS_SHEET, cell);
        let max = c("B$13");
        let clamp = |expr: String| format!("=IFERROR(MAX(0,MIN({},{})),0)", max, expr);

        let w = &model.profile.weights;
        let s = &model.score;
        let components = [
            (
                "Delivery Rate",
                w.delivery_rate,
                c("B$7"),
                s.delivery_rate,
                clamp(format!("{}*100/{}*100", CELL_DELIVERY_RATE, c("B$4"))),
            ),
            (
                "On-Time Rate",
                w.on_time_rate,
                c("B$8"),
                s.on_time_rate,
                clamp(format!("{}*100/{}*100", CELL_ON_TIME_RATE, c("B$5"))),
            ),
            (
                "Activity Level",
                w.activity,
                c("B$9"),
                s.activity,
                clamp(format!("{}/{}*100", CELL_DELIVERIES, c("B$6"))),
            ),
            (
                "Consistency",
                w.consistency,
                c("B$10"),
                s.consistency,
                clamp(format!("{}-{}*{}", max, CELL_CANCEL_RATE, c("B$14"))),
            ),
            (
                "Growth",
                w.growth,
                c("B$11"),
                s.growth,
                clamp(format!("{}+{}*100", c("B$12"), CELL_GROWTH_RATE)),
            ),
        ];

        let first = SCORE_HEADER_ROW + 1;
        for (idx, (label, weight, weight_ref, score, score_formula)) in
            components.into_iter().enumerate()
        {
            let row = first + idx as u32;
            sheet.label(row, 0, label)?;
            match mode {
                ReportMode::Static => {
                    sheet.number(row, 1, weight, NumberFormat::Weight)?;
                    sheet.number(row, 2, score, NumberFormat::Decimal)?;
                    sheet.number(row, 3, weight * score, NumberFormat::Decimal)?;
                }
                ReportMode::Formula => {
                    sheet.formula(row, 1, &format!("={}", weight_ref), NumberFormat::Weight)?;
                    sheet.formula(row, 2, &score_formula, NumberFormat::Decimal)?;
                    sheet.formula(
                        row,
                        3,
                        &format!("={}*{}", cell_ref(row, 1), cell_ref(row, 2)),
                        NumberFormat::Decimal,
                    )?;
                }
            }
        }

        let total_row = first + 5;
        sheet.total_label(total_row, 0, "TOTAL PERFORMANCE SCORE")?;
        match mode {
            ReportMode::Static => sheet.kpi(total_row, 3, s.total, NumberFormat::Decimal)?,
            ReportMode::Formula => sheet.kpi_formula(
                total_row,
                3,
                &format!("=SUM({}:{})", cell_ref(first, 3), cell_ref(first + 4, 3)),
                NumberFormat::Decimal,
            )?,
        }
        Ok(())
    }

    fn cost_sheet(&self, model: &PerformanceModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let range = model.data_range();
        let cost = range.column(COL_COST);
        let distance = range.column(COL_DISTANCE);
        let mut sheet = SheetWriter::new("Cost Analysis", &self.style)?;

        sheet.title(0, &format!("COST ANALYSIS - {}", period), 16.0, 5)?;
        sheet.section(3, 0, "COST METRICS")?;
        sheet.header_row(4, 0, &["Metric", "Value", "Unit"])?;

        // B6 total cost, B9 total distance, B10 deliveries
        let totals = &model.totals;
        let metrics = [
            Metric {
                label: "Total Cost",
                value: totals.total_cost,
                formula: format!("=SUM({})", cost),
                format: NumberFormat::Integer,
                unit: "IDR",
            },
            Metric {
                label: "Average Cost per Delivery",
                value: totals.avg_cost(),
                formula: "=IF(B10=0,0,B6/B10)".into(),
                format: NumberFormat::Integer,
                unit: "IDR/delivery",
            },
            Metric {
                label: "Cost per Kilometer",
                value: totals.cost_per_km(),
                formula: "=IF(B9=0,0,B6/B9)".into(),
                format: NumberFormat::Integer,
                unit: "IDR/km",
            },
            Metric {
                label: "Total Distance",
                value: totals.total_distance,
                formula: format!("=SUM({})", distance),
                format: NumberFormat::Decimal,
                unit: "km",
            },
            Metric {
                label: "Total Deliveries",
                value: totals.deliveries as f64,
                formula: format!("=COUNTA({})", range.column(0)),
                format: NumberFormat::Integer,
                unit: "deliveries",
            },
        ];
        write_metrics(&mut sheet, 5, &metrics, mode)?;

        let project_end = self.write_cost_table(
            &mut sheet,
            12,
            ("COST BY PROJECT", "Project Name"),
            &model.cost_by_project,
            &range,
            COL_PROJECT,
            mode,
        )?;
        self.write_cost_table(
            &mut sheet,
            project_end + 2,
            ("COST BY HUB", "Hub Name"),
            &model.cost_by_hub,
            &range,
            COL_HUB,
            mode,
        )?;

        sheet.widths(&[30.0, 20.0, 15.0, 20.0, 15.0])?;
        Ok(sheet)
    }

    /// Ranked cost table starting at `section_row`; returns the row after it
    #[allow(clippy::too_many_arguments)]
    fn write_cost_table(
        &self,
        sheet: &mut SheetWriter<'_>,
        section_row: u32,
        (section, key_header): (&str, &str),
        rows: &[RankedRow<String>],
        range: &DataRange,
        key_col: u16,
        mode: ReportMode,
    ) -> Result<u32> {
        sheet.section(section_row, 0, section)?;
        sheet.header_row(
            section_row + 1,
            0,
            &[key_header, "Total Cost", "Deliveries", "Avg Cost", "Share"],
        )?;

        let keys = range.column(key_col);
        let cost = range.column(COL_COST);
        let first = section_row + 2;
        for (idx, ranked) in rows.iter().enumerate() {
            let row = first + idx as u32;
            let key = cell_ref(row, 0);
            let (b, c) = (cell_ref(row, 1), cell_ref(row, 2));
            sheet.label(row, 0, &ranked.key)?;
            match mode {
                ReportMode::Static => {
                    sheet.number(row, 1, ranked.totals.cost_sum, NumberFormat::Integer)?;
                    sheet.number(row, 2, ranked.totals.count as f64, NumberFormat::Integer)?;
                    sheet.number(row, 3, ranked.totals.avg_cost(), NumberFormat::Integer)?;
                    sheet.number(row, 4, ranked.share, NumberFormat::Weight)?;
                }
                ReportMode::Formula => {
                    sheet.formula(
                        row,
                        1,
                        &format!("=SUMIF({},{},{})", keys, key, cost),
                        NumberFormat::Integer,
                    )?;
                    sheet.formula(
                        row,
                        2,
                        &format!("=COUNTIF({},{})", keys, key),
                        NumberFormat::Integer,
                    )?;
                    sheet.formula(
                        row,
                        3,
                        &format!("=IF({c}=0,0,{b}/{c})", b = b, c = c),
                        NumberFormat::Integer,
                    )?;
                    sheet.formula(
                        row,
                        4,
                        &format!("=IFERROR({}/SUMIF({},\"<>-\",{}),0)", b, keys, cost),
                        NumberFormat::Weight,
                    )?;
                }
            }
        }
        Ok(first + rows.len() as u32)
    }

    fn trends_sheet(&self, model: &PerformanceModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let mut sheet = SheetWriter::new(TRENDS_SHEET, &self.style)?;

        if !model.has_valid_trends() {
            sheet.title(0, &format!("LIMITED TREND DATA - {} STATISTICS ONLY", period), 16.0, 6)?;
            sheet.label(2, 0, &format!("Available Periods: {}", model.trend.len()))?;
            sheet.note(
                3,
                0,
                &format!("Minimum Required: {} periods for trend analysis", MIN_TREND_PERIODS),
            )?;
            sheet.section(5, 0, "AVAILABLE DATA")?;
            sheet.header_row(7, 0, &["Period", "Deliveries", "Notes"])?;
            for (idx, point) in model.trend.iter().enumerate() {
                let row = 8 + idx as u32;
                sheet.text(row, 0, &point.label)?;
                sheet.number(row, 1, point.deliveries as f64, NumberFormat::Integer)?;
                sheet.note(row, 2, "Baseline period - no comparison available")?;
            }
            sheet.uniform_width(7, 20.0)?;
            return Ok(sheet);
        }

        let range = model.data_range();
        let periods = range.column(COL_PERIOD);
        let cost = range.column(COL_COST);

        sheet.title(0, &format!("DELIVERY TRENDS - {} (CHRONOLOGICAL)", period), 14.0, 5)?;
        sheet.note(1, 0, "Sorted: oldest first")?;
        sheet.section(TREND_HEADER_ROW - 1, 0, &format!("{} TREND DATA", period))?;
        sheet.header_row(
            TREND_HEADER_ROW,
            0,
            &["Period", "Deliveries", "Cost", "Cumulative", "Growth", "Status"],
        )?;

        let first = TREND_HEADER_ROW + 1;
        for (idx, point) in model.trend.iter().enumerate() {
            let row = first + idx as u32;
            sheet.text(row, 0, &point.label)?;
            match mode {
                ReportMode::Static => {
                    sheet.number(row, 1, point.deliveries as f64, NumberFormat::Integer)?;
                    sheet.number(row, 2, point.cost, NumberFormat::Integer)?;
                    sheet.number(row, 3, point.cumulative as f64, NumberFormat::Integer)?;
                    sheet.number(row, 4, point.growth, NumberFormat::Weight)?;
                    sheet.text(row, 5, point.status.label())?;
                }
                ReportMode::Formula => {
                    let label = cell_ref(row, 0);
                    sheet.formula(
                        row,
                        1,
                        &format!("=COUNTIF({},{})", periods, label),
                        NumberFormat::Integer,
                    )?;
                    sheet.formula(
                        row,
                        2,
                        &format!("=SUMIF({},{},{})", periods, label, cost),
                        NumberFormat::Integer,
                    )?;
                    sheet.formula(
                        row,
                        3,
                        &format!("=SUM($B${}:{})", first + 1, cell_ref(row, 1)),
                        NumberFormat::Integer,
                    )?;
                    if idx == 0 {
                        sheet.number(row, 4, 0.0, NumberFormat::Weight)?;
                        sheet.text(row, 5, TrendStatus::Baseline.label())?;
                    } else {
                        let (prev, cur) = (cell_ref(row - 1, 1), cell_ref(row, 1));
                        let growth = cell_ref(row, 4);
                        sheet.formula(
                            row,
                            4,
                            &format!("=IF({p}=0,0,({c}-{p})/{p})", p = prev, c = cur),
                            NumberFormat::Weight,
                        )?;
                        sheet.text_formula(row, 5, &status_formula(&growth))?;
                    }
                }
            }
        }

        let project_section = first + model.trend.len() as u32 + 2;
        sheet.section(project_section, 0, "TOP PROJECTS BY DELIVERY VOLUME")?;
        sheet.header_row(
            project_section + 1,
            0,
            &["Rank", "Project Name", "Deliveries", "Total Cost", "Percentage"],
        )?;
        let projects = range.column(COL_PROJECT);
        let project_first = project_section + 2;
        for (idx, ranked) in model.top_projects.iter().enumerate() {
            let row = project_first + idx as u32;
            let name = cell_ref(row, 1);
            sheet.number(row, 0, ranked.rank as f64, NumberFormat::Count)?;
            sheet.label(row, 1, &ranked.key)?;
            match mode {
                ReportMode::Static => {
                    sheet.number(row, 2, ranked.totals.count as f64, NumberFormat::Integer)?;
                    sheet.number(row, 3, ranked.totals.cost_sum, NumberFormat::Integer)?;
                    sheet.number(row, 4, ranked.share, NumberFormat::Weight)?;
                }
                ReportMode::Formula => {
                    sheet.formula(
                        row,
                        2,
                        &format!("=COUNTIF({},{})", projects, name),
                        NumberFormat::Integer,
                    )?;
                    sheet.formula(
                        row,
                        3,
                        &format!("=SUMIF({},{},{})", projects, name, cost),
                        NumberFormat::Integer,
                    )?;
                    sheet.formula(
                        row,
                        4,
                        &format!(
                            "=IFERROR({}/COUNTIF({},\"<>-\"),0)",
                            cell_ref(row, 2),
                            projects
                        ),
                        NumberFormat::Weight,
                    )?;
                }
            }
        }

        sheet.uniform_width(8, 20.0)?;
        Ok(sheet)
    }

    fn projects_sheet(&self, model: &PerformanceModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let period = model.period_type.as_str().to_uppercase();
        let range = model.data_range();
        let projects = range.column(COL_PROJECT);
        let mut sheet = SheetWriter::new("Project Analysis", &self.style)?;

        sheet.title(0, &format!("PROJECT ANALYSIS - {}", period), 16.0, 6)?;
        sheet.header_row(
            3,
            0,
            &[
                "Project Name",
                "Total Deliveries",
                "Total Cost",
                "Avg Cost",
                "Avg Distance",
                "On-Time Count",
                "On-Time Rate",
            ],
        )?;

        for (idx, ranked) in model.project_table.iter().enumerate() {
            let row = 4 + idx as u32;
            let t = &ranked.totals;
            let (name, b, c, f) = (
                cell_ref(row, 0),
                cell_ref(row, 1),
                cell_ref(row, 2),
                cell_ref(row, 5),
            );
            sheet.label(row, 0, &ranked.key)?;
            match mode {
                ReportMode::Static => {
                    sheet.number(row, 1, t.count as f64, NumberFormat::Integer)?;
                    sheet.number(row, 2, t.cost_sum, NumberFormat::Integer)?;
                    sheet.number(row, 3, t.avg_cost(), NumberFormat::Integer)?;
                    sheet.number(row, 4, t.avg_distance(), NumberFormat::Decimal)?;
                    sheet.number(row, 5, t.on_time as f64, NumberFormat::Integer)?;
                    sheet.number(row, 6, t.on_time_rate(), NumberFormat::Weight)?;
                }
                ReportMode::Formula => {
                    let formulas = [
                        (format!("=COUNTIF({},{})", projects, name), NumberFormat::Integer),
                        (
                            format!("=SUMIF({},{},{})", projects, name, range.column(COL_COST)),
                            NumberFormat::Integer,
                        ),
                        (format!("=IF({b}=0,0,{c}/{b})", b = b, c = c), NumberFormat::Integer),
                        (
                            format!(
                                "=IF({b}=0,0,SUMIF({p},{n},{d})/{b})",
                                b = b,
                                p = projects,
                                n = name,
                                d = range.column(COL_DISTANCE)
                            ),
                            NumberFormat::Decimal,
                        ),
                        (
                            format!(
                                "=COUNTIFS({},{},{},TRUE)",
                                projects,
                                name,
                                range.column(COL_ON_TIME)
                            ),
                            NumberFormat::Integer,
                        ),
                        (format!("=IF({b}=0,0,{f}/{b})", b = b, f = f), NumberFormat::Weight),
                    ];
                    for (offset, (formula, format)) in formulas.iter().enumerate() {
                        sheet.formula(row, 1 + offset as u16, formula, *format)?;
                    }
                }
            }
        }

        sheet.uniform_width(7, 20.0)?;
        Ok(sheet)
    }
}

/// `2024-03-05` or an RFC 3339 timestamp as `05 March 2024`; anything
/// else is shown unchanged
fn joined_date(value: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map(|date| date.format("%d %B %Y").to_string())
        .unwrap_or_else(|_| value.to_string())
}

/// Trend status label computed from a growth cell
fn status_formula(growth: &str) -> String {
    format!(
        "=IF({g}>0.1,\"{inc}\",IF({g}>0,\"{gro}\",IF({g}<-0.1,\"{dec}\",\"{sta}\")))",
        g = growth,
        inc = TrendStatus::Increasing.label(),
        gro = TrendStatus::Growth.label(),
        dec = TrendStatus::Decreasing.label(),
        sta = TrendStatus::Stable.label(),
    )
}

impl ReportGenerator for PerformanceReport {
    fn name(&self) -> &str {
        "performance"
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
        let model = PerformanceModel::build(input, settings, layout)?;
        let mode = settings.mode;

        let mut workbook = ReportWorkbook::new();
        workbook.push(constants_sheet(&model.profile, &self.style)?);
        workbook.push(self.data_quality_sheet(input, &model)?);
        workbook.push(self.shipment_sheet(&model)?);
        workbook.push(self.metrics_sheet(&model, mode)?);
        workbook.push(self.cost_sheet(&model, mode)?);
        workbook.push(self.trends_sheet(&model, mode)?);
        workbook.push(self.projects_sheet(&model, mode)?);
        workbook.save(output)?;

        let period = model.period_type.as_str();
        let dq = &model.data_quality;
        let message = if !dq.has_valid_trends {
            format!(
                "Limited analysis report created (only {} period available). Add more delivery periods for full features.",
                dq.trend_count
            )
        } else if mode == ReportMode::Formula {
            format!(
                "Mitra performance chart with {} Excel formulas created successfully",
                period
            )
        } else {
            format!("Mitra performance chart with {} data created successfully", period)
        };

        let mut metadata = Map::new();
        metadata.insert(
            "data_quality".into(),
            json!({
                "has_valid_trends": dq.has_valid_trends,
                "trend_count": dq.trend_count,
                "shipment_count": model.rows.len(),
                "period_type": period,
            }),
        );
        if mode == ReportMode::Formula {
            metadata.insert(
                "formula_info".into(),
                json!({
                    "all_calculations_use_formulas": true,
                    "constants_sheet": "Constants (hidden)",
                    "source_data_sheet": DATA_SHEET,
                    "period_filter": period,
                }),
            );
        }

        Ok(ReportOutcome { message, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::SnakeCaseLayout;
    use crate::types::RawRecord;
    use serde_json::json;
    use tempfile::TempDir;

    fn shipment(mitra: &str, project: &str, hub: &str, date: &str, cost: f64, sla: &str) -> RawRecord {
        json!({
            "mitra_name": mitra,
            "client_name": "Sayurbox",
            "project_name": project,
            "hub": hub,
            "delivery_date": date,
            "distance_km": 10,
            "cost": cost,
            "sla": sla,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn input() -> ReportInput {
        ReportInput {
            period_type: PeriodType::Monthly,
            shipments: vec![
                shipment("Budi", "Instant", "Cakung", "10/02/2025", 300.0, "On Time"),
                shipment("Budi", "Instant", "Cakung", "03/01/2025", 100.0, "On Time"),
                shipment("Budi", "Sameday", "Bekasi", "not a date", 50.0, "Late"),
                shipment("Budi", "Sameday", "Cakung", "11/02/2025", 200.0, "On Time"),
            ],
            metrics: json!({"cancelRate": 5}).as_object().cloned().unwrap(),
            ..Default::default()
        }
    }

    fn model(input: &ReportInput) -> PerformanceModel {
        PerformanceModel::build(input, &ReportSettings::default(), &SnakeCaseLayout).unwrap()
    }

    // ========== validate ==========

    #[test]
    fn test_validate_empty_shipments() {
        let err = PerformanceReport::default()
            .validate(&ReportInput::default())
            .unwrap_err();
        assert_eq!(err.to_string(), NO_SHIPMENTS);
    }

    // ========== model ==========

    #[test]
    fn test_rows_are_chronological_with_unclassified_last() {
        let model = model(&input());
        let dates: Vec<&str> = model
            .rows
            .iter()
            .map(|r| r.record.delivery_date.as_str())
            .collect();
        assert_eq!(dates, vec!["03/01/2025", "10/02/2025", "11/02/2025", "not a date"]);
        assert_eq!(model.rows[3].display_period(), "not a date");
        assert_eq!(model.rows[0].display_period(), "January 2025");
    }

    #[test]
    fn test_model_totals_and_trend() {
        let model = model(&input());
        assert_eq!(model.profile.name, "performance");
        assert_eq!(model.totals.deliveries, 4);
        assert_eq!(model.totals.on_time, 3);
        assert_eq!(model.trend.len(), 2);
        // January 1, February 2
        assert!((model.growth_rate - 1.0).abs() < 1e-9);
        assert!((model.cancel_rate - 0.05).abs() < 1e-9);
        assert!((model.delivery_rate() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_derived_data_quality() {
        let model = model(&input());
        assert_eq!(
            model.data_quality,
            DataQuality {
                has_valid_trends: true,
                trend_count: 2,
                shipment_count: 4,
            }
        );

        let mut single = input();
        single.shipments.truncate(1);
        let model = self::model(&single);
        assert!(!model.data_quality.has_valid_trends);
        assert_eq!(model.data_quality.trend_count, 1);
    }

    #[test]
    fn test_supplied_data_quality_wins() {
        let mut input = input();
        input.data_quality = Some(DataQuality {
            has_valid_trends: false,
            trend_count: 1,
            shipment_count: 4,
        });
        assert!(!model(&input).has_valid_trends());
    }

    #[test]
    fn test_cost_rankings() {
        let model = model(&input());
        assert_eq!(model.cost_by_project[0].key, "Instant");
        assert!((model.cost_by_project[0].totals.cost_sum - 400.0).abs() < 1e-9);
        assert!((model.cost_by_project[0].share - 400.0 / 650.0).abs() < 1e-9);
        assert_eq!(model.cost_by_hub[0].key, "Cakung");
        assert_eq!(model.top_projects.len(), 2);
        assert_eq!(model.top_projects[0].rank, 1);
    }

    #[test]
    fn test_score_uses_cancel_rate() {
        let model = model(&input());
        // 0.95 delivery rate against a 95% target
        assert!((model.score.delivery_rate - 100.0).abs() < 1e-9);
        assert!((model.score.consistency - 99.5).abs() < 1e-9);
    }

    #[test]
    fn test_joined_date() {
        assert_eq!(joined_date("2024-03-05"), "05 March 2024");
        assert_eq!(joined_date("2024-03-05T08:00:00Z"), "05 March 2024");
        assert_eq!(joined_date("-"), "-");
        assert_eq!(joined_date("last spring"), "last spring");
    }

    #[test]
    fn test_status_formula() {
        let formula = status_formula("E7");
        assert!(formula.starts_with("=IF(E7>0.1,\"↑ Increasing\""));
        assert!(formula.ends_with("\"→ Stable\")))"));
    }

    // ========== build ==========

    #[test]
    fn test_build_static_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("performance.xlsx");
        let outcome = PerformanceReport::default()
            .generate(&input(), &ReportSettings::default(), &path)
            .unwrap();

        assert!(path.exists());
        assert_eq!(
            outcome.message,
            "Mitra performance chart with monthly data created successfully"
        );
        assert_eq!(outcome.metadata["data_quality"]["trend_count"], 2);
        assert_eq!(outcome.metadata["data_quality"]["shipment_count"], 4);
        assert!(outcome.metadata.get("formula_info").is_none());
    }

    #[test]
    fn test_build_formula_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("performance.xlsx");
        let settings = ReportSettings {
            mode: ReportMode::Formula,
            ..Default::default()
        };
        let outcome = PerformanceReport::default()
            .generate(&input(), &settings, &path)
            .unwrap();

        assert!(path.exists());
        assert_eq!(
            outcome.message,
            "Mitra performance chart with monthly Excel formulas created successfully"
        );
        assert_eq!(outcome.metadata["formula_info"]["source_data_sheet"], "Shipment Data");
    }

    #[test]
    fn test_build_limited_analysis() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("limited.xlsx");
        let mut single = input();
        single.shipments.truncate(1);

        let outcome = PerformanceReport::default()
            .generate(&single, &ReportSettings::default(), &path)
            .unwrap();
        assert!(outcome.message.starts_with("Limited analysis report created (only 1 period"));
        assert_eq!(outcome.metadata["data_quality"]["has_valid_trends"], false);
    }
}
