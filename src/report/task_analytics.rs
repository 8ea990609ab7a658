//! Task performance analytics dashboard from the pre-summarized
//! `performanceData`, `summaryData` and `insightsData` blocks.

use std::path::Path;

use serde_json::{json, Map};

use super::formula::tiered;
use super::workbook::{cell_ref, sheet_ref, ReportWorkbook, SheetWriter};
use super::{NumberFormat, ReportGenerator, ReportOutcome, StyleConfig};
use crate::config::{ReportMode, ReportSettings};
use crate::parsers::{parse_insights, parse_summary_metrics, parse_task_performance};
use crate::services::{top_n_by, ReportInput, TaskLevel};
use crate::types::{
    metric_value, ratio, Insight, InsightCategory, ReportError, Result, SummaryMetric,
    TaskPerformance,
};

const NO_PERFORMANCE: &str =
    "No performance data available. Cannot generate report without performance data.";

const USERS_SHEET: &str = "User Performance Analysis";
const USERS_HEADER_ROW: u32 = 3;
const USERS_HEADERS: [&str; 14] = [
    "Rank",
    "User Name",
    "Total Tasks",
    "Eligible",
    "Not Eligible",
    "Success Rate %",
    "Invited",
    "Changed Mind",
    "No Response",
    "Response Rate %",
    "Conversion Rate %",
    "Performance Level",
    "Projects",
    "Cities",
];
const COL_SUCCESS: u16 = 5;
const COL_LEVEL: u16 = 11;

/// One management recommendation
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Recommendation {
    pub category: &'static str,
    pub title: String,
    pub description: String,
    pub actions: [&'static str; 4],
    pub timeline: &'static str,
    pub owner: &'static str,
}

/// Recommendations from the summary metrics and insight sections.
///
/// The data-driven enhancement item is always last.
pub(crate) fn recommendations(
    metrics: &[SummaryMetric],
    insights: &[Insight],
) -> Vec<Recommendation> {
    let mut items = Vec::new();
    let total_tasks = metric_value(metrics, "Total Tasks");
    let in_section = |category: InsightCategory| {
        insights.iter().filter(|i| i.category == category).count()
    };

    if total_tasks > 0.0 {
        let success = metric_value(metrics, "Total Eligible") / total_tasks * 100.0;
        if success < 50.0 {
            items.push(Recommendation {
                category: "Critical",
                title: "Overall Success Rate Below Target".into(),
                description: "Current success rate requires immediate intervention.".into(),
                actions: [
                    "Conduct comprehensive review of task qualification criteria",
                    "Implement mandatory training program for all users",
                    "Establish weekly performance monitoring meetings",
                    "Review and update standard operating procedures",
                ],
                timeline: "Immediate (1-2 weeks)",
                owner: "Operations Manager",
            });
        }
    }

    let priority_users = in_section(InsightCategory::PriorityArea);
    if priority_users > 0 {
        items.push(Recommendation {
            category: "High Priority",
            title: format!("Performance Improvement Required for {} Users", priority_users),
            description: "Multiple users showing below-target performance metrics requiring immediate coaching.".into(),
            actions: [
                "Schedule one-on-one coaching sessions with underperforming users",
                "Assign mentors from top performer group",
                "Implement 30-day performance improvement plans",
                "Provide additional resources and training materials",
            ],
            timeline: "Short-term (2-4 weeks)",
            owner: "Team Lead & HR",
        });
    }

    let top_performers = in_section(InsightCategory::TopPerformer);
    if top_performers >= 3 {
        items.push(Recommendation {
            category: "Strategic",
            title: "Leverage Top Performers for Knowledge Transfer".into(),
            description: format!(
                "{} users demonstrating excellence in task execution.",
                top_performers
            ),
            actions: [
                "Document best practices from top performers",
                "Establish peer mentoring program",
                "Create case studies of successful task completions",
                "Recognize and reward top performers publicly",
            ],
            timeline: "Medium-term (1-2 months)",
            owner: "Training & Development",
        });
    }

    if total_tasks > 0.0 {
        let responded = metric_value(metrics, "Total Invited")
            + metric_value(metrics, "Total Changed Mind")
            + metric_value(metrics, "Total No Response");
        if responded / total_tasks * 100.0 < 70.0 {
            items.push(Recommendation {
                category: "Operational",
                title: "Improve Response Rate and Follow-up Process".into(),
                description: "Response rate optimization opportunity identified.".into(),
                actions: [
                    "Implement automated follow-up reminder system",
                    "Review and optimize contact timing strategies",
                    "Develop multi-channel communication approach",
                    "Create response tracking dashboard",
                ],
                timeline: "Medium-term (4-6 weeks)",
                owner: "Operations Team",
            });
        }
    }

    items.push(Recommendation {
        category: "Strategic",
        title: "Data-Driven Decision Making Enhancement".into(),
        description: "Establish robust analytics framework for continuous improvement.".into(),
        actions: [
            "Implement real-time performance monitoring dashboard",
            "Schedule monthly analytics review meetings",
            "Develop predictive models for success rate optimization",
            "Create automated reporting system for management",
        ],
        timeline: "Long-term (2-3 months)",
        owner: "Data Analytics Team",
    });
    items
}

/// Executive summary row computed from other metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DerivedMetric {
    SuccessRate,
    AvgTasksPerUser,
    ResponseRate,
}

impl DerivedMetric {
    const ALL: [DerivedMetric; 3] = [Self::SuccessRate, Self::AvgTasksPerUser, Self::ResponseRate];

    fn label(self) -> &'static str {
        match self {
            Self::SuccessRate => "Overall Success Rate",
            Self::AvgTasksPerUser => "Average Tasks per User",
            Self::ResponseRate => "Response Rate",
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Self::AvgTasksPerUser => "tasks",
            Self::SuccessRate | Self::ResponseRate => "percentage",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::SuccessRate => "Percentage of tasks marked as Eligible",
            Self::AvgTasksPerUser => "Average workload distribution across all users",
            Self::ResponseRate => "Percentage of tasks with responses",
        }
    }

    /// `(numerator metrics, denominator metric)`
    fn inputs(self) -> (&'static [&'static str], &'static str) {
        match self {
            Self::SuccessRate => (&["Total Eligible"], "Total Tasks"),
            Self::AvgTasksPerUser => (&["Total Tasks"], "Active Users"),
            Self::ResponseRate => (
                &["Total Invited", "Total Changed Mind", "Total No Response"],
                "Total Tasks",
            ),
        }
    }

    fn format(self) -> NumberFormat {
        match self {
            Self::AvgTasksPerUser => NumberFormat::Decimal,
            Self::SuccessRate | Self::ResponseRate => NumberFormat::Weight,
        }
    }
}

/// Pre-computed tables of the task analytics workbook
#[derive(Debug, Clone)]
pub(crate) struct TaskAnalyticsModel {
    pub metrics: Vec<SummaryMetric>,
    /// Users sorted by upstream rank, unranked last
    pub users: Vec<TaskPerformance>,
    /// Position of each sorted user in the input `performanceData`
    pub order: Vec<usize>,
    /// Indices into `users`, best success rate first
    pub top_performers: Vec<usize>,
    pub insights: Vec<Insight>,
    pub report_period: String,
    pub recommendations: Vec<Recommendation>,
}

impl TaskAnalyticsModel {
    pub fn build(input: &ReportInput, settings: &ReportSettings) -> Self {
        let metrics = parse_summary_metrics(&input.summary_data);
        let insights = parse_insights(&input.insights_data);

        let mut ranked: Vec<(usize, TaskPerformance)> = parse_task_performance(&input.performance_data)
            .into_iter()
            .enumerate()
            .collect();
        ranked.sort_by_key(|(_, user)| user.rank.unwrap_or(u64::MAX));
        let (order, users): (Vec<usize>, Vec<TaskPerformance>) = ranked.into_iter().unzip();

        let rates: Vec<(usize, f64)> = users
            .iter()
            .enumerate()
            .map(|(idx, user)| (idx, user.success_rate()))
            .collect();
        let top_performers = top_n_by(&rates, settings.top_n.top_performers, |(_, rate)| *rate)
            .into_iter()
            .map(|(idx, _)| *idx)
            .collect();

        let recommendations = recommendations(&metrics, &insights);
        Self {
            report_period: input
                .date_range_text()
                .unwrap_or_else(|| "All Time Data".to_string()),
            metrics,
            users,
            order,
            top_performers,
            insights,
            recommendations,
        }
    }

    /// Row of an insight's user in `users`: by input position, then by name
    fn user_position(&self, insight: &Insight) -> Option<usize> {
        insight
            .original_index
            .and_then(|original| self.order.iter().position(|o| *o == original))
            .or_else(|| self.users.iter().position(|u| u.user_name == insight.name))
    }

    fn level_counts(&self) -> [(TaskLevel, usize); 4] {
        TaskLevel::ALL.map(|level| {
            let count = self
                .users
                .iter()
                .filter(|u| TaskLevel::from_success_rate(u.success_rate()) == level)
                .count();
            (level, count)
        })
    }

    /// Value of a derived metric, `None` when an input metric is missing
    fn derived_value(&self, metric: DerivedMetric) -> Option<f64> {
        let (numerators, denominator) = metric.inputs();
        let has = |name: &str| self.metrics.iter().any(|m| m.metric == name);
        if !has(denominator) || !numerators.iter().all(|n| has(*n)) {
            return None;
        }
        let numerator: f64 = numerators.iter().map(|n| metric_value(&self.metrics, n)).sum();
        Some(ratio(numerator, metric_value(&self.metrics, denominator)))
    }
}

/// Excel row of sorted user `idx` on the users sheet
fn user_excel_row(idx: usize) -> u32 {
    USERS_HEADER_ROW + 2 + idx as u32
}

/// Task analytics workbook
#[derive(Default)]
pub struct TaskAnalyticsReport {
    style: StyleConfig,
}

impl TaskAnalyticsReport {
    pub fn new(style: StyleConfig) -> Self {
        Self { style }
    }

    fn overview_sheet(&self, model: &TaskAnalyticsModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Dashboard Overview", &self.style)?;
        sheet.activate();

        sheet.title(1, "TASK PERFORMANCE ANALYTICS DASHBOARD", 20.0, 6)?;
        sheet.note(2, 0, "User task eligibility and response performance")?;
        sheet.label(5, 1, "Report Period:")?;
        sheet.text(5, 2, &model.report_period)?;

        sheet.section(8, 1, "KEY METRICS")?;
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

        sheet.section(20, 1, "REPORT SECTIONS")?;
        let sections = [
            ("Executive Summary", "Key metrics with calculated rates"),
            (USERS_SHEET, "Per-user rates and performance levels"),
            ("Top Performers", "Users ranked by success rate"),
            ("Strategic Insights", "Top performers, priority areas and volume leaders"),
            ("Management Recommendations", "Action plans for leadership"),
        ];
        for (idx, (name, description)) in sections.iter().enumerate() {
            let row = 22 + idx as u32;
            sheet.label(row, 1, name)?;
            sheet.note(row, 2, description)?;
        }

        sheet.widths(&[2.0, 30.0, 35.0, 15.0])?;
        Ok(sheet)
    }

    fn executive_sheet(&self, model: &TaskAnalyticsModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Executive Summary", &self.style)?;
        sheet.title(0, "EXECUTIVE SUMMARY - KEY METRICS", 16.0, 4)?;
        sheet.header_row(3, 0, &["Metric", "Value", "Unit", "Status", "Description"])?;

        let first = 4;
        for (idx, metric) in model.metrics.iter().enumerate() {
            let row = first + idx as u32;
            sheet.label(row, 0, &metric.metric)?;
            let status = if metric.is_percentage() {
                sheet.number(row, 1, metric.value, NumberFormat::Points)?;
                TaskLevel::from_success_rate(metric.value / 100.0).label()
            } else {
                sheet.number(row, 1, metric.value, NumberFormat::Integer)?;
                "-"
            };
            sheet.text(row, 2, &metric.unit)?;
            sheet.text(row, 3, status)?;
            sheet.note(row, 4, &metric.description)?;
        }

        let metric_cell = |name: &str| {
            model
                .metrics
                .iter()
                .position(|m| m.metric == name)
                .map(|idx| cell_ref(first + idx as u32, 1))
        };

        let mut row = first + model.metrics.len() as u32;
        for derived in DerivedMetric::ALL {
            let Some(value) = model.derived_value(derived) else {
                continue;
            };
            sheet.label(row, 0, derived.label())?;
            match mode {
                ReportMode::Static => sheet.kpi(row, 1, value, derived.format())?,
                ReportMode::Formula => {
                    let (numerators, denominator) = derived.inputs();
                    let numerator = numerators
                        .iter()
                        .filter_map(|n| metric_cell(*n))
                        .collect::<Vec<_>>()
                        .join("+");
                    let denominator = metric_cell(denominator).unwrap_or_default();
                    let formula = format!(
                        "=IF({d}>0,({n})/{d},0)",
                        d = denominator,
                        n = numerator
                    );
                    sheet.kpi_formula(row, 1, &formula, derived.format())?;
                }
            }
            sheet.text(row, 2, derived.unit())?;
            if derived.format() == NumberFormat::Weight {
                match mode {
                    ReportMode::Static => {
                        sheet.text(row, 3, TaskLevel::from_success_rate(value).label())?
                    }
                    ReportMode::Formula => {
                        sheet.text_formula(row, 3, &level_formula(&cell_ref(row, 1)))?
                    }
                }
            } else {
                sheet.text(row, 3, "-")?;
            }
            sheet.note(row, 4, derived.description())?;
            row += 1;
        }

        sheet.widths(&[28.0, 16.0, 12.0, 18.0, 50.0])?;
        Ok(sheet)
    }

    fn users_sheet(&self, model: &TaskAnalyticsModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new(USERS_SHEET, &self.style)?;
        sheet.title(0, "USER PERFORMANCE ANALYSIS", 16.0, 13)?;
        sheet.note(1, 0, "Users ordered by rank")?;
        sheet.header_row(USERS_HEADER_ROW, 0, &USERS_HEADERS)?;

        for (idx, user) in model.users.iter().enumerate() {
            let row = USERS_HEADER_ROW + 1 + idx as u32;
            let r = row + 1;
            let rank = user.rank.unwrap_or(idx as u64 + 1);
            sheet.number(row, 0, rank as f64, NumberFormat::Count)?;
            sheet.label(row, 1, &user.user_name)?;
            sheet.number(row, 2, user.total_tasks as f64, NumberFormat::Integer)?;
            sheet.number(row, 3, user.eligible as f64, NumberFormat::Integer)?;
            sheet.number(row, 4, user.not_eligible as f64, NumberFormat::Integer)?;
            sheet.number(row, 6, user.invited as f64, NumberFormat::Integer)?;
            sheet.number(row, 7, user.changed_mind as f64, NumberFormat::Integer)?;
            sheet.number(row, 8, user.no_response as f64, NumberFormat::Integer)?;

            match mode {
                ReportMode::Static => {
                    sheet.number(row, COL_SUCCESS, user.success_rate(), NumberFormat::Weight)?;
                    sheet.number(row, 9, user.response_rate(), NumberFormat::Weight)?;
                    sheet.number(row, 10, user.conversion_rate(), NumberFormat::Weight)?;
                    let level = TaskLevel::from_success_rate(user.success_rate());
                    sheet.text(row, COL_LEVEL, level.label())?;
                }
                ReportMode::Formula => {
                    let success = format!("=IF(C{r}>0,D{r}/C{r},0)", r = r);
                    let response = format!("=IF(C{r}>0,(G{r}+H{r}+I{r})/C{r},0)", r = r);
                    let conversion = format!("=IF(G{r}>0,D{r}/G{r},0)", r = r);
                    sheet.formula(row, COL_SUCCESS, &success, NumberFormat::Weight)?;
                    sheet.formula(row, 9, &response, NumberFormat::Weight)?;
                    sheet.formula(row, 10, &conversion, NumberFormat::Weight)?;
                    sheet.text_formula(row, COL_LEVEL, &level_formula(&format!("F{}", r)))?;
                }
            }
            sheet.text(row, 12, &user.projects)?;
            sheet.text(row, 13, &user.cities)?;
        }

        let section = USERS_HEADER_ROW + model.users.len() as u32 + 3;
        sheet.section(section, 0, "PERFORMANCE LEVEL DISTRIBUTION")?;
        sheet.header_row(section + 1, 0, &["Level", "Count"])?;
        let last_user_row = user_excel_row(model.users.len().saturating_sub(1));
        for (idx, (level, count)) in model.level_counts().into_iter().enumerate() {
            let row = section + 2 + idx as u32;
            sheet.text(row, 0, level.label())?;
            match mode {
                ReportMode::Static => sheet.number(row, 1, count as f64, NumberFormat::Count)?,
                ReportMode::Formula => {
                    let formula = format!(
                        "=COUNTIF(L{}:L{},A{})",
                        user_excel_row(0),
                        last_user_row,
                        row + 1
                    );
                    sheet.formula(row, 1, &formula, NumberFormat::Count)?;
                }
            }
        }

        sheet.widths(&[
            7.0, 20.0, 12.0, 10.0, 12.0, 14.0, 10.0, 13.0, 12.0, 14.0, 14.0, 18.0, 25.0, 25.0,
        ])?;
        Ok(sheet)
    }

    fn top_performers_sheet(
        &self,
        model: &TaskAnalyticsModel,
        mode: ReportMode,
    ) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Top Performers", &self.style)?;
        sheet.title(0, "TOP PERFORMERS BY SUCCESS RATE", 16.0, 4)?;
        sheet.header_row(
            3,
            0,
            &["Position", "User Name", "Total Tasks", "Success Rate %", "Performance Level"],
        )?;

        for (position, &idx) in model.top_performers.iter().enumerate() {
            let row = 4 + position as u32;
            let user = &model.users[idx];
            sheet.number(row, 0, (position + 1) as f64, NumberFormat::Count)?;
            sheet.label(row, 1, &user.user_name)?;
            sheet.number(row, 2, user.total_tasks as f64, NumberFormat::Integer)?;
            user_rate_cells(&mut sheet, model, mode, row, 3, idx)?;
        }

        sheet.widths(&[10.0, 22.0, 12.0, 16.0, 20.0])?;
        Ok(sheet)
    }

    fn insights_sheet(&self, model: &TaskAnalyticsModel, mode: ReportMode) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Strategic Insights", &self.style)?;
        sheet.title(0, "STRATEGIC INSIGHTS & RECOMMENDATIONS", 16.0, 7)?;
        sheet.note(1, 0, "Data-Driven Insights for Leadership Decision Making")?;
        sheet.header_row(
            3,
            0,
            &[
                "Category",
                "User",
                "Total Tasks",
                "Success Rate %",
                "Performance Level",
                "Rank",
                "Key Issues",
                "Priority",
            ],
        )?;

        let mut row = 4;
        for category in InsightCategory::SECTIONS {
            let items: Vec<&Insight> = model
                .insights
                .iter()
                .filter(|i| i.category == category)
                .collect();
            if items.is_empty() {
                continue;
            }
            sheet.section(row, 0, &section_title(category))?;
            row += 1;
            for insight in items {
                sheet.text(row, 0, category.as_str())?;
                sheet.label(row, 1, &insight.name)?;
                sheet.number(row, 2, insight.volume, NumberFormat::Integer)?;
                match model.user_position(insight) {
                    Some(idx) => user_rate_cells(&mut sheet, model, mode, row, 3, idx)?,
                    None => {
                        sheet.text(row, 3, "-")?;
                        sheet.text(row, 4, "-")?;
                    }
                }
                sheet.text(row, 5, &insight.rank)?;
                sheet.note(row, 6, &insight.issues)?;
                if category == InsightCategory::PriorityArea {
                    sheet.alert(row, 7, category.priority())?;
                } else {
                    sheet.text(row, 7, category.priority())?;
                }
                row += 1;
            }
            row += 1;
        }

        sheet.widths(&[20.0, 20.0, 14.0, 15.0, 20.0, 10.0, 35.0, 12.0])?;
        Ok(sheet)
    }

    fn recommendations_sheet(&self, model: &TaskAnalyticsModel) -> Result<SheetWriter<'_>> {
        let mut sheet = SheetWriter::new("Management Recommendations", &self.style)?;
        sheet.title(0, "MANAGEMENT RECOMMENDATIONS", 16.0, 5)?;
        sheet.note(1, 0, "Data-Driven Insights for Leadership Decision Making")?;

        let mut row = 3;
        for item in &model.recommendations {
            let tag = format!("[{}]", item.category.to_uppercase());
            match item.category {
                "Critical" | "High Priority" => sheet.alert(row, 0, &tag)?,
                _ => sheet.section(row, 0, &tag)?,
            }
            row += 1;
            sheet.label(row, 0, &item.title)?;
            row += 1;
            sheet.text(row, 0, &item.description)?;
            row += 1;
            for action in item.actions {
                sheet.text(row, 0, &format!("• {}", action))?;
                row += 1;
            }
            sheet.note(row, 0, &format!("Timeline: {}", item.timeline))?;
            sheet.note(row, 3, &format!("Owner: {}", item.owner))?;
            row += 2;
        }

        sheet.widths(&[60.0, 20.0, 20.0, 30.0])?;
        Ok(sheet)
    }
}

fn level_formula(cell: &str) -> String {
    let tiers = [
        (TaskLevel::EXCELLENT_FROM, TaskLevel::Excellent.label()),
        (TaskLevel::GOOD_FROM, TaskLevel::Good.label()),
        (TaskLevel::FAIR_FROM, TaskLevel::Fair.label()),
    ];
    tiered(cell, ">=", &tiers, TaskLevel::NeedsImprovement.label())
}

/// Section banner of an insight category
pub(crate) fn section_title(category: InsightCategory) -> String {
    match category {
        InsightCategory::TopPerformer => "TOP PERFORMERS".into(),
        InsightCategory::PriorityArea => "PRIORITY AREAS (NEEDS IMPROVEMENT)".into(),
        InsightCategory::VolumeLeader => "VOLUME LEADERS".into(),
        InsightCategory::Other => category.as_str().to_uppercase(),
    }
}

/// Success rate and level of sorted user `idx` at `col` and `col + 1`,
/// linked to the users sheet in formula mode
fn user_rate_cells(
    sheet: &mut SheetWriter<'_>,
    model: &TaskAnalyticsModel,
    mode: ReportMode,
    row: u32,
    col: u16,
    idx: usize,
) -> Result<()> {
    match mode {
        ReportMode::Static => {
            let rate = model.users[idx].success_rate();
            sheet.number(row, col, rate, NumberFormat::Weight)?;
            sheet.text(row, col + 1, TaskLevel::from_success_rate(rate).label())
        }
        ReportMode::Formula => {
            let source_row = user_excel_row(idx) - 1;
            let rate = format!("={}!{}", sheet_ref(USERS_SHEET), cell_ref(source_row, COL_SUCCESS));
            let level = format!("={}!{}", sheet_ref(USERS_SHEET), cell_ref(source_row, COL_LEVEL));
            sheet.formula(row, col, &rate, NumberFormat::Weight)?;
            sheet.text_formula(row, col + 1, &level)
        }
    }
}

impl ReportGenerator for TaskAnalyticsReport {
    fn name(&self) -> &str {
        "task-analytics"
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
        settings: &ReportSettings,
        output: &Path,
    ) -> Result<ReportOutcome> {
        let model = TaskAnalyticsModel::build(input, settings);
        let mode = settings.mode;

        let mut workbook = ReportWorkbook::new();
        workbook.push(self.overview_sheet(&model)?);
        workbook.push(self.executive_sheet(&model, mode)?);
        workbook.push(self.users_sheet(&model, mode)?);
        workbook.push(self.top_performers_sheet(&model, mode)?);
        workbook.push(self.insights_sheet(&model, mode)?);
        workbook.push(self.recommendations_sheet(&model)?);
        workbook.save(output)?;

        let mut metadata = Map::new();
        metadata.insert("mode".into(), json!(mode.as_str()));
        metadata.insert("report_period".into(), json!(model.report_period));
        metadata.insert(
            "data_summary".into(),
            json!({
                "users": model.users.len(),
                "top_performers": model.top_performers.len(),
                "insights": model.insights.len(),
                "recommendations": model.recommendations.len(),
            }),
        );

        Ok(ReportOutcome {
            message: "Task performance analytics dashboard created successfully".into(),
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawRecord;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn metric(name: &str, value: f64) -> SummaryMetric {
        SummaryMetric {
            metric: name.into(),
            value,
            ..Default::default()
        }
    }

    fn insight(category: InsightCategory, name: &str) -> Insight {
        Insight {
            category,
            name: name.into(),
            location: "-".into(),
            volume: 0.0,
            percentage: 0.0,
            rank: "-".into(),
            issues: "-".into(),
            performance_level: "-".into(),
            original_index: None,
        }
    }

    fn input() -> ReportInput {
        ReportInput {
            performance_data: vec![
                raw(json!({"Rank": 2, "User Name": "sari", "Total Tasks": 10, "Eligible": 4, "Invited": 8})),
                raw(json!({"User Name": "andi", "Total Tasks": 5, "Eligible": 1})),
                raw(json!({"Rank": 1, "User Name": "dewi", "Total Tasks": 20, "Eligible": 16, "Invited": 18})),
            ],
            summary_data: vec![
                raw(json!({"Metric": "Total Tasks", "Value": 35, "Unit": "tasks"})),
                raw(json!({"Metric": "Total Eligible", "Value": 21, "Unit": "tasks"})),
                raw(json!({"Metric": "Active Users", "Value": 3, "Unit": "users"})),
            ],
            insights_data: vec![
                raw(json!({"Category": "Top Performer", "User": "dewi", "Total Tasks": 20, "OriginalIndex": 2})),
                raw(json!({"Category": "Priority Area", "User": "andi", "Total Tasks": 5})),
            ],
            date_range: raw(json!({"start": "01/01/2025", "end": "31/01/2025"})),
            ..Default::default()
        }
    }

    // ========== validate ==========

    #[test]
    fn test_validate_empty_performance() {
        let err = TaskAnalyticsReport::default()
            .validate(&ReportInput::default())
            .unwrap_err();
        assert_eq!(err.to_string(), NO_PERFORMANCE);
        assert!(err.details().unwrap().contains("performance data"));
    }

    // ========== model ==========

    #[test]
    fn test_users_sorted_by_rank_unranked_last() {
        let model = TaskAnalyticsModel::build(&input(), &ReportSettings::default());
        let names: Vec<&str> = model.users.iter().map(|u| u.user_name.as_str()).collect();
        assert_eq!(names, vec!["dewi", "sari", "andi"]);
        assert_eq!(model.order, vec![2, 0, 1]);
        assert_eq!(model.report_period, "01/01/2025 - 31/01/2025");
    }

    #[test]
    fn test_top_performers_by_success_rate() {
        let mut settings = ReportSettings::default();
        settings.top_n.top_performers = 2;
        let model = TaskAnalyticsModel::build(&input(), &settings);
        // dewi 0.8, sari 0.4, andi 0.2
        assert_eq!(model.top_performers, vec![0, 1]);
    }

    #[test]
    fn test_user_position_by_index_then_name() {
        let model = TaskAnalyticsModel::build(&input(), &ReportSettings::default());
        assert_eq!(model.user_position(&model.insights[0]), Some(0));
        assert_eq!(model.user_position(&model.insights[1]), Some(2));
        let unknown = insight(InsightCategory::VolumeLeader, "nobody");
        assert_eq!(model.user_position(&unknown), None);
    }

    #[test]
    fn test_level_counts() {
        let model = TaskAnalyticsModel::build(&input(), &ReportSettings::default());
        let counts = model.level_counts();
        assert_eq!(counts[0], (TaskLevel::Excellent, 1));
        assert_eq!(counts[1], (TaskLevel::Good, 0));
        assert_eq!(counts[2], (TaskLevel::Fair, 1));
        assert_eq!(counts[3], (TaskLevel::NeedsImprovement, 1));
    }

    #[test]
    fn test_derived_metrics_need_inputs() {
        let model = TaskAnalyticsModel::build(&input(), &ReportSettings::default());
        assert_eq!(model.derived_value(DerivedMetric::SuccessRate), Some(0.6));
        let avg = model.derived_value(DerivedMetric::AvgTasksPerUser).unwrap();
        assert!((avg - 35.0 / 3.0).abs() < 1e-9);
        assert_eq!(model.derived_value(DerivedMetric::ResponseRate), None);
    }

    #[test]
    fn test_all_time_without_date_range() {
        let mut input = input();
        input.date_range = RawRecord::new();
        let model = TaskAnalyticsModel::build(&input, &ReportSettings::default());
        assert_eq!(model.report_period, "All Time Data");
    }

    // ========== recommendations ==========

    #[test]
    fn test_recommendations_low_success_and_response() {
        let metrics = vec![
            metric("Total Tasks", 100.0),
            metric("Total Eligible", 40.0),
            metric("Total Invited", 30.0),
            metric("Total No Response", 10.0),
        ];
        let insights = vec![
            insight(InsightCategory::PriorityArea, "a"),
            insight(InsightCategory::PriorityArea, "b"),
        ];
        let items = recommendations(&metrics, &insights);
        let categories: Vec<&str> = items.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec!["Critical", "High Priority", "Operational", "Strategic"]
        );
        assert_eq!(items[1].title, "Performance Improvement Required for 2 Users");
        assert_eq!(items[3].title, "Data-Driven Decision Making Enhancement");
    }

    #[test]
    fn test_recommendations_healthy_team() {
        let metrics = vec![
            metric("Total Tasks", 100.0),
            metric("Total Eligible", 80.0),
            metric("Total Invited", 90.0),
        ];
        let insights = vec![
            insight(InsightCategory::TopPerformer, "a"),
            insight(InsightCategory::TopPerformer, "b"),
            insight(InsightCategory::TopPerformer, "c"),
        ];
        let items = recommendations(&metrics, &insights);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Leverage Top Performers for Knowledge Transfer");
        assert_eq!(items[0].description, "3 users demonstrating excellence in task execution.");
    }

    #[test]
    fn test_recommendations_without_tasks() {
        let items = recommendations(&[], &[]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].owner, "Data Analytics Team");
    }

    #[test]
    fn test_level_formula() {
        assert_eq!(
            level_formula("F5"),
            "=IF(F5>=0.7,\"Excellent\",IF(F5>=0.5,\"Good\",IF(F5>=0.3,\"Fair\",\"Needs Improvement\")))"
        );
    }

    // ========== build ==========

    #[test]
    fn test_build_static_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.xlsx");
        let outcome = TaskAnalyticsReport::default()
            .generate(&input(), &ReportSettings::default(), &path)
            .unwrap();

        assert!(path.exists());
        assert_eq!(
            outcome.message,
            "Task performance analytics dashboard created successfully"
        );
        assert_eq!(outcome.metadata["data_summary"]["users"], 3);
        assert_eq!(outcome.metadata["report_period"], "01/01/2025 - 31/01/2025");
    }

    #[test]
    fn test_build_formula_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.xlsx");
        let settings = ReportSettings {
            mode: ReportMode::Formula,
            ..Default::default()
        };
        let outcome = TaskAnalyticsReport::default()
            .generate(&input(), &settings, &path)
            .unwrap();
        assert!(path.exists());
        assert_eq!(outcome.metadata["mode"], "formula");
    }
}
