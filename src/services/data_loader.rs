//! Input document loading
//!
//! Reads the report input JSON with simd-json. The document is decoded
//! leniently: absent arrays are empty, rows that are not objects are
//! dropped, and an unknown `periodType` falls back to monthly.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::services::normalizer::{clean_int, clean_string};
use crate::types::{PeriodType, RawRecord, ReportError, Result, MISSING};

/// `dataQuality` block supplied by the upstream exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataQuality {
    pub has_valid_trends: bool,
    pub trend_count: u64,
    pub shipment_count: u64,
}

impl DataQuality {
    fn from_raw(raw: &RawRecord) -> Self {
        Self {
            has_valid_trends: raw
                .get("hasValidTrends")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            trend_count: clean_int(raw.get("trendCount"), 0).max(0) as u64,
            shipment_count: clean_int(raw.get("shipmentCount"), 0).max(0) as u64,
        }
    }
}

/// Decoded report input
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub period_type: PeriodType,
    pub shipments: Vec<RawRecord>,
    pub mitras: Vec<RawRecord>,
    /// Profile of the mitra a performance report is about
    pub profile: RawRecord,
    pub metadata: RawRecord,
    pub metrics: RawRecord,
    /// `None` when the document carries no `dataQuality` block
    pub data_quality: Option<DataQuality>,
    /// Pre-summarized dashboard rows (`performanceData`, `summaryData`,
    /// `insightsData`)
    pub performance_data: Vec<RawRecord>,
    pub summary_data: Vec<RawRecord>,
    pub insights_data: Vec<RawRecord>,
    /// `dateRange` with `start` and `end`
    pub date_range: RawRecord,
    /// Status dashboard blocks
    pub status_summary: RawRecord,
    pub rider_metrics: RawRecord,
    pub applied_filters: RawRecord,
    pub status_distribution: Vec<RawRecord>,
    pub monthly_data: Vec<RawRecord>,
    pub weekly_data: Vec<RawRecord>,
}

impl ReportInput {
    /// A `profile` string field, `"-"` when absent
    pub fn profile_text(&self, key: &str) -> String {
        clean_string(self.profile.get(key))
    }

    /// `"start - end"` of the `dateRange` block, `None` unless both are set
    pub fn date_range_text(&self) -> Option<String> {
        let start = clean_string(self.date_range.get("start"));
        let end = clean_string(self.date_range.get("end"));
        if start == MISSING || end == MISSING {
            return None;
        }
        Some(format!("{} - {}", start, end))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInput {
    #[serde(default)]
    period_type: Option<Value>,
    #[serde(default)]
    shipment_data: Option<Vec<Value>>,
    #[serde(default)]
    mitras: Option<Vec<Value>>,
    #[serde(default)]
    profile: Option<Value>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    metrics: Option<Value>,
    #[serde(default)]
    data_quality: Option<Value>,
    #[serde(default)]
    performance_data: Option<Vec<Value>>,
    #[serde(default)]
    summary_data: Option<Vec<Value>>,
    #[serde(default)]
    insights_data: Option<Vec<Value>>,
    #[serde(default)]
    date_range: Option<Value>,
    #[serde(default)]
    summary: Option<Value>,
    #[serde(default)]
    rider_metrics: Option<Value>,
    #[serde(default)]
    applied_filters: Option<Value>,
    #[serde(default)]
    status_distribution: Option<Vec<Value>>,
    #[serde(default)]
    monthly_data: Option<Vec<Value>>,
    #[serde(default)]
    weekly_data: Option<Vec<Value>>,
}

/// Loader for report input documents
pub struct DataLoader;

impl DataLoader {
    /// Read and decode the input file at `path`
    pub fn load(path: &Path) -> Result<ReportInput> {
        if !path.exists() {
            return Err(ReportError::InputNotFound(path.to_path_buf()));
        }
        let mut bytes = fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "read input document");
        Self::parse(&mut bytes)
    }

    /// Decode an input document. simd-json parses in place, so the buffer
    /// is clobbered.
    pub fn parse(bytes: &mut [u8]) -> Result<ReportInput> {
        let raw: RawInput =
            simd_json::from_slice(bytes).map_err(|e| ReportError::Parse(e.to_string()))?;

        let period_type = match raw.period_type {
            None | Some(Value::Null) => PeriodType::default(),
            Some(Value::String(s)) => PeriodType::parse(&s).unwrap_or_else(|| {
                warn!(period_type = %s, "unknown period type, using monthly");
                PeriodType::Monthly
            }),
            Some(other) => {
                warn!(period_type = %other, "period type is not a string, using monthly");
                PeriodType::Monthly
            }
        };

        Ok(ReportInput {
            period_type,
            shipments: objects(raw.shipment_data, "shipmentData"),
            mitras: objects(raw.mitras, "mitras"),
            profile: object(raw.profile),
            metadata: object(raw.metadata),
            metrics: object(raw.metrics),
            data_quality: raw
                .data_quality
                .and_then(|v| v.as_object().map(DataQuality::from_raw)),
            performance_data: objects(raw.performance_data, "performanceData"),
            summary_data: objects(raw.summary_data, "summaryData"),
            insights_data: objects(raw.insights_data, "insightsData"),
            date_range: object(raw.date_range),
            status_summary: object(raw.summary),
            rider_metrics: object(raw.rider_metrics),
            applied_filters: object(raw.applied_filters),
            status_distribution: objects(raw.status_distribution, "statusDistribution"),
            monthly_data: objects(raw.monthly_data, "monthlyData"),
            weekly_data: objects(raw.weekly_data, "weeklyData"),
        })
    }
}

fn object(value: Option<Value>) -> RawRecord {
    match value {
        Some(Value::Object(map)) => map,
        _ => RawRecord::new(),
    }
}

fn objects(values: Option<Vec<Value>>, field: &str) -> Vec<RawRecord> {
    let values = values.unwrap_or_default();
    let total = values.len();
    let rows: Vec<RawRecord> = values
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();
    if rows.len() < total {
        warn!(field, dropped = total - rows.len(), "skipped non-object rows");
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(json: &str) -> Result<ReportInput> {
        let mut bytes = json.as_bytes().to_vec();
        DataLoader::parse(&mut bytes)
    }

    // ========== parse ==========

    #[test]
    fn test_parse_full_document() {
        let input = parse(
            r#"{
                "periodType": "weekly",
                "shipmentData": [{"mitra_name": "Budi", "cost": 10}],
                "mitras": [{"name": "Budi"}, {"name": "Sari"}],
                "profile": {"name": "Budi", "city": "Jakarta"},
                "metadata": {"mitraName": "Budi"},
                "metrics": {"cancelRate": 2.5},
                "dataQuality": {"hasValidTrends": true, "trendCount": 4, "shipmentCount": 1}
            }"#,
        )
        .unwrap();

        assert_eq!(input.period_type, PeriodType::Weekly);
        assert_eq!(input.shipments.len(), 1);
        assert_eq!(input.mitras.len(), 2);
        assert_eq!(input.metadata.get("mitraName").and_then(Value::as_str), Some("Budi"));
        assert_eq!(input.profile_text("city"), "Jakarta");
        assert_eq!(input.metrics.get("cancelRate").and_then(Value::as_f64), Some(2.5));
        assert_eq!(
            input.data_quality,
            Some(DataQuality {
                has_valid_trends: true,
                trend_count: 4,
                shipment_count: 1,
            })
        );
    }

    #[test]
    fn test_parse_defaults() {
        let input = parse("{}").unwrap();
        assert_eq!(input.period_type, PeriodType::Monthly);
        assert!(input.shipments.is_empty());
        assert!(input.mitras.is_empty());
        assert!(input.data_quality.is_none());
        assert!(input.metadata.is_empty());
        assert_eq!(input.profile_text("name"), "-");
    }

    #[test]
    fn test_unknown_period_type_falls_back_to_monthly() {
        assert_eq!(
            parse(r#"{"periodType": "quarterly"}"#).unwrap().period_type,
            PeriodType::Monthly
        );
        assert_eq!(
            parse(r#"{"periodType": 7}"#).unwrap().period_type,
            PeriodType::Monthly
        );
        assert_eq!(
            parse(r#"{"periodType": "Yearly"}"#).unwrap().period_type,
            PeriodType::Yearly
        );
    }

    #[test]
    fn test_null_arrays_are_empty() {
        let input = parse(r#"{"shipmentData": null, "mitras": null}"#).unwrap();
        assert!(input.shipments.is_empty());
        assert!(input.mitras.is_empty());
    }

    #[test]
    fn test_non_object_rows_are_dropped() {
        let input = parse(r#"{"mitras": [{"name": "A"}, 5, "x", null, {"name": "B"}]}"#).unwrap();
        assert_eq!(input.mitras.len(), 2);
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, ReportError::Parse(_)));
    }

    #[test]
    fn test_parse_dashboard_blocks() {
        let input = parse(
            r#"{
                "performanceData": [{"User Name": "dewi"}, 3],
                "summaryData": [{"Metric": "Total Tasks", "Value": 40}],
                "insightsData": [],
                "dateRange": {"start": "01/01/2025", "end": "31/01/2025"},
                "summary": {"totalMitras": 12},
                "riderMetrics": {"currentActiveRiders": 8},
                "appliedFilters": {"year": "2025"},
                "statusDistribution": [{"status": "Active", "count": 8}],
                "monthlyData": [{"month": "January"}],
                "weeklyData": null
            }"#,
        )
        .unwrap();

        assert_eq!(input.performance_data.len(), 1);
        assert_eq!(input.summary_data.len(), 1);
        assert!(input.insights_data.is_empty());
        assert_eq!(input.date_range_text().as_deref(), Some("01/01/2025 - 31/01/2025"));
        assert_eq!(input.status_summary.get("totalMitras").and_then(Value::as_u64), Some(12));
        assert_eq!(input.rider_metrics.len(), 1);
        assert_eq!(input.applied_filters.len(), 1);
        assert_eq!(input.status_distribution.len(), 1);
        assert_eq!(input.monthly_data.len(), 1);
        assert!(input.weekly_data.is_empty());
    }

    #[test]
    fn test_date_range_needs_both_ends() {
        let input = parse(r#"{"dateRange": {"start": "01/01/2025"}}"#).unwrap();
        assert_eq!(input.date_range_text(), None);
        assert_eq!(parse("{}").unwrap().date_range_text(), None);
    }

    // ========== load ==========

    #[test]
    fn test_load_missing_file() {
        let err = DataLoader::load(Path::new("/nonexistent/input.json")).unwrap_err();
        assert!(matches!(err, ReportError::InputNotFound(_)));
        assert!(err.to_string().starts_with("Input file not found"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"periodType":"daily","shipmentData":[{"hub":"Cakung"}]}"#)
            .unwrap();
        let input = DataLoader::load(file.path()).unwrap();
        assert_eq!(input.period_type, PeriodType::Daily);
        assert_eq!(input.shipments.len(), 1);
    }
}
