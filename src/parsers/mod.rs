//! Record layouts for the field naming conventions found in input files

mod analytics;
mod mitra;
mod snake;
mod status;
mod title;

pub use analytics::{
    parse_insights, parse_location_performance, parse_summary_metrics, parse_task_performance,
};
pub use mitra::parse_mitras;
pub use snake::SnakeCaseLayout;
pub use status::{parse_lifecycle, parse_status_counts, LifecycleGrain};
pub use title::TitleCaseLayout;

use tracing::debug;

use crate::services::normalizer::{clean_number, clean_string};
use crate::types::{RawRecord, ReportError, Result, ShipmentRecord};

/// Input key for every [`ShipmentRecord`] field; `None` means the layout
/// never carries that field and it stays at the `"-"` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldNames {
    pub mitra_name: &'static str,
    pub mitra_code: Option<&'static str>,
    pub client_name: &'static str,
    pub project_name: Option<&'static str>,
    pub hub: &'static str,
    pub drop_point: &'static str,
    pub order_code: &'static str,
    pub delivery_date: &'static str,
    pub receiving_date: Option<&'static str>,
    pub vehicle_type: Option<&'static str>,
    pub weight: &'static str,
    pub weekly: &'static str,
    pub sla: &'static str,
    pub distance_km: &'static str,
    pub cost: &'static str,
}

/// Maps raw input rows onto [`ShipmentRecord`]
pub trait RecordLayout: Send + Sync {
    /// Layout name (e.g., "snake_case")
    fn name(&self) -> &str;

    /// Input key of each record field
    fn fields(&self) -> &FieldNames;

    /// Normalize one raw row. Never fails: malformed fields fall back to
    /// the `"-"` sentinel or 0.
    fn parse_record(&self, raw: &RawRecord) -> ShipmentRecord {
        let f = self.fields();
        let text = |key: &str| clean_string(raw.get(key));
        let optional = |key: Option<&str>| clean_string(key.and_then(|k| raw.get(k)));

        ShipmentRecord {
            mitra_name: text(f.mitra_name),
            mitra_code: optional(f.mitra_code),
            client_name: text(f.client_name),
            project_name: optional(f.project_name),
            hub: text(f.hub),
            drop_point: text(f.drop_point),
            order_code: text(f.order_code),
            delivery_date: text(f.delivery_date),
            receiving_date: optional(f.receiving_date),
            vehicle_type: optional(f.vehicle_type),
            weight: text(f.weight),
            weekly: text(f.weekly),
            sla: text(f.sla),
            distance_km: clean_number(raw.get(f.distance_km), 0.0),
            cost: clean_number(raw.get(f.cost), 0.0),
        }
    }

    /// Normalize every row, keeping input order
    fn parse_all(&self, raws: &[RawRecord]) -> Vec<ShipmentRecord> {
        debug!(layout = self.name(), rows = raws.len(), "normalizing shipment rows");
        raws.iter().map(|raw| self.parse_record(raw)).collect()
    }
}

/// Registry of the known record layouts
pub struct LayoutRegistry {
    layouts: Vec<Box<dyn RecordLayout>>,
}

impl LayoutRegistry {
    /// Create a new registry with the built-in layouts
    pub fn new() -> Self {
        Self {
            layouts: vec![Box::new(SnakeCaseLayout), Box::new(TitleCaseLayout)],
        }
    }

    /// Get all registered layouts
    pub fn layouts(&self) -> &[Box<dyn RecordLayout>] {
        &self.layouts
    }

    /// Registered layout names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.layouts.iter().map(|l| l.name()).collect()
    }

    /// Find a layout by name
    pub fn get(&self, name: &str) -> Option<&dyn RecordLayout> {
        self.layouts
            .iter()
            .find(|l| l.name() == name)
            .map(|l| l.as_ref())
    }

    /// Find a layout by name; unknown names are a config error
    pub fn resolve(&self, name: &str) -> Result<&dyn RecordLayout> {
        self.get(name).ok_or_else(|| {
            ReportError::Config(format!(
                "unknown layout '{}'. Available: {}",
                name,
                self.names().join(", ")
            ))
        })
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    // ========== LayoutRegistry ==========

    #[test]
    fn test_registry_default_layouts() {
        let registry = LayoutRegistry::new();
        assert_eq!(registry.layouts().len(), 2);
        assert_eq!(registry.names(), vec!["snake_case", "title_case"]);
        assert!(registry.get("snake_case").is_some());
        assert!(registry.get("title_case").is_some());
    }

    #[test]
    fn test_registry_get_unknown() {
        let registry = LayoutRegistry::new();
        assert!(registry.get("camelCase").is_none());
        let err = registry.resolve("camelCase").err().unwrap();
        assert_eq!(
            err.to_string(),
            "config error: unknown layout 'camelCase'. Available: snake_case, title_case"
        );
    }

    #[test]
    fn test_registry_resolve_parses_with_layout() {
        let registry = LayoutRegistry::new();
        let layout = registry.resolve("title_case").unwrap();
        let record = layout.parse_record(&raw(json!({"Mitra Name": "Budi", "Hub": "Cakung"})));
        assert_eq!(record.mitra_name, "Budi");
        assert_eq!(record.hub, "Cakung");
    }

    // ========== RecordLayout ==========

    #[test]
    fn test_parse_all_keeps_order() {
        let rows = vec![
            raw(json!({"mitra_name": "A"})),
            raw(json!({"mitra_name": "B"})),
        ];
        let records = SnakeCaseLayout.parse_all(&rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mitra_name, "A");
        assert_eq!(records[1].mitra_name, "B");
    }

    #[test]
    fn test_empty_row_is_all_sentinels() {
        let record = TitleCaseLayout.parse_record(&RawRecord::new());
        assert_eq!(record, ShipmentRecord::default());
    }
}
