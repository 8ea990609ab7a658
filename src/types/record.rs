//! Normalized input records

use serde::Serialize;

/// Sentinel used for absent or blank string fields
pub const MISSING: &str = "-";

/// A raw input row: flat mapping of string keys to JSON scalars
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// One delivery event after normalization.
///
/// Every string field holds [`MISSING`] when the input was null, empty or
/// already the placeholder; numeric fields hold 0 when unparsable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentRecord {
    pub mitra_name: String,
    pub mitra_code: String,
    pub client_name: String,
    pub project_name: String,
    pub hub: String,
    pub drop_point: String,
    pub order_code: String,
    pub delivery_date: String,
    pub receiving_date: String,
    pub vehicle_type: String,
    pub weight: String,
    pub weekly: String,
    pub sla: String,
    pub distance_km: f64,
    pub cost: f64,
}

impl Default for ShipmentRecord {
    fn default() -> Self {
        Self {
            mitra_name: MISSING.into(),
            mitra_code: MISSING.into(),
            client_name: MISSING.into(),
            project_name: MISSING.into(),
            hub: MISSING.into(),
            drop_point: MISSING.into(),
            order_code: MISSING.into(),
            delivery_date: MISSING.into(),
            receiving_date: MISSING.into(),
            vehicle_type: MISSING.into(),
            weight: MISSING.into(),
            weekly: MISSING.into(),
            sla: MISSING.into(),
            distance_km: 0.0,
            cost: 0.0,
        }
    }
}

impl ShipmentRecord {
    /// On-time flag derived from the SLA status string
    pub fn is_on_time(&self) -> bool {
        crate::services::normalizer::is_on_time(&self.sla)
    }
}

/// Returns the value unless it is the [`MISSING`] sentinel or blank
pub fn present(value: &str) -> Option<&str> {
    if value.is_empty() || value == MISSING {
        None
    } else {
        Some(value)
    }
}

/// One row of the pre-summarized `mitras` dataset
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MitraSummary {
    pub name: String,
    pub total_deliveries: u64,
    /// Fraction in `0.0..=1.0`
    pub on_time_rate: f64,
    pub total_cost: f64,
    pub avg_cost: f64,
    pub total_distance: f64,
    pub avg_distance: f64,
    pub cost_per_km: f64,
    /// Percentage in `0.0..=100.0`
    pub cancel_rate: f64,
    pub hubs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_uses_sentinels() {
        let record = ShipmentRecord::default();
        assert_eq!(record.mitra_name, MISSING);
        assert_eq!(record.sla, MISSING);
        assert_eq!(record.cost, 0.0);
        assert!(!record.is_on_time());
    }

    #[test]
    fn test_is_on_time_from_sla() {
        let record = ShipmentRecord {
            sla: "On Time".into(),
            ..Default::default()
        };
        assert!(record.is_on_time());
    }

    #[test]
    fn test_present() {
        assert_eq!(present("Jakarta"), Some("Jakarta"));
        assert_eq!(present("-"), None);
        assert_eq!(present(""), None);
    }
}
