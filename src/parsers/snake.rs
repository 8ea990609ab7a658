//! snake_case shipment rows (`mitra_name`, `delivery_date`, ...)

use super::{FieldNames, RecordLayout};

const FIELDS: FieldNames = FieldNames {
    mitra_name: "mitra_name",
    mitra_code: Some("mitra_code"),
    client_name: "client_name",
    project_name: Some("project_name"),
    hub: "hub",
    drop_point: "drop_point",
    order_code: "order_code",
    delivery_date: "delivery_date",
    receiving_date: Some("receiving_date"),
    vehicle_type: Some("vehicle_type"),
    weight: "weight",
    weekly: "weekly",
    sla: "sla",
    distance_km: "distance_km",
    cost: "cost",
};

/// Layout of the mitra performance export
pub struct SnakeCaseLayout;

impl RecordLayout for SnakeCaseLayout {
    fn name(&self) -> &str {
        "snake_case"
    }

    fn fields(&self) -> &FieldNames {
        &FIELDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawRecord;
    use serde_json::json;

    #[test]
    fn test_parse_full_row() {
        let raw: RawRecord = json!({
            "mitra_name": " Budi Santoso ",
            "mitra_code": "MTR-001",
            "client_name": "Sayurbox",
            "project_name": "Sayurbox Instant",
            "hub": "Cakung",
            "drop_point": "Pulogadung",
            "order_code": "ORD-9",
            "delivery_date": "15/03/2025",
            "receiving_date": "14/03/2025",
            "vehicle_type": "Motor",
            "weight": 12,
            "weekly": "March W2",
            "sla": "On Time",
            "distance_km": "12,5",
            "cost": "1.234,56"
        })
        .as_object()
        .cloned()
        .unwrap();

        let record = SnakeCaseLayout.parse_record(&raw);
        assert_eq!(record.mitra_name, "Budi Santoso");
        assert_eq!(record.mitra_code, "MTR-001");
        assert_eq!(record.project_name, "Sayurbox Instant");
        assert_eq!(record.vehicle_type, "Motor");
        assert_eq!(record.weight, "12");
        assert_eq!(record.distance_km, 12.5);
        assert!((record.cost - 1234.56).abs() < 1e-9);
        assert!(record.is_on_time());
    }

    #[test]
    fn test_parse_ignores_title_case_keys() {
        let raw: RawRecord = json!({"Mitra Name": "Budi", "Cost": 10})
            .as_object()
            .cloned()
            .unwrap();
        let record = SnakeCaseLayout.parse_record(&raw);
        assert_eq!(record.mitra_name, "-");
        assert_eq!(record.cost, 0.0);
    }
}
