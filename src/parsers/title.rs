//! Title Case shipment rows (`"Mitra Name"`, `"Distance (km)"`, ...)

use super::{FieldNames, RecordLayout};

const FIELDS: FieldNames = FieldNames {
    mitra_name: "Mitra Name",
    mitra_code: None,
    client_name: "Client Name",
    project_name: None,
    hub: "Hub",
    drop_point: "Drop Point",
    order_code: "Order Code",
    delivery_date: "Delivery Date",
    receiving_date: None,
    vehicle_type: None,
    weight: "Weight",
    weekly: "Weekly",
    sla: "SLA",
    distance_km: "Distance (km)",
    cost: "Cost",
};

/// Layout of the project analysis export
pub struct TitleCaseLayout;

impl RecordLayout for TitleCaseLayout {
    fn name(&self) -> &str {
        "title_case"
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
            "Mitra Name": "Sari",
            "Client Name": "Lazada",
            "Hub": "Bekasi",
            "Drop Point": "Harapan Indah",
            "Order Code": "LZ-1",
            "Delivery Date": "02/01/2025",
            "Weight": "3 kg",
            "Weekly": "January W1",
            "SLA": "Late",
            "Distance (km)": 7.25,
            "Cost": "15000"
        })
        .as_object()
        .cloned()
        .unwrap();

        let record = TitleCaseLayout.parse_record(&raw);
        assert_eq!(record.mitra_name, "Sari");
        assert_eq!(record.client_name, "Lazada");
        assert_eq!(record.weekly, "January W1");
        assert_eq!(record.distance_km, 7.25);
        assert_eq!(record.cost, 15000.0);
        assert!(!record.is_on_time());
    }

    #[test]
    fn test_fields_without_title_case_source_stay_missing() {
        let raw: RawRecord = json!({"mitra_code": "X", "project_name": "Y"})
            .as_object()
            .cloned()
            .unwrap();
        let record = TitleCaseLayout.parse_record(&raw);
        assert_eq!(record.mitra_code, "-");
        assert_eq!(record.project_name, "-");
    }
}
