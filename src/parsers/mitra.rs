//! camelCase rows of the pre-summarized `mitras` dataset

use crate::services::normalizer::{clean_int, clean_number, clean_string, clean_string_list};
use crate::types::{MitraSummary, RawRecord};

impl MitraSummary {
    /// Normalize one `mitras` row.
    ///
    /// `onTimeRate` is a fraction; values above 1 are read as percentages.
    pub fn from_raw(raw: &RawRecord) -> Self {
        let on_time_rate = clean_number(raw.get("onTimeRate"), 0.0);
        let on_time_rate = if on_time_rate > 1.0 {
            on_time_rate / 100.0
        } else {
            on_time_rate
        };

        Self {
            name: clean_string(raw.get("name")),
            total_deliveries: clean_int(raw.get("totalDeliveries"), 0).max(0) as u64,
            on_time_rate: on_time_rate.max(0.0),
            total_cost: clean_number(raw.get("totalCost"), 0.0),
            avg_cost: clean_number(raw.get("avgCost"), 0.0),
            total_distance: clean_number(raw.get("totalDistance"), 0.0),
            avg_distance: clean_number(raw.get("avgDistance"), 0.0),
            cost_per_km: clean_number(raw.get("costPerKm"), 0.0),
            cancel_rate: clean_number(raw.get("cancelRate"), 0.0),
            hubs: clean_string_list(raw.get("hubs")),
        }
    }
}

/// Normalize every `mitras` row, keeping input order
pub fn parse_mitras(raws: &[RawRecord]) -> Vec<MitraSummary> {
    raws.iter().map(MitraSummary::from_raw).collect()
}
