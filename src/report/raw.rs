//! Raw shipment sheet shared by the Title Case shipment reports
//!
//! Formula-mode counts on other sheets filter these rows by column, so the
//! column positions below are fixed.

use chrono::Datelike;

use super::formula::{Criterion, RowFilter};
use super::workbook::{DataRange, SheetWriter};
use super::{NumberFormat, StyleConfig};
use crate::services::aggregator::project_column;
use crate::services::period::parse_dmy;
use crate::types::{PeriodType, Result, ShipmentRecord, MISSING};

pub(crate) const RAW_SHEET: &str = "Raw Shipment Data";

const RAW_HEADERS: [&str; 13] = [
    "Mitra Name",
    "Client Name",
    "Delivery Date",
    "Hub",
    "Drop Point",
    "Weekly",
    "Order Code",
    "Weight",
    "Distance (km)",
    "Cost",
    "SLA",
    "Year",
    "Period",
];
/// First data row (0-based); headers sit on the row above
pub(crate) const RAW_FIRST_ROW: u32 = 2;
pub(crate) const RAW_MITRA: u16 = 0;
pub(crate) const RAW_CLIENT: u16 = 1;
pub(crate) const RAW_HUB: u16 = 3;
pub(crate) const RAW_YEAR: u16 = 11;
pub(crate) const RAW_PERIOD: u16 = 12;

/// 1-based range covering the first `rows` data rows
pub(crate) fn raw_range(rows: usize) -> DataRange {
    let first = RAW_FIRST_ROW + 1;
    DataRange::new(RAW_SHEET, first, first + rows as u32 - 1)
}

/// Rows with a named mitra and client
pub(crate) fn counted_rows(range: &DataRange) -> RowFilter<'_> {
    RowFilter::new(range)
        .with(RAW_MITRA, Criterion::NotText(MISSING.into()))
        .with(RAW_CLIENT, Criterion::NotText(MISSING.into()))
}

/// Period cell of a raw row; formula-mode COUNTIFS match on it
pub(crate) fn raw_period_label(record: &ShipmentRecord, period_type: PeriodType) -> String {
    project_column(record, period_type)
        .map(|c| c.label)
        .unwrap_or_else(|| MISSING.to_string())
}

/// Write the first `rows` records, hidden when `hidden` is set
pub(crate) fn raw_sheet<'a>(
    style: &'a StyleConfig,
    records: &[ShipmentRecord],
    rows: usize,
    period_type: PeriodType,
    hidden: bool,
) -> Result<SheetWriter<'a>> {
    let period = period_type.as_str().to_uppercase();
    let mut sheet = SheetWriter::new(RAW_SHEET, style)?;
    if hidden {
        sheet.hide();
    }

    sheet.title(0, &format!("RAW SHIPMENT DATA - {}", period), 14.0, 0)?;
    sheet.header_row(RAW_FIRST_ROW - 1, 0, &RAW_HEADERS)?;

    for (idx, r) in records.iter().take(rows).enumerate() {
        let row = RAW_FIRST_ROW + idx as u32;
        sheet.text(row, RAW_MITRA, &r.mitra_name)?;
        sheet.text(row, RAW_CLIENT, &r.client_name)?;
        sheet.text(row, 2, &r.delivery_date)?;
        sheet.text(row, RAW_HUB, &r.hub)?;
        sheet.text(row, 4, &r.drop_point)?;
        sheet.text(row, 5, &r.weekly)?;
        sheet.text(row, 6, &r.order_code)?;
        sheet.text(row, 7, &r.weight)?;
        sheet.number(row, 8, r.distance_km, NumberFormat::Decimal)?;
        sheet.number(row, 9, r.cost, NumberFormat::Integer)?;
        sheet.text(row, 10, &r.sla)?;

        if let Some(date) = parse_dmy(&r.delivery_date) {
            sheet.number(row, RAW_YEAR, f64::from(date.year()), NumberFormat::Count)?;
        }
        sheet.text(row, RAW_PERIOD, &raw_period_label(r, period_type))?;
    }

    sheet.uniform_width(RAW_HEADERS.len() as u16, 15.0)?;
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, weekly: &str) -> ShipmentRecord {
        ShipmentRecord {
            mitra_name: "Budi".into(),
            client_name: "Sayurbox".into(),
            delivery_date: date.into(),
            weekly: weekly.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_raw_range() {
        assert_eq!(raw_range(6).column(RAW_MITRA), "'Raw Shipment Data'!$A$3:$A$8");
        assert_eq!(raw_range(1).column(RAW_PERIOD), "'Raw Shipment Data'!$M$3:$M$3");
    }

    #[test]
    fn test_raw_period_label() {
        assert_eq!(raw_period_label(&record("12/03/2025", "-"), PeriodType::Monthly), "March");
        assert_eq!(
            raw_period_label(&record("12/03/2025", "March W2"), PeriodType::Weekly),
            "March W2"
        );
        assert_eq!(raw_period_label(&record("bad", "March W2"), PeriodType::Weekly), MISSING);
    }

    #[test]
    fn test_counted_rows_mask() {
        let range = raw_range(2);
        assert_eq!(
            counted_rows(&range).mask(),
            "('Raw Shipment Data'!$A$3:$A$4<>\"-\")*('Raw Shipment Data'!$B$3:$B$4<>\"-\")"
        );
    }
}
