//! Period classification
//!
//! Maps `d/m/y` delivery dates onto reporting periods. Display labels are
//! not chronologically ordered ("April" < "March"), so every period also
//! carries a zero-padded sort key, and ordering always goes through it.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::types::{PeriodKey, PeriodType, UNCLASSIFIED_SORT_KEY};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Sort tuple for week labels that cannot be parsed
const UNKNOWN_WEEK: (u32, u32) = (99, 99);

static MONTH_WEEK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\w+)\s+W(\d+)").expect("valid regex"));
static WEEK_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^week\s*(\d+)").expect("valid regex"));

/// English month name for 1-based `month`
pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
}

/// Parse a `d/m/y` date string into a calendar date
pub fn parse_dmy(date: &str) -> Option<NaiveDate> {
    let mut parts = date.split('/');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    // sort keys are fixed four-digit years
    if !(1..=9999).contains(&year) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Classify a delivery date into a period of the requested granularity.
///
/// Returns `None` for anything that is not a real `d/m/y` calendar date;
/// callers treat that as unclassifiable.
pub fn classify(date: &str, period_type: PeriodType) -> Option<PeriodKey> {
    let parsed = parse_dmy(date)?;
    let (year, month, day) = (parsed.year(), parsed.month(), parsed.day());
    let name = month_name(month)?;

    let key = match period_type {
        PeriodType::Daily => PeriodKey {
            label: date.to_string(),
            month: Some(month),
            year: Some(year),
            sort_key: format!("{:04}{:02}{:02}", year, month, day),
        },
        PeriodType::Weekly => {
            let week = parsed.iso_week().week();
            PeriodKey {
                label: format!("Week {} - {} {}", week, name, year),
                month: Some(month),
                year: Some(year),
                sort_key: format!("{:04}{:02}{:02}", year, month, week),
            }
        }
        PeriodType::Monthly => PeriodKey {
            label: format!("{} {}", name, year),
            month: Some(month),
            year: Some(year),
            sort_key: format!("{:04}{:02}", year, month),
        },
        PeriodType::Yearly => PeriodKey {
            label: year.to_string(),
            month: None,
            year: Some(year),
            sort_key: format!("{:04}", year),
        },
    };

    Some(key)
}

/// Sort key of a classified period, or the "last" sentinel
pub fn sort_key_or_last(key: Option<&PeriodKey>) -> &str {
    key.map(|k| k.sort_key.as_str())
        .unwrap_or(UNCLASSIFIED_SORT_KEY)
}

/// Parse weekly labels such as `"March W2"`, `"mar w2"` or `"Week 7"`.
///
/// Returns a `(month_index, week)` tuple where `month_index` is 0-based;
/// `"Week N"` labels carry no month and map to `(0, N)`. Anything else
/// maps to `(99, 99)` so it sorts last.
pub fn parse_week_label(label: &str) -> (u32, u32) {
    let label = label.trim();

    if let Some(caps) = MONTH_WEEK_RE.captures(label) {
        let prefix = caps[1].to_lowercase();
        let week = caps[2].parse().unwrap_or(UNKNOWN_WEEK.1);
        let month_index = MONTH_NAMES
            .iter()
            .position(|m| m.to_lowercase().starts_with(&prefix))
            .map(|i| i as u32)
            .unwrap_or(UNKNOWN_WEEK.0);
        return (month_index, week);
    }

    if let Some(caps) = WEEK_ONLY_RE.captures(label) {
        let week = caps[1].parse().unwrap_or(UNKNOWN_WEEK.1);
        return (0, week);
    }

    UNKNOWN_WEEK
}

/// Sort key for a weekly label: zero-padded month index + week
pub fn week_label_sort_key(label: &str) -> String {
    let (month, week) = parse_week_label(label);
    format!("{:02}{:02}", month, week)
}

/// Order weekly labels chronologically (stable for equal tuples)
pub fn sort_week_labels(labels: &mut [String]) {
    labels.sort_by(|a, b| compare_week_labels(a, b));
}

fn compare_week_labels(a: &str, b: &str) -> Ordering {
    parse_week_label(a).cmp(&parse_week_label(b))
}
