//! Fail-soft field normalization
//!
//! Turns loosely typed JSON field values into clean scalars. None of these
//! functions fail: malformed values collapse to the `"-"` sentinel or to a
//! caller-supplied numeric default.

use serde_json::Value;

use crate::types::MISSING;

/// Normalize a string-ish field.
///
/// Null, absent, empty and `"-"` all become `"-"`; other strings are
/// trimmed; numbers and booleans are rendered as their JSON text.
pub fn clean_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => MISSING.to_string(),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == MISSING {
                MISSING.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Some(other) => other.to_string(),
    }
}

/// Normalize a numeric field, falling back to `default`.
///
/// Accepts JSON numbers and numeric-looking strings. Decimal commas are
/// tolerated, see [`parse_decimal`].
pub fn clean_number(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(default),
        Some(Value::String(s)) => parse_decimal(s).unwrap_or(default),
        _ => default,
    }
}

/// [`clean_number`] truncated toward zero
pub fn clean_int(value: Option<&Value>, default: i64) -> i64 {
    clean_number(value, default as f64).trunc() as i64
}

/// Non-negative whole count; negatives clamp to 0
pub fn clean_count(value: Option<&Value>) -> u64 {
    clean_int(value, 0).max(0) as u64
}

/// Percentage field such as `98.5`, `"98,5"` or `"98.5%"`
pub fn clean_percent(value: Option<&Value>, default: f64) -> f64 {
    match value {
        Some(Value::String(s)) => parse_decimal(s.trim().trim_end_matches('%')).unwrap_or(default),
        other => clean_number(other, default),
    }
}

/// Optional number: `None` for absent, null or unparsable values
pub fn optional_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        Some(Value::String(s)) => parse_decimal(s.trim().trim_end_matches('%')),
        _ => None,
    }
}

/// Parse a number written with either `.` or `,` as decimal separator.
///
/// - both present: the right-most one is the decimal separator and the
///   other groups thousands (`"1.234,56"`, `"1,234.56"`)
/// - a single `,`: decimal comma (`"12,5"`)
/// - repeated `,` or repeated `.`: thousands grouping (`"1,234,567"`)
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == MISSING {
        return None;
    }

    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (None, Some(_)) if s.matches(',').count() == 1 => s.replace(',', "."),
        (None, Some(_)) => s.replace(',', ""),
        (Some(_), None) if s.matches('.').count() > 1 => s.replace('.', ""),
        _ => s.to_string(),
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// True when the SLA status reads "on time" / "ontime" (any case)
pub fn is_on_time(sla: &str) -> bool {
    if sla.is_empty() || sla == MISSING {
        return false;
    }
    let lower = sla.to_lowercase();
    lower.contains("on time") || lower.contains("ontime")
}

/// Normalize a list of strings, dropping blanks and non-string items
pub fn clean_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != MISSING)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}
