//! Reporting granularity and period keys

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort key given to records whose date cannot be classified.
/// Sorts after every real period key.
pub const UNCLASSIFIED_SORT_KEY: &str = "99999999";

/// Reporting granularity selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl PeriodType {
    pub const ALL: [PeriodType; 4] = [Self::Daily, Self::Weekly, Self::Monthly, Self::Yearly];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Case-insensitive lookup; `None` for anything else
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
    }

    /// "Monthly", "Weekly", ...
    pub fn title(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reporting bucket derived from a delivery date.
///
/// `sort_key` orders periods chronologically; `label` is for display only
/// and must never be used for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PeriodKey {
    pub label: String,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub sort_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_types() {
        assert_eq!(PeriodType::parse("daily"), Some(PeriodType::Daily));
        assert_eq!(PeriodType::parse("Weekly"), Some(PeriodType::Weekly));
        assert_eq!(PeriodType::parse(" MONTHLY "), Some(PeriodType::Monthly));
        assert_eq!(PeriodType::parse("yearly"), Some(PeriodType::Yearly));
    }

    #[test]
    fn test_parse_unknown_type() {
        assert_eq!(PeriodType::parse("quarterly"), None);
        assert_eq!(PeriodType::parse(""), None);
    }

    #[test]
    fn test_default_is_monthly() {
        assert_eq!(PeriodType::default(), PeriodType::Monthly);
    }

    #[test]
    fn test_unclassified_sorts_last() {
        assert!("20991231" < UNCLASSIFIED_SORT_KEY);
        assert!("9999" < UNCLASSIFIED_SORT_KEY);
    }
}
