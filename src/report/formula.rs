//! Spreadsheet formula templates
//!
//! Templates use named `{placeholders}`. Rendering is single pass, so
//! substituted values are never scanned for further placeholders.

use std::collections::HashSet;
use std::fmt::Display;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::workbook::{excel_string, DataRange};
use crate::types::{ReportError, Result};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_][a-z0-9_]*)\}").expect("valid regex"));

/// Distinct count of the first criterion column over rows matching `mask`.
/// Rows outside the mask get `+1` in the denominator so they never divide
/// by zero.
pub const DISTINCT_COUNT: FormulaTemplate =
    FormulaTemplate::new("=IFERROR(SUMPRODUCT(({mask})/(COUNTIFS({countifs})+1-({mask}))),0)");

/// Rows matching `mask`
pub const COUNT_MATCHING: FormulaTemplate = FormulaTemplate::new("=SUMPRODUCT({mask})");

/// A named spreadsheet formula with `{placeholder}` slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaTemplate {
    source: &'static str,
}

impl FormulaTemplate {
    pub const fn new(source: &'static str) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Distinct placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        PLACEHOLDER_RE
            .captures_iter(self.source)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Substitute every placeholder.
    ///
    /// Fails when a placeholder has no value or a value names no
    /// placeholder.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String> {
        let names = self.placeholders();

        for name in &names {
            if !values.iter().any(|(key, _)| key == name) {
                return Err(ReportError::Config(format!(
                    "formula template is missing a value for '{}'",
                    name
                )));
            }
        }
        for (key, _) in values {
            if !names.iter().any(|name| name == key) {
                return Err(ReportError::Config(format!(
                    "unknown formula placeholder '{}'",
                    key
                )));
            }
        }

        let rendered = PLACEHOLDER_RE.replace_all(self.source, |caps: &Captures| {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }
}

/// Right-hand side of one row condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// Column equals the value of a cell on the formula's own sheet
    EqualsCell(String),
    /// Column equals a text literal
    EqualsText(String),
    /// Column differs from a text literal
    NotText(String),
}

/// Row filter over columns of a [`DataRange`]
#[derive(Debug, Clone)]
pub struct RowFilter<'a> {
    range: &'a DataRange,
    conditions: Vec<(u16, Criterion)>,
}

impl<'a> RowFilter<'a> {
    pub fn new(range: &'a DataRange) -> Self {
        Self {
            range,
            conditions: Vec::new(),
        }
    }

    pub fn with(mut self, col: u16, criterion: Criterion) -> Self {
        self.conditions.push((col, criterion));
        self
    }

    /// Product of boolean arrays, one per condition
    pub fn mask(&self) -> String {
        self.conditions
            .iter()
            .map(|(col, criterion)| {
                let column = self.range.column(*col);
                match criterion {
                    Criterion::EqualsCell(cell) => format!("({}={})", column, cell),
                    Criterion::EqualsText(text) => format!("({}={})", column, excel_string(text)),
                    Criterion::NotText(text) => format!("({}<>{})", column, excel_string(text)),
                }
            })
            .collect::<Vec<_>>()
            .join("*")
    }

    /// `range, criteria` pairs for COUNTIFS
    pub fn countifs_args(&self) -> String {
        self.conditions
            .iter()
            .map(|(col, criterion)| {
                let column = self.range.column(*col);
                let criteria = match criterion {
                    Criterion::EqualsCell(cell) => cell.clone(),
                    Criterion::EqualsText(text) => excel_string(text),
                    Criterion::NotText(text) => excel_string(&format!("<>{}", text)),
                };
                format!("{},{}", column, criteria)
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Distinct values of column `counted` among matching rows
    pub fn distinct_count(&self, counted: u16) -> Result<String> {
        let column = self.range.column(counted);
        let countifs = format!("{},{},{}", column, column, self.countifs_args());
        let countifs = countifs.trim_end_matches(',').to_string();
        DISTINCT_COUNT.render(&[("mask", &self.mask()), ("countifs", &countifs)])
    }

    /// Number of matching rows
    pub fn count(&self) -> Result<String> {
        COUNT_MATCHING.render(&[("mask", &self.mask())])
    }
}

/// Nested IF choosing a band label: `cell > high`, then `cell > mid`,
/// otherwise `low`
pub fn banded<T: Display>(cell: &str, high: (T, &str), mid: (T, &str), low: &str) -> String {
    tiered(cell, ">", &[high, mid], low)
}

/// Nested IF testing `cell <op> threshold` for each tier in order
pub fn tiered<T: Display>(cell: &str, op: &str, tiers: &[(T, &str)], fallback: &str) -> String {
    let mut formula = excel_string(fallback);
    for (threshold, label) in tiers.iter().rev() {
        formula = format!(
            "IF({}{}{},{},{})",
            cell,
            op,
            threshold,
            excel_string(label),
            formula
        );
    }
    format!("={}", formula)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== FormulaTemplate ==========

    #[test]
    fn test_placeholders_are_distinct_and_ordered() {
        let t = FormulaTemplate::new("=IF({a}>{b},{a},{c})");
        assert_eq!(t.placeholders(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_render_substitutes_every_occurrence() {
        let t = FormulaTemplate::new("=IF({a}>{b},{a},0)");
        let out = t.render(&[("a", "C4"), ("b", "10")]).unwrap();
        assert_eq!(out, "=IF(C4>10,C4,0)");
    }

    #[test]
    fn test_render_is_single_pass() {
        let t = FormulaTemplate::new("=\"{label}\"");
        let out = t.render(&[("label", "{label}")]).unwrap();
        assert_eq!(out, "=\"{label}\"");
    }

    #[test]
    fn test_render_missing_value() {
        let t = FormulaTemplate::new("=SUM({range})");
        let err = t.render(&[]).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
        assert!(err.to_string().contains("missing a value for 'range'"));
    }

    #[test]
    fn test_render_unknown_placeholder() {
        let t = FormulaTemplate::new("=SUM({range})");
        let err = t.render(&[("range", "A1:A3"), ("extra", "1")]).unwrap_err();
        assert!(err.to_string().contains("unknown formula placeholder 'extra'"));
    }

    #[test]
    fn test_builtin_templates() {
        assert_eq!(COUNT_MATCHING.placeholders(), vec!["mask"]);
        assert_eq!(DISTINCT_COUNT.placeholders(), vec!["mask", "countifs"]);
    }

    // ========== RowFilter ==========

    #[test]
    fn test_row_filter_mask_and_countifs() {
        let range = DataRange::new("Raw", 3, 10);
        let filter = RowFilter::new(&range)
            .with(1, Criterion::EqualsCell("$A7".into()))
            .with(12, Criterion::EqualsText("March".into()))
            .with(0, Criterion::NotText("-".into()));

        assert_eq!(
            filter.mask(),
            "('Raw'!$B$3:$B$10=$A7)*('Raw'!$M$3:$M$10=\"March\")*('Raw'!$A$3:$A$10<>\"-\")"
        );
        assert_eq!(
            filter.countifs_args(),
            "'Raw'!$B$3:$B$10,$A7,'Raw'!$M$3:$M$10,\"March\",'Raw'!$A$3:$A$10,\"<>-\""
        );
    }

    #[test]
    fn test_distinct_count_formula() {
        let range = DataRange::new("Raw", 3, 10);
        let formula = RowFilter::new(&range)
            .with(0, Criterion::NotText("-".into()))
            .distinct_count(0)
            .unwrap();
        assert_eq!(
            formula,
            "=IFERROR(SUMPRODUCT((('Raw'!$A$3:$A$10<>\"-\"))/(COUNTIFS('Raw'!$A$3:$A$10,'Raw'!$A$3:$A$10,'Raw'!$A$3:$A$10,\"<>-\")+1-(('Raw'!$A$3:$A$10<>\"-\")))),0)"
        );
    }

    #[test]
    fn test_count_formula() {
        let range = DataRange::new("Raw", 3, 4);
        let formula = RowFilter::new(&range)
            .with(0, Criterion::NotText("-".into()))
            .count()
            .unwrap();
        assert_eq!(formula, "=SUMPRODUCT(('Raw'!$A$3:$A$4<>\"-\"))");
    }

    // ========== bands ==========

    #[test]
    fn test_banded_formula() {
        let formula = banded("D16", (50, "High"), (25, "Medium"), "Low");
        assert_eq!(formula, "=IF(D16>50,\"High\",IF(D16>25,\"Medium\",\"Low\"))");
    }

    #[test]
    fn test_tiered_formula() {
        let formula = tiered(
            "F5",
            ">=",
            &[(0.7, "Excellent"), (0.5, "Good"), (0.3, "Fair")],
            "Needs Improvement",
        );
        assert_eq!(
            formula,
            "=IF(F5>=0.7,\"Excellent\",IF(F5>=0.5,\"Good\",IF(F5>=0.3,\"Fair\",\"Needs Improvement\")))"
        );
        assert_eq!(tiered::<u64>("A1", ">", &[], "None"), "=\"None\"");
    }
}
