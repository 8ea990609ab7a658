//! Sheet writing helpers on top of rust_xlsxwriter
//!
//! Rows and columns are 0-based like rust_xlsxwriter; only the A1-style
//! references produced here for formulas are 1-based.

use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};

use super::style::{NumberFormat, StyleConfig};
use crate::types::Result;

/// Column letters for a 0-based column index (0 → "A", 26 → "AA")
pub fn column_letter(col: u16) -> String {
    let mut n = u32::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Relative A1 reference for a 0-based cell
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", column_letter(col), row + 1)
}

/// Quoted sheet name for use in formulas
pub fn sheet_ref(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Excel string literal with embedded quotes doubled
pub fn excel_string(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Absolute column range on another sheet, e.g. `'Raw'!$A$3:$A$120`.
/// `first_row` and `last_row` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRange {
    pub sheet: String,
    pub first_row: u32,
    pub last_row: u32,
}

impl DataRange {
    pub fn new(sheet: &str, first_row: u32, last_row: u32) -> Self {
        Self {
            sheet: sheet.to_string(),
            first_row,
            last_row: last_row.max(first_row),
        }
    }

    pub fn column(&self, col: u16) -> String {
        let letter = column_letter(col);
        format!(
            "{}!${}${}:${}${}",
            sheet_ref(&self.sheet),
            letter,
            self.first_row,
            letter,
            self.last_row
        )
    }
}

/// One worksheet under construction
pub struct SheetWriter<'a> {
    sheet: Worksheet,
    style: &'a StyleConfig,
}

impl<'a> SheetWriter<'a> {
    pub fn new(name: &str, style: &'a StyleConfig) -> Result<Self> {
        let mut sheet = Worksheet::new();
        sheet.set_name(name)?;
        Ok(Self { sheet, style })
    }

    /// Title in row `row`, merged across columns `0..=last_col`
    pub fn title(&mut self, row: u32, text: &str, size: f64, last_col: u16) -> Result<()> {
        let format = self.style.title(size);
        if last_col == 0 {
            self.sheet.write_string_with_format(row, 0, text, &format)?;
        } else {
            self.sheet.merge_range(row, 0, row, last_col, text, &format)?;
        }
        Ok(())
    }

    pub fn section(&mut self, row: u32, col: u16, text: &str) -> Result<()> {
        self.sheet
            .write_string_with_format(row, col, text, &self.style.section())?;
        Ok(())
    }

    pub fn note(&mut self, row: u32, col: u16, text: &str) -> Result<()> {
        self.sheet
            .write_string_with_format(row, col, text, &self.style.note())?;
        Ok(())
    }

    pub fn alert(&mut self, row: u32, col: u16, text: &str) -> Result<()> {
        self.sheet
            .write_string_with_format(row, col, text, &self.style.alert())?;
        Ok(())
    }

    pub fn header_row(&mut self, row: u32, first_col: u16, headers: &[&str]) -> Result<()> {
        let format = self.style.header();
        for (offset, header) in headers.iter().enumerate() {
            let col = first_col + offset as u16;
            self.sheet
                .write_string_with_format(row, col, *header, &format)?;
        }
        Ok(())
    }

    pub fn text(&mut self, row: u32, col: u16, text: &str) -> Result<()> {
        self.sheet.write_string(row, col, text)?;
        Ok(())
    }

    pub fn label(&mut self, row: u32, col: u16, text: &str) -> Result<()> {
        self.sheet
            .write_string_with_format(row, col, text, &self.style.label())?;
        Ok(())
    }

    pub fn total_label(&mut self, row: u32, col: u16, text: &str) -> Result<()> {
        self.sheet
            .write_string_with_format(row, col, text, &self.style.total())?;
        Ok(())
    }

    pub fn number(&mut self, row: u32, col: u16, value: f64, format: NumberFormat) -> Result<()> {
        self.sheet
            .write_number_with_format(row, col, value, &self.style.number(format))?;
        Ok(())
    }

    pub fn kpi(&mut self, row: u32, col: u16, value: f64, format: NumberFormat) -> Result<()> {
        self.sheet
            .write_number_with_format(row, col, value, &self.style.kpi(format))?;
        Ok(())
    }

    pub fn formula(&mut self, row: u32, col: u16, formula: &str, format: NumberFormat) -> Result<()> {
        self.sheet
            .write_formula_with_format(row, col, formula, &self.style.number(format))?;
        Ok(())
    }

    pub fn kpi_formula(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
        format: NumberFormat,
    ) -> Result<()> {
        self.sheet
            .write_formula_with_format(row, col, formula, &self.style.kpi(format))?;
        Ok(())
    }

    /// Formula cell without a number format (text results)
    pub fn text_formula(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.sheet.write_formula(row, col, formula)?;
        Ok(())
    }

    pub fn boolean(&mut self, row: u32, col: u16, value: bool) -> Result<()> {
        self.sheet.write_boolean(row, col, value)?;
        Ok(())
    }

    /// Status banner in the success or warning colour
    pub fn status(&mut self, row: u32, text: &str, ok: bool, last_col: u16) -> Result<()> {
        let format = self.style.status(ok);
        self.sheet.merge_range(row, 1, row, last_col, text, &format)?;
        Ok(())
    }

    /// Column widths starting at column A
    pub fn widths(&mut self, widths: &[f64]) -> Result<()> {
        for (col, width) in widths.iter().enumerate() {
            self.sheet.set_column_width(col as u16, *width)?;
        }
        Ok(())
    }

    /// Same width for the first `count` columns
    pub fn uniform_width(&mut self, count: u16, width: f64) -> Result<()> {
        for col in 0..count {
            self.sheet.set_column_width(col, width)?;
        }
        Ok(())
    }

    pub fn hide(&mut self) {
        self.sheet.set_hidden(true);
    }

    pub fn activate(&mut self) {
        self.sheet.set_active(true);
    }

    pub fn into_sheet(self) -> Worksheet {
        self.sheet
    }
}

/// Workbook being assembled from finished sheets
pub struct ReportWorkbook {
    workbook: Workbook,
    sheet_names: Vec<String>,
}

impl ReportWorkbook {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheet_names: Vec::new(),
        }
    }

    pub fn push(&mut self, sheet: SheetWriter<'_>) {
        let sheet = sheet.into_sheet();
        self.sheet_names.push(sheet.name());
        self.workbook.push_worksheet(sheet);
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn save(mut self, path: &Path) -> Result<()> {
        self.workbook.save(path)?;
        Ok(())
    }
}

impl Default for ReportWorkbook {
    fn default() -> Self {
        Self::new()
    }
}
