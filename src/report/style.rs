//! Workbook colours and cell formats

use rust_xlsxwriter::{Color, Format, FormatAlign};

/// Number format of a value cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    /// `#,##0`
    Integer,
    /// `0`
    Count,
    /// `0.00`
    Decimal,
    /// `0.00%`
    Percent,
    /// `0.0%`
    Weight,
    /// `+0.00;-0.00`
    Signed,
    /// `0.00"%"` for values already scaled to 0..100
    Points,
}

impl NumberFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "#,##0",
            Self::Count => "0",
            Self::Decimal => "0.00",
            Self::Percent => "0.00%",
            Self::Weight => "0.0%",
            Self::Signed => "+0.00;-0.00",
            Self::Points => "0.00\"%\"",
        }
    }
}

/// Colour palette shared by every report.
///
/// Colours are `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleConfig {
    pub primary: u32,
    pub secondary: u32,
    pub success: u32,
    pub warning: u32,
    pub danger: u32,
    pub light_bg: u32,
    pub header_bg: u32,
    pub header_text: u32,
    pub muted: u32,
    pub highlight_bg: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            primary: 0x1E3A8A,
            secondary: 0x3B82F6,
            success: 0x10B981,
            warning: 0xF59E0B,
            danger: 0xEF4444,
            light_bg: 0xF3F4F6,
            header_bg: 0x1E40AF,
            header_text: 0xFFFFFF,
            muted: 0x6B7280,
            highlight_bg: 0xFEF3C7,
        }
    }
}

impl StyleConfig {
    /// Bold sheet title in the primary colour
    pub fn title(&self, size: f64) -> Format {
        Format::new()
            .set_bold()
            .set_font_size(size)
            .set_font_color(Color::RGB(self.primary))
    }

    /// Section heading inside a sheet
    pub fn section(&self) -> Format {
        self.title(12.0)
    }

    /// Small italic explanatory line
    pub fn note(&self) -> Format {
        Format::new()
            .set_italic()
            .set_font_size(9)
            .set_font_color(Color::RGB(self.muted))
    }

    /// Table header cell: white bold text on the header background
    pub fn header(&self) -> Format {
        Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::RGB(self.header_text))
            .set_background_color(Color::RGB(self.header_bg))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
    }

    /// Row label on a light background
    pub fn label(&self) -> Format {
        Format::new()
            .set_bold()
            .set_background_color(Color::RGB(self.light_bg))
    }

    /// Highlighted KPI value
    pub fn kpi(&self, format: NumberFormat) -> Format {
        self.number(format)
            .set_bold()
            .set_font_size(14)
            .set_font_color(Color::RGB(self.secondary))
    }

    /// Total row label
    pub fn total(&self) -> Format {
        Format::new()
            .set_bold()
            .set_background_color(Color::RGB(self.highlight_bg))
    }

    /// Status text in the success or warning colour
    pub fn status(&self, ok: bool) -> Format {
        let color = if ok { self.success } else { self.warning };
        Format::new()
            .set_bold()
            .set_font_size(20)
            .set_font_color(Color::RGB(color))
    }

    /// Error text in the danger colour
    pub fn alert(&self) -> Format {
        Format::new()
            .set_bold()
            .set_font_color(Color::RGB(self.danger))
    }

    pub fn number(&self, format: NumberFormat) -> Format {
        Format::new().set_num_format(format.as_str())
    }
}
