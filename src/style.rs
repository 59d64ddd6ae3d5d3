//! Page geometry, colors and typography shared by every report section.
//!
//! A single [`ReportStyle`] is built once per run and handed by reference to
//! the assembler, the table elements and the page decorator.

use genpdf::style::{Color, Style};
use genpdf::{Mm, Size};

use crate::model::TableKind;

const MM_PER_PT: f64 = 25.4 / 72.0;

/// Converts a raw millimetre value into a `genpdf` length.
pub fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Extracts the raw millimetre value from a `genpdf` length.
pub fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Converts typographic points into a `genpdf` length.
pub fn pt(value: f64) -> Mm {
    mm_from_f64(value * MM_PER_PT)
}

/// Builds a text style from its parts.
pub fn text_style(font_size: u8, bold: bool, color: Color) -> Style {
    let mut style = Style::new();
    style.set_font_size(font_size);
    style.set_color(color);
    if bold {
        style.set_bold();
    }
    style
}

/// Brand colors.
pub mod palette {
    use genpdf::style::Color;

    pub const NAVY: Color = Color::Rgb(0x1F, 0x3A, 0x5B);
    pub const LIGHT_BLUE: Color = Color::Rgb(0xEB, 0xF2, 0xFF);
    pub const WHITESMOKE: Color = Color::Rgb(0xF5, 0xF5, 0xF5);
    pub const WHITE: Color = Color::Rgb(0xFF, 0xFF, 0xFF);
    pub const GRAY: Color = Color::Rgb(0x6B, 0x72, 0x80);
    pub const GRID: Color = Color::Rgb(0x80, 0x80, 0x80);
    pub const BRAND_BLUE: Color = Color::Rgb(0x17, 0x5E, 0x86);
    pub const DIVIDER: Color = Color::Rgb(0xCC, 0xCC, 0xCC);
}

/// Paper size and body margins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageLayout {
    pub paper_width_mm: f64,
    pub paper_height_mm: f64,
    pub margin_left_pt: f64,
    pub margin_right_pt: f64,
    /// Includes the header region drawn by the page decorator.
    pub margin_top_pt: f64,
    pub margin_bottom_pt: f64,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            paper_width_mm: 210.0,
            paper_height_mm: 297.0,
            margin_left_pt: 40.0,
            margin_right_pt: 40.0,
            margin_top_pt: 180.0,
            margin_bottom_pt: 50.0,
        }
    }
}

impl PageLayout {
    pub fn paper_size(&self) -> Size {
        Size::new(
            mm_from_f64(self.paper_width_mm),
            mm_from_f64(self.paper_height_mm),
        )
    }

    pub fn margins(&self) -> genpdf::Margins {
        genpdf::Margins::trbl(
            pt(self.margin_top_pt),
            pt(self.margin_right_pt),
            pt(self.margin_bottom_pt),
            pt(self.margin_left_pt),
        )
    }

    /// Height available to flowed content on an empty page.
    pub fn body_height(&self) -> Mm {
        self.paper_size().height - pt(self.margin_top_pt) - pt(self.margin_bottom_pt)
    }

    /// Width available to flowed content.
    pub fn body_width(&self) -> Mm {
        self.paper_size().width - pt(self.margin_left_pt) - pt(self.margin_right_pt)
    }
}

/// A heading's typography plus the gap left underneath it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingStyle {
    pub font_size: u8,
    pub color: Color,
    pub space_after_pt: f64,
}

impl HeadingStyle {
    pub fn text(&self) -> Style {
        text_style(self.font_size, true, self.color)
    }
}

/// Appearance of a data table.
#[derive(Clone, Debug, PartialEq)]
pub struct TableStyle {
    /// Column widths as fractions of the body width.
    pub column_ratios: Vec<f64>,
    pub header_font_size: u8,
    pub body_font_size: u8,
    pub padding_vertical_pt: f64,
    pub padding_horizontal_pt: f64,
    pub header_fill: Color,
    pub header_text: Color,
    /// Backgrounds cycled over the data rows.
    pub row_fills: [Color; 2],
    pub body_text: Color,
    /// Grid lines use the renderer's fixed stroke width.
    pub grid_color: Color,
}

impl TableStyle {
    fn new(column_widths_pt: &[f64], header_font_size: u8, padding: (f64, f64)) -> Self {
        Self {
            column_ratios: column_widths_pt
                .iter()
                .map(|width| width / REFERENCE_BODY_WIDTH_PT)
                .collect(),
            header_font_size,
            body_font_size: 10,
            padding_vertical_pt: padding.0,
            padding_horizontal_pt: padding.1,
            header_fill: palette::NAVY,
            header_text: palette::WHITE,
            row_fills: [palette::LIGHT_BLUE, palette::WHITESMOKE],
            body_text: Color::Rgb(0, 0, 0),
            grid_color: palette::GRID,
        }
    }

    pub fn header_style(&self) -> Style {
        text_style(self.header_font_size, true, self.header_text)
    }

    pub fn body_style(&self) -> Style {
        text_style(self.body_font_size, false, self.body_text)
    }
}

/// A4 width minus the default side margins.
const REFERENCE_BODY_WIDTH_PT: f64 = 515.0;

/// Appearance of the flowed footer line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FooterStyle {
    pub font_size: u8,
    pub color: Color,
    pub padding_top_pt: f64,
    pub padding_bottom_pt: f64,
}

impl FooterStyle {
    pub fn text(&self) -> Style {
        text_style(self.font_size, false, self.color)
    }
}

/// One line of header text placed at a fixed offset from the page's top edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeaderLine {
    pub top_pt: f64,
    pub font_size: u8,
    pub bold: bool,
    pub color: Color,
}

impl HeaderLine {
    const fn new(top_pt: f64, font_size: u8, bold: bool, color: Color) -> Self {
        Self {
            top_pt,
            font_size,
            bold,
            color,
        }
    }

    pub fn text(&self) -> Style {
        text_style(self.font_size, self.bold, self.color)
    }
}

/// Fixed positions of the repeating page header, in points from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeaderStyle {
    pub logo_left_pt: f64,
    pub logo_top_pt: f64,
    pub logo_size_pt: f64,
    /// Left edge of the institutional text block beside the logo.
    pub text_left_pt: f64,
    pub institution: [HeaderLine; 3],
    pub divider_top_pt: f64,
    pub divider_inset_pt: f64,
    pub divider_color: Color,
    pub title: HeaderLine,
    pub filter: HeaderLine,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            logo_left_pt: 40.0,
            logo_top_pt: 2.0,
            logo_size_pt: 70.0,
            text_left_pt: 125.0,
            institution: [
                HeaderLine::new(13.0, 16, true, palette::BRAND_BLUE),
                HeaderLine::new(30.0, 13, true, palette::BRAND_BLUE),
                HeaderLine::new(47.0, 11, false, palette::BRAND_BLUE),
            ],
            divider_top_pt: 82.0,
            divider_inset_pt: 40.0,
            divider_color: palette::DIVIDER,
            title: HeaderLine::new(118.0, 16, true, palette::BRAND_BLUE),
            filter: HeaderLine::new(140.0, 13, false, palette::GRAY),
        }
    }
}

/// Process-wide immutable styling for one report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportStyle {
    pub page: PageLayout,
    pub base_font_size: u8,
    pub summary_heading: HeadingStyle,
    pub section_heading: HeadingStyle,
    pub summary_table: TableStyle,
    pub department_table: TableStyle,
    pub adviser_table: TableStyle,
    pub footer: FooterStyle,
    pub header: HeaderStyle,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            page: PageLayout::default(),
            base_font_size: 10,
            summary_heading: HeadingStyle {
                font_size: 16,
                color: palette::NAVY,
                space_after_pt: 12.0,
            },
            section_heading: HeadingStyle {
                font_size: 14,
                color: palette::NAVY,
                space_after_pt: 8.0,
            },
            summary_table: TableStyle::new(&[220.0, 220.0], 12, (10.0, 14.0)),
            department_table: TableStyle::new(&[210.0, 110.0, 110.0], 10, (6.0, 10.0)),
            adviser_table: TableStyle::new(&[210.0, 110.0, 110.0], 12, (10.0, 14.0)),
            footer: FooterStyle {
                font_size: 9,
                color: palette::GRAY,
                padding_top_pt: 20.0,
                padding_bottom_pt: 10.0,
            },
            header: HeaderStyle::default(),
        }
    }
}

impl ReportStyle {
    /// Table appearance for the given section.
    pub fn table(&self, kind: TableKind) -> &TableStyle {
        match kind {
            TableKind::Summary => &self.summary_table,
            TableKind::Department => &self.department_table,
            TableKind::Adviser => &self.adviser_table,
        }
    }
}
