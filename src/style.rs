//! Styling values handed to the layout engine at construction: page
//! geometry, colour palettes and type sizes. Nothing here is global; each
//! document kind builds its own immutable [`DocumentStyle`].

use serde::{Deserialize, Serialize};

/// Points per inch.
pub const INCH: f32 = 72.0;

/// RGB colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b })
        } else if hex.len() == 3 {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()? as f32 / 255.0;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()? as f32 / 255.0;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()? as f32 / 255.0;
            Some(Self { r, g, b })
        } else {
            None
        }
    }

    fn hex_or(hex: &str, fallback: Self) -> Self {
        Self::from_hex(hex).unwrap_or(fallback)
    }
}

/// Page size and margins, in points. The content area lies between the
/// margins; the footer sits inside the bottom margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    /// A4 portrait with one-inch margins (payslips).
    pub fn a4_portrait() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
        }
    }

    /// A4 landscape with half-inch margins (bank statements).
    pub fn a4_landscape() -> Self {
        Self {
            width: 841.89,
            height: 595.28,
            margin_top: 36.0,
            margin_bottom: 36.0,
            margin_left: 36.0,
            margin_right: 36.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Y of the first baseline region on a fresh page.
    pub fn content_top(&self) -> f32 {
        self.height - self.margin_top
    }

    /// Lowest Y a row or block may reach.
    pub fn content_bottom(&self) -> f32 {
        self.margin_bottom
    }

    pub fn center_x(&self) -> f32 {
        self.margin_left + self.content_width() / 2.0
    }
}

/// Colour scheme of one document kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub header: Color,
    pub subheader: Color,
    pub text: Color,
    /// Money coming in / earnings.
    pub credit: Color,
    /// Money going out / deductions.
    pub debit: Color,
    /// Running balances and net figures.
    pub emphasis: Color,
    pub table_header: Color,
    pub row_even: Color,
    pub row_odd: Color,
    pub rule: Color,
}

impl Palette {
    pub fn payslip() -> Self {
        Self {
            header: Color::hex_or("#1a237e", Color::BLACK),
            subheader: Color::hex_or("#3949ab", Color::BLACK),
            text: Color::hex_or("#212121", Color::BLACK),
            credit: Color::hex_or("#1b5e20", Color::BLACK),
            debit: Color::hex_or("#b71c1c", Color::BLACK),
            emphasis: Color::hex_or("#b71c1c", Color::BLACK),
            table_header: Color::hex_or("#e8eaf6", Color::WHITE),
            row_even: Color::hex_or("#f5f5f5", Color::WHITE),
            row_odd: Color::WHITE,
            rule: Color::hex_or("#bdbdbd", Color::BLACK),
        }
    }

    pub fn statement() -> Self {
        Self {
            header: Color::hex_or("#004d40", Color::BLACK),
            subheader: Color::hex_or("#00796b", Color::BLACK),
            text: Color::hex_or("#212121", Color::BLACK),
            credit: Color::hex_or("#2e7d32", Color::BLACK),
            debit: Color::hex_or("#c62828", Color::BLACK),
            emphasis: Color::hex_or("#0d47a1", Color::BLACK),
            table_header: Color::hex_or("#e0f2f1", Color::WHITE),
            row_even: Color::hex_or("#f5f5f5", Color::WHITE),
            row_odd: Color::WHITE,
            rule: Color::hex_or("#bdbdbd", Color::BLACK),
        }
    }
}

/// Type sizes and vertical rhythm, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub title_size: f32,
    pub subtitle_size: f32,
    pub section_size: f32,
    pub body_size: f32,
    pub table_header_size: f32,
    pub table_body_size: f32,
    pub footer_size: f32,
    /// Cursor decrement after one line of body text.
    pub line_height: f32,
    pub row_height: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            title_size: 20.0,
            subtitle_size: 12.0,
            section_size: 14.0,
            body_size: 11.0,
            table_header_size: 10.0,
            table_body_size: 9.0,
            footer_size: 8.0,
            line_height: 16.0,
            row_height: 16.0,
        }
    }
}

/// Everything the layout engine needs to know about appearance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentStyle {
    pub geometry: PageGeometry,
    pub palette: Palette,
    pub typography: Typography,
    /// Logo placement size (width, height).
    pub logo_size: (f32, f32),
}

impl DocumentStyle {
    pub fn payslip() -> Self {
        Self {
            geometry: PageGeometry::a4_portrait(),
            palette: Palette::payslip(),
            typography: Typography {
                table_body_size: 11.0,
                table_header_size: 11.0,
                row_height: 20.0,
                ..Typography::default()
            },
            logo_size: (2.0 * INCH, INCH),
        }
    }

    pub fn statement() -> Self {
        Self {
            geometry: PageGeometry::a4_landscape(),
            palette: Palette::statement(),
            typography: Typography::default(),
            logo_size: (2.0 * INCH, INCH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_from_hex() {
        let c = Color::from_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert!(Color::from_hex("#12345").is_none());
        assert_eq!(Color::from_hex("fff"), Some(Color::WHITE));
    }

    #[test]
    fn landscape_is_wider_than_tall() {
        let g = PageGeometry::a4_landscape();
        assert!(g.width > g.height);
        assert!((g.content_width() - (841.89 - 72.0)).abs() < 0.01);
    }

    #[test]
    fn palettes_differ_per_document_kind() {
        assert_ne!(Palette::payslip().header, Palette::statement().header);
    }
}
