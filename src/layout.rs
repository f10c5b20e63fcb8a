//! Layout engine – turns regions into draw operations.
//!
//! A document is a list of [`Region`]s. There are only two kinds:
//!
//! - **Fixed blocks** ([`Block`]) – title, identity block, section headers,
//!   amount summaries. Drawn once, wherever the cursor is.
//! - **Repeating tables** ([`Table`]) – column headers plus rows, split
//!   across pages by [`crate::pagination`].
//!
//! Coordinates are PDF points with the origin at the bottom-left. The
//! vertical [`Cursor`] holds the top edge of the next line box and only
//! ever moves down the page.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::{RenderError, Result};
use crate::fonts::{ascent, text_width};
use crate::format::{format_amount, format_date, format_timestamp, truncate, DESCRIPTION_WIDTH};
use crate::layout_config::{DrawOp, EmbeddedImage};
use crate::logo::Logo;
use crate::style::{Color, DocumentStyle, INCH};

/// Inner horizontal padding of table cells.
const CELL_PADDING: f32 = 4.0;
/// Offset of the value column in key/value blocks.
const KEY_COLUMN_WIDTH: f32 = 2.0 * INCH;
/// Width reserved for the value of a summary line.
const SUMMARY_VALUE_WIDTH: f32 = 1.75 * INCH;

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Which palette colour a value is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Credit,
    Debit,
    Emphasis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub label: String,
    pub value: Decimal,
    pub tone: Tone,
    pub strong: bool,
}

/// A non-repeating region.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Logo(Logo),
    Title(String),
    Subtitle(String),
    /// Two-column label/value rows.
    KeyValues(Vec<(String, String)>),
    Section(String),
    /// Right-aligned label/amount rows under a rule.
    Summary(Vec<SummaryLine>),
    Note(String),
    Spacer(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub title: String,
    /// Offset from the left margin.
    pub x: f32,
    pub width: f32,
    pub align: Align,
}

impl Column {
    pub fn new(title: &str, x: f32, width: f32, align: Align) -> Self {
        Self {
            title: title.to_string(),
            x,
            width,
            align,
        }
    }
}

/// Cell contents, stringified only when drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    /// Free text clipped to the description column width.
    Clipped(String),
    Amount(Decimal),
    /// Amount that renders blank when zero.
    NonZeroAmount(Decimal),
    Date(NaiveDate),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub tone: Tone,
}

impl Cell {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            tone: Tone::Normal,
        }
    }

    pub fn toned(value: CellValue, tone: Tone) -> Self {
        Self { value, tone }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Fixed(Block),
    Table(Table),
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Vertical position of the next line box on the current page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    y: f32,
    bottom: f32,
}

impl Cursor {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self { y: top, bottom }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// Space left above the bottom limit.
    pub fn remaining(&self) -> f32 {
        self.y - self.bottom
    }

    pub fn fits(&self, height: f32) -> bool {
        height <= self.remaining() + f32::EPSILON
    }

    fn advance(&mut self, height: f32) {
        self.y -= height.max(0.0);
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless drawing rules for one document kind. Everything it needs is
/// fixed at construction; all mutable state lives in the caller's cursor
/// and op list.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    style: DocumentStyle,
    currency: String,
}

impl LayoutEngine {
    pub fn new(style: DocumentStyle, currency: &str) -> Self {
        Self {
            style,
            currency: currency.to_string(),
        }
    }

    pub fn style(&self) -> &DocumentStyle {
        &self.style
    }

    /// A cursor at the top of a fresh page.
    pub fn page_cursor(&self) -> Cursor {
        let g = &self.style.geometry;
        Cursor::new(g.content_top(), g.content_bottom())
    }

    fn tone_color(&self, tone: Tone) -> Color {
        let p = &self.style.palette;
        match tone {
            Tone::Normal => p.text,
            Tone::Credit => p.credit,
            Tone::Debit => p.debit,
            Tone::Emphasis => p.emphasis,
        }
    }

    // -- fixed blocks --------------------------------------------------------

    pub fn block_height(&self, block: &Block) -> f32 {
        let t = &self.style.typography;
        match block {
            Block::Logo(logo) => logo.height + 12.0,
            Block::Title(_) => t.title_size * 1.6,
            Block::Subtitle(_) | Block::Note(_) => t.line_height,
            Block::KeyValues(rows) => rows.len() as f32 * t.line_height,
            Block::Section(_) => t.section_size + 12.0,
            Block::Summary(lines) => 6.0 + lines.len() as f32 * t.line_height,
            Block::Spacer(h) => *h,
        }
    }

    /// Draw `block` at the cursor and move the cursor below it.
    pub fn draw_block(
        &self,
        block: &Block,
        cursor: &mut Cursor,
        ops: &mut Vec<DrawOp>,
        images: &mut Vec<EmbeddedImage>,
    ) {
        let g = &self.style.geometry;
        let t = &self.style.typography;
        let p = &self.style.palette;
        let top = cursor.y();

        match block {
            Block::Logo(logo) => {
                images.push(logo.image.clone());
                ops.push(DrawOp::Image {
                    image: images.len() - 1,
                    x: g.center_x() - logo.width / 2.0,
                    y: top - logo.height,
                    width: logo.width,
                    height: logo.height,
                });
            }
            Block::Title(text) => {
                let lh = self.block_height(block);
                let x = g.center_x() - text_width(text, t.title_size, true) / 2.0;
                ops.push(text_op(x, baseline(top, lh, t.title_size), text, t.title_size, true, p.header));
            }
            Block::Subtitle(text) => {
                let x = g.center_x() - text_width(text, t.subtitle_size, false) / 2.0;
                let y = baseline(top, t.line_height, t.subtitle_size);
                ops.push(text_op(x, y, text, t.subtitle_size, false, p.subheader));
            }
            Block::Note(text) => {
                let y = baseline(top, t.line_height, t.body_size);
                ops.push(text_op(g.margin_left, y, text, t.body_size, false, p.subheader));
            }
            Block::KeyValues(rows) => {
                let mut y_top = top;
                for (key, value) in rows {
                    let y = baseline(y_top, t.line_height, t.body_size);
                    ops.push(text_op(g.margin_left, y, key, t.body_size, true, p.text));
                    ops.push(text_op(
                        g.margin_left + KEY_COLUMN_WIDTH,
                        y,
                        value,
                        t.body_size,
                        false,
                        p.text,
                    ));
                    y_top -= t.line_height;
                }
            }
            Block::Section(text) => {
                let lh = self.block_height(block);
                let y = baseline(top, lh, t.section_size);
                ops.push(text_op(g.margin_left, y, text, t.section_size, true, p.subheader));
                let rule_y = top - lh + 2.0;
                ops.push(DrawOp::Line {
                    x1: g.margin_left,
                    y1: rule_y,
                    x2: g.width - g.margin_right,
                    y2: rule_y,
                    width: 0.75,
                    color: p.subheader,
                });
            }
            Block::Summary(lines) => {
                let right = g.width - g.margin_right;
                let rule_y = top - 2.0;
                ops.push(DrawOp::Line {
                    x1: right - 2.0 * SUMMARY_VALUE_WIDTH,
                    y1: rule_y,
                    x2: right,
                    y2: rule_y,
                    width: 0.5,
                    color: p.rule,
                });
                let mut y_top = top - 6.0;
                for line in lines {
                    let size = if line.strong { t.body_size + 1.0 } else { t.body_size };
                    let y = baseline(y_top, t.line_height, size);
                    let label_right = right - SUMMARY_VALUE_WIDTH - CELL_PADDING;
                    let label_x = label_right - text_width(&line.label, size, true);
                    ops.push(text_op(label_x, y, &line.label, size, true, p.text));

                    let value = format_amount(line.value, &self.currency);
                    let value_x = right - text_width(&value, size, line.strong);
                    ops.push(text_op(value_x, y, &value, size, line.strong, self.tone_color(line.tone)));
                    y_top -= t.line_height;
                }
            }
            Block::Spacer(_) => {}
        }

        cursor.advance(self.block_height(block));
    }

    // -- repeating tables ----------------------------------------------------

    pub fn header_height(&self) -> f32 {
        self.style.typography.row_height + 2.0
    }

    pub fn row_height(&self) -> f32 {
        self.style.typography.row_height
    }

    /// Draw the column header band of `table`.
    pub fn draw_table_header(&self, table: &Table, cursor: &mut Cursor, ops: &mut Vec<DrawOp>) {
        let g = &self.style.geometry;
        let t = &self.style.typography;
        let p = &self.style.palette;
        let h = self.header_height();
        let top = cursor.y();

        ops.push(DrawOp::Rect {
            x: g.margin_left,
            y: top - h,
            width: table_width(table),
            height: h,
            fill: p.table_header,
        });
        let y = baseline(top, h, t.table_header_size);
        for col in &table.columns {
            let x = aligned_x(col, &col.title, t.table_header_size, true);
            ops.push(text_op(
                g.margin_left + x,
                y,
                &col.title,
                t.table_header_size,
                true,
                p.header,
            ));
        }
        self.rule(table, top - h, ops);
        cursor.advance(h);
    }

    /// Draw data row `row_index`. Stripe parity follows the row index, so it
    /// carries over page breaks unchanged.
    pub fn draw_row(
        &self,
        table: &Table,
        row_index: usize,
        cursor: &mut Cursor,
        ops: &mut Vec<DrawOp>,
    ) -> Result<()> {
        let g = &self.style.geometry;
        let t = &self.style.typography;
        let p = &self.style.palette;
        let row = table
            .rows
            .get(row_index)
            .ok_or_else(|| row_out_of_range(row_index, table.rows.len()))?;
        let h = self.row_height();
        let top = cursor.y();

        let fill = if row_index % 2 == 0 { p.row_odd } else { p.row_even };
        if fill != Color::WHITE {
            ops.push(DrawOp::Rect {
                x: g.margin_left,
                y: top - h,
                width: table_width(table),
                height: h,
                fill,
            });
        }

        let y = baseline(top, h, t.table_body_size);
        for (col, cell) in table.columns.iter().zip(row) {
            let text = self.cell_text(&cell.value);
            if text.is_empty() {
                continue;
            }
            let x = aligned_x(col, &text, t.table_body_size, false);
            ops.push(text_op(
                g.margin_left + x,
                y,
                &text,
                t.table_body_size,
                false,
                self.tone_color(cell.tone),
            ));
        }
        self.rule(table, top - h, ops);
        cursor.advance(h);
        Ok(())
    }

    fn rule(&self, table: &Table, y: f32, ops: &mut Vec<DrawOp>) {
        let g = &self.style.geometry;
        ops.push(DrawOp::Line {
            x1: g.margin_left,
            y1: y,
            x2: g.margin_left + table_width(table),
            y2: y,
            width: 0.25,
            color: self.style.palette.rule,
        });
    }

    /// Display string of a cell; this is where amounts and dates are formatted.
    pub fn cell_text(&self, value: &CellValue) -> String {
        match value {
            CellValue::Text(s) => s.clone(),
            CellValue::Clipped(s) => truncate(s, DESCRIPTION_WIDTH),
            CellValue::Amount(a) => format_amount(*a, &self.currency),
            CellValue::NonZeroAmount(a) if a.is_zero() => String::new(),
            CellValue::NonZeroAmount(a) => format_amount(*a, &self.currency),
            CellValue::Date(d) => format_date(*d),
            CellValue::Index(i) => i.to_string(),
        }
    }

    // -- footer --------------------------------------------------------------

    /// Footer inside the bottom margin: render timestamp and page number.
    pub fn draw_footer(
        &self,
        page_number: usize,
        page_count: usize,
        generated_at: NaiveDateTime,
        ops: &mut Vec<DrawOp>,
    ) {
        let g = &self.style.geometry;
        let t = &self.style.typography;
        let p = &self.style.palette;
        let y = g.margin_bottom / 2.0;

        let stamp = format!("Generated on {}", format_timestamp(generated_at));
        let x = g.center_x() - text_width(&stamp, t.footer_size, false) / 2.0;
        ops.push(text_op(x, y, &stamp, t.footer_size, false, p.subheader));

        let numbering = format!("Page {page_number} of {page_count}");
        let x = g.width - g.margin_right - text_width(&numbering, t.footer_size, false);
        ops.push(text_op(x, y, &numbering, t.footer_size, false, p.subheader));
    }
}

fn row_out_of_range(index: usize, len: usize) -> RenderError {
    RenderError::RenderFailure(format!("row {index} requested from a table of {len} rows"))
}

fn table_width(table: &Table) -> f32 {
    table
        .columns
        .iter()
        .map(|c| c.x + c.width)
        .fold(0.0, f32::max)
}

/// X offset (relative to the left margin) of `text` inside `col`.
fn aligned_x(col: &Column, text: &str, size: f32, bold: bool) -> f32 {
    match col.align {
        Align::Left => col.x + CELL_PADDING,
        Align::Center => col.x + (col.width - text_width(text, size, bold)) / 2.0,
        Align::Right => col.x + col.width - CELL_PADDING - text_width(text, size, bold),
    }
}

/// Baseline that vertically centres cap height inside a line box.
fn baseline(top: f32, line_height: f32, font_size: f32) -> f32 {
    top - (line_height + ascent(font_size)) / 2.0
}

fn text_op(x: f32, y: f32, text: &str, font_size: f32, bold: bool, color: Color) -> DrawOp {
    DrawOp::Text {
        x,
        y,
        text: text.to_string(),
        font_size,
        bold,
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> LayoutEngine {
        LayoutEngine::new(DocumentStyle::statement(), "KES")
    }

    fn table() -> Table {
        Table {
            columns: vec![
                Column::new("Description", 0.0, 200.0, Align::Left),
                Column::new("Amount", 200.0, 100.0, Align::Right),
            ],
            rows: vec![
                vec![
                    Cell::new(CellValue::Clipped("A very long description text".into())),
                    Cell::toned(CellValue::Amount(Decimal::new(123456, 2)), Tone::Credit),
                ],
                vec![
                    Cell::new(CellValue::Text("Short".into())),
                    Cell::new(CellValue::NonZeroAmount(Decimal::ZERO)),
                ],
            ],
        }
    }

    #[test]
    fn cursor_moves_down_by_block_height() {
        let e = engine();
        let mut cursor = e.page_cursor();
        let start = cursor.y();
        let mut ops = Vec::new();
        let mut images = Vec::new();
        let block = Block::KeyValues(vec![
            ("Account Name:".into(), "Jane".into()),
            ("Account Number:".into(), "001".into()),
        ]);
        e.draw_block(&block, &mut cursor, &mut ops, &mut images);
        assert_eq!(ops.len(), 4);
        assert!((start - cursor.y() - 2.0 * e.style().typography.line_height).abs() < 0.001);
        assert!(ops.iter().all(|op| op.bottom() >= cursor.y()));
    }

    #[test]
    fn cursor_fits_exactly_the_remaining_space() {
        let cursor = Cursor::new(100.0, 40.0);
        assert_eq!(cursor.remaining(), 60.0);
        assert!(cursor.fits(60.0));
        assert!(!cursor.fits(60.5));
    }

    #[test]
    fn cells_are_formatted_at_draw_time() {
        let e = engine();
        assert_eq!(e.cell_text(&CellValue::Amount(Decimal::new(123456, 2))), "KES 1,234.56");
        assert_eq!(e.cell_text(&CellValue::NonZeroAmount(Decimal::ZERO)), "");
        assert_eq!(
            e.cell_text(&CellValue::Clipped("A very long description text".into())),
            "A very long descr..."
        );
        assert_eq!(e.cell_text(&CellValue::Index(7)), "7");
    }

    #[test]
    fn right_aligned_amount_ends_at_column_edge() {
        let e = engine();
        let t = table();
        let mut cursor = e.page_cursor();
        let mut ops = Vec::new();
        e.draw_row(&t, 0, &mut cursor, &mut ops).unwrap();
        let g = e.style().geometry;
        let size = e.style().typography.table_body_size;
        let amount = ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { x, text, .. } if text.starts_with("KES") => Some((*x, text.clone())),
                _ => None,
            })
            .unwrap();
        let right = amount.0 + text_width(&amount.1, size, false);
        assert!((right - (g.margin_left + 300.0 - CELL_PADDING)).abs() < 0.01);
    }

    #[test]
    fn blank_cells_emit_no_text() {
        let e = engine();
        let t = table();
        let mut cursor = e.page_cursor();
        let mut ops = Vec::new();
        e.draw_row(&t, 1, &mut cursor, &mut ops).unwrap();
        let texts: Vec<_> = ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Text { .. }))
            .collect();
        assert_eq!(texts.len(), 1);
    }

    #[test]
    fn missing_row_is_a_render_failure() {
        let e = engine();
        let mut cursor = e.page_cursor();
        let err = e.draw_row(&table(), 9, &mut cursor, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, RenderError::RenderFailure(_)));
    }

    #[test]
    fn footer_carries_timestamp_and_page_number() {
        let e = engine();
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let mut ops = Vec::new();
        e.draw_footer(2, 3, ts, &mut ops);
        let texts: Vec<String> = ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Generated on 2024-05-01 08:30:00", "Page 2 of 3"]);
    }
}
