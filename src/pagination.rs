//! Pagination – flows regions onto pages.
//!
//! Handles:
//! - Fixed blocks that do not fit the remaining space (moved to a new page)
//! - Tables split across pages, with column headers repeated on every page
//! - Row index / stripe continuity across page breaks
//! - Footers with page numbering once the page count is known

use chrono::NaiveDateTime;

use crate::error::{RenderError, Result};
use crate::layout::{Block, Cursor, LayoutEngine, Region, Table};
use crate::layout_config::{DocumentPlan, EmbeddedImage, PagePlan};

/// Where a table is in its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    WritingHeader,
    WritingRows,
    PageFull,
    Closed,
}

/// Owns the pages of one document while it is being laid out.
pub struct Paginator<'a> {
    engine: &'a LayoutEngine,
    pages: Vec<PagePlan>,
    current: PagePlan,
    cursor: Cursor,
    images: Vec<EmbeddedImage>,
}

impl<'a> Paginator<'a> {
    pub fn new(engine: &'a LayoutEngine) -> Self {
        Self {
            engine,
            pages: Vec::new(),
            current: PagePlan {
                page_index: 0,
                ops: Vec::new(),
            },
            cursor: engine.page_cursor(),
            images: Vec::new(),
        }
    }

    pub fn page_index(&self) -> usize {
        self.current.page_index
    }

    fn page_is_blank(&self) -> bool {
        self.current.ops.is_empty()
    }

    /// Flush the current page and start a fresh one.
    fn break_page(&mut self) {
        let next = PagePlan {
            page_index: self.current.page_index + 1,
            ops: Vec::new(),
        };
        self.pages.push(std::mem::replace(&mut self.current, next));
        self.cursor = self.engine.page_cursor();
        log::debug!("page break → page {}", self.current.page_index + 1);
    }

    /// Place a fixed block, moving to a new page when it does not fit.
    pub fn place_block(&mut self, block: &Block) -> Result<()> {
        let height = self.engine.block_height(block);
        if !self.cursor.fits(height) {
            if matches!(block, Block::Spacer(_)) {
                // Vertical space at the bottom of a page is simply dropped.
                return Ok(());
            }
            if !self.page_is_blank() {
                self.break_page();
            }
            if !self.cursor.fits(height) {
                return Err(RenderError::RenderFailure(format!(
                    "block of height {height:.1}pt does not fit on an empty page"
                )));
            }
        }
        self.engine
            .draw_block(block, &mut self.cursor, &mut self.current.ops, &mut self.images);
        Ok(())
    }

    /// Write `table`, breaking pages as needed. Returns the number of rows
    /// written (always every row on success).
    pub fn write_table(&mut self, table: &Table) -> Result<usize> {
        let header_h = self.engine.header_height();
        let row_h = self.engine.row_height();
        let mut row_index = 0usize;
        let mut state = TableState::WritingHeader;
        // Guards against a page too short for a header plus one row.
        let mut rows_on_page = 0usize;

        loop {
            state = match state {
                TableState::WritingHeader => {
                    let needed = if table.rows.is_empty() { header_h } else { header_h + row_h };
                    if !self.cursor.fits(needed) {
                        if self.page_is_blank() {
                            return Err(RenderError::RenderFailure(format!(
                                "page cannot hold a table header and one row ({needed:.1}pt)"
                            )));
                        }
                        self.break_page();
                    }
                    self.engine
                        .draw_table_header(table, &mut self.cursor, &mut self.current.ops);
                    rows_on_page = 0;
                    TableState::WritingRows
                }
                TableState::WritingRows => {
                    if row_index == table.rows.len() {
                        TableState::Closed
                    } else if !self.cursor.fits(row_h) {
                        if rows_on_page == 0 {
                            return Err(RenderError::RenderFailure(format!(
                                "row {row_index} does not fit below a fresh table header"
                            )));
                        }
                        TableState::PageFull
                    } else {
                        self.engine.draw_row(
                            table,
                            row_index,
                            &mut self.cursor,
                            &mut self.current.ops,
                        )?;
                        row_index += 1;
                        rows_on_page += 1;
                        TableState::WritingRows
                    }
                }
                TableState::PageFull => {
                    log::debug!(
                        "table full at row {row_index} of {} on page {}",
                        table.rows.len(),
                        self.current.page_index + 1
                    );
                    self.break_page();
                    TableState::WritingHeader
                }
                TableState::Closed => break,
            };
        }
        Ok(row_index)
    }

    /// Stamp footers on every page and hand back the finished plan.
    /// Consumes the paginator, so nothing can be written afterwards.
    pub fn finish(mut self, title: &str, generated_at: NaiveDateTime) -> DocumentPlan {
        self.pages.push(self.current);
        let page_count = self.pages.len();
        for page in &mut self.pages {
            self.engine
                .draw_footer(page.page_index + 1, page_count, generated_at, &mut page.ops);
        }
        let g = &self.engine.style().geometry;
        DocumentPlan {
            title: title.to_string(),
            page_width_pt: g.width,
            page_height_pt: g.height,
            images: self.images,
            pages: self.pages,
        }
    }
}

/// Flow `regions` onto pages and return the finished plan.
pub fn paginate(
    engine: &LayoutEngine,
    title: &str,
    regions: &[Region],
    generated_at: NaiveDateTime,
) -> Result<DocumentPlan> {
    let mut paginator = Paginator::new(engine);
    for region in regions {
        match region {
            Region::Fixed(block) => paginator.place_block(block)?,
            Region::Table(table) => {
                paginator.write_table(table)?;
            }
        }
    }
    let plan = paginator.finish(title, generated_at);
    log::debug!("'{title}' laid out on {} page(s)", plan.pages.len());
    Ok(plan)
}
