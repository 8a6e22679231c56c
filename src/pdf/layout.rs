//! Page layout for A4 reports.
//!
//! Coordinates are in millimetres measured from the top-left corner of the
//! page. The renderer flips the y axis for PDF space.

use crate::pdf::PdfError;

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const MARGIN: f32 = 15.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

/// Maximum number of support images on a single page.
pub const IMAGES_PER_PAGE: usize = 2;
const IMAGE_GUTTER: f32 = 6.0;
const MAX_IMAGE_HEIGHT: f32 = 110.0;

const HEADER_BAR_HEIGHT: f32 = 28.0;
const HEADING_HEIGHT: f32 = 10.0;
const ROW_HEIGHT: f32 = 7.0;
const CELL_PADDING: f32 = 2.0;
const TABLE_FONT_SIZE: f32 = 9.0;
const SECTION_GAP: f32 = 6.0;

const PT_TO_MM: f32 = 0.3528;

/// An sRGB colour with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colour(pub u8, pub u8, pub u8);

impl Colour {
    pub const PRIMARY: Colour = Colour(37, 99, 235);
    pub const WHITE: Colour = Colour(255, 255, 255);
    pub const TEXT: Colour = Colour(31, 41, 55);
    pub const MUTED: Colour = Colour(107, 114, 128);
    pub const STRIPE: Colour = Colour(243, 244, 246);
    pub const TOTAL: Colour = Colour(219, 234, 254);
    pub const RULE: Colour = Colour(209, 213, 219);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A positioned drawing instruction.
///
/// `y` is always the top edge of the element, except for text where it is
/// the baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOp {
    NewPage,
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: Weight,
        colour: Colour,
        text: String,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        colour: Colour,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    /// Draws the image at `index` of the image list handed to the renderer.
    Image {
        index: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub title: String,
    /// Share of the content width, the shares of a table should sum to 1.
    pub share: f32,
    pub align: Align,
}

impl Column {
    pub fn new(title: &str, share: f32, align: Align) -> Self {
        Self {
            title: title.to_owned(),
            share,
            align,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    /// Highlighted closing row, e.g. totals.
    pub footer: Option<Vec<String>>,
}

/// An image waiting to be placed, with its pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSlot {
    pub index: usize,
    pub width_px: u32,
    pub height_px: u32,
}

/// Accumulates [LayoutOp]s and tracks the cursor across pages.
#[derive(Debug)]
pub struct PageLayout {
    ops: Vec<LayoutOp>,
    cursor: f32,
    pages: usize,
    images_on_page: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl PageLayout {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            cursor: MARGIN,
            pages: 1,
            images_on_page: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Vertical space left above the bottom margin.
    pub fn remaining(&self) -> f32 {
        PAGE_HEIGHT - MARGIN - self.cursor
    }

    pub fn page_break(&mut self) {
        self.ops.push(LayoutOp::NewPage);
        self.cursor = MARGIN;
        self.pages += 1;
        self.images_on_page = 0;
    }

    /// Start a new page unless `height` still fits on this one.
    ///
    /// Returns whether a page break was emitted.
    pub fn ensure_space(&mut self, height: f32) -> bool {
        if self.remaining() < height && self.cursor > MARGIN {
            self.page_break();
            true
        } else {
            false
        }
    }

    pub fn gap(&mut self) {
        self.cursor += SECTION_GAP;
    }

    /// A full-bleed coloured bar at the very top of the page.
    pub fn header_bar(&mut self, title: &str, subtitle: &str) {
        self.ops.push(LayoutOp::FillRect {
            x: 0.0,
            y: 0.0,
            width: PAGE_WIDTH,
            height: HEADER_BAR_HEIGHT,
            colour: Colour::PRIMARY,
        });
        self.text(MARGIN, 13.0, 18.0, Weight::Bold, Colour::WHITE, title);
        self.text(MARGIN, 21.0, 10.0, Weight::Regular, Colour::WHITE, subtitle);
        self.cursor = HEADER_BAR_HEIGHT + SECTION_GAP;
    }

    /// A section title with a rule underneath.
    pub fn heading(&mut self, text: &str) {
        self.ensure_space(HEADING_HEIGHT + ROW_HEIGHT);
        self.text(
            MARGIN,
            self.cursor + 6.0,
            12.0,
            Weight::Bold,
            Colour::TEXT,
            text,
        );
        self.ops.push(LayoutOp::Line {
            x1: MARGIN,
            y1: self.cursor + 8.0,
            x2: MARGIN + CONTENT_WIDTH,
            y2: self.cursor + 8.0,
        });
        self.cursor += HEADING_HEIGHT;
    }

    /// A single muted line of text, e.g. "Sin registros".
    pub fn note(&mut self, text: &str) {
        self.ensure_space(ROW_HEIGHT);
        self.text(
            MARGIN,
            self.cursor + 5.0,
            TABLE_FONT_SIZE,
            Weight::Regular,
            Colour::MUTED,
            text,
        );
        self.cursor += ROW_HEIGHT;
    }

    /// Lay out `table`, breaking pages between rows and repeating the header
    /// row at the top of every continuation page.
    ///
    /// # Errors
    /// Returns [PdfError::Table] before emitting anything if a row does not
    /// have exactly one cell per column.
    pub fn table(&mut self, table: &Table) -> Result<(), PdfError> {
        let expected = table.columns.len();
        for (row, cells) in table.rows.iter().chain(table.footer.iter()).enumerate() {
            if cells.len() != expected {
                return Err(PdfError::Table {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
        }

        // Keep the header together with at least one row.
        self.ensure_space(2.0 * ROW_HEIGHT);
        self.table_header(&table.columns);

        for (i, cells) in table.rows.iter().enumerate() {
            if self.ensure_space(ROW_HEIGHT) {
                self.table_header(&table.columns);
            }
            let fill = (i % 2 == 1).then_some(Colour::STRIPE);
            self.table_row(&table.columns, cells, fill, Weight::Regular, Colour::TEXT);
        }

        if let Some(footer) = &table.footer {
            if self.ensure_space(ROW_HEIGHT) {
                self.table_header(&table.columns);
            }
            self.table_row(
                &table.columns,
                footer,
                Some(Colour::TOTAL),
                Weight::Bold,
                Colour::TEXT,
            );
        }

        Ok(())
    }

    /// Lay out images two to a row, at most [IMAGES_PER_PAGE] per page.
    ///
    /// Nothing is emitted for an empty section.
    pub fn image_section(&mut self, title: &str, images: &[ImageSlot]) {
        if images.is_empty() {
            return;
        }

        if self.images_on_page >= IMAGES_PER_PAGE {
            self.page_break();
        }
        self.heading(title);

        let slot_width = (CONTENT_WIDTH - IMAGE_GUTTER) / 2.0;

        for pair in images.chunks(2) {
            let sizes: Vec<(f32, f32)> = pair
                .iter()
                .map(|slot| fit_image(slot.width_px, slot.height_px, slot_width))
                .collect();
            let row_height = sizes.iter().map(|(_, h)| *h).fold(0.0, f32::max);

            if self.images_on_page + pair.len() > IMAGES_PER_PAGE || self.remaining() < row_height
            {
                self.page_break();
                self.text(
                    MARGIN,
                    self.cursor + 6.0,
                    10.0,
                    Weight::Bold,
                    Colour::MUTED,
                    &format!("{title} (continuación)"),
                );
                self.cursor += HEADING_HEIGHT;
            }

            for (column, (slot, (width, height))) in pair.iter().zip(sizes).enumerate() {
                let x = MARGIN + column as f32 * (slot_width + IMAGE_GUTTER);
                self.ops.push(LayoutOp::Image {
                    index: slot.index,
                    x,
                    y: self.cursor,
                    width,
                    height,
                });
                self.images_on_page += 1;
            }

            self.cursor += row_height + SECTION_GAP;
        }
    }

    pub fn into_ops(self) -> Vec<LayoutOp> {
        self.ops
    }

    fn text(&mut self, x: f32, y: f32, size: f32, weight: Weight, colour: Colour, text: &str) {
        self.ops.push(LayoutOp::Text {
            x,
            y,
            size,
            weight,
            colour,
            text: text.to_owned(),
        });
    }

    fn table_header(&mut self, columns: &[Column]) {
        let titles: Vec<String> = columns.iter().map(|column| column.title.clone()).collect();
        self.table_row(
            columns,
            &titles,
            Some(Colour::PRIMARY),
            Weight::Bold,
            Colour::WHITE,
        );
    }

    fn table_row(
        &mut self,
        columns: &[Column],
        cells: &[String],
        fill: Option<Colour>,
        weight: Weight,
        colour: Colour,
    ) {
        if let Some(fill) = fill {
            self.ops.push(LayoutOp::FillRect {
                x: MARGIN,
                y: self.cursor,
                width: CONTENT_WIDTH,
                height: ROW_HEIGHT,
                colour: fill,
            });
        }

        let baseline = self.cursor + ROW_HEIGHT - CELL_PADDING;
        let mut x = MARGIN;
        for (column, cell) in columns.iter().zip(cells) {
            let width = column.share * CONTENT_WIDTH;
            let inner = (width - 2.0 * CELL_PADDING).max(0.0);
            let text = truncate_to_width(cell, inner, TABLE_FONT_SIZE);
            let text_x = match column.align {
                Align::Left => x + CELL_PADDING,
                Align::Right => x + width - CELL_PADDING - text_width(&text, TABLE_FONT_SIZE),
            };
            self.text(text_x, baseline, TABLE_FONT_SIZE, weight, colour, &text);
            x += width;
        }

        self.ops.push(LayoutOp::Line {
            x1: MARGIN,
            y1: self.cursor + ROW_HEIGHT,
            x2: MARGIN + CONTENT_WIDTH,
            y2: self.cursor + ROW_HEIGHT,
        });
        self.cursor += ROW_HEIGHT;
    }
}

/// Approximate width of Helvetica text in millimetres.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5 * PT_TO_MM
}

fn truncate_to_width(text: &str, width: f32, size: f32) -> String {
    if text_width(text, size) <= width {
        return text.to_owned();
    }

    let per_char = size * 0.5 * PT_TO_MM;
    let keep = ((width / per_char) as usize).saturating_sub(3);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

/// Scale an image to `max_width`, shrinking further if it would be taller
/// than [MAX_IMAGE_HEIGHT]. Aspect ratio is preserved.
fn fit_image(width_px: u32, height_px: u32, max_width: f32) -> (f32, f32) {
    if width_px == 0 || height_px == 0 {
        return (max_width, max_width);
    }

    let aspect = height_px as f32 / width_px as f32;
    let height = max_width * aspect;
    if height > MAX_IMAGE_HEIGHT {
        (MAX_IMAGE_HEIGHT / aspect, MAX_IMAGE_HEIGHT)
    } else {
        (max_width, height)
    }
}
