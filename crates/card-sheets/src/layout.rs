//! Pixel layout of a printed sheet
//!
//! All positions are in raster pixels at the configured DPI, origin at the
//! top-left corner of the page.

use crate::types::*;

/// Convert millimetres to whole pixels, truncating toward zero.
pub fn mm_to_px(mm: f64, dpi: u32) -> i64 {
    (mm * dpi as f64 / 25.4) as i64
}

/// Rectangle with inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl PixelRect {
    /// Rectangle spanning two corners given in any order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            x0: a.0.min(b.0).floor() as i64,
            y0: a.1.min(b.1).floor() as i64,
            x1: a.0.max(b.0).floor() as i64,
            y1: a.1.max(b.1).floor() as i64,
        }
    }
}

/// Layout derived once per run from the sheet options.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConstants {
    pub dpi: u32,
    pub card_width_px: u32,
    pub card_height_px: u32,
    pub page_width_px: u32,
    pub page_height_px: u32,
    /// Top-left corner of each card cell, `[row][col]`
    pub positions: [[(i64, i64); GRID_COLS]; GRID_ROWS],
    pub background: PixelRect,
    pub markers: Vec<PixelRect>,
}

impl LayoutConstants {
    pub fn new(options: &SheetOptions) -> Self {
        let dpi = options.dpi;
        let px = |mm: f64| mm_to_px(mm, dpi);

        let card_width = px(CARD_WIDTH_MM);
        let card_height = px(CARD_HEIGHT_MM);
        let spacing = px(options.spacing_mm);
        let page_width = px(PAGE_WIDTH_MM);
        let page_height = px(PAGE_HEIGHT_MM);
        let x_offset = px(options.x_axis_offset_mm) as f64;

        let cols = GRID_COLS as i64;
        let rows = GRID_ROWS as i64;
        let grid_width = cols * card_width + (cols - 1) * spacing;
        let grid_height = rows * card_height + (rows - 1) * spacing;
        let grid_x = (page_width - grid_width) as f64 / 2.0 + x_offset;
        let grid_y = (page_height - grid_height) as f64 / 2.0;

        let mut positions = [[(0, 0); GRID_COLS]; GRID_ROWS];
        for (row, cells) in positions.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = (
                    (grid_x + (col as i64 * (card_width + spacing)) as f64) as i64,
                    (grid_y + (row as i64 * (card_height + spacing)) as f64) as i64,
                );
            }
        }

        let margin = px(BG_BOX_MARGIN_MM) as f64;
        let background = PixelRect::from_corners(
            (grid_x - margin, grid_y - margin),
            (
                grid_x + grid_width as f64 + margin,
                grid_y + grid_height as f64 + margin,
            ),
        );

        let center = (page_width as f64 / 2.0 + x_offset, page_height as f64 / 2.0);
        let markers = marker_rects(center, px);

        Self {
            dpi,
            card_width_px: card_width.max(0) as u32,
            card_height_px: card_height.max(0) as u32,
            page_width_px: page_width.max(0) as u32,
            page_height_px: page_height.max(0) as u32,
            positions,
            background,
            markers,
        }
    }

    /// Number of page indices needed for `units` cards.
    pub fn total_pages(units: usize) -> usize {
        units.div_ceil(CARDS_PER_PAGE)
    }
}

/// Two small squares at each corner of the marker span, touching at the
/// corner point.
fn marker_rects(center: (f64, f64), px: impl Fn(f64) -> i64) -> Vec<PixelRect> {
    let size = px(MARKER_SIZE_MM) as f64;
    let vectors = [(size, size), (-size, -size)];
    let corners = [(1.0, 1.0), (1.0, -1.0), (-1.0, -1.0), (-1.0, 1.0)];

    let mut rects = Vec::with_capacity(corners.len() * vectors.len());
    for (sx, sy) in corners {
        let x = center.0 + px(sx * MARKER_SPAN_MM.0 / 2.0) as f64;
        let y = center.1 + px(sy * MARKER_SPAN_MM.1 / 2.0) as f64;
        for (dx, dy) in vectors {
            rects.push(PixelRect::from_corners((x, y), (x + dx, y + dy)));
        }
    }
    rects
}
