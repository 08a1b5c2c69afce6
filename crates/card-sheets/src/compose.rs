//! Page compositing: place cached card images on a 3x3 grid and wrap the
//! raster in a single-page PDF.

use crate::layout::{LayoutConstants, PixelRect};
use crate::types::*;
use card_images::ImageCache;
use deck_resolver::{Face, PrintUnit};
use image::{Rgb, RgbImage, imageops};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, RawImage, RawImageData, RawImageFormat,
    XObjectTransform,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Single-page PDFs keyed by page index and face.
#[derive(Debug, Clone, Default)]
pub struct RenderedPages {
    pub total_pages: usize,
    pub pages: BTreeMap<(usize, Face), Vec<u8>>,
}

impl RenderedPages {
    pub fn get(&self, page: usize, face: Face) -> Option<&[u8]> {
        self.pages.get(&(page, face)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Draw one face of one page.
///
/// The back face mirrors the columns so that after flipping the sheet along
/// its vertical axis each back lands behind its front.
pub fn render_page_raster(
    page: usize,
    face: Face,
    units: &[PrintUnit],
    cache: &ImageCache,
    layout: &LayoutConstants,
    options: &SheetOptions,
) -> Result<RgbImage> {
    let mut canvas = RgbImage::from_pixel(layout.page_width_px, layout.page_height_px, WHITE);

    if options.background_box {
        fill_rect(&mut canvas, layout.background, BLACK);
    }

    let start = page * CARDS_PER_PAGE;
    let end = units.len().min(start + CARDS_PER_PAGE);
    for (slot, unit) in units.get(start..end).unwrap_or_default().iter().enumerate() {
        let Some(side) = unit.side(face) else {
            continue;
        };
        let image = cache
            .get(&side.key)
            .ok_or_else(|| SheetError::MissingCacheEntry {
                key: side.key.clone(),
            })?;

        let row = slot / GRID_COLS;
        let col = match face {
            Face::Front => slot % GRID_COLS,
            Face::Back => GRID_COLS - 1 - slot % GRID_COLS,
        };
        let (x, y) = layout.positions[row][col];
        imageops::replace(&mut canvas, &**image, x, y);
    }

    if options.reference_points {
        for rect in &layout.markers {
            fill_rect(&mut canvas, *rect, BLACK);
        }
    }

    Ok(canvas)
}

/// Fill an inclusive rectangle, clipped to the canvas.
fn fill_rect(canvas: &mut RgbImage, rect: PixelRect, color: Rgb<u8>) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    if rect.x1 < 0 || rect.y1 < 0 || rect.x0 >= width as i64 || rect.y0 >= height as i64 {
        return;
    }
    let x0 = rect.x0.clamp(0, width as i64 - 1) as u32;
    let x1 = rect.x1.clamp(0, width as i64 - 1) as u32;
    let y0 = rect.y0.clamp(0, height as i64 - 1) as u32;
    let y1 = rect.y1.clamp(0, height as i64 - 1) as u32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            canvas.put_pixel(x, y, color);
        }
    }
}

/// Wrap a page raster in a single-page A4 PDF.
pub fn raster_to_pdf(raster: RgbImage, dpi: u32, title: &str) -> Vec<u8> {
    let (width, height) = raster.dimensions();
    let image = RawImage {
        pixels: RawImageData::U8(raster.into_raw()),
        width: width as usize,
        height: height as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };

    let mut doc = PdfDocument::new(title);
    let image_id = doc.add_image(&image);
    let ops = vec![Op::UseXobject {
        id: image_id,
        transform: XObjectTransform {
            translate_x: Some(Pt(0.0)),
            translate_y: Some(Pt(0.0)),
            dpi: Some(dpi as f32),
            ..Default::default()
        },
    }];
    doc.pages.push(PdfPage::new(
        Mm(PAGE_WIDTH_MM as f32),
        Mm(PAGE_HEIGHT_MM as f32),
        ops,
    ));

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    for warning in warnings {
        log::debug!("printpdf: {warning:?}");
    }
    bytes
}

/// Render one face of one page to PDF bytes.
pub fn render_page(
    page: usize,
    face: Face,
    units: &[PrintUnit],
    cache: &ImageCache,
    layout: &LayoutConstants,
    options: &SheetOptions,
) -> Result<Vec<u8>> {
    let started = Instant::now();
    let raster = render_page_raster(page, face, units, cache, layout, options)?;
    let drawn = started.elapsed();

    let bytes = raster_to_pdf(raster, layout.dpi, &format!("Page {page} {}", face.name()));
    log::info!(
        "Rendered page {page} {} in {:.0?} (PDF in {:.0?})",
        face.name(),
        started.elapsed(),
        started.elapsed() - drawn
    );
    Ok(bytes)
}

/// Render every page (and back page when printing two-sided) on a bounded
/// pool of `render_threads` blocking workers.
pub async fn render_pages(
    units: Arc<[PrintUnit]>,
    cache: Arc<ImageCache>,
    options: &SheetOptions,
) -> Result<RenderedPages> {
    options.validate()?;
    let layout = Arc::new(LayoutConstants::new(options));
    let total_pages = LayoutConstants::total_pages(units.len());
    if total_pages == 0 {
        return Err(SheetError::NoPages);
    }

    let started = Instant::now();
    let semaphore = Arc::new(Semaphore::new(options.render_threads));
    let mut tasks = JoinSet::new();
    for &face in options.faces() {
        for page in 0..total_pages {
            let semaphore = semaphore.clone();
            let units = units.clone();
            let cache = cache.clone();
            let layout = layout.clone();
            let options = options.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.clone().acquire_owned().await else {
                    return Ok(None);
                };
                let rendered = tokio::task::spawn_blocking(move || {
                    render_page(page, face, &units, &cache, &layout, &options)
                })
                .await
                .map_err(SheetError::from)
                .and_then(|result| result);
                match rendered {
                    Ok(bytes) => Ok(Some(((page, face), bytes))),
                    Err(e) => {
                        // pages still waiting for a permit are skipped
                        semaphore.close();
                        Err(e)
                    }
                }
            });
        }
    }

    let mut rendered = RenderedPages {
        total_pages,
        pages: BTreeMap::new(),
    };
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(SheetError::from).and_then(|result| result) {
            Ok(Some((slot, bytes))) => {
                rendered.pages.insert(slot, bytes);
            }
            Ok(None) => {}
            Err(e) => {
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    log::info!(
        "Rendered {} page faces in {:.2?}",
        rendered.len(),
        started.elapsed()
    );
    Ok(rendered)
}
