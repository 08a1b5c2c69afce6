use card_images::ImageCache;
use card_sheets::*;
use deck_resolver::{Face, PrintUnit, Side};
use image::{Rgb, RgbImage};
use std::sync::Arc;

const DPI: u32 = 50;

fn options(two_sided: bool) -> SheetOptions {
    SheetOptions {
        dpi: DPI,
        background_box: false,
        reference_points: false,
        two_sided,
        render_threads: 2,
        ..Default::default()
    }
}

fn color(index: usize) -> Rgb<u8> {
    Rgb([(index * 20) as u8, 100, 200 - (index * 10) as u8])
}

/// Units `*c0`, `*c1`, ... each with a uniquely colored cached image, and
/// optionally a back `*b<i>`.
fn fixture(count: usize, with_backs: bool) -> (Vec<PrintUnit>, ImageCache, LayoutConstants) {
    let layout = LayoutConstants::new(&options(with_backs));
    let (w, h) = (layout.card_width_px, layout.card_height_px);
    let mut cache = ImageCache::new();
    let mut units = Vec::new();
    for i in 0..count {
        let front = Side::custom(&format!("c{i}"));
        cache.insert(front.key.clone(), RgbImage::from_pixel(w, h, color(i)));
        if with_backs {
            let back = Side::custom(&format!("b{i}"));
            cache.insert(back.key.clone(), RgbImage::from_pixel(w, h, color(i + 1)));
            units.push(PrintUnit::double(front, back));
        } else {
            units.push(PrintUnit::single(front));
        }
    }
    (units, cache, layout)
}

fn cell_center(layout: &LayoutConstants, row: usize, col: usize) -> (u32, u32) {
    let (x, y) = layout.positions[row][col];
    (
        (x + layout.card_width_px as i64 / 2) as u32,
        (y + layout.card_height_px as i64 / 2) as u32,
    )
}

#[test]
fn test_front_cells_follow_reading_order() {
    let (units, cache, layout) = fixture(5, false);
    let page = render_page_raster(0, Face::Front, &units, &cache, &layout, &options(false)).unwrap();

    assert_eq!(page.dimensions(), (layout.page_width_px, layout.page_height_px));
    for i in 0..5 {
        let (x, y) = cell_center(&layout, i / 3, i % 3);
        assert_eq!(page.get_pixel(x, y), &color(i), "cell {i}");
    }
    let (x, y) = cell_center(&layout, 2, 2);
    assert_eq!(page.get_pixel(x, y), &Rgb([255, 255, 255]));
}

#[test]
fn test_back_columns_are_mirrored() {
    let (units, cache, layout) = fixture(9, true);
    let page = render_page_raster(0, Face::Back, &units, &cache, &layout, &options(true)).unwrap();

    for row in 0..3 {
        for col in 0..3 {
            let unit = row * 3 + col;
            let (x, y) = cell_center(&layout, row, 2 - col);
            assert_eq!(page.get_pixel(x, y), &color(unit + 1), "unit {unit}");
        }
    }
}

#[test]
fn test_second_page_takes_remaining_units() {
    let (units, cache, layout) = fixture(11, false);
    let page = render_page_raster(1, Face::Front, &units, &cache, &layout, &options(false)).unwrap();

    let (x, y) = cell_center(&layout, 0, 0);
    assert_eq!(page.get_pixel(x, y), &color(9));
    let (x, y) = cell_center(&layout, 0, 1);
    assert_eq!(page.get_pixel(x, y), &color(10));
    let (x, y) = cell_center(&layout, 0, 2);
    assert_eq!(page.get_pixel(x, y), &Rgb([255, 255, 255]));
}

#[test]
fn test_unit_without_back_leaves_cell_empty() {
    let (mut units, cache, layout) = fixture(2, true);
    units[1] = PrintUnit::single(units[1].front().clone());

    let page = render_page_raster(0, Face::Back, &units, &cache, &layout, &options(true)).unwrap();
    let (x, y) = cell_center(&layout, 0, 2);
    assert_eq!(page.get_pixel(x, y), &color(1));
    let (x, y) = cell_center(&layout, 0, 1);
    assert_eq!(page.get_pixel(x, y), &Rgb([255, 255, 255]));
}

#[test]
fn test_missing_cache_entry_is_fatal() {
    let (mut units, cache, layout) = fixture(3, false);
    units.push(PrintUnit::single(Side::custom("uncached")));

    match render_page_raster(0, Face::Front, &units, &cache, &layout, &options(false)) {
        Err(SheetError::MissingCacheEntry { key }) => assert_eq!(key, "*uncached"),
        other => panic!("expected missing cache entry, got {other:?}"),
    }
}

#[test]
fn test_background_and_markers_are_black() {
    let (units, cache, layout) = fixture(1, false);
    let opts = SheetOptions {
        background_box: true,
        reference_points: true,
        ..options(false)
    };
    let page = render_page_raster(0, Face::Front, &units, &cache, &layout, &opts).unwrap();

    let bg = layout.background;
    assert_eq!(page.get_pixel(bg.x0 as u32, bg.y0 as u32), &Rgb([0, 0, 0]));
    assert_eq!(page.get_pixel(bg.x1 as u32, bg.y1 as u32), &Rgb([0, 0, 0]));
    let (x, y) = cell_center(&layout, 0, 0);
    assert_eq!(page.get_pixel(x, y), &color(0));
    for marker in &layout.markers {
        assert_eq!(
            page.get_pixel(marker.x0 as u32, marker.y0 as u32),
            &Rgb([0, 0, 0])
        );
    }
    assert_eq!(page.get_pixel(0, 0), &Rgb([255, 255, 255]));
}

#[test]
fn test_raster_to_pdf_is_single_a4_page() {
    let raster = RgbImage::from_pixel(40, 56, Rgb([10, 20, 30]));
    let bytes = raster_to_pdf(raster, 10, "test page");

    let doc = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 1);
}

#[tokio::test]
async fn test_render_pages_two_sided() {
    let (units, cache, _) = fixture(10, true);
    let rendered = render_pages(Arc::from(units), Arc::new(cache), &options(true))
        .await
        .unwrap();

    assert_eq!(rendered.total_pages, 2);
    assert_eq!(rendered.len(), 4);
    for page in 0..2 {
        assert!(rendered.get(page, Face::Front).is_some());
        assert!(rendered.get(page, Face::Back).is_some());
    }
}

#[tokio::test]
async fn test_render_pages_single_sided_skips_backs() {
    let (units, cache, _) = fixture(4, true);
    let rendered = render_pages(Arc::from(units), Arc::new(cache), &options(false))
        .await
        .unwrap();
    assert_eq!(rendered.len(), 1);
    assert!(rendered.get(0, Face::Back).is_none());
}

#[tokio::test]
async fn test_render_pages_fails_on_missing_image() {
    let (mut units, cache, _) = fixture(12, false);
    units.push(PrintUnit::single(Side::custom("uncached")));
    let result = render_pages(Arc::from(units), Arc::new(cache), &options(false)).await;
    assert!(matches!(result, Err(SheetError::MissingCacheEntry { .. })));
}

#[tokio::test]
async fn test_render_pages_without_units() {
    let result = render_pages(Arc::from(Vec::new()), Arc::new(ImageCache::new()), &options(false)).await;
    assert!(matches!(result, Err(SheetError::NoPages)));
}
