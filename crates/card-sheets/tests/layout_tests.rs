use card_sheets::*;

#[test]
fn test_mm_to_px_truncates() {
    assert_eq!(mm_to_px(63.0, 600), 1488);
    assert_eq!(mm_to_px(88.0, 600), 2078);
    assert_eq!(mm_to_px(210.0, 600), 4960);
    assert_eq!(mm_to_px(-96.5, 600), -2279);
}

#[test]
fn test_total_pages() {
    assert_eq!(LayoutConstants::total_pages(0), 0);
    assert_eq!(LayoutConstants::total_pages(1), 1);
    assert_eq!(LayoutConstants::total_pages(9), 1);
    assert_eq!(LayoutConstants::total_pages(10), 2);
    assert_eq!(LayoutConstants::total_pages(27), 3);
}

#[test]
fn test_grid_is_centered() {
    let layout = LayoutConstants::new(&SheetOptions::default());

    assert_eq!(layout.card_width_px, 1488);
    assert_eq!(layout.card_height_px, 2078);
    assert_eq!((layout.page_width_px, layout.page_height_px), (4960, 7015));

    let left = layout.positions[0][0].0;
    let right = layout.positions[0][2].0 + layout.card_width_px as i64;
    assert_eq!(left, layout.page_width_px as i64 - right);
    assert_eq!(layout.positions[0][0], (248, 390));

    // rows share x, columns share y
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            assert_eq!(layout.positions[row][col].0, layout.positions[0][col].0);
            assert_eq!(layout.positions[row][col].1, layout.positions[row][0].1);
        }
    }
}

#[test]
fn test_spacing_and_offset() {
    let options = SheetOptions {
        spacing_mm: 1.0,
        x_axis_offset_mm: 2.0,
        ..Default::default()
    };
    let layout = LayoutConstants::new(&options);
    let spacing = mm_to_px(1.0, 600);
    let offset = mm_to_px(2.0, 600);

    let centered = LayoutConstants::new(&SheetOptions {
        spacing_mm: 1.0,
        ..Default::default()
    });
    assert_eq!(
        layout.positions[1][1].0,
        centered.positions[1][1].0 + offset
    );
    assert_eq!(
        layout.positions[0][1].0 - layout.positions[0][0].0,
        layout.card_width_px as i64 + spacing
    );
    assert_eq!(
        layout.positions[1][0].1 - layout.positions[0][0].1,
        layout.card_height_px as i64 + spacing
    );
}

#[test]
fn test_background_box_surrounds_grid() {
    let layout = LayoutConstants::new(&SheetOptions::default());
    let margin = mm_to_px(BG_BOX_MARGIN_MM, 600);
    let (grid_x, grid_y) = layout.positions[0][0];
    let (last_x, last_y) = layout.positions[2][2];

    assert_eq!(layout.background.x0, grid_x - margin);
    assert_eq!(layout.background.y0, grid_y - margin);
    assert_eq!(
        layout.background.x1,
        last_x + layout.card_width_px as i64 + margin
    );
    assert_eq!(
        layout.background.y1,
        last_y + layout.card_height_px as i64 + margin
    );
}

#[test]
fn test_marker_rects() {
    let layout = LayoutConstants::new(&SheetOptions::default());
    let size = mm_to_px(MARKER_SIZE_MM, 600);

    assert_eq!(layout.markers.len(), 8);
    for rect in &layout.markers {
        assert!(rect.x0 <= rect.x1 && rect.y0 <= rect.y1);
        assert_eq!(rect.x1 - rect.x0, size);
        assert_eq!(rect.y1 - rect.y0, size);
    }

    // bottom-right corner: one square on each side of the corner point
    let corner_x = 2480 + mm_to_px(193.0 / 2.0, 600);
    let corner_y = 3507 + mm_to_px(278.0 / 2.0, 600);
    assert_eq!(
        layout.markers[0],
        PixelRect {
            x0: corner_x,
            y0: corner_y,
            x1: corner_x + size,
            y1: corner_y + size,
        }
    );
    assert_eq!(
        layout.markers[1],
        PixelRect {
            x0: corner_x - size,
            y0: corner_y - size,
            x1: corner_x,
            y1: corner_y,
        }
    );
}

#[test]
fn test_options_validation() {
    assert!(SheetOptions::default().validate().is_ok());
    for options in [
        SheetOptions {
            dpi: 0,
            ..Default::default()
        },
        SheetOptions {
            spacing_mm: -1.0,
            ..Default::default()
        },
        SheetOptions {
            render_threads: 0,
            ..Default::default()
        },
    ] {
        assert!(matches!(options.validate(), Err(SheetError::Config(_))));
    }
}
