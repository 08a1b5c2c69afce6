use deck_resolver::Face;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No image cached for key `{key}`")]
    MissingCacheEntry { key: String },
    #[error("Page {page} {} was not rendered", .face.name())]
    MissingPage { page: usize, face: Face },
    #[error("Rendered page {page} {} contains no page", .face.name())]
    EmptyPage { page: usize, face: Face },
    #[error("No pages to print")]
    NoPages,
}

pub type Result<T> = std::result::Result<T, SheetError>;

pub const CARD_WIDTH_MM: f64 = 63.0;
pub const CARD_HEIGHT_MM: f64 = 88.0;
pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;

/// Margin of the background box around the card grid
pub const BG_BOX_MARGIN_MM: f64 = 2.0;

/// Distance between the marker corners, centered on the grid
pub const MARKER_SPAN_MM: (f64, f64) = (193.0, 278.0);
pub const MARKER_SIZE_MM: f64 = 2.0;

pub const GRID_ROWS: usize = 3;
pub const GRID_COLS: usize = 3;
pub const CARDS_PER_PAGE: usize = GRID_ROWS * GRID_COLS;

/// Page layout and printing options
#[derive(Debug, Clone, PartialEq)]
pub struct SheetOptions {
    pub dpi: u32,
    /// Gap between adjacent cards
    pub spacing_mm: f64,
    /// Horizontal shift of the whole grid, for printers that do not center
    pub x_axis_offset_mm: f64,
    pub background_box: bool,
    pub reference_points: bool,
    pub two_sided: bool,
    pub stagger: bool,
    pub render_threads: usize,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            dpi: 600,
            spacing_mm: 0.0,
            x_axis_offset_mm: 0.0,
            background_box: true,
            reference_points: true,
            two_sided: false,
            stagger: false,
            render_threads: 2,
        }
    }
}

impl SheetOptions {
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(SheetError::Config("DPI must be greater than 0".to_string()));
        }
        if self.spacing_mm < 0.0 {
            return Err(SheetError::Config(format!(
                "Card spacing must not be negative (got {}mm)",
                self.spacing_mm
            )));
        }
        if self.render_threads == 0 {
            return Err(SheetError::Config(
                "At least one render thread is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Faces rendered for every page index
    pub fn faces(&self) -> &'static [Face] {
        if self.two_sided {
            &[Face::Front, Face::Back]
        } else {
            &[Face::Front]
        }
    }
}
