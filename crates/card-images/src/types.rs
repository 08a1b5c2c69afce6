use deck_resolver::ImageType;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to download {url} after {attempts} attempts: {reason}")]
    Download {
        url: String,
        attempts: u32,
        reason: String,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to decode image from {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to save image to {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Image from {origin} has zero width or height")]
    EmptyImage { origin: String },
    #[error("Could not sample border pixel of a {width}x{height} image")]
    BorderSample { width: u32, height: u32 },
    #[error("Image source not found: {path:?}")]
    MissingSource { path: PathBuf },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// Border brightness at or below which a border counts as black
pub const GAMMA_THRESHOLD: f32 = 3.0;

/// Borders brighter than this are not solid black borders; no correction
pub const MAX_BORDER_BRIGHTNESS: f32 = 100.0;

/// Border sample position, as a fraction of the height above the bottom edge
pub const BORDER_SAMPLE_OFFSET: f32 = 0.02;

/// Upper bound on contrast passes for one image
pub const MAX_GAMMA_PASSES: u32 = 32;

/// Download attempts per image
pub const RETRY_COUNT: u32 = 3;

/// Delay before every request to the image host (milliseconds)
pub const RATE_LIMIT_DELAY_MS: u64 = 100;

/// Image cache configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOptions {
    /// Directory holding `image_cache/`, `custom_cards/` and `cardbacks/`
    pub root: PathBuf,
    pub image_type: ImageType,
    pub dpi: u32,
    /// Target card width in pixels at `dpi`
    pub card_width_px: u32,
    /// Target card height in pixels at `dpi`
    pub card_height_px: u32,
    pub gamma_correction: bool,
    pub worker_threads: usize,
    pub max_attempts: u32,
    /// Initial retry delay, doubled after each failed attempt
    pub retry_backoff_ms: u64,
    pub rate_limit_delay_ms: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            image_type: ImageType::Png,
            dpi: 600,
            card_width_px: 1488,
            card_height_px: 2078,
            gamma_correction: true,
            worker_threads: 4,
            max_attempts: RETRY_COUNT,
            retry_backoff_ms: 1000,
            rate_limit_delay_ms: RATE_LIMIT_DELAY_MS,
        }
    }
}

impl CacheOptions {
    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(ImageError::Config("DPI must be greater than 0".to_string()));
        }
        if self.card_width_px == 0 || self.card_height_px == 0 {
            return Err(ImageError::Config(format!(
                "Card size {}x{} px is empty",
                self.card_width_px, self.card_height_px
            )));
        }
        if self.worker_threads == 0 {
            return Err(ImageError::Config(
                "At least one image worker is required".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ImageError::Config(
                "At least one download attempt is required".to_string(),
            ));
        }
        Ok(())
    }
}
