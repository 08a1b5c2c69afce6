//! Synchronous image operations: decode, scale, border gamma correction.
//!
//! Everything here is CPU-bound and runs inside `spawn_blocking`.

use crate::types::*;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbImage};
use std::path::Path;

/// Open an image file, sniffing the format from its content.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let origin = path.display().to_string();
    let image = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|source| ImageError::Decode {
            origin: origin.clone(),
            source,
        })?;
    ensure_not_empty(image, origin)
}

/// Decode downloaded bytes.
pub fn decode_image(bytes: &[u8], origin: &str) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes).map_err(|source| ImageError::Decode {
        origin: origin.to_string(),
        source,
    })?;
    ensure_not_empty(image, origin.to_string())
}

fn ensure_not_empty(image: DynamicImage, origin: String) -> Result<DynamicImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ImageError::EmptyImage { origin });
    }
    Ok(image)
}

/// Resize to the exact card size in pixels, dropping any alpha channel.
pub fn scale_to_card(image: &DynamicImage, width: u32, height: u32) -> RgbImage {
    image::imageops::resize(&image.to_rgb8(), width, height, FilterType::Lanczos3)
}

pub fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|source| ImageError::Encode {
        path: path.to_owned(),
        source,
    })
}

/// Mean channel value of the pixel sampled near the bottom-center border.
pub fn border_brightness(image: &RgbImage) -> Option<f32> {
    let (width, height) = image.dimensions();
    let x = width / 2;
    let y = (height as f32 - height as f32 * BORDER_SAMPLE_OFFSET) as u32;
    image.get_pixel_checked(x, y).map(|pixel| {
        let [r, g, b] = pixel.0;
        (r as f32 + g as f32 + b as f32) / 3.0
    })
}

/// Contrast enhancement around the mean grey level of the image.
///
/// `factor == 1.0` returns an identical image; larger factors push every
/// channel away from the mean.
pub fn enhance_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let pixel_count = (image.width() as u64 * image.height() as u64).max(1);
    let luma_sum: u64 = image
        .pixels()
        .map(|pixel| {
            let [r, g, b] = pixel.0;
            (r as u64 * 19595 + g as u64 * 38470 + b as u64 * 7471 + 0x8000) >> 16
        })
        .sum();
    let mean = (luma_sum as f64 / pixel_count as f64 + 0.5) as i32 as f32;

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let value = mean + factor * (*channel as f32 - mean);
            *channel = if value <= 0.0 {
                0
            } else if value >= 255.0 {
                255
            } else {
                value as u8
            };
        }
    }
    out
}

/// What gamma correction did to an image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GammaOutcome {
    /// Border too bright to be a solid black border
    Skipped { brightness: f32 },
    /// Border at or below the threshold after `passes` contrast passes
    Corrected { passes: u32, brightness: f32 },
    /// Stopped early, keeping the darkest result reached
    Stalled { passes: u32, brightness: f32 },
}

/// Darken a near-black border until it samples as black.
pub fn gamma_correct(image: RgbImage) -> Result<(RgbImage, GammaOutcome)> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::EmptyImage {
            origin: "gamma correction input".to_string(),
        });
    }

    let mut brightness =
        border_brightness(&image).ok_or(ImageError::BorderSample { width, height })?;
    if brightness > MAX_BORDER_BRIGHTNESS {
        return Ok((image, GammaOutcome::Skipped { brightness }));
    }

    let mut best = image;
    let mut passes = 0;
    while brightness > GAMMA_THRESHOLD {
        if passes == MAX_GAMMA_PASSES {
            return Ok((best, GammaOutcome::Stalled { passes, brightness }));
        }
        let enhanced = enhance_contrast(&best, 1.0 + brightness / 256.0);
        passes += 1;

        match border_brightness(&enhanced) {
            Some(next) if next < brightness => {
                best = enhanced;
                brightness = next;
            }
            _ => return Ok((best, GammaOutcome::Stalled { passes, brightness })),
        }
    }

    Ok((best, GammaOutcome::Corrected { passes, brightness }))
}
