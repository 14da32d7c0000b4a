//! Off-screen raster preparation for the decoder.
//!
//! Readers want 8-bit grayscale. Small or low-contrast barcodes decode far
//! more often after an integer upscale and a contrast stretch, so camera
//! frames go through [`render_frame`] and uploads through [`prepare`].

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

use crate::models::decode::{DecodeRequest, ImageSource};
use crate::models::error::ScanError;

/// Upper bound on raster size after upscaling (64 megapixels).
const MAX_RASTER_PIXELS: u64 = 64 * 1024 * 1024;

/// Render one video frame into a grayscale raster `factor` times its native size.
///
/// The factor is lowered as far as needed to stay within the raster budget.
pub fn render_frame(frame: &RgbImage, factor: u32) -> Result<GrayImage, ScanError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(ScanError::CaptureFailed("frame has no pixels".into()));
    }
    Ok(upscale(imageops::grayscale(frame), factor))
}

/// Scale a raster up by an integer factor, clamped to the raster budget.
/// A factor of 0 or 1 is a no-op.
pub fn upscale(raster: GrayImage, factor: u32) -> GrayImage {
    upscale_within(raster, factor, MAX_RASTER_PIXELS)
}

fn upscale_within(raster: GrayImage, factor: u32, max_pixels: u64) -> GrayImage {
    let (width, height) = raster.dimensions();
    let applied = fit_factor(width, height, factor, max_pixels);
    if applied < factor && factor > 1 {
        log::debug!(
            "{}x{} raster: upscale lowered from {}x to {}x",
            width,
            height,
            factor,
            applied
        );
    }
    if applied <= 1 {
        return raster;
    }
    imageops::resize(&raster, width * applied, height * applied, FilterType::Triangle)
}

/// Largest factor up to `factor` whose scaled raster has at most `max_pixels` pixels.
fn fit_factor(width: u32, height: u32, factor: u32, max_pixels: u64) -> u32 {
    let area = u64::from(width) * u64::from(height);
    let mut applied = factor.max(1);
    while applied > 1 {
        let side = u64::from(applied);
        let max_side = u64::from(u32::MAX);
        let fits_dims = u64::from(width) * side <= max_side && u64::from(height) * side <= max_side;
        if fits_dims && area.saturating_mul(side * side) <= max_pixels {
            break;
        }
        applied -= 1;
    }
    applied
}

/// Shrink a raster so its longer side is at most `max_edge`. Never enlarges.
pub fn fit_within(raster: GrayImage, max_edge: u32) -> GrayImage {
    let (width, height) = raster.dimensions();
    let longest = width.max(height);
    if longest <= max_edge || max_edge == 0 {
        return raster;
    }

    let scale = f64::from(max_edge) / f64::from(longest);
    let new_width = ((f64::from(width) * scale).round() as u32).max(1);
    let new_height = ((f64::from(height) * scale).round() as u32).max(1);
    imageops::resize(&raster, new_width, new_height, FilterType::Triangle)
}

/// Linearly stretch luminance so the darkest pixel is 0 and the brightest 255.
pub fn stretch_contrast(raster: &GrayImage) -> GrayImage {
    let Some((min, max)) = luminance_range(raster) else {
        return raster.clone();
    };
    if max == min {
        return raster.clone();
    }

    let span = u32::from(max - min);
    let mut out = raster.clone();
    for pixel in out.pixels_mut() {
        let value = u32::from(pixel.0[0] - min);
        pixel.0[0] = ((value * 255 + span / 2) / span) as u8;
    }
    out
}

/// Photometric negative, for light-on-dark prints.
pub fn invert(raster: &GrayImage) -> GrayImage {
    let mut out = raster.clone();
    imageops::invert(&mut out);
    out
}

/// Spread between darkest and brightest pixel, 0.0–1.0.
pub fn contrast_ratio(raster: &GrayImage) -> f32 {
    match luminance_range(raster) {
        Some((min, max)) => f32::from(max - min) / 255.0,
        None => 0.0,
    }
}

/// Decode an image source to grayscale.
pub fn load_source(source: &ImageSource) -> Result<GrayImage, ScanError> {
    match source {
        ImageSource::Path(path) => image::open(path)
            .map(|img| img.to_luma8())
            .map_err(|e| ScanError::UnreadableImage(format!("{}: {}", path.display(), e))),
        ImageSource::Bytes(bytes) => image::load_from_memory(bytes)
            .map(|img| img.to_luma8())
            .map_err(|e| ScanError::UnreadableImage(e.to_string())),
        ImageSource::Raster(raster) => {
            if raster.width() == 0 || raster.height() == 0 {
                return Err(ScanError::CaptureFailed("raster has no pixels".into()));
            }
            Ok(raster.clone())
        }
    }
}

/// Load and pre-process the raster for a still decode request.
pub fn prepare(request: &DecodeRequest) -> Result<GrayImage, ScanError> {
    let mut raster = load_source(request.source())?;
    if let Some(factor) = request.upscale_factor() {
        raster = upscale(raster, factor);
    }
    if let Some(edge) = request.max_edge() {
        raster = fit_within(raster, edge);
    }
    Ok(raster)
}

fn luminance_range(raster: &GrayImage) -> Option<(u8, u8)> {
    raster.pixels().fold(None, |range, pixel| {
        let value = pixel.0[0];
        Some(match range {
            None => (value, value),
            Some((min, max)) => (min.min(value), max.max(value)),
        })
    })
}
