//! Output canvas: black fill plus a single scaled blit.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb, RgbImage};

use super::MAX_CANVAS_AREA;
use crate::crop::PixelRect;
use crate::decode::DecodedImage;
use crate::error::CropError;

/// Allocate an all-black RGB buffer, refusing sizes the compositor cannot hold.
///
/// # Errors
///
/// `CropError::RasterContextUnavailable` when either side is zero, the area
/// exceeds [`MAX_CANVAS_AREA`] or the allocation fails.
pub(crate) fn black_buffer(width: u32, height: u32) -> Result<RgbImage, CropError> {
    let unavailable = || CropError::RasterContextUnavailable { width, height };
    if width == 0 || height == 0 || width as u64 * height as u64 > MAX_CANVAS_AREA {
        return Err(unavailable());
    }

    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(unavailable)?;
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(len).map_err(|_| unavailable())?;
    pixels.resize(len, 0);
    RgbImage::from_raw(width, height, pixels).ok_or_else(unavailable)
}

/// An RGB drawing surface pre-filled with opaque black.
#[derive(Debug)]
pub(crate) struct Canvas {
    image: RgbImage,
}

/// Integer span `[start, end)` of a fractional edge pair, clamped to `limit`.
fn pixel_span(start: f64, extent: f64, limit: u32) -> (u32, u32) {
    let lo = start.round().clamp(0.0, limit as f64) as u32;
    let hi = (start + extent).round().clamp(0.0, limit as f64) as u32;
    (lo, hi.max(lo))
}

impl Canvas {
    /// Allocate a black canvas.
    ///
    /// # Errors
    ///
    /// See [`black_buffer`].
    pub(crate) fn black(width: u32, height: u32) -> Result<Self, CropError> {
        black_buffer(width, height).map(|image| Self { image })
    }

    /// Draw the `src` region of `source` into the `dest` region of the canvas.
    ///
    /// Equal-sized regions are copied 1:1; anything else is resampled with a
    /// triangle (bilinear) filter. Fractional edges are rounded to whole
    /// pixels and both regions are clipped to their images.
    pub(crate) fn draw(&mut self, source: &DecodedImage, src: PixelRect, dest: PixelRect) {
        let (width, height) = self.image.dimensions();
        let (sx0, sx1) = pixel_span(src.x, src.width, source.width);
        let (sy0, sy1) = pixel_span(src.y, src.height, source.height);
        let (dx0, dx1) = pixel_span(dest.x, dest.width, width);
        let (dy0, dy1) = pixel_span(dest.y, dest.height, height);

        let (sw, sh) = (sx1 - sx0, sy1 - sy0);
        let (dw, dh) = (dx1 - dx0, dy1 - dy0);
        if sw == 0 || sh == 0 || dw == 0 || dh == 0 {
            return;
        }

        let Some(view) = ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(
            source.width,
            source.height,
            source.pixels.as_slice(),
        ) else {
            return;
        };

        let region = imageops::crop_imm(&view, sx0, sy0, sw, sh);
        if (sw, sh) == (dw, dh) {
            imageops::replace(&mut self.image, &*region, dx0 as i64, dy0 as i64);
        } else {
            let scaled = imageops::resize(&*region, dw, dh, FilterType::Triangle);
            imageops::replace(&mut self.image, &scaled, dx0 as i64, dy0 as i64);
        }
    }

    pub(crate) fn into_image(self) -> DecodedImage {
        DecodedImage::from_rgb_image(self.image)
    }
}
