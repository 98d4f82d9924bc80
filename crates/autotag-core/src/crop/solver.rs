//! Automatic crop derivation for a target aspect ratio and pixel size.
//!
//! When the dataset has a target output size, every image gets a crop that
//! already has the right shape:
//!
//! 1. No ratio: the whole image.
//! 2. Exact fit: the image is at least as large as the target in both
//!    dimensions, so a centered crop of exactly `target` pixels is taken and
//!    no scaling happens later.
//! 3. Maximize: otherwise the largest centered rectangle with the target
//!    ratio that fits inside the image. The compositor pads it later.

use tracing::debug;

use super::area::{AspectRatio, CropArea, TargetSize, FULL_EXTENT};
use crate::error::CropError;

/// Derive a centered crop satisfying `ratio` and, when it fits, `target`.
///
/// # Errors
///
/// Returns `CropError::InvalidConstraint` if either image dimension is zero
/// or `ratio` is present but not a positive finite number.
///
/// # Example
///
/// ```ignore
/// let crop = derive_crop(4000, 3000, Some(1.0), TargetSize::exact(1024, 1024))?;
/// assert!((crop.width - 25.6).abs() < 1e-9);
/// ```
pub fn derive_crop(
    image_width: u32,
    image_height: u32,
    ratio: Option<f64>,
    target: TargetSize,
) -> Result<CropArea, CropError> {
    if image_width == 0 || image_height == 0 {
        return Err(CropError::InvalidConstraint(format!(
            "image dimensions must be positive, got {image_width}x{image_height}"
        )));
    }

    let Some(ratio) = ratio else {
        return Ok(CropArea::FULL);
    };
    let ratio = AspectRatio::new(ratio)?.value();

    let img_w = image_width as f64;
    let img_h = image_height as f64;

    if let Some((target_w, target_h)) = target.dimensions() {
        if image_width >= target_w && image_height >= target_h {
            let width_pct = (target_w as f64 / img_w) * FULL_EXTENT;
            let height_pct = (target_h as f64 / img_h) * FULL_EXTENT;
            debug!(image_width, image_height, target_w, target_h, "exact pixel crop");
            return Ok(CropArea::centered(width_pct, height_pct));
        }
    }

    let image_ratio = img_w / img_h;
    let (width_pct, height_pct) = if image_ratio > ratio {
        // Wider than the target: full height, trimmed width
        (((img_h * ratio) / img_w) * FULL_EXTENT, FULL_EXTENT)
    } else {
        // Taller than (or equal to) the target: full width, trimmed height
        (FULL_EXTENT, ((img_w / ratio) / img_h) * FULL_EXTENT)
    };
    debug!(image_width, image_height, ratio, "maximized ratio crop");

    Ok(CropArea::centered(width_pct, height_pct))
}

/// Derive a crop using the ratio implied by `target` (both dimensions set).
pub fn derive_crop_for_target(
    image_width: u32,
    image_height: u32,
    target: TargetSize,
) -> Result<CropArea, CropError> {
    let ratio = target.aspect_ratio().map(AspectRatio::value);
    derive_crop(image_width, image_height, ratio, target)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
