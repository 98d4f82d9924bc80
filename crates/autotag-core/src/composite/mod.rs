//! Rasterizing a crop into the final output image.
//!
//! # Algorithm
//!
//! 1. Convert the crop percentages to a source pixel rectangle.
//! 2. The canvas is `target` when given, otherwise the crop's own pixel size
//!    (truncated to whole pixels, like a host canvas dimension).
//! 3. Fill the canvas with opaque black.
//! 4. With both target dimensions, fit the crop with
//!    `scale = min(tw / pxW, th / pxH, 1)` and center it. The scale is capped
//!    at 1: an undersized crop is drawn 1:1 and padded, never upscaled.
//!    Without a full target the crop fills the whole canvas.
//! 5. Draw the crop into the destination rectangle and encode as JPEG.
//!
//! Planning ([`plan_composite`]) is pure geometry and is what the editor
//! preview and the raster path share; [`composite`] does the pixel work.

mod raster;

use tracing::debug;

use crate::crop::{CropArea, PixelRect, TargetSize};
use crate::decode::{decode_image, DecodedImage};
use crate::encode::encode_image;
use crate::error::CropError;
use crate::transform;
pub(crate) use raster::black_buffer;
use raster::Canvas;

/// Largest canvas the compositor will allocate (16384 x 16384 pixels).
pub const MAX_CANVAS_AREA: u64 = 16_384 * 16_384;

/// Geometry of one composite: where the crop comes from and where it lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeLayout {
    /// Crop rectangle in source pixels.
    pub source: PixelRect,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Destination rectangle in canvas pixels.
    pub dest: PixelRect,
    /// Fit scale, present only when both target dimensions were given.
    pub scale: Option<f64>,
}

impl CompositeLayout {
    /// True when some canvas area is left as black padding.
    pub fn is_padded(&self) -> bool {
        self.dest.x > 0.0
            || self.dest.y > 0.0
            || self.dest.width < self.canvas_width as f64
            || self.dest.height < self.canvas_height as f64
    }
}

/// Compute the canvas and destination rectangle for a crop.
///
/// # Errors
///
/// - `CropError::InvalidConstraint` for a zero-sized source or non-finite crop
/// - `CropError::RasterContextUnavailable` when the canvas would be empty or
///   larger than [`MAX_CANVAS_AREA`]
pub fn plan_composite(
    natural_width: u32,
    natural_height: u32,
    crop: &CropArea,
    target: TargetSize,
) -> Result<CompositeLayout, CropError> {
    if natural_width == 0 || natural_height == 0 {
        return Err(CropError::InvalidConstraint(format!(
            "source dimensions must be positive, got {natural_width}x{natural_height}"
        )));
    }
    if !crop.is_finite() {
        return Err(CropError::InvalidConstraint(format!(
            "crop has non-finite fields: {crop:?}"
        )));
    }

    let source = crop.to_pixels(natural_width, natural_height);

    // `as u32` truncates and saturates, matching how a canvas takes its size
    let canvas_width = target.width.unwrap_or(source.width as u32);
    let canvas_height = target.height.unwrap_or(source.height as u32);
    if canvas_width == 0
        || canvas_height == 0
        || canvas_width as u64 * canvas_height as u64 > MAX_CANVAS_AREA
    {
        return Err(CropError::RasterContextUnavailable {
            width: canvas_width,
            height: canvas_height,
        });
    }

    let cw = canvas_width as f64;
    let ch = canvas_height as f64;

    let (dest, scale) = match target.dimensions() {
        Some((tw, th)) => {
            let scale = (tw as f64 / source.width)
                .min(th as f64 / source.height)
                .min(1.0);
            let dest_w = source.width * scale;
            let dest_h = source.height * scale;
            let dest = PixelRect {
                x: (cw - dest_w) / 2.0,
                y: (ch - dest_h) / 2.0,
                width: dest_w,
                height: dest_h,
            };
            (dest, Some(scale))
        }
        None => (
            PixelRect {
                x: 0.0,
                y: 0.0,
                width: cw,
                height: ch,
            },
            None,
        ),
    };

    Ok(CompositeLayout {
        source,
        canvas_width,
        canvas_height,
        dest,
        scale,
    })
}

/// Composite `crop` of `source` into the output canvas.
///
/// A non-zero `rotation_degrees` (clockwise) first rotates the source into
/// its expanded bounds; the crop then refers to the rotated image.
pub fn composite(
    source: &DecodedImage,
    crop: &CropArea,
    rotation_degrees: f64,
    target: TargetSize,
) -> Result<DecodedImage, CropError> {
    if !rotation_degrees.is_finite() {
        return Err(CropError::InvalidConstraint(format!(
            "rotation must be finite, got {rotation_degrees}"
        )));
    }

    let rotated;
    let source = if transform::is_identity(rotation_degrees) {
        source
    } else {
        rotated = transform::rotate(source, rotation_degrees)?;
        &rotated
    };

    let layout = plan_composite(source.width, source.height, crop, target)?;
    debug!(
        canvas_width = layout.canvas_width,
        canvas_height = layout.canvas_height,
        scale = ?layout.scale,
        "compositing crop"
    );

    let mut canvas = Canvas::black(layout.canvas_width, layout.canvas_height)?;
    canvas.draw(source, layout.source, layout.dest);
    Ok(canvas.into_image())
}

/// Decode `bytes`, composite the crop and encode the result as JPEG.
///
/// # Errors
///
/// `CropError::SourceUnavailable` when the bytes do not decode; otherwise as
/// [`composite`], plus `CropError::Encode`.
pub fn composite_jpeg(
    bytes: &[u8],
    crop: &CropArea,
    rotation_degrees: f64,
    target: TargetSize,
    quality: u8,
) -> Result<Vec<u8>, CropError> {
    let source = decode_image(bytes)?;
    let raster = composite(&source, crop, rotation_degrees, target)?;
    Ok(encode_image(&raster, quality)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::derive_crop_for_target;
    use crate::encode::{encode_jpeg, DEFAULT_JPEG_QUALITY};
    use approx::assert_relative_eq;

    /// Image with no black pixels so padding is distinguishable.
    fn test_image(width: u32, height: u32) -> DecodedImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x % 200) as u8 + 50, (y % 200) as u8 + 50, 128]);
            }
        }
        DecodedImage::new(width, height, pixels)
    }

    #[test]
    fn test_no_target_matches_crop_pixels() {
        let layout = plan_composite(4000, 3000, &CropArea::new(10.0, 10.0, 50.0, 50.0), TargetSize::default()).unwrap();
        assert_eq!((layout.canvas_width, layout.canvas_height), (2000, 1500));
        assert_eq!(layout.scale, None);
        assert!(!layout.is_padded());
    }

    #[test]
    fn test_canvas_truncates_fractional_crop() {
        let layout = plan_composite(1001, 999, &CropArea::new(0.0, 0.0, 50.0, 50.0), TargetSize::default()).unwrap();
        assert_eq!((layout.canvas_width, layout.canvas_height), (500, 499));
    }

    #[test]
    fn test_undersized_source_is_padded_not_upscaled() {
        let layout = plan_composite(500, 500, &CropArea::FULL, TargetSize::exact(1024, 1024)).unwrap();

        assert_eq!((layout.canvas_width, layout.canvas_height), (1024, 1024));
        assert_eq!(layout.scale, Some(1.0));
        assert_relative_eq!(layout.dest.x, 262.0);
        assert_relative_eq!(layout.dest.y, 262.0);
        assert_relative_eq!(layout.dest.width, 500.0);
        assert_relative_eq!(layout.dest.height, 500.0);
        assert!(layout.is_padded());
    }

    #[test]
    fn test_oversized_crop_scales_down_to_fit() {
        // 2:1 crop into a square target: width binds
        let layout = plan_composite(2000, 1000, &CropArea::FULL, TargetSize::exact(1000, 1000)).unwrap();
        assert_relative_eq!(layout.scale.unwrap(), 0.5);
        assert_relative_eq!(layout.dest.width, 1000.0);
        assert_relative_eq!(layout.dest.height, 500.0);
        assert_relative_eq!(layout.dest.x, 0.0);
        assert_relative_eq!(layout.dest.y, 250.0);
    }

    #[test]
    fn test_single_target_dimension_fills_canvas() {
        let layout = plan_composite(800, 600, &CropArea::FULL, TargetSize::new(Some(400), None)).unwrap();
        assert_eq!((layout.canvas_width, layout.canvas_height), (400, 600));
        assert_eq!(layout.scale, None);
        assert_relative_eq!(layout.dest.width, 400.0);
        assert_relative_eq!(layout.dest.height, 600.0);
    }

    #[test]
    fn test_empty_crop_without_target_is_unavailable() {
        let result = plan_composite(100, 100, &CropArea::new(50.0, 50.0, 0.5, 20.0), TargetSize::default());
        assert!(matches!(
            result,
            Err(CropError::RasterContextUnavailable { width: 0, height: 20 })
        ));
    }

    #[test]
    fn test_huge_canvas_is_unavailable() {
        let result = plan_composite(100, 100, &CropArea::FULL, TargetSize::exact(100_000, 100_000));
        assert!(matches!(result, Err(CropError::RasterContextUnavailable { .. })));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            plan_composite(0, 100, &CropArea::FULL, TargetSize::default()),
            Err(CropError::InvalidConstraint(_))
        ));
        assert!(matches!(
            plan_composite(100, 100, &CropArea::new(f64::NAN, 0.0, 10.0, 10.0), TargetSize::default()),
            Err(CropError::InvalidConstraint(_))
        ));
        let img = test_image(4, 4);
        assert!(matches!(
            composite(&img, &CropArea::FULL, f64::NAN, TargetSize::default()),
            Err(CropError::InvalidConstraint(_))
        ));
    }

    #[test]
    fn test_composite_non_upscale_raster() {
        let source = test_image(500, 500);
        let out = composite(&source, &CropArea::FULL, 0.0, TargetSize::exact(1024, 1024)).unwrap();

        assert_eq!(out.dimensions(), (1024, 1024));
        assert_eq!(out.pixel(262, 262), source.pixel(0, 0));
        assert_eq!(out.pixel(761, 761), source.pixel(499, 499));
        assert_eq!(out.pixel(400, 300), source.pixel(138, 38));
        for (x, y) in [(0, 0), (261, 261), (762, 762), (1023, 1023), (512, 100), (100, 512)] {
            assert_eq!(out.pixel(x, y), [0, 0, 0], "expected padding at ({x}, {y})");
        }
    }

    #[test]
    fn test_composite_exact_crop_is_pixel_copy() {
        let source = test_image(400, 300);
        // 100x100 px crop at (40, 30)
        let crop = CropArea::new(10.0, 10.0, 25.0, 100.0 / 3.0);
        let out = composite(&source, &crop, 0.0, TargetSize::exact(100, 100)).unwrap();

        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.pixel(0, 0), source.pixel(40, 30));
        assert_eq!(out.pixel(99, 99), source.pixel(139, 129));
    }

    #[test]
    fn test_solver_and_compositor_agree_on_exact_fit() {
        let source = test_image(640, 480);
        let target = TargetSize::exact(320, 320);
        let crop = derive_crop_for_target(640, 480, target).unwrap();
        let layout = plan_composite(640, 480, &crop, target).unwrap();

        assert_relative_eq!(layout.scale.unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(layout.dest.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(layout.dest.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(layout.dest.width, 320.0, epsilon = 1e-9);

        let out = composite(&source, &crop, 0.0, target).unwrap();
        assert_eq!(out.dimensions(), (320, 320));
        assert_eq!(out.pixel(0, 0), source.pixel(160, 80));
    }

    #[test]
    fn test_composite_scaled_down_has_letterbox() {
        let source = DecodedImage::new(200, 100, vec![180u8; 200 * 100 * 3]);
        let out = composite(&source, &CropArea::FULL, 0.0, TargetSize::exact(100, 100)).unwrap();

        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.pixel(50, 10), [0, 0, 0]);
        assert_eq!(out.pixel(50, 50), [180, 180, 180]);
        assert_eq!(out.pixel(50, 90), [0, 0, 0]);
    }

    #[test]
    fn test_composite_quarter_rotation_uses_rotated_bounds() {
        let source = test_image(40, 20);
        let out = composite(&source, &CropArea::FULL, 90.0, TargetSize::default()).unwrap();
        assert_eq!(out.dimensions(), (20, 40));
    }

    #[test]
    fn test_composite_jpeg_round_trip() {
        let source = test_image(64, 48);
        let jpeg_in = encode_jpeg(&source.pixels, 64, 48, 95).unwrap();

        let out = composite_jpeg(&jpeg_in, &CropArea::new(0.0, 0.0, 50.0, 50.0), 0.0, TargetSize::exact(64, 64), DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(&out[0..2], &[0xFF, 0xD8]);

        let decoded = decode_image(&out).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
    }

    #[test]
    fn test_composite_jpeg_source_unavailable() {
        let result = composite_jpeg(b"not an image", &CropArea::FULL, 0.0, TargetSize::default(), 90);
        assert!(matches!(result, Err(CropError::SourceUnavailable(_))));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: With a full target the destination never exceeds the
        /// canvas and is never larger than the crop itself.
        #[test]
        fn prop_dest_fits_and_never_upscales(
            (img_w, img_h) in (1u32..=5000, 1u32..=5000),
            (x, y) in (0.0f64..=50.0, 0.0f64..=50.0),
            (w, h) in (1.0f64..=50.0, 1.0f64..=50.0),
            (tw, th) in (1u32..=4096, 1u32..=4096),
        ) {
            let crop = CropArea::new(x, y, w, h);
            let layout = plan_composite(img_w, img_h, &crop, TargetSize::exact(tw, th)).unwrap();

            prop_assert_eq!((layout.canvas_width, layout.canvas_height), (tw, th));
            prop_assert!(layout.dest.width <= layout.source.width + 1e-9);
            prop_assert!(layout.dest.height <= layout.source.height + 1e-9);
            prop_assert!(layout.dest.x >= -1e-9 && layout.dest.y >= -1e-9);
            prop_assert!(layout.dest.x + layout.dest.width <= tw as f64 + 1e-6);
            prop_assert!(layout.dest.y + layout.dest.height <= th as f64 + 1e-6);
        }

        /// Property: The destination is centered on the canvas.
        #[test]
        fn prop_dest_centered(
            (img_w, img_h) in (10u32..=3000, 10u32..=3000),
            (tw, th) in (1u32..=2048, 1u32..=2048),
        ) {
            let layout = plan_composite(img_w, img_h, &CropArea::FULL, TargetSize::exact(tw, th)).unwrap();
            let left = layout.dest.x;
            let right = tw as f64 - (layout.dest.x + layout.dest.width);
            let top = layout.dest.y;
            let bottom = th as f64 - (layout.dest.y + layout.dest.height);
            prop_assert!((left - right).abs() < 1e-6);
            prop_assert!((top - bottom).abs() < 1e-6);
        }
    }
}
