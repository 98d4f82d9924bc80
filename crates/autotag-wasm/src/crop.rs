//! Crop model and solver bindings.
//!
//! # Example
//!
//! ```typescript
//! import { derive_crop } from '@autotag/wasm';
//!
//! // Largest centered 1:1 crop, or the exact 1024x1024 window when it fits
//! const crop = derive_crop(img.naturalWidth, img.naturalHeight, 1024, 1024);
//! console.log(crop.x, crop.y, crop.width, crop.height);
//! ```

use autotag_core::crop::{self, CropArea, TargetSize};
use wasm_bindgen::prelude::*;

/// A crop rectangle in percent (0-100) of the natural image size.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsCropArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[wasm_bindgen]
impl JsCropArea {
    #[wasm_bindgen(constructor)]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> JsCropArea {
        JsCropArea {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole image.
    pub fn full() -> JsCropArea {
        CropArea::FULL.into()
    }
}

impl From<CropArea> for JsCropArea {
    fn from(area: CropArea) -> Self {
        JsCropArea::new(area.x, area.y, area.width, area.height)
    }
}

impl From<JsCropArea> for CropArea {
    fn from(area: JsCropArea) -> Self {
        CropArea::new(area.x, area.y, area.width, area.height)
    }
}

/// Build a target from optional JS numbers; zero means "not set".
pub(crate) fn target_size(width: Option<u32>, height: Option<u32>) -> TargetSize {
    TargetSize::new(width, height)
}

pub(crate) fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Derive the automatic crop for an image.
///
/// The aspect ratio is `target_width / target_height` when both are given;
/// otherwise the full image is returned.
///
/// # Errors
///
/// Returns an error for zero image dimensions.
#[wasm_bindgen]
pub fn derive_crop(
    image_width: u32,
    image_height: u32,
    target_width: Option<u32>,
    target_height: Option<u32>,
) -> Result<JsCropArea, JsValue> {
    crop::derive_crop_for_target(image_width, image_height, target_size(target_width, target_height))
        .map(JsCropArea::from)
        .map_err(to_js_error)
}

/// Derive a crop for an explicit aspect ratio (`width / height`).
///
/// # Errors
///
/// Returns an error for zero image dimensions or a non-positive ratio.
#[wasm_bindgen]
pub fn derive_crop_with_ratio(
    image_width: u32,
    image_height: u32,
    ratio: f64,
) -> Result<JsCropArea, JsValue> {
    crop::derive_crop(image_width, image_height, Some(ratio), TargetSize::default())
        .map(JsCropArea::from)
        .map_err(to_js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "{actual} != {expected}");
    }

    #[test]
    fn test_conversion_round_trip() {
        let js = JsCropArea::new(1.0, 2.0, 30.0, 40.0);
        let core: CropArea = js.into();
        assert_eq!(JsCropArea::from(core), js);
        assert_eq!(CropArea::from(JsCropArea::full()), CropArea::FULL);
    }

    #[test]
    fn test_target_size_treats_zero_as_unset() {
        assert_eq!(target_size(Some(0), Some(512)), TargetSize::new(None, Some(512)));
        assert_eq!(target_size(None, None).aspect_ratio(), None);
    }

    #[test]
    fn test_derive_crop_exact_fit() {
        let crop = derive_crop(4000, 3000, Some(1024), Some(1024)).unwrap();
        assert_close(crop.width, 25.6);
        assert_close(crop.height, 1024.0 / 3000.0 * 100.0);
        assert_close(crop.x, 37.2);
    }

    #[test]
    fn test_derive_crop_without_target() {
        let crop = derive_crop(640, 480, Some(512), None).unwrap();
        assert_eq!(crop, JsCropArea::full());
    }

    #[test]
    fn test_derive_crop_with_ratio() {
        let crop = derive_crop_with_ratio(1000, 500, 1.0).unwrap();
        assert_close(crop.width, 50.0);
        assert_close(crop.height, 100.0);
        assert_close(crop.x, 25.0);
    }
}
