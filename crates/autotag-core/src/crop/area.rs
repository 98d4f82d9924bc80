//! Resolution-independent crop rectangles and output size targets.
//!
//! A [`CropArea`] stores its edges as percentages (0 to 100) of the image's
//! natural width and height, so the same value applies to the full-size
//! source, a scaled preview, or an on-screen element of any size.
//!
//! # Coordinate System
//!
//! - (0, 0) = top-left corner
//! - (100, 100) = bottom-right corner
//! - width/height are relative to the natural dimensions

use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// Upper bound of every percentage axis.
pub const FULL_EXTENT: f64 = 100.0;

/// Smallest width/height an interactive resize may shrink a crop to.
pub const MIN_CROP_EXTENT: f64 = 5.0;

/// Slack allowed when checking bounds of values produced by float arithmetic.
const BOUNDS_EPSILON: f64 = 1e-9;

/// A crop rectangle in percent of the image's natural dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropArea {
    /// Left edge (0 to 100)
    pub x: f64,
    /// Top edge (0 to 100)
    pub y: f64,
    /// Width (0 to 100)
    pub width: f64,
    /// Height (0 to 100)
    pub height: f64,
}

impl Default for CropArea {
    fn default() -> Self {
        Self::FULL
    }
}

impl CropArea {
    /// The whole image.
    pub const FULL: CropArea = CropArea {
        x: 0.0,
        y: 0.0,
        width: FULL_EXTENT,
        height: FULL_EXTENT,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A crop of the given extent centered in the image.
    pub fn centered(width: f64, height: f64) -> Self {
        Self {
            x: (FULL_EXTENT - width) / 2.0,
            y: (FULL_EXTENT - height) / 2.0,
            width,
            height,
        }
    }

    /// True when every field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// True when the rectangle lies inside the image and has no negative extent.
    pub fn is_within_bounds(&self) -> bool {
        self.is_finite()
            && self.x >= -BOUNDS_EPSILON
            && self.y >= -BOUNDS_EPSILON
            && self.width >= 0.0
            && self.height >= 0.0
            && self.x + self.width <= FULL_EXTENT + BOUNDS_EPSILON
            && self.y + self.height <= FULL_EXTENT + BOUNDS_EPSILON
    }

    /// Right edge in percent.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge in percent.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Convert to natural pixel units of an image of the given size.
    pub fn to_pixels(&self, natural_width: u32, natural_height: u32) -> PixelRect {
        let w = natural_width as f64;
        let h = natural_height as f64;
        PixelRect {
            x: (self.x / FULL_EXTENT) * w,
            y: (self.y / FULL_EXTENT) * h,
            width: (self.width / FULL_EXTENT) * w,
            height: (self.height / FULL_EXTENT) * h,
        }
    }
}

/// A crop rectangle in natural pixel units. Edges may be fractional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    /// Width over height, or `None` for a degenerate rectangle.
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height > 0.0 {
            Some(self.width / self.height)
        } else {
            None
        }
    }
}

/// Output width/height over height, always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AspectRatio(f64);

impl AspectRatio {
    pub fn new(ratio: f64) -> Result<Self, CropError> {
        if ratio.is_finite() && ratio > 0.0 {
            Ok(Self(ratio))
        } else {
            Err(CropError::InvalidConstraint(format!(
                "aspect ratio must be positive and finite, got {ratio}"
            )))
        }
    }

    pub fn from_dimensions(width: u32, height: u32) -> Result<Self, CropError> {
        if height == 0 {
            return Err(CropError::InvalidConstraint(
                "aspect ratio height is zero".to_string(),
            ));
        }
        Self::new(width as f64 / height as f64)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for AspectRatio {
    type Error = CropError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AspectRatio> for f64 {
    fn from(ratio: AspectRatio) -> Self {
        ratio.0
    }
}

/// Requested output raster size. Either dimension may be absent.
///
/// When both are present they fix the exact output size regardless of the
/// crop's proportions, and their quotient locks the crop aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetSize {
    /// Build a target, treating zero as "not set".
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            width: width.filter(|w| *w > 0),
            height: height.filter(|h| *h > 0),
        }
    }

    pub fn exact(width: u32, height: u32) -> Self {
        Self::new(Some(width), Some(height))
    }

    /// Both dimensions, when both are set.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }

    /// The locked aspect ratio, present only when both dimensions are set.
    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        self.dimensions()
            .and_then(|(w, h)| AspectRatio::from_dimensions(w, h).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_full_image() {
        assert_eq!(CropArea::default(), CropArea::new(0.0, 0.0, 100.0, 100.0));
        assert!(CropArea::default().is_within_bounds());
    }

    #[test]
    fn test_centered() {
        let crop = CropArea::centered(50.0, 20.0);
        assert_relative_eq!(crop.x, 25.0);
        assert_relative_eq!(crop.y, 40.0);
        assert_relative_eq!(crop.right(), 75.0);
        assert_relative_eq!(crop.bottom(), 60.0);
    }

    #[test]
    fn test_bounds_check() {
        assert!(!CropArea::new(80.0, 0.0, 30.0, 10.0).is_within_bounds());
        assert!(!CropArea::new(-1.0, 0.0, 30.0, 10.0).is_within_bounds());
        assert!(!CropArea::new(0.0, 0.0, f64::NAN, 10.0).is_within_bounds());
        assert!(CropArea::new(80.0, 80.0, 20.0, 20.0).is_within_bounds());
    }

    #[test]
    fn test_to_pixels() {
        let rect = CropArea::new(37.2, 25.0, 25.6, 50.0).to_pixels(4000, 3000);
        assert_relative_eq!(rect.x, 1488.0, epsilon = 1e-9);
        assert_relative_eq!(rect.y, 750.0, epsilon = 1e-9);
        assert_relative_eq!(rect.width, 1024.0, epsilon = 1e-9);
        assert_relative_eq!(rect.height, 1500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_aspect_ratio_rejects_non_positive() {
        assert!(AspectRatio::new(0.0).is_err());
        assert!(AspectRatio::new(-1.5).is_err());
        assert!(AspectRatio::new(f64::INFINITY).is_err());
        assert!(AspectRatio::from_dimensions(16, 0).is_err());
        assert_relative_eq!(AspectRatio::from_dimensions(16, 9).unwrap().value(), 16.0 / 9.0);
    }

    #[test]
    fn test_target_size_zero_is_unset() {
        let target = TargetSize::new(Some(0), Some(512));
        assert_eq!(target.width, None);
        assert_eq!(target.height, Some(512));
        assert!(target.dimensions().is_none());
        assert!(target.aspect_ratio().is_none());
    }

    #[test]
    fn test_target_size_ratio() {
        let target = TargetSize::exact(1024, 512);
        assert_eq!(target.dimensions(), Some((1024, 512)));
        assert_relative_eq!(target.aspect_ratio().unwrap().value(), 2.0);
    }
}
