//! JPEG encoding of composited output rasters.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::DecodedImage;

/// Quality used when the caller does not pick one (a canvas `toBlob` default
/// of 0.92 expressed on the 1-100 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode RGB pixel data to JPEG bytes.
///
/// `quality` is clamped to 1-100.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }

    let mut buffer = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

/// Encode a raster produced by the compositor.
pub fn encode_image(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    encode_jpeg(&image.pixels, image.width, image.height, quality)
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: Any non-empty raster encodes to a well-formed JPEG.
        #[test]
        fn prop_valid_raster_encodes(
            (width, height) in (1u32..=48, 1u32..=48),
            fill in any::<u8>(),
            quality in any::<u8>(),
        ) {
            let pixels = vec![fill; (width * height * 3) as usize];
            let jpeg = encode_jpeg(&pixels, width, height, quality).unwrap();
            prop_assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
            prop_assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
        }

        /// Property: Encoding is deterministic.
        #[test]
        fn prop_deterministic(
            (width, height) in (1u32..=24, 1u32..=24),
            quality in 1u8..=100,
        ) {
            let pixels: Vec<u8> = (0..(width * height * 3)).map(|i| (i * 37 % 256) as u8).collect();
            let first = encode_jpeg(&pixels, width, height, quality).unwrap();
            let second = encode_jpeg(&pixels, width, height, quality).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
