//! Source image decoding.
//!
//! This module provides functionality for:
//! - Decoding dataset images (JPEG, PNG, WebP) to RGB with EXIF orientation
//! - Probing natural dimensions cheaply at ingestion time
//!
//! # Examples
//!
//! ```ignore
//! use autotag_core::decode::{decode_image, read_dimensions};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let (w, h) = read_dimensions(&bytes).unwrap();
//! let image = decode_image(&bytes).unwrap();
//! assert_eq!((image.width, image.height), (w, h));
//! ```

mod source;
mod types;

pub use source::{decode_image, get_orientation, read_dimensions};
pub use types::{DecodeError, DecodedImage, Orientation};
