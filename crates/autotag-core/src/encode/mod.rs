//! Output encoding.
//!
//! Every composited raster is re-encoded as JPEG, whatever the source format
//! was. Lossless round-trips are not preserved.
//!
//! # Examples
//!
//! ```ignore
//! use autotag_core::encode::{encode_jpeg, DEFAULT_JPEG_QUALITY};
//!
//! let pixels = vec![0u8; 1024 * 1024 * 3]; // Black canvas
//! let jpeg_bytes = encode_jpeg(&pixels, 1024, 1024, DEFAULT_JPEG_QUALITY).unwrap();
//! ```

mod jpeg;

pub use jpeg::{encode_image, encode_jpeg, EncodeError, DEFAULT_JPEG_QUALITY};
