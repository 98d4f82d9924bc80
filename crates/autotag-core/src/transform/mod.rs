//! Source transforms applied before cropping.
//!
//! # Transform Order
//!
//! When an image is finalized, operations are applied in this order:
//! 1. Rotation (always 0 from the editor, honoured when set)
//! 2. Crop
//! 3. Fit into the output canvas (scale down or pad, never upscale)
//! 4. JPEG encode

mod rotation;

pub use rotation::{is_identity, rotate, rotated_bounds};
