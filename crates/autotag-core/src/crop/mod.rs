//! Crop geometry: the percentage-based crop model, the automatic solver and
//! the interactive editor.
//!
//! # Coordinate System
//!
//! - Crop coordinates are percentages (0 to 100) of the natural image size
//! - Origin is top-left corner, y grows downward
//! - Aspect ratios are always measured in natural pixels, never in percent

mod area;
mod gesture;
mod solver;

pub use area::{AspectRatio, CropArea, PixelRect, TargetSize, FULL_EXTENT, MIN_CROP_EXTENT};
pub use gesture::{
    apply_drag, CropEditor, DragDelta, DragMode, DragSession, RatioLock, RenderedSize, ScreenPoint,
};
pub use solver::{derive_crop, derive_crop_for_target};
