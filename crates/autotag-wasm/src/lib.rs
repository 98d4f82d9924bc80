//! AutoTag WASM - WebAssembly bindings for the AutoTag crop engine
//!
//! This crate exposes autotag-core to the browser application that builds
//! the dataset.
//!
//! # Module Structure
//!
//! - `crop` - crop model and the automatic solver
//! - `editor` - pointer-driven crop dialog state
//! - `composite` - canvas layout and JPEG compositing
//! - `dataset` - the image list: ingestion, retarget, captions and export
//!
//! # Usage
//!
//! ```typescript
//! import init, { derive_crop, composite_jpeg } from '@autotag/wasm';
//!
//! await init();
//!
//! const crop = derive_crop(img.naturalWidth, img.naturalHeight, 1024, 1024);
//! const jpeg = composite_jpeg(bytes, crop, 0, 1024, 1024, 92);
//! ```

use wasm_bindgen::prelude::*;

mod composite;
mod crop;
mod dataset;
mod editor;

pub use composite::{composite_jpeg, composite_layout, JsCompositeLayout};
pub use crop::{derive_crop, derive_crop_with_ratio, JsCropArea};
pub use dataset::JsDataset;
pub use editor::JsCropEditor;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Default JPEG quality used for exports.
#[wasm_bindgen]
pub fn default_jpeg_quality() -> u8 {
    autotag_core::encode::DEFAULT_JPEG_QUALITY
}
