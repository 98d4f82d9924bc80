//! Compositor bindings.
//!
//! ```typescript
//! import { composite_jpeg, composite_layout } from '@autotag/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const jpeg = composite_jpeg(bytes, crop, 0, 1024, 1024, 92);
//! const blob = new Blob([jpeg], { type: 'image/jpeg' });
//! ```

use autotag_core::composite::{self, CompositeLayout};
use wasm_bindgen::prelude::*;

use crate::crop::{target_size, to_js_error, JsCropArea};

/// Where a crop lands on the output canvas, for previews.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsCompositeLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub dest_x: f64,
    pub dest_y: f64,
    pub dest_width: f64,
    pub dest_height: f64,
}

impl From<CompositeLayout> for JsCompositeLayout {
    fn from(layout: CompositeLayout) -> Self {
        Self {
            canvas_width: layout.canvas_width,
            canvas_height: layout.canvas_height,
            dest_x: layout.dest.x,
            dest_y: layout.dest.y,
            dest_width: layout.dest.width,
            dest_height: layout.dest.height,
        }
    }
}

/// Compute the output canvas and destination rectangle without drawing.
///
/// # Errors
///
/// Returns an error for zero natural dimensions, a non-finite crop, or a
/// canvas that cannot be allocated.
#[wasm_bindgen]
pub fn composite_layout(
    natural_width: u32,
    natural_height: u32,
    crop: &JsCropArea,
    target_width: Option<u32>,
    target_height: Option<u32>,
) -> Result<JsCompositeLayout, JsValue> {
    composite::plan_composite(
        natural_width,
        natural_height,
        &(*crop).into(),
        target_size(target_width, target_height),
    )
    .map(JsCompositeLayout::from)
    .map_err(to_js_error)
}

/// Decode `bytes`, crop, fit into the target canvas and encode as JPEG.
///
/// Sources smaller than the target are centered on black, never upscaled.
///
/// # Errors
///
/// Returns an error when the source cannot be decoded, the canvas cannot be
/// allocated or encoding fails.
#[wasm_bindgen]
pub fn composite_jpeg(
    bytes: &[u8],
    crop: &JsCropArea,
    rotation_degrees: f64,
    target_width: Option<u32>,
    target_height: Option<u32>,
    quality: u8,
) -> Result<Vec<u8>, JsValue> {
    composite::composite_jpeg(
        bytes,
        &(*crop).into(),
        rotation_degrees,
        target_size(target_width, target_height),
        quality,
    )
    .map_err(to_js_error)
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_undecodable_source_is_error() {
        assert!(composite_jpeg(b"garbage", &JsCropArea::full(), 0.0, None, None, 92).is_err());
    }
}
