//! Interactive crop editor bindings.
//!
//! The host forwards pointer events from the crop dialog; the editor keeps
//! the crop inside the image and the aspect ratio locked.
//!
//! ```typescript
//! const editor = new JsCropEditor(entryCrop, 1024, 1024);
//! editor.set_natural_size(img.naturalWidth, img.naturalHeight);
//!
//! handle.onpointerdown = (e) => editor.pointer_down('se', e.clientX, e.clientY);
//! window.onpointermove = (e) => {
//!   const r = img.getBoundingClientRect();
//!   if (editor.pointer_move(e.clientX, e.clientY, r.width, r.height)) redraw(editor.crop);
//! };
//! window.onpointerup = () => editor.pointer_up();
//! ```

use autotag_core::crop::{CropEditor, DragMode, RenderedSize, ScreenPoint};
use wasm_bindgen::prelude::*;

use crate::crop::{target_size, JsCropArea};

/// Parse a drag mode name: `"move"` for the body, `"se"` for the corner handle.
pub(crate) fn parse_drag_mode(name: &str) -> Option<DragMode> {
    match name {
        "move" => Some(DragMode::Move),
        "se" | "resize-se" => Some(DragMode::ResizeSe),
        _ => None,
    }
}

/// Crop dialog state for one image.
#[wasm_bindgen]
pub struct JsCropEditor {
    inner: CropEditor,
}

#[wasm_bindgen]
impl JsCropEditor {
    /// Open an editor. Without `initial` the crop starts at `{10, 10, 80, 80}`;
    /// the ratio is locked when both target dimensions are given.
    #[wasm_bindgen(constructor)]
    pub fn new(
        initial: Option<JsCropArea>,
        target_width: Option<u32>,
        target_height: Option<u32>,
    ) -> JsCropEditor {
        let ratio = target_size(target_width, target_height).aspect_ratio();
        JsCropEditor {
            inner: CropEditor::new(initial.map(Into::into), ratio),
        }
    }

    /// Report the image's natural size once it has loaded.
    pub fn set_natural_size(&mut self, width: u32, height: u32) {
        self.inner.set_natural_size(width, height);
    }

    #[wasm_bindgen(getter)]
    pub fn crop(&self) -> JsCropArea {
        self.inner.crop().into()
    }

    #[wasm_bindgen(getter)]
    pub fn is_dragging(&self) -> bool {
        self.inner.is_dragging()
    }

    /// Start a gesture at screen position `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown `mode`.
    pub fn pointer_down(&mut self, mode: &str, x: f64, y: f64) -> Result<(), JsValue> {
        let mode = parse_drag_mode(mode)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown drag mode '{mode}'")))?;
        self.inner.pointer_down(mode, ScreenPoint::new(x, y));
        Ok(())
    }

    /// Continue the gesture. Returns `true` when the crop changed.
    pub fn pointer_move(&mut self, x: f64, y: f64, rendered_width: f64, rendered_height: f64) -> bool {
        self.inner.pointer_move(
            ScreenPoint::new(x, y),
            RenderedSize::new(rendered_width, rendered_height),
        )
    }

    pub fn pointer_up(&mut self) {
        self.inner.pointer_up();
    }
}

impl JsCropEditor {
    pub(crate) fn from_core(inner: CropEditor) -> Self {
        Self { inner }
    }

    pub(crate) fn into_core(self) -> CropEditor {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(editor: &mut JsCropEditor, mode: DragMode, to: (f64, f64), rendered: (f64, f64)) -> bool {
        editor.inner.pointer_down(mode, ScreenPoint::new(0.0, 0.0));
        let changed = editor.pointer_move(to.0, to.1, rendered.0, rendered.1);
        editor.pointer_up();
        changed
    }

    #[test]
    fn test_parse_drag_mode() {
        assert_eq!(parse_drag_mode("move"), Some(DragMode::Move));
        assert_eq!(parse_drag_mode("se"), Some(DragMode::ResizeSe));
        assert_eq!(parse_drag_mode("nw"), None);
    }

    #[test]
    fn test_default_crop() {
        let editor = JsCropEditor::new(None, None, None);
        assert_eq!(editor.crop(), JsCropArea::new(10.0, 10.0, 80.0, 80.0));
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_move_clamps_to_image() {
        let mut editor = JsCropEditor::new(Some(JsCropArea::new(80.0, 80.0, 20.0, 20.0)), None, None);
        assert!(!drag(&mut editor, DragMode::Move, (50.0, 50.0), (100.0, 100.0)));
        assert_eq!(editor.crop(), JsCropArea::new(80.0, 80.0, 20.0, 20.0));
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_locked_resize() {
        let mut editor = JsCropEditor::new(Some(JsCropArea::new(0.0, 0.0, 20.0, 20.0)), Some(200), Some(100));
        editor.set_natural_size(1000, 500);
        drag(&mut editor, DragMode::ResizeSe, (100.0, 0.0), (500.0, 250.0));

        // 40% of 1000 x 40% of 500 = 400x200 px, the locked 2:1
        let crop = editor.crop();
        assert!((crop.width - 40.0).abs() < 1e-9);
        assert!((crop.height - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_unmeasured_move_is_ignored() {
        let mut editor = JsCropEditor::new(None, None, None);
        assert!(!drag(&mut editor, DragMode::Move, (10.0, 10.0), (0.0, 0.0)));
        assert_eq!(editor.crop(), JsCropArea::new(10.0, 10.0, 80.0, 80.0));
    }
}
