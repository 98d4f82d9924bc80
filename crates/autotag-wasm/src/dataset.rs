//! Dataset bindings: the image list behind the upload, caption and export
//! steps.
//!
//! ```typescript
//! const dataset = new JsDataset({ target: { width: 1024, height: 1024 } });
//! const id = dataset.ingest(file.name, new Uint8Array(await file.arrayBuffer()));
//!
//! // Debounced target edits
//! dataset.queue_target(w, h, performance.now());
//! setTimeout(() => dataset.poll_target(performance.now()), 300);
//!
//! dataset.finalize();
//! for (const [i, file] of dataset.export_manifest().entries()) {
//!   zip.file(file.imageName, dataset.export_image(i));
//!   zip.file(file.captionName, file.caption);
//! }
//! ```

use std::time::Duration;

use autotag_core::dataset::{
    CaptionMetadata, Dataset, ImageEntry, ImageId, NamingConfig, RetargetDebouncer, UpdateField,
};
use autotag_core::{CropArea, ExportSettings};
use js_sys::Uint8Array;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::crop::{target_size, to_js_error};
use crate::editor::JsCropEditor;

/// Per-entry view handed to the host table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntrySummary<'a> {
    id: u64,
    original_name: &'a str,
    file_name: &'a str,
    natural_width: Option<u32>,
    natural_height: Option<u32>,
    crop: CropArea,
    caption: &'a str,
    metadata: Option<&'a CaptionMetadata>,
    rendered: bool,
}

impl<'a> From<&'a ImageEntry> for EntrySummary<'a> {
    fn from(entry: &'a ImageEntry) -> Self {
        Self {
            id: entry.id.0,
            original_name: &entry.original_name,
            file_name: &entry.file_name,
            natural_width: entry.natural_size.map(|(w, _)| w),
            natural_height: entry.natural_size.map(|(_, h)| h),
            crop: entry.crop,
            caption: &entry.caption,
            metadata: entry.metadata.as_ref(),
            rendered: entry.output.is_some(),
        }
    }
}

/// Export listing without the image bytes; fetch those with `export_image`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry {
    image_name: String,
    caption_name: String,
    caption: String,
    rendered: bool,
}

/// Milliseconds from `performance.now()` as a duration.
///
/// Negative or non-finite readings map to zero.
fn millis(now_ms: f64) -> Duration {
    Duration::try_from_secs_f64(now_ms / 1000.0).unwrap_or(Duration::ZERO)
}

#[cfg(target_arch = "wasm32")]
fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn console_warn(_message: &str) {}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}

/// The image list with its export settings.
#[wasm_bindgen]
pub struct JsDataset {
    inner: Dataset,
    retarget: RetargetDebouncer,
}

#[wasm_bindgen]
impl JsDataset {
    /// Create a dataset. `settings` may be `undefined` or a partial
    /// `{ target, naming, jpegQuality }` object.
    ///
    /// # Errors
    ///
    /// Returns an error when `settings` has the wrong shape.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<JsDataset, JsValue> {
        let settings = if settings.is_undefined() || settings.is_null() {
            ExportSettings::default()
        } else {
            serde_wasm_bindgen::from_value(settings).map_err(to_js_error)?
        };
        Ok(Self::with_settings(settings))
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    /// Add an image; returns its id.
    pub fn ingest(&mut self, name: &str, bytes: Vec<u8>) -> u64 {
        self.inner.ingest(name, bytes).0
    }

    /// Add an image whose natural size the host already measured.
    pub fn ingest_with_size(&mut self, name: &str, bytes: Vec<u8>, width: u32, height: u32) -> u64 {
        self.inner.ingest_with_size(name, bytes, Some((width, height))).0
    }

    /// Remove an image.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id.
    pub fn remove(&mut self, id: u64) -> Result<(), JsValue> {
        self.inner.remove(ImageId(id)).map(drop).map_err(to_js_error)
    }

    /// Move the image at `from` to index `to`.
    ///
    /// # Errors
    ///
    /// Returns an error when either index is out of range.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), JsValue> {
        self.inner.move_entry(from, to).map_err(to_js_error)
    }

    /// Replace the naming scheme (`{ prefix, start, digits }`).
    ///
    /// # Errors
    ///
    /// Returns an error when `naming` has the wrong shape.
    pub fn set_naming(&mut self, naming: JsValue) -> Result<(), JsValue> {
        let naming: NamingConfig = serde_wasm_bindgen::from_value(naming).map_err(to_js_error)?;
        self.inner.set_naming(naming);
        Ok(())
    }

    /// Apply a new target immediately; returns the number of crops re-derived.
    pub fn set_target(&mut self, width: Option<u32>, height: Option<u32>) -> usize {
        self.retarget.cancel();
        self.inner.set_target(target_size(width, height))
    }

    /// Record a target edit at `now_ms`; applied by `poll_target` once input
    /// has been quiet for 300 ms.
    pub fn queue_target(&mut self, width: Option<u32>, height: Option<u32>, now_ms: f64) {
        self.retarget.push(target_size(width, height), millis(now_ms));
    }

    /// Apply a queued target if it is due. Returns the number of crops
    /// re-derived, or `undefined` when nothing was applied.
    pub fn poll_target(&mut self, now_ms: f64) -> Option<usize> {
        let target = self.retarget.poll(millis(now_ms))?;
        Some(self.inner.set_target(target))
    }

    /// Open the crop dialog for an image; `undefined` for an unknown id.
    pub fn open_editor(&self, id: u64) -> Option<JsCropEditor> {
        self.inner.open_editor(ImageId(id)).map(JsCropEditor::from_core)
    }

    /// Save the dialog's crop on the image.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id.
    pub fn commit_editor(&mut self, id: u64, editor: JsCropEditor) -> Result<(), JsValue> {
        self.inner
            .commit_editor(ImageId(id), editor.into_core())
            .map(drop)
            .map_err(to_js_error)
    }

    /// Composite every image. Returns the number rendered; failures are
    /// reported on the console and export their original bytes.
    pub fn finalize(&mut self) -> usize {
        let report = self.inner.finalize();
        for failure in &report.failures {
            console_warn(&format!(
                "Image {} could not be cropped, exporting original: {}",
                failure.id, failure.error
            ));
        }
        report.rendered
    }

    /// Overwrite an image's caption.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id.
    pub fn set_caption(&mut self, id: u64, caption: &str) -> Result<(), JsValue> {
        self.inner.set_caption(ImageId(id), caption).map_err(to_js_error)
    }

    /// Edit one metadata field such as `"subject.en"` or `"triggerWord"`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or field path.
    pub fn update_field(&mut self, id: u64, path: &str, value: &str) -> Result<(), JsValue> {
        let update = UpdateField::parse(ImageId(id), path, value).map_err(to_js_error)?;
        self.inner.update_field(update).map_err(to_js_error)
    }

    pub fn apply_trigger_word(&mut self, trigger_word: &str) {
        self.inner.apply_trigger_word(trigger_word);
    }

    /// Store an analysis result (same shape as the metadata object).
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown id or a malformed analysis.
    pub fn apply_analysis(&mut self, id: u64, analysis: JsValue) -> Result<(), JsValue> {
        let analysis: CaptionMetadata =
            serde_wasm_bindgen::from_value(analysis).map_err(to_js_error)?;
        self.inner.apply_analysis(ImageId(id), analysis).map_err(to_js_error)
    }

    /// Ids of images still lacking an analysis.
    pub fn pending_analysis(&self) -> Vec<u64> {
        self.inner.pending_analysis().into_iter().map(|id| id.0).collect()
    }

    /// Bytes to send for analysis: the rendered crop, else the original.
    pub fn analysis_source(&self, id: u64) -> Option<Uint8Array> {
        self.inner.get(ImageId(id)).map(|e| Uint8Array::from(e.export_bytes()))
    }

    /// All entries as plain objects.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn entries(&self) -> Result<JsValue, JsValue> {
        let summaries: Vec<EntrySummary<'_>> = self.inner.entries().iter().map(Into::into).collect();
        to_js_value(&summaries)
    }

    /// File names and captions for export, in dataset order.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_manifest(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.manifest())
    }

    /// Image bytes for export entry `index`.
    pub fn export_image(&self, index: usize) -> Option<Uint8Array> {
        self.export_bytes(index).map(Uint8Array::from)
    }
}

impl JsDataset {
    pub(crate) fn with_settings(settings: ExportSettings) -> Self {
        Self {
            inner: Dataset::new(settings),
            retarget: RetargetDebouncer::default(),
        }
    }

    fn export_bytes(&self, index: usize) -> Option<&[u8]> {
        self.inner.entries().get(index).map(ImageEntry::export_bytes)
    }

    fn manifest(&self) -> Vec<ManifestEntry> {
        self.inner
            .export_entries()
            .into_iter()
            .map(|file| ManifestEntry {
                image_name: file.image_name,
                caption_name: file.caption_name,
                caption: file.caption,
                rendered: file.rendered,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autotag_core::crop::TargetSize;
    use autotag_core::encode::encode_jpeg;

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        encode_jpeg(&vec![120u8; (width * height * 3) as usize], width, height, 90).unwrap()
    }

    fn square(size: u32) -> JsDataset {
        JsDataset::with_settings(ExportSettings {
            target: TargetSize::exact(size, size),
            ..ExportSettings::default()
        })
    }

    #[test]
    fn test_millis() {
        assert_eq!(millis(1500.0), Duration::from_millis(1500));
        assert_eq!(millis(-3.0), Duration::ZERO);
    }

    #[test]
    fn test_millis_non_finite_is_zero() {
        assert_eq!(millis(f64::INFINITY), Duration::ZERO);
        assert_eq!(millis(f64::NEG_INFINITY), Duration::ZERO);
        assert_eq!(millis(f64::NAN), Duration::ZERO);
        assert_eq!(millis(f64::MAX), Duration::ZERO);
    }

    #[test]
    fn test_queued_target_applies_after_quiet_period() {
        let mut dataset = JsDataset::with_settings(ExportSettings::default());
        let id = dataset.ingest_with_size("a.jpg", Vec::new(), 1000, 500);

        dataset.queue_target(Some(100), None, 0.0);
        dataset.queue_target(Some(100), Some(100), 120.0);
        assert_eq!(dataset.poll_target(300.0), None);
        assert_eq!(dataset.poll_target(420.0), Some(1));

        let crop = dataset.inner.get(ImageId(id)).unwrap().crop;
        assert!((crop.width - 10.0).abs() < 1e-9);
        assert!((crop.height - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_target_cancels_queued_edit() {
        let mut dataset = JsDataset::with_settings(ExportSettings::default());
        dataset.ingest_with_size("a.jpg", Vec::new(), 100, 100);
        dataset.queue_target(Some(10), Some(20), 0.0);
        assert_eq!(dataset.set_target(Some(50), Some(50)), 1);
        assert_eq!(dataset.poll_target(10_000.0), None);
    }

    #[test]
    fn test_editor_commit() {
        let mut dataset = square(32);
        let id = dataset.ingest("a.jpg", jpeg(64, 64));

        let mut editor = dataset.open_editor(id).unwrap();
        // Idle editor ignores moves
        assert!(!editor.pointer_move(10.0, 10.0, 100.0, 100.0));
        editor.set_natural_size(64, 64);
        dataset.commit_editor(id, editor).unwrap();

        let crop = dataset.inner.get(ImageId(id)).unwrap().crop;
        assert!((crop.width - 50.0).abs() < 1e-9);
        assert!(dataset.open_editor(id + 100).is_none());
    }

    #[test]
    fn test_finalize_and_manifest() {
        let mut dataset = square(32);
        dataset.ingest("a.jpg", jpeg(64, 48));
        dataset.ingest("b.png", b"broken".to_vec());

        assert_eq!(dataset.finalize(), 1);

        let manifest = dataset.manifest();
        assert_eq!(manifest[0].image_name, "image001.jpg");
        assert!(manifest[0].rendered);
        assert_eq!(manifest[1].image_name, "image002.png");
        assert_eq!(manifest[1].caption_name, "image002.txt");
        assert!(!manifest[1].rendered);
        assert_eq!(dataset.export_bytes(1), Some(&b"broken"[..]));
        assert!(dataset.export_bytes(2).is_none());
    }

    #[test]
    fn test_caption_flow() {
        let mut dataset = square(32);
        let id = dataset.ingest_with_size("a.jpg", Vec::new(), 64, 64);
        dataset.apply_trigger_word("tw");
        dataset.update_field(id, "subject.en", "a hat").unwrap();

        let entry = dataset.inner.get(ImageId(id)).unwrap();
        assert_eq!(entry.caption, "tw, a hat");
        assert!(dataset.pending_analysis().is_empty());
    }
}
