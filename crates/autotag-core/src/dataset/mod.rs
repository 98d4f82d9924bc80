//! The ordered image list a host builds a dataset from.
//!
//! A [`Dataset`] owns every ingested image together with its crop, caption
//! metadata and rendered output. It is the boundary the surrounding
//! application talks to:
//!
//! - ingestion probes the natural size and derives the initial crop from the
//!   active target,
//! - the crop dialog is a [`CropEditor`] opened from and committed back to an
//!   entry,
//! - changing the target re-derives every crop (see [`RetargetDebouncer`] for
//!   coalescing rapid edits),
//! - finalize composites every entry and keeps the original when that fails,
//! - export lists the renamed image and caption files for archiving.
//!
//! # Example
//!
//! ```ignore
//! use autotag_core::dataset::Dataset;
//! use autotag_core::crop::TargetSize;
//!
//! let mut dataset = Dataset::default();
//! dataset.set_target(TargetSize::exact(1024, 1024));
//! let id = dataset.ingest("cat.png", bytes);
//! let report = dataset.finalize();
//! for file in dataset.export_entries() {
//!     archive.add(&file.image_name, file.image);
//!     archive.add(&file.caption_name, file.caption.as_bytes());
//! }
//! ```

mod metadata;
mod naming;
mod retarget;

use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use metadata::{
    integrate_caption, Bilingual, CaptionMetadata, Facet, FieldPath, Language, UpdateField,
};
pub use naming::NamingConfig;
pub use retarget::{RetargetDebouncer, DEFAULT_RETARGET_DELAY};

use crate::composite::composite_jpeg;
use crate::crop::{derive_crop_for_target, CropArea, CropEditor, TargetSize};
use crate::decode::read_dimensions;
use crate::error::CropError;
use crate::settings::ExportSettings;
use naming::split_extension;

/// Extension of rendered output files.
const OUTPUT_EXTENSION: &str = "jpg";

/// Extension of caption files.
const CAPTION_EXTENSION: &str = "txt";

/// Errors raised by dataset bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("Unknown image id {0}")]
    UnknownImage(ImageId),

    #[error("Unknown metadata field '{0}'")]
    InvalidFieldPath(String),

    #[error("Index {index} out of range for {len} images")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Stable identifier of an entry; survives reordering and renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One image of the dataset.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    pub id: ImageId,
    /// File name the image was ingested under.
    pub original_name: String,
    /// Encoded source bytes as ingested.
    pub original: Vec<u8>,
    /// Oriented natural size; `None` when probing failed.
    pub natural_size: Option<(u32, u32)>,
    pub crop: CropArea,
    /// Clockwise rotation applied before cropping. Always 0 from the editor.
    pub rotation: f64,
    /// Sequential export name without extension (e.g. `image001`).
    pub file_name: String,
    /// Integrated caption written to the caption file.
    pub caption: String,
    pub metadata: Option<CaptionMetadata>,
    /// Rendered JPEG from the last finalize, cleared when the crop or target changes.
    pub output: Option<Vec<u8>>,
}

impl ImageEntry {
    /// Bytes to export or analyze: the rendered output, else the original.
    pub fn export_bytes(&self) -> &[u8] {
        self.output.as_deref().unwrap_or(&self.original)
    }

    /// Export file name including extension.
    ///
    /// Rendered output is always JPEG. The fallback keeps the original
    /// extension so the bytes and the name agree.
    pub fn export_file_name(&self) -> String {
        let ext = match (&self.output, split_extension(&self.original_name).1) {
            (Some(_), _) | (None, None) => OUTPUT_EXTENSION.to_string(),
            (None, Some(ext)) => ext,
        };
        format!("{}.{}", self.file_name, ext)
    }

    fn metadata_mut(&mut self) -> &mut CaptionMetadata {
        self.metadata.get_or_insert_with(CaptionMetadata::default)
    }

    fn refresh_caption(&mut self) {
        if let Some(metadata) = &self.metadata {
            self.caption = integrate_caption(metadata);
        }
    }

    fn set_crop(&mut self, crop: CropArea) {
        if self.crop != crop {
            self.crop = crop;
            self.output = None;
        }
    }
}

/// Failure of one entry during [`Dataset::finalize`].
#[derive(Debug)]
pub struct FinalizeFailure {
    pub id: ImageId,
    pub error: CropError,
}

/// Outcome of a finalize pass.
#[derive(Debug, Default)]
pub struct FinalizeReport {
    /// Entries whose output was rendered.
    pub rendered: usize,
    /// Entries that fell back to their original bytes.
    pub failures: Vec<FinalizeFailure>,
}

impl FinalizeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One exported image and its caption file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry<'a> {
    pub image_name: String,
    pub image: &'a [u8],
    pub caption_name: String,
    /// Trimmed integrated caption.
    pub caption: String,
    /// False when `image` is the original fallback.
    pub rendered: bool,
}

/// Ordered collection of images sharing one set of export settings.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    entries: Vec<ImageEntry>,
    settings: ExportSettings,
    next_id: u64,
}

impl Dataset {
    pub fn new(settings: ExportSettings) -> Self {
        Self {
            entries: Vec::new(),
            settings,
            next_id: 0,
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn target(&self) -> TargetSize {
        self.settings.target
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: ImageId) -> Result<&mut ImageEntry, DatasetError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(DatasetError::UnknownImage(id))
    }

    fn position(&self, id: ImageId) -> Result<usize, DatasetError> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(DatasetError::UnknownImage(id))
    }

    // ------------------------------------------------------------------
    // Ingestion and ordering
    // ------------------------------------------------------------------

    /// Add an image, probing its natural size from the encoded bytes.
    ///
    /// When the size cannot be read the entry keeps the full-image crop and
    /// is skipped by later retarget passes.
    pub fn ingest(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> ImageId {
        let name = name.into();
        let natural_size = match read_dimensions(&bytes) {
            Ok(size) => Some(size),
            Err(err) => {
                warn!(name = %name, error = %err, "could not read image size, using full crop");
                None
            }
        };
        self.ingest_with_size(name, bytes, natural_size)
    }

    /// Add an image whose natural size is already known to the caller.
    pub fn ingest_with_size(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
        natural_size: Option<(u32, u32)>,
    ) -> ImageId {
        let natural_size = natural_size.filter(|&(w, h)| w > 0 && h > 0);
        let crop = natural_size
            .and_then(|(w, h)| derive_crop_for_target(w, h, self.settings.target).ok())
            .unwrap_or(CropArea::FULL);

        let id = ImageId(self.next_id);
        self.next_id += 1;

        let original_name = name.into();
        debug!(%id, name = %original_name, ?natural_size, ?crop, "ingested image");
        self.entries.push(ImageEntry {
            id,
            original_name,
            original: bytes,
            natural_size,
            crop,
            rotation: 0.0,
            file_name: String::new(),
            caption: String::new(),
            metadata: None,
            output: None,
        });
        self.rename_all();
        id
    }

    /// Remove an entry; later entries are renamed to close the gap.
    pub fn remove(&mut self, id: ImageId) -> Result<ImageEntry, DatasetError> {
        let index = self.position(id)?;
        let entry = self.entries.remove(index);
        self.rename_all();
        Ok(entry)
    }

    /// Move the entry at `from` so it ends up at index `to`.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), DatasetError> {
        let len = self.entries.len();
        for index in [from, to] {
            if index >= len {
                return Err(DatasetError::IndexOutOfRange { index, len });
            }
        }
        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
            self.rename_all();
        }
        Ok(())
    }

    pub fn set_naming(&mut self, naming: NamingConfig) {
        self.settings.naming = naming;
        self.rename_all();
    }

    fn rename_all(&mut self) {
        let naming = &self.settings.naming;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.file_name = naming.name_at(index);
        }
    }

    // ------------------------------------------------------------------
    // Cropping
    // ------------------------------------------------------------------

    /// Change the global target and re-derive every crop from it.
    ///
    /// Any change drops rendered output, which was sized for the old target.
    /// Without a full target there is no ratio to enforce and existing crops
    /// are kept. Entries with an unknown natural size are skipped. Returns
    /// the number of crops re-derived.
    pub fn set_target(&mut self, target: TargetSize) -> usize {
        if target != self.settings.target {
            // Rendered output is sized for the old target.
            for entry in &mut self.entries {
                entry.output = None;
            }
        }
        self.settings.target = target;
        if target.aspect_ratio().is_none() {
            debug!(?target, "target has no aspect ratio, crops unchanged");
            return 0;
        }

        let mut updated = 0;
        for entry in &mut self.entries {
            let Some((w, h)) = entry.natural_size else {
                continue;
            };
            match derive_crop_for_target(w, h, target) {
                Ok(crop) => {
                    entry.set_crop(crop);
                    updated += 1;
                }
                Err(err) => warn!(id = %entry.id, error = %err, "retarget skipped"),
            }
        }
        info!(?target, updated, total = self.entries.len(), "retargeted crops");
        updated
    }

    /// Replace the rotation applied to an entry before cropping.
    pub fn set_rotation(&mut self, id: ImageId, degrees: f64) -> Result<(), DatasetError> {
        let entry = self.get_mut(id)?;
        if entry.rotation != degrees {
            entry.rotation = degrees;
            entry.output = None;
        }
        Ok(())
    }

    /// Open the crop dialog for an entry, seeded with its crop, the active
    /// ratio and its natural size when known.
    pub fn open_editor(&self, id: ImageId) -> Option<CropEditor> {
        let entry = self.get(id)?;
        let editor = CropEditor::new(Some(entry.crop), self.settings.target.aspect_ratio());
        Some(match entry.natural_size {
            Some((w, h)) => editor.with_natural_size(w, h),
            None => editor,
        })
    }

    /// Store the editor's crop on the entry. Cancelling is dropping the
    /// editor instead.
    pub fn commit_editor(&mut self, id: ImageId, editor: CropEditor) -> Result<CropArea, DatasetError> {
        let entry = self.get_mut(id)?;
        let crop = editor.finish();
        entry.set_crop(crop);
        debug!(%id, ?crop, "committed crop");
        Ok(crop)
    }

    // ------------------------------------------------------------------
    // Finalize and export
    // ------------------------------------------------------------------

    /// Composite every entry with the global target.
    ///
    /// A failing entry keeps no output, so export falls back to its original
    /// bytes; the rest of the batch is unaffected.
    pub fn finalize(&mut self) -> FinalizeReport {
        let settings = &self.settings;
        let finalize_one = |entry: &mut ImageEntry| -> Option<FinalizeFailure> {
            let rendered = composite_jpeg(
                &entry.original,
                &entry.crop,
                entry.rotation,
                settings.target,
                settings.jpeg_quality,
            );
            match rendered {
                Ok(bytes) => {
                    entry.output = Some(bytes);
                    None
                }
                Err(error) => {
                    warn!(
                        id = %entry.id,
                        name = %entry.original_name,
                        %error,
                        "composite failed, exporting original"
                    );
                    entry.output = None;
                    Some(FinalizeFailure {
                        id: entry.id,
                        error,
                    })
                }
            }
        };

        #[cfg(feature = "parallel")]
        let failures: Vec<FinalizeFailure> =
            self.entries.par_iter_mut().filter_map(finalize_one).collect();
        #[cfg(not(feature = "parallel"))]
        let failures: Vec<FinalizeFailure> =
            self.entries.iter_mut().filter_map(finalize_one).collect();

        let report = FinalizeReport {
            rendered: self.entries.len() - failures.len(),
            failures,
        };
        info!(
            rendered = report.rendered,
            failed = report.failures.len(),
            "finalized dataset"
        );
        report
    }

    /// Image and caption files in dataset order.
    pub fn export_entries(&self) -> Vec<ExportEntry<'_>> {
        self.entries
            .iter()
            .map(|entry| ExportEntry {
                image_name: entry.export_file_name(),
                image: entry.export_bytes(),
                caption_name: format!("{}.{}", entry.file_name, CAPTION_EXTENSION),
                caption: entry.caption.trim().to_string(),
                rendered: entry.output.is_some(),
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Captions
    // ------------------------------------------------------------------

    /// Overwrite the integrated caption directly. The next metadata edit
    /// rebuilds it.
    pub fn set_caption(&mut self, id: ImageId, caption: impl Into<String>) -> Result<(), DatasetError> {
        self.get_mut(id)?.caption = caption.into();
        Ok(())
    }

    /// Edit one metadata field and rebuild the integrated caption.
    pub fn update_field(&mut self, update: UpdateField) -> Result<(), DatasetError> {
        let entry = self.get_mut(update.id)?;
        entry.metadata_mut().set(update.path, update.value);
        entry.refresh_caption();
        Ok(())
    }

    /// Set the trigger word on every entry.
    pub fn apply_trigger_word(&mut self, trigger_word: &str) {
        for entry in &mut self.entries {
            entry.metadata_mut().trigger_word = trigger_word.to_string();
            entry.refresh_caption();
        }
        info!(trigger_word, count = self.entries.len(), "applied trigger word");
    }

    /// Store an analysis result. The entry's current trigger word is kept.
    pub fn apply_analysis(&mut self, id: ImageId, analysis: CaptionMetadata) -> Result<(), DatasetError> {
        let entry = self.get_mut(id)?;
        let trigger_word = entry
            .metadata
            .as_ref()
            .map(|m| m.trigger_word.clone())
            .unwrap_or_default();
        entry.metadata = Some(CaptionMetadata {
            trigger_word,
            ..analysis
        });
        entry.refresh_caption();
        Ok(())
    }

    /// Entries that have not been analyzed yet, in dataset order.
    pub fn pending_analysis(&self) -> Vec<ImageId> {
        self.entries
            .iter()
            .filter(|e| !e.metadata.as_ref().is_some_and(CaptionMetadata::is_analyzed))
            .map(|e| e.id)
            .collect()
    }
}
