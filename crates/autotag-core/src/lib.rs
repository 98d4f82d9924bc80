//! AutoTag Core - crop geometry and compositing for image datasets
//!
//! This crate turns a batch of images of differing sizes into a uniformly
//! framed training set: every image gets a crop stored as percentages of its
//! natural size, the crop is solved or edited against a target aspect ratio,
//! and the final raster is composited into a fixed canvas with black padding
//! (never upscaled) and encoded as JPEG.
//!
//! # Module Structure
//!
//! - [`crop`] - crop model, aspect/size solver and interactive editor
//! - [`composite`] - canvas planning and rasterization
//! - [`decode`] / [`encode`] - source decoding and JPEG output
//! - [`transform`] - rotation applied ahead of cropping
//! - [`dataset`] - the ordered image list with captions and export naming
//! - [`settings`] - export settings shared by a dataset
//!
//! # Logging
//!
//! Diagnostics are emitted through `tracing`. The library never installs a
//! subscriber; hosts that want the output install their own.

pub mod composite;
pub mod crop;
pub mod dataset;
pub mod decode;
pub mod encode;
pub mod error;
pub mod settings;
pub mod transform;

pub use composite::{composite, composite_jpeg, plan_composite, CompositeLayout};
pub use crop::{derive_crop, derive_crop_for_target, CropArea, CropEditor, TargetSize};
pub use dataset::{Dataset, ImageId};
pub use error::CropError;
pub use settings::ExportSettings;
