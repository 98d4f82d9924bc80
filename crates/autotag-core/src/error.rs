//! Error type shared by the solver and the compositor.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;

/// Errors raised while deriving or rasterizing a crop.
#[derive(Debug, Error)]
pub enum CropError {
    /// The source image could not be decoded (corrupt file, unreadable bytes).
    #[error("Source image unavailable: {0}")]
    SourceUnavailable(#[from] DecodeError),

    /// No drawing surface of the requested size can be allocated.
    #[error("Cannot allocate a {width}x{height} raster")]
    RasterContextUnavailable { width: u32, height: u32 },

    /// The solver or compositor was called with non-positive dimensions or ratio.
    #[error("Invalid crop constraint: {0}")]
    InvalidConstraint(String),

    /// The composited raster could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}
