//! Export settings shared by every entry of a dataset.

use serde::{Deserialize, Serialize};

use crate::crop::TargetSize;
use crate::dataset::NamingConfig;
use crate::encode::DEFAULT_JPEG_QUALITY;

/// Global output configuration.
///
/// Missing fields deserialize to their defaults, so a host may send only the
/// part it changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    /// Output raster size; drives the crop aspect ratio when fully set.
    pub target: TargetSize,
    pub naming: NamingConfig,
    /// JPEG quality (1-100); out-of-range values are clamped by the encoder.
    pub jpeg_quality: u8,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            target: TargetSize::default(),
            naming: NamingConfig::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ExportSettings::default();
        assert_eq!(settings.target, TargetSize::default());
        assert_eq!(settings.naming.prefix, "image");
        assert_eq!(settings.jpeg_quality, 92);
    }
}
