//! Sequential file naming for exported entries.

use serde::{Deserialize, Serialize};

/// How exported files are named: `prefix` followed by a zero-padded counter.
///
/// With the defaults the first three entries are `image001`, `image002`,
/// `image003`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub prefix: String,
    /// Counter value of the first entry.
    pub start: u32,
    /// Minimum number of counter digits; longer numbers are not truncated.
    pub digits: usize,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: "image".to_string(),
            start: 1,
            digits: 3,
        }
    }
}

impl NamingConfig {
    /// Name of the entry at position `index` (0-based).
    pub fn name_at(&self, index: usize) -> String {
        let number = self.start as u64 + index as u64;
        format!("{}{:0width$}", self.prefix, number, width = self.digits)
    }
}

/// Split `file_name` into stem and lowercase extension.
///
/// `None` extension when there is no dot, or the dot is leading or trailing.
pub(crate) fn split_extension(file_name: &str) -> (&str, Option<String>) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem, Some(ext.to_ascii_lowercase()))
        }
        _ => (file_name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names() {
        let naming = NamingConfig::default();
        assert_eq!(naming.name_at(0), "image001");
        assert_eq!(naming.name_at(9), "image010");
    }

    #[test]
    fn test_custom_prefix_and_start() {
        let naming = NamingConfig {
            prefix: "cat_".to_string(),
            start: 100,
            digits: 2,
        };
        assert_eq!(naming.name_at(0), "cat_100");
        assert_eq!(naming.name_at(5), "cat_105");
    }

    #[test]
    fn test_zero_digits_means_no_padding() {
        let naming = NamingConfig {
            prefix: "x".to_string(),
            start: 7,
            digits: 0,
        };
        assert_eq!(naming.name_at(0), "x7");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("photo.JPG"), ("photo", Some("jpg".to_string())));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz".to_string())));
        assert_eq!(split_extension("README"), ("README", None));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
        assert_eq!(split_extension("trailing."), ("trailing.", None));
    }
}
