//! Caption metadata attached to each dataset entry.
//!
//! An entry carries a trigger word, a free-form AI understanding and six
//! bilingual facets. The integrated caption written next to the exported
//! image is built from the trigger word and the English facets only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{DatasetError, ImageId};

/// Separator between caption parts.
const CAPTION_SEPARATOR: &str = ", ";

/// A value with an English and a Chinese rendition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bilingual {
    pub en: String,
    pub cn: String,
}

impl Bilingual {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Cn => &self.cn,
        }
    }

    fn get_mut(&mut self, language: Language) -> &mut String {
        match language {
            Language::En => &mut self.en,
            Language::Cn => &mut self.cn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    Cn,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Cn => "cn",
        }
    }
}

/// The descriptive facets of an analysis, in caption order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Subject,
    Scene,
    Lighting,
    Perspective,
    Quality,
    Style,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::Subject,
        Facet::Scene,
        Facet::Lighting,
        Facet::Perspective,
        Facet::Quality,
        Facet::Style,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Facet::Subject => "subject",
            Facet::Scene => "scene",
            Facet::Lighting => "lighting",
            Facet::Perspective => "perspective",
            Facet::Quality => "quality",
            Facet::Style => "style",
        }
    }
}

/// Structured caption data for one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptionMetadata {
    pub trigger_word: String,
    pub ai_understanding: String,
    pub subject: Bilingual,
    pub scene: Bilingual,
    pub lighting: Bilingual,
    pub perspective: Bilingual,
    pub quality: Bilingual,
    pub style: Bilingual,
}

impl CaptionMetadata {
    pub fn facet(&self, facet: Facet) -> &Bilingual {
        match facet {
            Facet::Subject => &self.subject,
            Facet::Scene => &self.scene,
            Facet::Lighting => &self.lighting,
            Facet::Perspective => &self.perspective,
            Facet::Quality => &self.quality,
            Facet::Style => &self.style,
        }
    }

    fn facet_mut(&mut self, facet: Facet) -> &mut Bilingual {
        match facet {
            Facet::Subject => &mut self.subject,
            Facet::Scene => &mut self.scene,
            Facet::Lighting => &mut self.lighting,
            Facet::Perspective => &mut self.perspective,
            Facet::Quality => &mut self.quality,
            Facet::Style => &mut self.style,
        }
    }

    /// Read the field at `path`.
    pub fn get(&self, path: FieldPath) -> &str {
        match path {
            FieldPath::TriggerWord => &self.trigger_word,
            FieldPath::AiUnderstanding => &self.ai_understanding,
            FieldPath::Facet(facet, language) => self.facet(facet).get(language),
        }
    }

    /// Overwrite the field at `path`.
    pub fn set(&mut self, path: FieldPath, value: impl Into<String>) {
        let slot = match path {
            FieldPath::TriggerWord => &mut self.trigger_word,
            FieldPath::AiUnderstanding => &mut self.ai_understanding,
            FieldPath::Facet(facet, language) => self.facet_mut(facet).get_mut(language),
        };
        *slot = value.into();
    }

    /// True once an analysis has filled in the English subject.
    pub fn is_analyzed(&self) -> bool {
        !self.subject.en.is_empty()
    }
}

/// Build the integrated caption: trigger word then the English facets,
/// skipping blank parts.
pub fn integrate_caption(metadata: &CaptionMetadata) -> String {
    std::iter::once(metadata.trigger_word.as_str())
        .chain(Facet::ALL.iter().map(|&facet| metadata.facet(facet).en.as_str()))
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(CAPTION_SEPARATOR)
}

/// Address of one editable metadata field.
///
/// Parses from and displays as the dotted form used by table hosts:
/// `triggerWord`, `aiUnderstanding`, `subject.en`, `style.cn` and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldPath {
    TriggerWord,
    AiUnderstanding,
    Facet(Facet, Language),
}

impl FromStr for FieldPath {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DatasetError::InvalidFieldPath(s.to_string());
        match s {
            "triggerWord" => return Ok(FieldPath::TriggerWord),
            "aiUnderstanding" => return Ok(FieldPath::AiUnderstanding),
            _ => {}
        }

        let (facet, language) = s.split_once('.').ok_or_else(invalid)?;
        let facet = Facet::ALL
            .into_iter()
            .find(|f| f.as_str() == facet)
            .ok_or_else(invalid)?;
        let language = match language {
            "en" => Language::En,
            "cn" => Language::Cn,
            _ => return Err(invalid()),
        };
        Ok(FieldPath::Facet(facet, language))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::TriggerWord => f.write_str("triggerWord"),
            FieldPath::AiUnderstanding => f.write_str("aiUnderstanding"),
            FieldPath::Facet(facet, language) => {
                write!(f, "{}.{}", facet.as_str(), language.as_str())
            }
        }
    }
}

/// A single-field metadata edit addressed to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateField {
    pub id: ImageId,
    pub path: FieldPath,
    pub value: String,
}

impl UpdateField {
    pub fn new(id: ImageId, path: FieldPath, value: impl Into<String>) -> Self {
        Self {
            id,
            path,
            value: value.into(),
        }
    }

    /// Build an update from a dotted path string.
    ///
    /// # Errors
    ///
    /// `DatasetError::InvalidFieldPath` for an unknown path.
    pub fn parse(id: ImageId, path: &str, value: impl Into<String>) -> Result<Self, DatasetError> {
        Ok(Self::new(id, path.parse()?, value))
    }
}
