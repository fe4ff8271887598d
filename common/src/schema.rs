//! Label schemas and cleaning rules
//!
//! - LANGUAGES: static table of supported output languages and their markers
//! - LabelSchema: the markers the parser looks for in one generation call
//! - CleaningRules: boilerplate phrases and fallback values

use serde::{Deserialize, Serialize};

/// Field a label marker introduces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Headline,
    Description,
    Category,
    ObjectId,
    Manufacturer,
    Date,
    Material,
    Dimensions,
    Weight,
    Location,
}

impl FieldKind {
    /// Field name used in `CaptionResult::fields` and output headers
    pub fn key(&self) -> &'static str {
        match self {
            FieldKind::Headline => "headline",
            FieldKind::Description => "description",
            FieldKind::Category => "category",
            FieldKind::ObjectId => "object_id",
            FieldKind::Manufacturer => "manufacturer",
            FieldKind::Date => "date",
            FieldKind::Material => "material",
            FieldKind::Dimensions => "dimensions",
            FieldKind::Weight => "weight",
            FieldKind::Location => "location",
        }
    }

    /// Only the description accumulates continuation lines.
    pub fn is_multi_line(&self) -> bool {
        matches!(self, FieldKind::Description)
    }
}

/// Output language profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageProfile {
    pub name: &'static str,
    pub headline: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    /// Column suffix in wide catalog output
    pub suffix: &'static str,
    /// Phrase substituted for blank context fields
    pub not_specified: &'static str,
}

/// Supported output languages
pub const LANGUAGES: &[LanguageProfile] = &[
    LanguageProfile {
        name: "Deutsch",
        headline: "TITEL",
        description: "BESCHREIBUNG",
        category: "KATEGORIE",
        suffix: "DE",
        not_specified: "nicht angegeben",
    },
    LanguageProfile {
        name: "English",
        headline: "HEADLINE",
        description: "DESCRIPTION",
        category: "CATEGORY",
        suffix: "EN",
        not_specified: "not specified",
    },
    LanguageProfile {
        name: "Polski",
        headline: "NAGŁÓWEK",
        description: "OPIS",
        category: "KATEGORIA",
        suffix: "PL",
        not_specified: "nie podano",
    },
    LanguageProfile {
        name: "Lietuvių",
        headline: "ANTRAŠTĖ",
        description: "APRAŠYMAS",
        category: "KATEGORIJA",
        suffix: "LT",
        not_specified: "nenurodyta",
    },
];

/// Look up a language by name, ignoring case.
pub fn find_language(name: &str) -> Option<&'static LanguageProfile> {
    let wanted = name.trim().to_lowercase();
    LANGUAGES.iter().find(|l| l.name.to_lowercase() == wanted)
}

/// Names of all supported languages, in table order
pub fn language_names() -> Vec<&'static str> {
    LANGUAGES.iter().map(|l| l.name).collect()
}

/// One marker the parser recognizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub kind: FieldKind,
    pub marker: String,
}

/// Markers active for one generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSchema {
    pub language: String,
    labels: Vec<Label>,
}

impl LabelSchema {
    /// Headline/description pair
    pub fn new(language: &str, headline: &str, description: &str) -> Self {
        Self {
            language: language.to_string(),
            labels: vec![
                Label { kind: FieldKind::Headline, marker: headline.to_string() },
                Label { kind: FieldKind::Description, marker: description.to_string() },
            ],
        }
    }

    /// Add a marker (replaces an existing marker of the same kind)
    pub fn with_label(mut self, kind: FieldKind, marker: &str) -> Self {
        self.labels.retain(|l| l.kind != kind);
        self.labels.push(Label { kind, marker: marker.to_string() });
        self
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn marker(&self, kind: FieldKind) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.kind == kind)
            .map(|l| l.marker.as_str())
    }

    /// Headline/description schema of a language
    pub fn for_language(profile: &LanguageProfile) -> Self {
        Self::new(profile.name, profile.headline, profile.description)
    }

    /// Headline/description/category schema of a language
    pub fn with_category(profile: &LanguageProfile) -> Self {
        Self::for_language(profile).with_label(FieldKind::Category, profile.category)
    }

    /// Catalog entry schema: English labels, content in the target language
    pub fn catalog(profile: &LanguageProfile) -> Self {
        Self::new(profile.name, "Title", "Description")
            .with_label(FieldKind::ObjectId, "Object ID")
            .with_label(FieldKind::Manufacturer, "Manufacturer/Collection")
            .with_label(FieldKind::Date, "Date")
            .with_label(FieldKind::Dimensions, "Dimensions")
            .with_label(FieldKind::Weight, "Weight")
            .with_label(FieldKind::Location, "Location")
    }
}

/// Boilerplate openers removed from the start of captions
pub const UNWANTED_PHRASES: &[&str] = &[
    // English
    "this image shows", "in this scene", "in the image",
    "the image depicts", "here we see", "this is a",
    // Deutsch
    "dieses bild zeigt", "in dieser szene", "im bild ist",
    "die abbildung zeigt", "auf diesem bild", "man sieht hier",
    // Polski
    "ten obraz przedstawia", "na tej scenie", "na zdjęciu",
    "zdjęcie przedstawia", "tu widzimy", "jest to",
    // Lietuvių
    "šis paveikslas rodo", "šioje scenoje", "nuotraukoje",
    "nuotrauka vaizduoja", "čia matome", "tai yra",
];

/// Descriptions used when no description label was found
pub const FALLBACK_DESCRIPTIONS: &[&str] = &[
    "a detailed scene with multiple visual elements and characters",
    "a composition featuring people in an environment with various details",
    "a visual narrative showing characters and their surroundings",
    "an image depicting figures in a setting with atmospheric elements",
    "a scene with characters, environment, and compositional details",
];

pub const FALLBACK_HEADLINE: &str = "Untitled";
pub const FALLBACK_CATEGORY: &str = "Uncategorized";
pub const SHORT_CAPTION_REPLACEMENT: &str = "a detailed scene with visual elements";
pub const MIN_CAPTION_LENGTH: usize = 10;

/// Cleaning and fallback configuration handed to the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningRules {
    /// Lower-case phrases stripped from the start of headline/description
    pub unwanted_phrases: Vec<String>,
    pub fallback_headline: String,
    pub fallback_descriptions: Vec<String>,
    /// Replaces a description that is too short after cleaning
    pub short_replacement: String,
    /// Minimum description length in characters
    pub min_length: usize,
    pub fallback_category: String,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            unwanted_phrases: UNWANTED_PHRASES.iter().map(|s| s.to_string()).collect(),
            fallback_headline: FALLBACK_HEADLINE.to_string(),
            fallback_descriptions: FALLBACK_DESCRIPTIONS.iter().map(|s| s.to_string()).collect(),
            short_replacement: SHORT_CAPTION_REPLACEMENT.to_string(),
            min_length: MIN_CAPTION_LENGTH,
            fallback_category: FALLBACK_CATEGORY.to_string(),
        }
    }
}

impl CleaningRules {
    /// Rules that keep text as extracted (no phrase stripping)
    pub fn without_phrases() -> Self {
        Self {
            unwanted_phrases: Vec::new(),
            ..Self::default()
        }
    }
}
