//! Shared record types
//!
//! - Metadata: spreadsheet facts for one object, keyed by field name
//! - ObjectRecord: one physical object with its photographs
//! - CaptionResult: parsed output of one generation call

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel for absent or blank spreadsheet values
pub const NOT_AVAILABLE: &str = "N/A";

/// Spreadsheet fields for one object (material, dimensions, date, ...)
pub type Metadata = BTreeMap<String, String>;

/// Replace a blank cell value with the `"N/A"` sentinel.
pub fn or_not_available(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// One physical museum object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    /// Group key (or canonical key when built from the spreadsheet side)
    pub object_key: String,

    /// Spreadsheet facts, `"N/A"` for anything missing
    pub metadata: Metadata,

    /// Photographs, sorted and capped
    pub image_paths: Vec<String>,

    /// Whether a spreadsheet row was found for this object
    #[serde(default)]
    pub matched: bool,
}

impl ObjectRecord {
    /// Metadata value for `field`, or `"N/A"`.
    pub fn field(&self, field: &str) -> &str {
        self.metadata
            .get(field)
            .map(|s| s.as_str())
            .unwrap_or(NOT_AVAILABLE)
    }
}

/// Parsed output of one generation call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionResult {
    pub headline: String,

    pub description: String,

    /// Additional labeled fields (category, date, material, ...)
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl CaptionResult {
    /// Additional field value, empty when the label was never seen.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(|s| s.as_str()).unwrap_or("")
    }
}
