//! Model response parser
//!
//! Turns free text like
//!
//! ```text
//! TITEL: Morsetaste
//! BESCHREIBUNG: Eine Taste aus Messing
//! auf einem Holzsockel.
//! ```
//!
//! into a `CaptionResult`. Lines are scanned top to bottom; a line starting
//! with `MARKER:` (case-insensitive) opens that field. Only the description
//! keeps collecting the following unlabeled lines. Any later label closes it.
//!
//! Parsing never fails: missing fields fall back to the values in
//! `CleaningRules`.

use crate::schema::{CleaningRules, FieldKind, Label, LabelSchema};
use crate::types::CaptionResult;
use std::collections::BTreeMap;

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Not inside a multi-line field
    Scanning,
    /// Appending continuation lines to this field
    InField(FieldKind),
}

/// Strip `prefix` from the start of `text`, comparing characters case-insensitively.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    match chars.next() {
        Some((idx, _)) => Some(&text[idx..]),
        None => Some(""),
    }
}

/// Value after `MARKER:` if the line starts with that label.
fn strip_label<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = strip_prefix_ignore_case(line, marker)?;
    rest.strip_prefix(':').map(str::trim)
}

/// Labels ordered longest marker first so a marker never shadows a longer one.
fn ordered_labels(schema: &LabelSchema) -> Vec<&Label> {
    let mut labels: Vec<&Label> = schema.labels().iter().collect();
    labels.sort_by(|a, b| b.marker.chars().count().cmp(&a.marker.chars().count()));
    labels
}

/// Parse one model response with the active label schema.
///
/// # Arguments
/// * `text` - raw model output
/// * `schema` - markers of the current language/mode
/// * `rules` - phrase stripping and fallback values
///
/// # Returns
/// A result whose headline and description are never empty.
pub fn parse_response(text: &str, schema: &LabelSchema, rules: &CleaningRules) -> CaptionResult {
    let labels = ordered_labels(schema);
    let mut raw: BTreeMap<FieldKind, String> = BTreeMap::new();
    let mut state = ParseState::Scanning;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let matched = labels
            .iter()
            .find_map(|label| strip_label(line, &label.marker).map(|value| (label.kind, value)));

        match (matched, state) {
            (Some((kind, value)), _) => {
                raw.insert(kind, value.to_string());
                state = if kind.is_multi_line() {
                    ParseState::InField(kind)
                } else {
                    ParseState::Scanning
                };
            }
            (None, ParseState::InField(kind)) => {
                let value = raw.entry(kind).or_default();
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line);
            }
            (None, ParseState::Scanning) => {}
        }
    }

    let headline = raw
        .remove(&FieldKind::Headline)
        .map(|h| clean_headline(&h, rules))
        .unwrap_or_else(|| rules.fallback_headline.clone());

    let description = match raw.remove(&FieldKind::Description) {
        Some(d) => clean_caption(&d, rules),
        None => fallback_description(text, rules),
    };

    let mut fields: BTreeMap<String, String> = raw
        .into_iter()
        .map(|(kind, value)| (kind.key().to_string(), value.trim().to_string()))
        .collect();

    if schema.marker(FieldKind::Category).is_some() {
        let category = fields.entry(FieldKind::Category.key().to_string()).or_default();
        if category.is_empty() {
            *category = rules.fallback_category.clone();
        }
    }

    CaptionResult {
        headline,
        description,
        fields,
    }
}

/// Result written when generation failed for an object.
pub fn fallback_caption(schema: &LabelSchema, rules: &CleaningRules, seed: &str) -> CaptionResult {
    let mut result = CaptionResult {
        headline: rules.fallback_headline.clone(),
        description: fallback_description(seed, rules),
        ..Default::default()
    };
    if schema.marker(FieldKind::Category).is_some() {
        result
            .fields
            .insert(FieldKind::Category.key().to_string(), rules.fallback_category.clone());
    }
    result
}

/// Pick a fallback description deterministically from `seed`.
pub fn fallback_description(seed: &str, rules: &CleaningRules) -> String {
    if rules.fallback_descriptions.is_empty() {
        return rules.short_replacement.clone();
    }
    let hash = seed
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
    rules.fallback_descriptions[hash % rules.fallback_descriptions.len()].clone()
}

/// Remove unwanted leading phrases and trailing punctuation.
fn strip_boilerplate(text: &str, rules: &CleaningRules) -> String {
    let mut caption = text.trim().to_string();

    for phrase in &rules.unwanted_phrases {
        if let Some(rest) = strip_prefix_ignore_case(&caption, phrase) {
            caption = rest
                .trim()
                .trim_start_matches([',', ':', '.'])
                .trim_start()
                .to_string();
        }
    }

    caption
        .trim_end_matches(['.', ',', ';', '!', '?'])
        .trim_end()
        .to_string()
}

/// Clean a headline; empty results become the fallback headline.
pub fn clean_headline(text: &str, rules: &CleaningRules) -> String {
    let headline = strip_boilerplate(text, rules);
    if headline.is_empty() {
        rules.fallback_headline.clone()
    } else {
        headline
    }
}

/// Clean a description; results shorter than `min_length` are replaced.
pub fn clean_caption(text: &str, rules: &CleaningRules) -> String {
    let caption = strip_boilerplate(text, rules);
    if caption.chars().count() < rules.min_length {
        rules.short_replacement.clone()
    } else {
        caption
    }
}
