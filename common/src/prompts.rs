//! Prompt generation
//!
//! - build_caption_prompt: one image, no database facts
//! - build_enriched_prompt: an object group with spreadsheet facts as source of truth
//! - build_catalog_prompt: registrar-style catalog entry with English labels

use crate::schema::{FieldKind, LabelSchema, LanguageProfile};
use crate::types::ObjectRecord;

/// Categories offered when the schema has a category label
pub const OBJECT_CATEGORIES: &[&str] = &[
    "Measurement & Testing",
    "Communication & Transmission",
    "Power & Electrical",
    "Audio/Visual",
    "Data Processing",
    "Mechanical Component",
    "Other",
];

fn marker(schema: &LabelSchema, kind: FieldKind) -> &str {
    schema.marker(kind).unwrap_or_else(|| kind.key())
}

/// Prompt for a single photograph
pub fn build_caption_prompt(schema: &LabelSchema) -> String {
    let language = &schema.language;
    let headline_tag = marker(schema, FieldKind::Headline);
    let description_tag = marker(schema, FieldKind::Description);

    format!(
        r#"As an expert **Museum Curator and Art Historian**, your task is to analyze the **physical object** in the uploaded image to generate a **formal public exhibition label** (wall text). **Ignore** any photographic elements (lighting, perspective). **Focus exclusively** on the object's material, date, style, and historical function. The target audience is a general, non-academic museum visitor.

**Output must be in {language}.**

Provide your response in the following format:
{headline_tag}: [A short, compelling title for the museum object, stating material and epoch, max. 5-10 words]
{description_tag}: [The formal museum description in {language}. The description must be approx. **70-90 words** long and cover: 1. **Visual Identification** (material, technique, main motif). 2. **Context/Origin** (epoch, culture). 3. **Historical or Cultural Significance** (function, relevance). Avoid unnecessary filler text.]"#
    )
}

/// Prompt for an object group with spreadsheet facts
///
/// Adds a category task when the schema carries a category label.
pub fn build_enriched_prompt(schema: &LabelSchema, record: &ObjectRecord) -> String {
    let language = &schema.language;
    let headline_tag = marker(schema, FieldKind::Headline);
    let description_tag = marker(schema, FieldKind::Description);
    let object_id = &record.object_key;
    let date = record.field("date");
    let material = record.field("material");
    let dimensions = record.field("dimensions");

    let (category_task, category_line) = match schema.marker(FieldKind::Category) {
        Some(category_tag) => (
            format!(
                "\n5. After the description, add a category tag. Choose the ONE most fitting category from the following list: [{}]",
                OBJECT_CATEGORIES.join(", ")
            ),
            format!("\n{category_tag}: [Your chosen category from the list]"),
        ),
        None => (String::new(), String::new()),
    };

    format!(
        r#"As an expert **Museum Curator and Art Historian**, your task is to generate a formal public exhibition label (wall text). Analyze the provided images and use the factual data from the museum database as the primary source of truth.

**DATABASE INFORMATION (Source of Truth):**
- **Object ID:** {object_id}
- **Date:** {date}
- **Material:** {material}
- **Dimensions:** {dimensions}

**YOUR TASK:**
1. Synthesize the database information with the visual evidence from the images.
2. Focus exclusively on the object's physical characteristics, context, and significance.
3. **Do NOT contradict the database information.** If an image seems to show something different, assume the database is correct.
4. If a database field is marked as 'N/A', do not invent information for it.{category_task}

**Output must be in {language}.**

Provide your response in the following format:
{headline_tag}: [A short, compelling title for the museum object, consistent with the provided data.]
{description_tag}: [The formal museum description in {language}, approx. **70-90 words**. Weave the database facts naturally into a descriptive text about the object's appearance, context, and function.]{category_line}"#
    )
}

/// Spreadsheet context for a catalog entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogContext {
    pub object_id: String,
    pub title: String,
    pub manufacturer: String,
    pub dimensions: String,
    pub date: String,
    pub weight: String,
    pub location: String,
    pub notes: String,
}

const REGISTRAR_INSTRUCTIONS: &str = "You are a registrar / documentation specialist in a technical museum. \
Create a factual, verifiable catalog entry. \
Describe only characteristics explicitly stated in the metadata or clearly visible/identified: \
form, materials, construction/components, visible surface features, inscriptions/markings, dimensions/weight, condition traces. \
Do not provide interpretations, assumptions, historical context, or inferred functions. \
Do not mention functions or uses unless explicitly stated. \
Avoid subjective adjectives and speculative language. \
Write in precise, neutral museum terminology. \
Use only the provided information.";

/// Prompt for a catalog entry in one language
///
/// Blank context values are replaced by the language's "not specified" phrase.
pub fn build_catalog_prompt(profile: &LanguageProfile, context: &CatalogContext) -> String {
    let ns = profile.not_specified;
    let or_ns = |value: &str| {
        let trimmed = value.trim();
        if trimmed.is_empty() { ns.to_string() } else { trimmed.to_string() }
    };
    let language = profile.name;

    format!(
        r#"{REGISTRAR_INSTRUCTIONS}

Write the content in {language}.

Object ID: {object_id}
Title: {title}
Manufacturer/Collection: {manufacturer}
Date: {date}
Dimensions/Description: {dimensions}
Weight: {weight}
Location: {location}
Additional Notes: {notes}


Provide the entry in the following exact label format. Write the content in {language} (the labels remain in English):
Title: <text or '{ns}'>
Object ID: <value>
Manufacturer/Collection: <value or '{ns}'>
Date: <value or '{ns}'>
Dimensions: <value or '{ns}'>
Weight: <value or '{ns}'>
Location: <value or '{ns}'>
Description: 2–5 sentences. Only observable/stated features. No function, context, or evaluation."#,
        object_id = context.object_id.trim(),
        title = or_ns(&context.title),
        manufacturer = or_ns(&context.manufacturer),
        date = or_ns(&context.date),
        dimensions = or_ns(&context.dimensions),
        weight = or_ns(&context.weight),
        location = or_ns(&context.location),
        notes = or_ns(&context.notes),
    )
}
