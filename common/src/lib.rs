//! Museum Caption Common Library
//!
//! Pure logic shared by the CLI:
//! - identity: joining spreadsheet rows to photographs by naming convention
//! - parser: turning model output into headline/description/fields
//! - schema/prompts: per-language labels and prompt templates

pub mod types;
pub mod identity;
pub mod schema;
pub mod parser;
pub mod prompts;

pub use types::{CaptionResult, Metadata, ObjectRecord, NOT_AVAILABLE};
pub use identity::{
    build_lookup, canonicalize_id, group_images_by_object, group_key, lookup_key,
    match_image_to_record, resolve_objects, ImageGroups, LookupTable, ResolutionStats,
};
pub use schema::{find_language, CleaningRules, FieldKind, LabelSchema, LanguageProfile, LANGUAGES};
pub use parser::{clean_caption, fallback_caption, parse_response};
pub use prompts::{build_caption_prompt, build_catalog_prompt, build_enriched_prompt, CatalogContext};
