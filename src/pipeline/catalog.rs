//! Catalog run: registrar-style entries in several languages
//!
//! Objects come straight from the spreadsheet (one per distinct ID cell).
//! Photographs are found through the path column, under a per-year folder
//! when the inventory number carries a year. Objects without a readable
//! photograph get a fallback entry and no request.

use super::{progress_bar, RunContext};
use crate::error::Result;
use crate::export::RowSink;
use crate::generator::{load_images, CaptionGenerator, ImagePayload};
use crate::scanner::is_image_extension;
use crate::spreadsheet::{
    Sheet, DATE_COLUMNS, DIMENSIONS_COLUMNS, ID_COLUMNS, LOCATION_COLUMNS, MANUFACTURER_COLUMNS,
    MATERIAL_COLUMNS, NOTES_COLUMNS, PATH_COLUMNS, WEIGHT_COLUMNS,
};
use museum_caption_common::identity::{path_fragments, year_segment};
use museum_caption_common::{
    build_catalog_prompt, fallback_caption, CatalogContext, CleaningRules, FieldKind, LabelSchema,
    LanguageProfile,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Per-language columns, in output order
const CATALOG_FIELDS: &[(&str, FieldKind)] = &[
    ("Title", FieldKind::Headline),
    ("Manufacturer", FieldKind::Manufacturer),
    ("Date", FieldKind::Date),
    ("Dimensions", FieldKind::Dimensions),
    ("Weight", FieldKind::Weight),
    ("Location", FieldKind::Location),
    ("Description", FieldKind::Description),
];

/// One spreadsheet object ready for the catalog run
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogObject {
    pub context: CatalogContext,
    pub image_paths: Vec<PathBuf>,
}

/// `Object ID, Images` followed by the per-language columns.
pub fn catalog_headers(languages: &[&LanguageProfile]) -> Vec<String> {
    let mut headers = vec!["Object ID".to_string(), "Images".to_string()];
    for profile in languages {
        for (name, _) in CATALOG_FIELDS {
            headers.push(format!("{}_{}", name, profile.suffix));
        }
    }
    headers
}

/// Folder holding the photographs of `raw_id`.
fn image_folder(root: &Path, raw_id: &str) -> PathBuf {
    match year_segment(raw_id) {
        Some(year) => root.join(year),
        None => root.to_path_buf(),
    }
}

/// Build catalog objects from a sheet, one per distinct ID.
///
/// Metadata comes from the first row of each ID; photographs are gathered
/// from the path cells of every row sharing it.
///
/// # Arguments
/// * `sheet` - metadata export (ID and path columns required, others optional)
/// * `source` - sheet path, for error messages
/// * `image_root` - folder with per-year subfolders of photographs
/// * `max_images` - photographs kept per object
pub fn collect_catalog_objects(
    sheet: &Sheet,
    source: &Path,
    image_root: &Path,
    max_images: usize,
) -> Result<Vec<CatalogObject>> {
    let id_col = sheet.require_column(ID_COLUMNS, source)?;
    let path_col = sheet.require_column(PATH_COLUMNS, source)?;
    let optional = |allowed: &[&str]| sheet.column(allowed);
    let title = optional(MATERIAL_COLUMNS);
    let manufacturer = optional(MANUFACTURER_COLUMNS);
    let dimensions = optional(DIMENSIONS_COLUMNS);
    let date = optional(DATE_COLUMNS);
    let weight = optional(WEIGHT_COLUMNS);
    let location = optional(LOCATION_COLUMNS);
    let notes = optional(NOTES_COLUMNS);

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut objects: Vec<CatalogObject> = Vec::new();

    for row in &sheet.rows {
        let raw_id = sheet.cell(row, id_col).trim();
        if raw_id.is_empty() {
            continue;
        }

        let existing = index.get(raw_id).copied();
        let slot = match existing {
            Some(slot) => slot,
            None => {
                let value = |col: Option<usize>| {
                    col.map(|c| sheet.cell(row, c).trim().to_string()).unwrap_or_default()
                };
                objects.push(CatalogObject {
                    context: CatalogContext {
                        object_id: raw_id.to_string(),
                        title: value(title),
                        manufacturer: value(manufacturer),
                        dimensions: value(dimensions),
                        date: value(date),
                        weight: value(weight),
                        location: value(location),
                        notes: value(notes),
                    },
                    image_paths: Vec::new(),
                });
                index.insert(raw_id.to_string(), objects.len() - 1);
                objects.len() - 1
            }
        };

        let object = &mut objects[slot];
        for path in resolve_images(image_root, raw_id, sheet.cell(row, path_col)) {
            if !object.image_paths.contains(&path) {
                object.image_paths.push(path);
            }
        }
    }

    for object in &mut objects {
        object.image_paths.truncate(max_images);
    }
    Ok(objects)
}

/// Existing photographs named in one path cell.
fn resolve_images(image_root: &Path, raw_id: &str, cell: &str) -> Vec<PathBuf> {
    let folder = image_folder(image_root, raw_id);
    let mut found = Vec::new();

    for name in path_fragments(cell) {
        let is_image = Path::new(&name)
            .extension()
            .map(|ext| is_image_extension(&ext.to_string_lossy()))
            .unwrap_or(false);
        if !is_image {
            tracing::debug!("{}: not an image: {}", raw_id, name);
            continue;
        }

        let candidate = folder.join(&name);
        if candidate.is_file() {
            found.push(candidate);
        } else if image_root.join(&name).is_file() {
            found.push(image_root.join(&name));
        } else {
            tracing::warn!("{}: image not found: {}", raw_id, candidate.display());
        }
    }
    found
}

/// Per-language columns written without asking the model.
fn fallback_entry(rules: &CleaningRules, profile: &LanguageProfile, seed: &str) -> Vec<String> {
    let result = fallback_caption(&LabelSchema::catalog(profile), rules, seed);
    CATALOG_FIELDS
        .iter()
        .map(|(_, kind)| match kind {
            FieldKind::Headline => result.headline.clone(),
            FieldKind::Description => result.description.clone(),
            _ => profile.not_specified.to_string(),
        })
        .collect()
}

fn file_names(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Write one wide row per object with an entry per language.
pub async fn run_catalog<G: CaptionGenerator + ?Sized>(
    ctx: &mut RunContext<'_, G>,
    objects: &[CatalogObject],
    languages: &[&LanguageProfile],
    sink: &mut RowSink,
) -> Result<()> {
    let pb = progress_bar(objects.len());

    for object in objects {
        if ctx.should_stop() {
            pb.println("⚠ cancelled");
            break;
        }
        let object_id = object.context.object_id.as_str();
        ctx.summary.processed += 1;
        pb.set_message(object_id.to_string());

        let mut row = vec![object_id.to_string(), file_names(&object.image_paths)];

        if object.image_paths.is_empty() {
            ctx.summary.unmatched += 1;
            pb.println(format!("❌ {}: no valid image found", object_id));
            for profile in languages {
                row.extend(fallback_entry(&ctx.rules, profile, object_id));
            }
            sink.write_row(&row)?;
            pb.inc(1);
            continue;
        }
        ctx.summary.matched += 1;

        let payloads: Vec<ImagePayload> = match load_images(&object.image_paths, ctx.options.max_image_size) {
            Ok(payloads) => payloads,
            Err(e) => {
                ctx.note_failure(e, object_id).await?;
                for profile in languages {
                    row.extend(fallback_entry(&ctx.rules, profile, object_id));
                }
                sink.write_row(&row)?;
                pb.inc(1);
                continue;
            }
        };

        for profile in languages {
            let schema = LabelSchema::catalog(profile);
            let prompt = build_catalog_prompt(profile, &object.context);
            let result = ctx.request(&prompt, &payloads, &schema, object_id).await?;

            for (_, kind) in CATALOG_FIELDS {
                let value = match kind {
                    FieldKind::Headline => result.headline.clone(),
                    FieldKind::Description => result.description.clone(),
                    other => {
                        let v = result.field(other.key()).trim();
                        if v.is_empty() { profile.not_specified.to_string() } else { v.to_string() }
                    }
                };
                row.push(value);
            }
            pb.println(format!("✔ {} [{}] → {}", object_id, profile.suffix, result.headline));
        }

        sink.write_row(&row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(())
}
