//! Enrichment run: one request per object group with spreadsheet facts

use super::{progress_bar, RunContext};
use crate::error::Result;
use crate::export::RowSink;
use crate::generator::{load_images, CaptionGenerator};
use crate::scanner::ImageInfo;
use crate::spreadsheet::{metadata_rows, MetadataColumns, Sheet};
use museum_caption_common::{
    build_enriched_prompt, build_lookup, group_images_by_object, resolve_objects, FieldKind,
    LabelSchema, ObjectRecord, ResolutionStats,
};
use std::path::Path;

/// Output columns; the category column only with the triple schema.
pub fn enrich_headers(with_category: bool) -> Vec<String> {
    let mut headers = vec!["object_id"];
    if with_category {
        headers.push("primary_category");
    }
    headers.extend(["headline", "description", "material", "date", "dimensions"]);
    headers.into_iter().map(String::from).collect()
}

/// Group the scanned images by object and join them with the sheet rows.
///
/// # Arguments
/// * `images` - scanned photographs
/// * `sheet` - metadata export (ID column required)
/// * `source` - sheet path, for error messages
/// * `max_images` - photographs kept per object
pub fn prepare_objects(
    images: &[ImageInfo],
    sheet: &Sheet,
    source: &Path,
    max_images: usize,
) -> Result<(Vec<ObjectRecord>, ResolutionStats)> {
    let columns = MetadataColumns::locate(sheet, source)?;
    let lookup = build_lookup(metadata_rows(sheet, &columns));
    let groups = group_images_by_object(images.iter().map(|i| i.path.to_string_lossy().to_string()));

    tracing::debug!("{} lookup keys, {} image groups", lookup.len(), groups.len());
    Ok(resolve_objects(&groups, &lookup, &columns.field_names(), max_images))
}

/// Describe each resolved object, writing one row per object.
pub async fn run_enrich<G: CaptionGenerator + ?Sized>(
    ctx: &mut RunContext<'_, G>,
    objects: &[ObjectRecord],
    schema: &LabelSchema,
    sink: &mut RowSink,
) -> Result<()> {
    let with_category = schema.marker(FieldKind::Category).is_some();
    let pb = progress_bar(objects.len());

    for record in objects {
        if ctx.should_stop() {
            pb.println("⚠ cancelled");
            break;
        }
        ctx.summary.processed += 1;
        if record.matched {
            ctx.summary.matched += 1;
        } else {
            ctx.summary.unmatched += 1;
        }
        pb.set_message(record.object_key.clone());

        let prompt = build_enriched_prompt(schema, record);
        tracing::debug!("{}: {} images, prompt {} chars", record.object_key, record.image_paths.len(), prompt.len());

        let images: Vec<&str> = record
            .image_paths
            .iter()
            .take(ctx.options.max_images)
            .map(|p| p.as_str())
            .collect();

        let result = match load_images(&images, ctx.options.max_image_size) {
            Ok(payloads) => ctx.request(&prompt, &payloads, schema, &record.object_key).await?,
            Err(e) => ctx.record_failure(e, schema, &record.object_key).await?,
        };

        let marker = if record.matched { "✔" } else { "?" };
        tracing::info!("{}: {}", record.object_key, result.headline);
        pb.println(format!("{} {} → {}", marker, record.object_key, result.headline));

        let mut row = vec![record.object_key.clone()];
        if with_category {
            row.push(result.field(FieldKind::Category.key()).to_string());
        }
        row.extend([
            result.headline,
            result.description,
            record.field("material").to_string(),
            record.field("date").to_string(),
            record.field("dimensions").to_string(),
        ]);
        sink.write_row(&row)?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{CancelFlag, RunContext};
    use super::*;
    use museum_caption_common::find_language;

    #[test]
    fn test_prepare_objects_joins_sheet() {
        let images: Vec<ImageInfo> = ["1-1996-6864-000-a.jpg", "1-1996-6864-000-b.jpg", "5-2001-0001-000.jpg", "scan.jpg"]
            .iter()
            .map(|name| ImageInfo {
                path: Path::new("/photos").join(name),
                file_name: name.to_string(),
            })
            .collect();
        let sheet = Sheet {
            headers: vec!["T1".into(), "T3".into()],
            rows: vec![vec!["1/1996/6864 0".into(), "Brass".into()]],
        };

        let (objects, stats) = prepare_objects(&images, &sheet, Path::new("data.csv"), 4).unwrap();
        assert_eq!(stats.groups, 2);
        assert_eq!(stats.matched, 1);
        assert_eq!(objects[0].object_key, "1-1996-6864-000");
        assert_eq!(objects[0].image_paths.len(), 2);
        assert_eq!(objects[0].field("material"), "Brass");
        assert!(!objects[1].matched);
        assert_eq!(objects[1].field("material"), "N/A");
    }

    #[test]
    fn test_enrich_headers() {
        assert_eq!(
            enrich_headers(false),
            vec!["object_id", "headline", "description", "material", "date", "dimensions"]
        );
        assert_eq!(enrich_headers(true)[1], "primary_category");
    }

    #[tokio::test]
    async fn test_enrich_run_with_category() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("1-1996-6864-000-a.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3])).save(&image).unwrap();

        let mut record = ObjectRecord {
            object_key: "1-1996-6864-000".to_string(),
            image_paths: vec![image.to_string_lossy().to_string()],
            matched: true,
            ..Default::default()
        };
        record.metadata.insert("material".into(), "Brass".into());
        record.metadata.insert("date".into(), "1934".into());
        record.metadata.insert("dimensions".into(), "N/A".into());

        let out = dir.path().join("enriched.csv");
        let mut sink = RowSink::create(&out, &enrich_headers(true)).unwrap();
        let generator = ScriptedGenerator::new(vec![Ok(
            "HEADLINE: Telegraph key\nDESCRIPTION: A brass Morse key from 1934.\nCATEGORY: Communication & Transmission"
                .to_string(),
        )]);
        let schema = LabelSchema::with_category(find_language("English").unwrap());
        let mut ctx = RunContext::new(&generator, quick_options(), CancelFlag::new());

        run_enrich(&mut ctx, &[record], &schema, &mut sink).await.unwrap();
        sink.finish().unwrap();

        let (prompt, image_count) = generator.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("- **Material:** Brass"));
        assert_eq!(image_count, 1);
        assert_eq!(ctx.summary.matched, 1);

        let sheet = crate::spreadsheet::read_sheet(&out).unwrap();
        assert_eq!(
            sheet.rows[0],
            vec![
                "1-1996-6864-000",
                "Communication & Transmission",
                "Telegraph key",
                "A brass Morse key from 1934",
                "Brass",
                "1934",
                "N/A"
            ]
        );
    }

    #[tokio::test]
    async fn test_enrich_run_missing_images_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let record = ObjectRecord {
            object_key: "2-2000-0001-000".to_string(),
            image_paths: vec![dir.path().join("gone.jpg").to_string_lossy().to_string()],
            ..Default::default()
        };
        let mut sink = RowSink::create(&dir.path().join("out.csv"), &enrich_headers(true)).unwrap();
        let generator = ScriptedGenerator::new(vec![]);
        let schema = LabelSchema::with_category(find_language("English").unwrap());
        let mut ctx = RunContext::new(&generator, quick_options(), CancelFlag::new());

        run_enrich(&mut ctx, &[record], &schema, &mut sink).await.unwrap();

        assert_eq!(generator.calls(), 0);
        assert_eq!(ctx.summary.failed, 1);
        assert_eq!(ctx.summary.unmatched, 1);
        assert_eq!(sink.rows_written(), 1);
    }
}
