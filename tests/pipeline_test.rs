//! End-to-end runs with a scripted generator
//!
//! Spreadsheet and photographs on disk, no network.

use async_trait::async_trait;
use museum_caption::error::{CaptionError, Result};
use museum_caption::export::RowSink;
use museum_caption::generator::{CaptionGenerator, ImagePayload};
use museum_caption::pipeline::{self, CancelFlag, RunContext, RunOptions};
use museum_caption::scanner::ImageSource;
use museum_caption::spreadsheet;
use museum_caption_common::{find_language, LabelSchema};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::tempdir;

/// Answers every prompt with the same text and counts calls.
struct EchoGenerator {
    reply: String,
    calls: Mutex<Vec<usize>>,
}

impl EchoGenerator {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CaptionGenerator for EchoGenerator {
    async fn generate(&self, _prompt: &str, images: &[ImagePayload]) -> Result<String> {
        self.calls.lock().unwrap().push(images.len());
        if self.reply.is_empty() {
            return Err(CaptionError::EmptyResponse);
        }
        Ok(self.reply.clone())
    }
}

fn options() -> RunOptions {
    RunOptions {
        batch: 0,
        window: Duration::ZERO,
        failure_pause: Duration::ZERO,
        max_image_size: 64,
        max_images: 4,
    }
}

fn write_photo(dir: &Path, name: &str) {
    image::RgbImage::from_pixel(16, 12, image::Rgb([180, 150, 90]))
        .save(dir.join(name))
        .unwrap();
}

#[tokio::test]
async fn test_enrich_end_to_end() {
    let dir = tempdir().unwrap();
    let photos = dir.path().join("photos");
    std::fs::create_dir(&photos).unwrap();
    write_photo(&photos, "1-1996-6864-000-a.jpg");
    write_photo(&photos, "1-1996-6864-000-b.jpg");
    write_photo(&photos, "7-2010-0042-001.jpg");
    write_photo(&photos, "overview.jpg");

    let sheet_path = dir.path().join("cleaned_data.csv");
    std::fs::write(
        &sheet_path,
        "t1,T3,T14\n\"1/1996/6864 0\",Brass,1934\n\"1/1996/6864 1\",Iron,1950\n",
    )
    .unwrap();

    let table = spreadsheet::read_sheet(&sheet_path).unwrap();
    let source = ImageSource::open(&photos, false).unwrap();
    let (objects, stats) = pipeline::prepare_objects(&source.images, &table, &sheet_path, 4).unwrap();

    assert_eq!(stats.groups, 2);
    assert_eq!(stats.matched, 1);
    assert_eq!(stats.unmatched, 1);
    assert_eq!(objects[0].object_key, "1-1996-6864-000");
    assert_eq!(objects[0].image_paths.len(), 2);
    // first row wins for the shared canonical key
    assert_eq!(objects[0].field("material"), "Brass");
    assert_eq!(objects[0].field("date"), "1934");

    let generator = EchoGenerator::new(
        "HEADLINE: Telegraph key\nDESCRIPTION: A brass Morse key.\nMounted on oak.",
    );
    let output = dir.path().join("enriched.csv");
    let schema = LabelSchema::for_language(find_language("English").unwrap());
    let mut sink = RowSink::create(&output, &pipeline::enrich_headers(false)).unwrap();
    let mut ctx = RunContext::new(&generator, options(), CancelFlag::new());

    pipeline::run_enrich(&mut ctx, &objects, &schema, &mut sink).await.unwrap();
    sink.finish().unwrap();

    assert_eq!(*generator.calls.lock().unwrap(), vec![2, 1]);
    assert_eq!(ctx.summary.processed, 2);
    assert_eq!(ctx.summary.generated, 2);

    let result = spreadsheet::read_sheet(&output).unwrap();
    assert_eq!(
        result.headers,
        vec!["object_id", "headline", "description", "material", "date", "dimensions"]
    );
    assert_eq!(
        result.rows[0],
        vec![
            "1-1996-6864-000",
            "Telegraph key",
            "A brass Morse key. Mounted on oak",
            "Brass",
            "1934",
            "N/A"
        ]
    );
    assert_eq!(result.rows[1][0], "7-2010-0042-001");
    assert_eq!(result.rows[1][3], "N/A");
}

#[tokio::test]
async fn test_caption_from_zip_with_failures() {
    let dir = tempdir().unwrap();
    let photos = dir.path().join("src");
    std::fs::create_dir(&photos).unwrap();
    write_photo(&photos, "a.jpg");
    write_photo(&photos, "b.jpg");

    let zip_path = dir.path().join("photos.zip");
    {
        use std::io::Write;
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&zip_path).unwrap());
        for name in ["a.jpg", "b.jpg"] {
            writer
                .start_file(format!("batch/{}", name), zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(&std::fs::read(photos.join(name)).unwrap()).unwrap();
        }
        writer.finish().unwrap();
    }

    let source = ImageSource::open(&zip_path, false).unwrap();
    assert_eq!(source.images.len(), 2);

    let generator = EchoGenerator::new("");
    let output = dir.path().join("captions.xlsx");
    let headers: Vec<String> = pipeline::CAPTION_HEADERS.iter().map(|s| s.to_string()).collect();
    let schema = LabelSchema::for_language(find_language("Lietuvių").unwrap());
    let mut sink = RowSink::create(&output, &headers).unwrap();
    let mut ctx = RunContext::new(&generator, options(), CancelFlag::new());

    pipeline::run_caption(&mut ctx, &source.images, &schema, &mut sink).await.unwrap();
    sink.finish().unwrap();

    assert_eq!(ctx.summary.failed, 2);

    let result = spreadsheet::read_sheet(&output).unwrap();
    assert_eq!(result.rows.len(), 2);
    for (row, name) in result.rows.iter().zip(["a.jpg", "b.jpg"]) {
        assert_eq!(row[0], name);
        assert_eq!(row[1], "Untitled");
        assert!(row[2].chars().count() >= 10);
    }
}

#[test]
fn test_merge_then_clean() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("export_a.csv");
    let b = dir.path().join("export_b.csv");
    std::fs::write(&a, "t1,T2,T5\n1/1996/6864,\"Lorenz AG\nBerlin\",\n").unwrap();
    std::fs::write(&b, "t1,T5,T14\n1/1996/6864,\"HxBxT: 90 x 60 x 30 mm, Masse: 0,8 kg\",um 1934\n").unwrap();

    let merged_path = dir.path().join("merged_data.csv");
    spreadsheet::merge::merge_files(&[&a, &b], &merged_path).unwrap();

    let merged = spreadsheet::read_sheet(&merged_path).unwrap();
    assert_eq!(merged.rows.len(), 1);

    let cleaned = spreadsheet::clean::clean_sheet(&merged);
    let col = |name: &str| cleaned.headers.iter().position(|h| h == name).unwrap();
    let row = &cleaned.rows[0];
    assert_eq!(row[col("ID")], "1/1996/6864");
    assert_eq!(row[col("Manufacturer_Cleaned")], "Lorenz AG");
    assert_eq!(row[col("Year_Cleaned")], "1934");
    assert_eq!(row[col("Mass_kg")], "0.8");
    assert_eq!(row[col("Height_mm")], "90");
    assert_eq!(row[col("Depth_mm")], "30");
}
