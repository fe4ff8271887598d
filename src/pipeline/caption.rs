//! Caption run: one photograph per request, no spreadsheet facts

use super::{progress_bar, RunContext};
use crate::error::Result;
use crate::export::RowSink;
use crate::generator::{load_image, CaptionGenerator};
use crate::scanner::ImageInfo;
use museum_caption_common::{build_caption_prompt, LabelSchema};

pub const CAPTION_HEADERS: &[&str] = &["image", "headline", "description"];

/// Caption every image in order, writing one row each.
pub async fn run_caption<G: CaptionGenerator + ?Sized>(
    ctx: &mut RunContext<'_, G>,
    images: &[ImageInfo],
    schema: &LabelSchema,
    sink: &mut RowSink,
) -> Result<()> {
    let prompt = build_caption_prompt(schema);
    let pb = progress_bar(images.len());

    for image in images {
        if ctx.should_stop() {
            pb.println("⚠ cancelled");
            break;
        }
        ctx.summary.processed += 1;
        pb.set_message(image.file_name.clone());

        let result = match load_image(&image.path, ctx.options.max_image_size) {
            Ok(payload) => ctx.request(&prompt, &[payload], schema, &image.file_name).await?,
            Err(e) => ctx.record_failure(e, schema, &image.file_name).await?,
        };

        tracing::info!("{}: {}", image.file_name, result.headline);
        pb.println(format!("✔ {} → {}", image.file_name, result.headline));

        sink.write_row(&[image.file_name.clone(), result.headline, result.description])?;
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
    use crate::error::CaptionError;
    use museum_caption_common::find_language;
    use std::path::Path;

    fn write_image(dir: &Path, name: &str) -> ImageInfo {
        let path = dir.join(name);
        image::RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30])).save(&path).unwrap();
        ImageInfo {
            path,
            file_name: name.to_string(),
        }
    }

    fn headers() -> Vec<String> {
        CAPTION_HEADERS.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_caption_run_writes_rows_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![
            write_image(dir.path(), "a.png"),
            ImageInfo {
                path: dir.path().join("missing.jpg"),
                file_name: "missing.jpg".to_string(),
            },
            write_image(dir.path(), "c.png"),
        ];
        let out = dir.path().join("captions.csv");
        let mut sink = RowSink::create(&out, &headers()).unwrap();

        let generator = ScriptedGenerator::new(vec![
            Ok("TITEL: Morsetaste\nBESCHREIBUNG: Eine Taste aus Messing.".to_string()),
            Err(CaptionError::Generation("503".into())),
        ]);
        let schema = LabelSchema::for_language(find_language("Deutsch").unwrap());
        let mut ctx = RunContext::new(&generator, quick_options(), CancelFlag::new());

        run_caption(&mut ctx, &images, &schema, &mut sink).await.unwrap();
        sink.finish().unwrap();

        // unreadable image never reaches the generator
        assert_eq!(generator.calls(), 2);
        assert_eq!(ctx.summary.processed, 3);
        assert_eq!(ctx.summary.generated, 1);
        assert_eq!(ctx.summary.failed, 2);

        let sheet = crate::spreadsheet::read_sheet(&out).unwrap();
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0], vec!["a.png", "Morsetaste", "Eine Taste aus Messing"]);
        assert_eq!(sheet.rows[1][1], "Untitled");
        assert_eq!(sheet.rows[2][1], "Untitled");
    }

    #[tokio::test]
    async fn test_caption_run_survives_garbled_reply() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![write_image(dir.path(), "a.png"), write_image(dir.path(), "b.png")];
        let mut sink = RowSink::create(&dir.path().join("out.csv"), &headers()).unwrap();

        let garbled = crate::generator::gemini::extract_text("<html>bad gateway</html>").unwrap_err();
        let generator = ScriptedGenerator::new(vec![
            Err(garbled),
            Ok("HEADLINE: Brass key\nDESCRIPTION: A Morse key on a wooden base.".to_string()),
        ]);
        let schema = LabelSchema::for_language(find_language("English").unwrap());
        let mut ctx = RunContext::new(&generator, quick_options(), CancelFlag::new());

        run_caption(&mut ctx, &images, &schema, &mut sink).await.unwrap();

        assert_eq!(generator.calls(), 2);
        assert_eq!(sink.rows_written(), 2);
        assert_eq!(ctx.summary.failed, 1);
        assert_eq!(ctx.summary.generated, 1);
    }

    #[tokio::test]
    async fn test_caption_run_stops_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![write_image(dir.path(), "a.png")];
        let mut sink = RowSink::create(&dir.path().join("out.csv"), &headers()).unwrap();

        let generator = ScriptedGenerator::new(vec![]);
        let cancel = CancelFlag::new();
        cancel.cancel();
        let schema = LabelSchema::for_language(find_language("English").unwrap());
        let mut ctx = RunContext::new(&generator, quick_options(), cancel);

        run_caption(&mut ctx, &images, &schema, &mut sink).await.unwrap();
        assert!(ctx.summary.cancelled);
        assert_eq!(ctx.summary.processed, 0);
        assert_eq!(sink.rows_written(), 0);
    }
}
