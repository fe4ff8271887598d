//! Text generation collaborator
//!
//! - CaptionGenerator: one prompt plus images in, raw response text out
//! - GeminiClient: the hosted model over HTTP
//! - load_image: resize and encode a photograph as an inline JPEG part

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::{CaptionError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// Base64-encoded image sent alongside a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

/// Anything that turns a prompt and images into response text.
///
/// Errors are classified by `CaptionError::is_fatal`; non-fatal errors
/// make the pipeline write a fallback row and continue.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, images: &[ImagePayload]) -> Result<String>;
}

/// Load a photograph, shrink it to fit `max_size` and encode as RGB JPEG.
///
/// # Arguments
/// * `path` - image file
/// * `max_size` - longest edge in pixels (aspect ratio kept)
pub fn load_image(path: &Path, max_size: u32) -> Result<ImagePayload> {
    let img = image::open(path)
        .map_err(|e| CaptionError::ImageLoad(format!("{}: {}", path.display(), e)))?;

    let img = if img.width() > max_size || img.height() > max_size {
        img.thumbnail(max_size, max_size)
    } else {
        img
    };

    // alpha and palette images are not valid JPEG input
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| CaptionError::ImageLoad(format!("{}: {}", path.display(), e)))?;

    tracing::debug!(
        "encoded {:?} as {}x{} JPEG ({} bytes)",
        path,
        rgb.width(),
        rgb.height(),
        buf.len()
    );

    Ok(ImagePayload {
        mime_type: "image/jpeg".to_string(),
        data: STANDARD.encode(&buf),
    })
}

/// Load every image that can be read; unreadable files are logged and skipped.
///
/// Fails only when none of the paths could be loaded.
pub fn load_images<P: AsRef<Path>>(paths: &[P], max_size: u32) -> Result<Vec<ImagePayload>> {
    let mut payloads = Vec::with_capacity(paths.len());
    let mut last_error = None;

    for path in paths {
        match load_image(path.as_ref(), max_size) {
            Ok(payload) => payloads.push(payload),
            Err(e) => {
                tracing::warn!("skipping image: {}", e);
                last_error = Some(e);
            }
        }
    }

    match (payloads.is_empty(), last_error) {
        (true, Some(e)) => Err(e),
        (true, None) => Err(CaptionError::ImageLoad("no images".to_string())),
        _ => Ok(payloads),
    }
}
