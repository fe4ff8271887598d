mod archive;
pub mod copy;

pub use archive::{extract_archive, is_zip};
pub use copy::{copy_images_by_id, referenced_identifiers, CopyReport};

use crate::error::{CaptionError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Check if a file extension is a supported image format
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// macOS archive metadata (`__MACOSX/`, `._photo.jpg`)
fn is_resource_fork(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == "__MACOSX")
        || path
            .file_name()
            .map(|n| n.to_string_lossy().starts_with("._"))
            .unwrap_or(false)
}

pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(CaptionError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || is_resource_fork(path) {
            continue;
        }

        let is_image = path
            .extension()
            .map(|ext| is_image_extension(&ext.to_string_lossy()))
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        images.push(ImageInfo {
            path: path.to_path_buf(),
            file_name,
        });
    }

    // file name order, path as tie-break for recursive scans
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name).then_with(|| a.path.cmp(&b.path)));

    Ok(images)
}

/// Images of a folder or ZIP archive
///
/// Archives are extracted into a temporary directory that lives as long as
/// this value.
pub struct ImageSource {
    pub images: Vec<ImageInfo>,
    _extracted: Option<TempDir>,
}

impl ImageSource {
    /// Folders are scanned at the top level unless `recursive`; archives
    /// always recursively.
    pub fn open(input: &Path, recursive: bool) -> Result<Self> {
        if input.is_file() && is_zip(input) {
            let dir = extract_archive(input)?;
            let images = scan_folder(dir.path(), true)?;
            return Ok(Self {
                images,
                _extracted: Some(dir),
            });
        }

        if !input.exists() {
            return Err(CaptionError::FileNotFound(input.display().to_string()));
        }

        Ok(Self {
            images: scan_folder(input, recursive)?,
            _extracted: None,
        })
    }
}
