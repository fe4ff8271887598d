//! ZIP input support
//!
//! Image sets are often delivered as a single archive; it is unpacked into a
//! temporary directory and scanned like a folder.

use crate::error::Result;
use std::fs::File;
use std::path::Path;
use tempfile::TempDir;

pub fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Extract an archive into a fresh temporary directory.
pub fn extract_archive(path: &Path) -> Result<TempDir> {
    let dir = tempfile::Builder::new().prefix("museum-caption-").tempdir()?;
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    tracing::debug!("extracting {} entries from {:?} to {:?}", archive.len(), path, dir.path());
    archive.extract(dir.path())?;

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[&str]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for name in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(b"dummy").unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_is_zip() {
        assert!(is_zip(Path::new("photos.zip")));
        assert!(is_zip(Path::new("photos.ZIP")));
        assert!(!is_zip(Path::new("photos")));
        assert!(!is_zip(Path::new("photos.tar")));
    }

    #[test]
    fn test_extract_and_scan_archive() {
        let temp_dir = tempfile::tempdir().unwrap();
        let zip_path = temp_dir.path().join("photos.zip");
        write_zip(&zip_path, &[
            "batch/1-1996-6864-000-a.jpg",
            "batch/notes.txt",
            "__MACOSX/batch/._1-1996-6864-000-a.jpg",
        ]);

        let source = crate::scanner::ImageSource::open(&zip_path, false).unwrap();
        assert_eq!(source.images.len(), 1);
        assert_eq!(source.images[0].file_name, "1-1996-6864-000-a.jpg");
    }
}
