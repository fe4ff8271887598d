//! Copy the photographs referenced by a metadata export

use crate::error::{CaptionError, Result};
use crate::spreadsheet::{Sheet, PATH_COLUMNS};
use museum_caption_common::identity::{file_identifier, path_fragments};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome of a copy pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub identifiers: usize,
    pub copied: Vec<PathBuf>,
    /// Matching files skipped because the name was already copied
    pub duplicates: usize,
}

/// Lower-cased 3-segment identifiers of every file named in the path column.
pub fn referenced_identifiers(sheet: &Sheet, source: &Path) -> Result<BTreeSet<String>> {
    let col = sheet.require_column(PATH_COLUMNS, source)?;
    Ok(sheet
        .rows
        .iter()
        .flat_map(|row| path_fragments(sheet.cell(row, col)))
        .filter_map(|name| file_identifier(&name))
        .collect())
}

/// Copy files whose lower-cased name starts with a referenced identifier.
///
/// Source folders are searched in order (top level only); a file name is
/// copied at most once.
pub fn copy_images_by_id(
    identifiers: &BTreeSet<String>,
    sources: &[PathBuf],
    target: &Path,
) -> Result<CopyReport> {
    for source in sources {
        if !source.is_dir() {
            return Err(CaptionError::FolderNotFound(source.display().to_string()));
        }
    }
    std::fs::create_dir_all(target)?;

    let mut report = CopyReport {
        identifiers: identifiers.len(),
        ..Default::default()
    };
    let mut copied_names = BTreeSet::new();

    for source in sources {
        let mut entries: Vec<_> = WalkDir::new(source)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .collect();
        entries.sort_by(|a, b| a.file_name().cmp(b.file_name()));

        for entry in entries {
            let name = entry.file_name().to_string_lossy().to_string();
            let lower = name.to_lowercase();
            if !identifiers.iter().any(|id| lower.starts_with(id.as_str())) {
                continue;
            }
            if !copied_names.insert(name.clone()) {
                report.duplicates += 1;
                continue;
            }

            let destination = target.join(&name);
            std::fs::copy(entry.path(), &destination)?;
            tracing::debug!("copied {:?} -> {:?}", entry.path(), destination);
            report.copied.push(destination);
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_identifiers() {
        let sheet = Sheet {
            headers: vec!["t1".into(), "T13".into()],
            rows: vec![
                vec!["1/1996/6864".into(), "D:\\Bilder\\1-1996-6864-000.JPG\nD:\\Bilder\\1-1996-6864-001.JPG".into()],
                vec!["x".into(), "notes.txt".into()],
                vec!["y".into(), "".into()],
            ],
        };
        let ids = referenced_identifiers(&sheet, Path::new("data.csv")).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["1-1996-6864"]);
    }

    #[test]
    fn test_copy_once_per_name() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("1996");
        let b = dir.path().join("2024");
        let target = dir.path().join("final_pictures");
        std::fs::create_dir_all(&a).unwrap();
        std::fs::create_dir_all(&b).unwrap();
        std::fs::write(a.join("1-1996-6864-000.JPG"), b"a").unwrap();
        std::fs::write(a.join("9-9999-0000-000.jpg"), b"a").unwrap();
        std::fs::write(b.join("1-1996-6864-000.JPG"), b"b").unwrap();
        std::fs::write(b.join("1-1996-6864-001.jpg"), b"b").unwrap();

        let ids: BTreeSet<String> = ["1-1996-6864".to_string()].into_iter().collect();
        let report = copy_images_by_id(&ids, &[a, b], &target).unwrap();

        assert_eq!(report.copied.len(), 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(std::fs::read(target.join("1-1996-6864-000.JPG")).unwrap(), b"a");
        assert!(!target.join("9-9999-0000-000.jpg").exists());
    }

    #[test]
    fn test_copy_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = copy_images_by_id(&BTreeSet::new(), &[dir.path().join("nope")], dir.path());
        assert!(matches!(result, Err(CaptionError::FolderNotFound(_))));
    }
}
