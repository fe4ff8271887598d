//! Object identity resolution
//!
//! Joins spreadsheet rows to photographs through naming conventions:
//! - Inventory numbers are canonicalized (`1/1996/6864 0` → `1-1996-6864`)
//! - Photos are grouped by the first 4 hyphen-separated segments of their stem
//! - A group is matched to a row by the first 3 segments of its group key
//!
//! The spreadsheet ID convention is one level coarser than the photo naming,
//! so the segment counts must stay 4 (grouping) and 3 (lookup).

use crate::types::{or_not_available, Metadata, ObjectRecord, NOT_AVAILABLE};
use std::collections::BTreeMap;
use std::path::Path;

/// Segments forming the photo group key
pub const GROUP_SEGMENTS: usize = 4;

/// Segments forming the metadata lookup key
pub const LOOKUP_SEGMENTS: usize = 3;

/// Images forwarded per object unless configured otherwise
pub const DEFAULT_MAX_IMAGES: usize = 4;

/// Canonical key → metadata, first occurrence wins
pub type LookupTable = BTreeMap<String, Metadata>;

/// Group key → sorted image paths
pub type ImageGroups = BTreeMap<String, Vec<String>>;

/// Normalize a free-text inventory number into a canonical object key.
///
/// Trims, replaces every `/` with `-` and keeps the part before the first
/// whitespace. Blank input yields an empty string, which callers must exclude.
///
/// # Examples
/// ```
/// use museum_caption_common::canonicalize_id;
///
/// assert_eq!(canonicalize_id("1/1996/6864 0"), "1-1996-6864");
/// ```
pub fn canonicalize_id(raw: &str) -> String {
    raw.trim()
        .replace('/', "-")
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_string()
}

/// Build the canonical key → metadata table from spreadsheet rows.
///
/// Rows whose ID canonicalizes to an empty key are skipped. When two rows
/// share a key the first one is kept and the later one is discarded without
/// comparing their metadata.
pub fn build_lookup<I, S>(rows: I) -> LookupTable
where
    I: IntoIterator<Item = (S, Metadata)>,
    S: AsRef<str>,
{
    let mut lookup = LookupTable::new();
    for (raw_id, metadata) in rows {
        let key = canonicalize_id(raw_id.as_ref());
        if key.is_empty() {
            continue;
        }
        lookup.entry(key).or_insert(metadata);
    }
    lookup
}

/// First `count` hyphen-separated segments of `name`, or `None` if it has fewer.
fn leading_segments(name: &str, count: usize) -> Option<String> {
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() < count {
        return None;
    }
    Some(parts[..count].join("-"))
}

fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Group key of an image file name (first 4 segments of the stem, case preserved).
pub fn group_key(file_name: &str) -> Option<String> {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    leading_segments(file_stem(name), GROUP_SEGMENTS)
}

/// Metadata lookup key for a group key (its first 3 segments).
pub fn lookup_key(group_key: &str) -> Option<String> {
    leading_segments(group_key, LOOKUP_SEGMENTS)
}

/// Group image paths by object.
///
/// Files with fewer than four segments in their stem are left out. Paths in
/// each group are sorted lexicographically.
pub fn group_images_by_object<I, S>(paths: I) -> ImageGroups
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups = ImageGroups::new();
    for path in paths {
        let path = path.as_ref();
        if let Some(key) = group_key(path) {
            groups.entry(key).or_default().push(path.to_string());
        }
    }
    for images in groups.values_mut() {
        images.sort();
    }
    groups
}

/// Find the spreadsheet metadata for an image file name.
pub fn match_image_to_record<'a>(image_file_name: &str, lookup: &'a LookupTable) -> Option<&'a Metadata> {
    let group = group_key(image_file_name)?;
    let key = lookup_key(&group)?;
    lookup.get(&key)
}

/// Match/miss counts of one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Image groups found
    pub groups: usize,
    /// Groups with a spreadsheet row
    pub matched: usize,
    /// Groups without a spreadsheet row
    pub unmatched: usize,
    /// Spreadsheet rows no group referenced
    pub unused_rows: usize,
}

/// Turn image groups into object records joined with spreadsheet metadata.
///
/// Every group yields a record; unmatched groups carry `"N/A"` for each of
/// `fields`. At most `max_images` paths are kept per record.
pub fn resolve_objects(
    groups: &ImageGroups,
    lookup: &LookupTable,
    fields: &[&str],
    max_images: usize,
) -> (Vec<ObjectRecord>, ResolutionStats) {
    let mut stats = ResolutionStats {
        groups: groups.len(),
        ..Default::default()
    };
    let mut used_keys = std::collections::BTreeSet::new();

    let records = groups
        .iter()
        .map(|(group, images)| {
            let found = lookup_key(group).and_then(|key| {
                let metadata = lookup.get(&key)?;
                used_keys.insert(key);
                Some(metadata)
            });

            let metadata: Metadata = fields
                .iter()
                .map(|field| {
                    let value = found
                        .and_then(|m| m.get(*field))
                        .map(|v| or_not_available(v))
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                    (field.to_string(), value)
                })
                .collect();

            if found.is_some() {
                stats.matched += 1;
            } else {
                stats.unmatched += 1;
            }

            ObjectRecord {
                object_key: group.clone(),
                metadata,
                image_paths: images.iter().take(max_images).cloned().collect(),
                matched: found.is_some(),
            }
        })
        .collect();

    stats.unused_rows = lookup.len() - used_keys.len();
    (records, stats)
}

/// File names referenced by a path cell.
///
/// Cells hold one path per line, often with Windows separators; only the
/// final component of each non-blank line is returned.
pub fn path_fragments(cell: &str) -> Vec<String> {
    cell.replace("\\\\", "\\")
        .replace('\r', "")
        .lines()
        .map(|line| line.trim().replace('\\', "/"))
        .filter_map(|line| {
            Path::new(&line)
                .file_name()
                .and_then(|s| s.to_str())
                .map(|s| s.trim().to_string())
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Lower-cased 3-segment identifier of a referenced file name.
///
/// Used to find photographs on disk by prefix; names with fewer than three
/// segments are not identifiable.
pub fn file_identifier(file_name: &str) -> Option<String> {
    leading_segments(file_name, LOOKUP_SEGMENTS).map(|s| s.to_lowercase())
}

/// Four-digit year segment of a raw inventory number (`1/1996/6864` → `1996`).
pub fn year_segment(raw_id: &str) -> Option<&str> {
    raw_id
        .split('/')
        .map(str::trim)
        .find(|part| part.len() == 4 && part.chars().all(|c| c.is_ascii_digit()))
}
