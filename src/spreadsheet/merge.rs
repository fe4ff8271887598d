//! Merge and deduplicate metadata exports
//!
//! Several export files (often one per collection) are stacked, rows without
//! an ID are dropped and rows sharing an ID collapse into one, taking the
//! first non-empty value per column.

use super::{Sheet, ID_COLUMNS};
use crate::error::{CaptionError, Result};
use std::collections::BTreeMap;
use std::path::Path;

fn same_header(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Stack sheets by column name and collapse rows per object ID.
///
/// The ID column comes first in the result; rows are sorted by ID.
pub fn merge_sheets(sheets: &[(String, Sheet)]) -> Result<Sheet> {
    // union of headers ignoring case, first spelling wins the position
    let mut headers: Vec<String> = Vec::new();
    for (_, sheet) in sheets {
        for header in &sheet.headers {
            if !headers.iter().any(|h| same_header(h, header)) {
                headers.push(header.trim().to_string());
            }
        }
    }

    let combined = Sheet::new(headers);
    let id_col = combined.column(ID_COLUMNS).ok_or_else(|| CaptionError::MissingColumn {
        expected: ID_COLUMNS.iter().map(|s| s.to_string()).collect(),
        file: sheets
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    })?;

    let mut order: Vec<usize> = vec![id_col];
    order.extend((0..combined.headers.len()).filter(|&i| i != id_col));

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut total = 0usize;

    for (_, sheet) in sheets {
        // position of each combined column in this sheet
        let positions: Vec<Option<usize>> = combined
            .headers
            .iter()
            .map(|h| sheet.headers.iter().position(|s| same_header(s, h)))
            .collect();

        for row in &sheet.rows {
            total += 1;
            let id = positions[id_col]
                .map(|c| sheet.cell(row, c).trim())
                .unwrap_or("");
            if id.is_empty() {
                continue;
            }

            let merged = grouped
                .entry(id.to_string())
                .or_insert_with(|| vec![String::new(); combined.headers.len()]);
            for (i, pos) in positions.iter().enumerate() {
                if merged[i].is_empty() {
                    if let Some(c) = pos {
                        merged[i] = sheet.cell(row, *c).trim().to_string();
                    }
                }
            }
        }
    }

    let mut result = Sheet::new(order.iter().map(|&i| combined.headers[i].clone()).collect());
    result.rows = grouped
        .into_values()
        .map(|row| order.iter().map(|&i| row[i].clone()).collect())
        .collect();

    tracing::info!(
        "merged {} rows from {} files into {} objects",
        total,
        sheets.len(),
        result.rows.len()
    );
    Ok(result)
}

/// Read each input, merge, and write the result as CSV.
pub fn merge_files(inputs: &[impl AsRef<Path>], output: &Path) -> Result<Sheet> {
    let mut sheets = Vec::with_capacity(inputs.len());
    for input in inputs {
        let path = input.as_ref();
        sheets.push((path.display().to_string(), super::read_sheet(path)?));
    }
    let merged = merge_sheets(&sheets)?;
    super::write_csv(&merged, output)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> Sheet {
        Sheet {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_merge_first_non_empty_per_column() {
        let a = sheet(&["T3", "t1"], &[&["", "2/2000/1"], &["Messing", "1/1996/6864"]]);
        let b = sheet(&["t1", "T3", "T14"], &[&["2/2000/1", "Holz", "1950"], &["", "Glas", ""]]);

        let merged = merge_sheets(&[("a.csv".into(), a), ("b.csv".into(), b)]).unwrap();

        assert_eq!(merged.headers, vec!["t1", "T3", "T14"]);
        assert_eq!(merged.rows.len(), 2);
        assert_eq!(merged.rows[0], vec!["1/1996/6864", "Messing", ""]);
        assert_eq!(merged.rows[1], vec!["2/2000/1", "Holz", "1950"]);
    }

    #[test]
    fn test_merge_header_case_differs() {
        let a = sheet(&["t1", "T3"], &[&["1/1", "Brass"]]);
        let b = sheet(&["T1", "t3"], &[&["2/2", "Wood"], &["1/1", "Glass"]]);

        let merged = merge_sheets(&[("a.csv".into(), a), ("b.xlsx".into(), b)]).unwrap();

        assert_eq!(merged.headers, vec!["t1", "T3"]);
        assert_eq!(merged.rows, vec![vec!["1/1", "Brass"], vec!["2/2", "Wood"]]);
    }

    #[test]
    fn test_merge_missing_id_column() {
        let a = sheet(&["name"], &[&["x"]]);
        let result = merge_sheets(&[("a.csv".into(), a)]);
        assert!(matches!(result, Err(CaptionError::MissingColumn { .. })));
    }

    #[test]
    fn test_merge_files_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, "t1,T3\n1/1,Brass\n").unwrap();
        std::fs::write(&b, "t1,T3\n1/1,Wood\n0/9,Glass\n").unwrap();
        let out = dir.path().join("merged.csv");

        let merged = merge_files(&[&a, &b], &out).unwrap();
        assert_eq!(merged.rows.len(), 2);

        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(content, "t1,T3\n0/9,Glass\n1/1,Brass\n");
    }
}
