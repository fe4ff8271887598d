//! Spreadsheet input/output
//!
//! CSV and Excel files are loaded into a plain `Sheet` (header row + string
//! cells). Columns are located case-insensitively through allow-lists, so
//! `t1`, `T1` and a cleaned `ID` column all serve as the object ID.

pub mod clean;
pub mod merge;

use crate::error::{CaptionError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use museum_caption_common::types::{or_not_available, Metadata};
use std::path::Path;

pub const ID_COLUMNS: &[&str] = &["t1", "ID", "Object ID"];
pub const PATH_COLUMNS: &[&str] = &["T13", "Image_Path"];
pub const MANUFACTURER_COLUMNS: &[&str] = &["T2", "Manufacturer"];
pub const MATERIAL_COLUMNS: &[&str] = &["T3", "Material"];
pub const DIMENSIONS_COLUMNS: &[&str] = &["T5", "Dimensions"];
pub const WEIGHT_COLUMNS: &[&str] = &["T6", "Weight"];
pub const NOTES_COLUMNS: &[&str] = &["T7", "Notes"];
pub const LOCATION_COLUMNS: &[&str] = &["T8", "Location"];
pub const DATE_COLUMNS: &[&str] = &["T14", "Year", "Date"];

/// Metadata fields joined to image groups in the enrichment run
pub const ENRICHMENT_FIELDS: &[(&str, &[&str])] = &[
    ("material", MATERIAL_COLUMNS),
    ("dimensions", DIMENSIONS_COLUMNS),
    ("date", DATE_COLUMNS),
];

/// Tabular file contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Index of the first header matching the allow-list, ignoring case.
    pub fn column(&self, allowed: &[&str]) -> Option<usize> {
        allowed.iter().find_map(|name| {
            self.headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        })
    }

    /// Like `column`, but a missing column is a configuration error.
    pub fn require_column(&self, allowed: &[&str], source: &Path) -> Result<usize> {
        self.column(allowed).ok_or_else(|| CaptionError::MissingColumn {
            expected: allowed.iter().map(|s| s.to_string()).collect(),
            file: source.display().to_string(),
        })
    }

    /// Cell value, empty when the row is shorter than the header.
    pub fn cell<'a>(&self, row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Load a CSV or Excel file (first worksheet).
pub fn read_sheet(path: &Path) -> Result<Sheet> {
    if !path.is_file() {
        return Err(CaptionError::FileNotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let sheet = match extension.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_excel(path)?,
        _ => read_csv(path)?,
    };

    tracing::debug!(
        "loaded {:?}: {} columns, {} rows",
        path,
        sheet.headers.len(),
        sheet.rows.len()
    );
    Ok(sheet)
}

fn read_csv(path: &Path) -> Result<Sheet> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}').to_string() } else { h.to_string() })
        .collect();

    let mut sheet = Sheet::new(headers);
    for record in reader.records() {
        let record = record?;
        let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        row.resize(sheet.headers.len().max(row.len()), String::new());
        sheet.rows.push(row);
    }
    Ok(sheet)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // whole numbers (years, inventory numbers) without ".0"
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn read_excel(path: &Path) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| CaptionError::Spreadsheet(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CaptionError::Spreadsheet(format!("{}: no worksheet", path.display())))?
        .map_err(|e| CaptionError::Spreadsheet(format!("{}: {}", path.display(), e)))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(cell_to_string).collect())
        .unwrap_or_default();

    let mut sheet = Sheet::new(headers);
    sheet.rows = rows.map(|r| r.iter().map(cell_to_string).collect()).collect();
    Ok(sheet)
}

/// Write a sheet as UTF-8 CSV with header row.
pub fn write_csv(sheet: &Sheet, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&sheet.headers)?;
    for row in &sheet.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Column positions used to build the metadata lookup
#[derive(Debug, Clone)]
pub struct MetadataColumns {
    pub id: usize,
    pub fields: Vec<(&'static str, Option<usize>)>,
}

impl MetadataColumns {
    /// Locate the ID column (required) and the enrichment fields (optional).
    pub fn locate(sheet: &Sheet, source: &Path) -> Result<Self> {
        let id = sheet.require_column(ID_COLUMNS, source)?;
        let fields = ENRICHMENT_FIELDS
            .iter()
            .map(|(name, allowed)| (*name, sheet.column(allowed)))
            .collect();
        Ok(Self { id, fields })
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(name, _)| *name).collect()
    }
}

/// (raw ID, metadata) pairs in row order; blank or missing values become `"N/A"`.
pub fn metadata_rows(sheet: &Sheet, columns: &MetadataColumns) -> Vec<(String, Metadata)> {
    sheet
        .rows
        .iter()
        .map(|row| {
            let metadata = columns
                .fields
                .iter()
                .map(|(name, col)| {
                    let value = col.map(|c| sheet.cell(row, c)).unwrap_or("");
                    (name.to_string(), or_not_available(value))
                })
                .collect();
            (sheet.cell(row, columns.id).to_string(), metadata)
        })
        .collect()
}
