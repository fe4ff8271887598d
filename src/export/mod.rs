//! Incremental result output
//!
//! A `RowSink` is opened once per run with the header row and receives one
//! row per object. CSV rows are flushed immediately so an interrupted run
//! keeps everything written so far; Excel workbooks are saved on `finish`.

use crate::error::Result;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs::File;
use std::path::{Path, PathBuf};

/// `.xlsx` output is written as a workbook, anything else as CSV.
pub fn is_excel_path(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false)
}

enum SinkKind {
    Csv(csv::Writer<File>),
    Excel {
        worksheet: Worksheet,
        next_row: u32,
    },
}

pub struct RowSink {
    path: PathBuf,
    columns: usize,
    rows: usize,
    kind: SinkKind,
}

impl RowSink {
    /// Create the output file and write the header row.
    pub fn create(path: &Path, headers: &[String]) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let kind = if is_excel_path(path) {
            let mut worksheet = Worksheet::new();
            let bold = Format::new().set_bold();
            for (col, header) in headers.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, header.as_str(), &bold)?;
            }
            SinkKind::Excel { worksheet, next_row: 1 }
        } else {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(headers)?;
            writer.flush()?;
            SinkKind::Csv(writer)
        };

        tracing::debug!("opened {:?} with {} columns", path, headers.len());
        Ok(Self {
            path: path.to_path_buf(),
            columns: headers.len(),
            rows: 0,
            kind,
        })
    }

    /// Append one row; short rows are padded with empty cells.
    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        let mut cells: Vec<&str> = row.iter().map(|s| s.as_str()).collect();
        cells.resize(self.columns.max(cells.len()), "");

        match &mut self.kind {
            SinkKind::Csv(writer) => {
                writer.write_record(&cells)?;
                writer.flush()?;
            }
            SinkKind::Excel { worksheet, next_row } => {
                for (col, value) in cells.iter().enumerate() {
                    worksheet.write_string(*next_row, col as u16, *value)?;
                }
                *next_row += 1;
            }
        }

        self.rows += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    /// Flush (CSV) or save the workbook (Excel).
    pub fn finish(self) -> Result<()> {
        match self.kind {
            SinkKind::Csv(mut writer) => writer.flush()?,
            SinkKind::Excel { worksheet, .. } => {
                let mut workbook = Workbook::new();
                workbook.push_worksheet(worksheet);
                workbook.save(&self.path)?;
            }
        }
        tracing::info!("wrote {} rows to {:?}", self.rows, self.path);
        Ok(())
    }
}
