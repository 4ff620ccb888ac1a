//! Spreadsheet export of flat report rows.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid export file name: {0:?}")]
    InvalidFileName(String),

    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of an export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing to export; no file was produced.
    Skipped,
    Written {
        path: PathBuf,
        sheet_name: String,
        rows: usize,
    },
}

/// Converts an ordered sequence of flat rows into a tabular file.
///
/// Column headers come from the first record's keys, so every record must
/// share the same shape.
pub trait SpreadsheetExporter {
    fn export<T: Serialize>(
        &self,
        records: &[T],
        file_name: &str,
        sheet_name: &str,
    ) -> Result<ExportOutcome, ExportError>;
}

/// Resolve `<out_dir>/<file_name>.<extension>`, creating `out_dir`.
fn target_path(out_dir: &Path, file_name: &str, extension: &str) -> Result<PathBuf, ExportError> {
    if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name == ".." {
        return Err(ExportError::InvalidFileName(file_name.to_string()));
    }

    std::fs::create_dir_all(out_dir)?;
    Ok(out_dir.join(format!("{file_name}.{extension}")))
}

fn written(path: PathBuf, sheet_name: &str, rows: usize) -> ExportOutcome {
    tracing::info!(path = %path.display(), sheet_name, rows, "spreadsheet exported");
    ExportOutcome::Written {
        path,
        sheet_name: sheet_name.to_string(),
        rows,
    }
}

/// Writes `<out_dir>/<file_name>.xlsx` with a single worksheet named
/// `sheet_name`. The header row holds the first record's field names.
#[derive(Debug, Clone)]
pub struct XlsxExporter {
    out_dir: PathBuf,
}

impl XlsxExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl SpreadsheetExporter for XlsxExporter {
    fn export<T: Serialize>(
        &self,
        records: &[T],
        file_name: &str,
        sheet_name: &str,
    ) -> Result<ExportOutcome, ExportError> {
        let Some(first) = records.first() else {
            tracing::warn!(file_name, "no data to export");
            return Ok(ExportOutcome::Skipped);
        };

        let path = target_path(&self.out_dir, file_name, "xlsx")?;

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name)?;
        worksheet.serialize_headers(0, 0, first)?;
        for record in records {
            worksheet.serialize(record)?;
        }
        workbook.save(&path)?;

        Ok(written(path, sheet_name, records.len()))
    }
}

/// Writes `<out_dir>/<file_name>.csv`.
///
/// CSV has no sheets; the sheet name is only reported back in the outcome.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    out_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl SpreadsheetExporter for CsvExporter {
    fn export<T: Serialize>(
        &self,
        records: &[T],
        file_name: &str,
        sheet_name: &str,
    ) -> Result<ExportOutcome, ExportError> {
        if records.is_empty() {
            tracing::warn!(file_name, "no data to export");
            return Ok(ExportOutcome::Skipped);
        }

        let path = target_path(&self.out_dir, file_name, "csv")?;

        let mut writer = csv::Writer::from_path(&path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        Ok(written(path, sheet_name, records.len()))
    }
}
