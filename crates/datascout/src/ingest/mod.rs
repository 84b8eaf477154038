//! File ingestion.
//!
//! Spreadsheets and delimited files become a [`DataFrame`]; documents become
//! text. The file extension, compared case-insensitively, picks the reader.

mod csv;
mod document;
mod excel;

pub use csv::{clean_csv_content, load_csv};
pub use document::{load_docx, load_pdf, load_text};
pub use excel::load_excel;

use crate::config::ScoutConfig;
use crate::error::{Result, ScoutError};
use polars::prelude::DataFrame;
use std::path::Path;
use tracing::info;

/// Contents of an uploaded file.
#[derive(Debug, Clone)]
pub enum Upload {
    /// A CSV or spreadsheet.
    Table(DataFrame),
    /// Extracted document text.
    Text(String),
}

impl Upload {
    pub fn as_table(&self) -> Option<&DataFrame> {
        match self {
            Upload::Table(df) => Some(df),
            Upload::Text(_) => None,
        }
    }

    pub fn into_table(self) -> Result<DataFrame> {
        match self {
            Upload::Table(df) => Ok(df),
            Upload::Text(_) => Err(ScoutError::NoDataLoaded),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Upload::Text(text) => Some(text),
            Upload::Table(_) => None,
        }
    }
}

/// Supported file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
    Pdf,
    Docx,
    Text,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileKind::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(FileKind::Spreadsheet),
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "txt" => Some(FileKind::Text),
            _ => None,
        }
    }
}

/// Load a file by extension.
pub fn load_file(path: &Path, config: &ScoutConfig) -> Result<Upload> {
    let Some(kind) = FileKind::from_path(path) else {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        return Err(ScoutError::UnsupportedFileType(ext));
    };

    let upload = match kind {
        FileKind::Csv => Upload::Table(load_csv(path, config)?),
        FileKind::Spreadsheet => Upload::Table(load_excel(path)?),
        FileKind::Pdf => Upload::Text(load_pdf(path)?),
        FileKind::Docx => Upload::Text(load_docx(path)?),
        FileKind::Text => Upload::Text(load_text(path)?),
    };

    match &upload {
        Upload::Table(df) => info!("Loaded {}: {} rows, {} columns", path.display(), df.height(), df.width()),
        Upload::Text(text) => info!("Loaded {}: {} characters of text", path.display(), text.chars().count()),
    }
    Ok(upload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_kind_is_case_insensitive() {
        assert_eq!(FileKind::from_path(Path::new("a/B.CSV")), Some(FileKind::Csv));
        assert_eq!(FileKind::from_path(Path::new("sheet.XlSx")), Some(FileKind::Spreadsheet));
        assert_eq!(FileKind::from_path(Path::new("notes.txt")), Some(FileKind::Text));
        assert_eq!(FileKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("program.exe"), &ScoutConfig::default()).unwrap_err();
        assert!(matches!(err, ScoutError::UnsupportedFileType(ref ext) if ext == "exe"));
    }

    #[test]
    fn test_text_upload_is_not_a_table() {
        let upload = Upload::Text("hello".to_string());
        assert_eq!(upload.as_text(), Some("hello"));
        assert!(upload.as_table().is_none());
        assert_eq!(upload.into_table().unwrap_err().error_code(), "NO_DATA_LOADED");
    }
}
