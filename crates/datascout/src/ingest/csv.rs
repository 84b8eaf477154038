//! Delimited text loading with fallback strategies.

use crate::config::ScoutConfig;
use crate::error::{Result, ScoutError};
use crate::utils::MISSING_MARKERS;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

const INFER_SCHEMA_ROWS: usize = 100;

fn read_options(n_rows: Option<usize>, quote: Option<u8>) -> CsvReadOptions {
    let null_values = NullValues::AllColumns(MISSING_MARKERS.iter().map(|m| (*m).into()).collect());
    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_n_rows(n_rows)
        .with_parse_options(
            CsvParseOptions::default()
                .with_quote_char(quote)
                .with_null_values(Some(null_values)),
        )
}

/// Row limit for `path`, if the file is large enough to be read partially.
fn row_limit(path: &Path, config: &ScoutConfig) -> Option<usize> {
    let size_mb = std::fs::metadata(path).ok()?.len() as f64 / (1024.0 * 1024.0);
    if size_mb > config.large_file_threshold_mb {
        warn!(
            "Large file detected ({:.0} MB), reading the first {} rows",
            size_mb, config.large_file_row_limit
        );
        Some(config.large_file_row_limit)
    } else {
        None
    }
}

/// Load a CSV file.
///
/// Tries a standard read with quote handling, then a read without quote
/// handling, then a read of pre-cleaned content. The last error is returned
/// when all three fail.
pub fn load_csv(path: &Path, config: &ScoutConfig) -> Result<DataFrame> {
    let n_rows = row_limit(path, config);

    match read_options(n_rows, Some(b'"'))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    match read_options(n_rows, None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading without quotes failed: {}", e),
    }

    let content = std::fs::read_to_string(path).map_err(|e| ScoutError::file_read(path, e))?;
    read_options(n_rows, Some(b'"'))
        .into_reader_with_file_handle(Cursor::new(clean_csv_content(&content)))
        .finish()
        .map_err(|e| ScoutError::file_read(path, e))
}

/// Collapse doubled quotes and drop blank lines.
pub fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_markers_read_as_null() {
        let file = write_csv("name,score\nann,1.5\nbob,NA\nN/A,null\ncid,#N/A\n");
        let df = load_csv(file.path(), &ScoutConfig::default()).unwrap();

        assert_eq!(df.shape(), (4, 2));
        assert_eq!(df.column("score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("score").unwrap().null_count(), 3);
        assert_eq!(df.column("name").unwrap().null_count(), 1);
    }

    #[test]
    fn test_row_limit_for_large_files() {
        let file = write_csv("a\n1\n2\n3\n4\n");
        let config = ScoutConfig::builder()
            .large_file_threshold_mb(1e-9)
            .large_file_row_limit(2)
            .build()
            .unwrap();

        let df = load_csv(file.path(), &config).unwrap();
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_clean_csv_content() {
        let cleaned = clean_csv_content("a,b\n\n\"\"x\"\",1\n   \n");
        assert_eq!(cleaned, "a,b\n\"x\",1");
    }

    #[test]
    fn test_missing_file_is_file_read_error() {
        let err = load_csv(Path::new("/no/such/file.csv"), &ScoutConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "FILE_READ_FAILED");
    }
}
