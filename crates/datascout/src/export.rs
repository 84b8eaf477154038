//! Writing results to disk: cleaned CSV, statistics CSV and a JSON run report.

use crate::error::{Result, ResultExt};
use crate::types::{CleaningReport, DatasetShape, PlanSource};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Render a DataFrame as CSV text (header included, no index column).
pub fn to_csv_string(df: &DataFrame) -> PolarsResult<String> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut frame = df.clone();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut frame)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write a DataFrame to `path` as CSV, creating parent directories.
pub fn write_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    let mut frame = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut frame)
        .context(format!("Writing {}", path.display()))?;

    info!("Saved {} rows to {}", df.height(), path.display());
    Ok(path.to_path_buf())
}

/// File name for the cleaned export of an input file, e.g. `sales_cleaned.csv`.
pub fn cleaned_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    format!("{}_cleaned.csv", stem)
}

/// Summary of one CLI run, written with `--report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub input_file: String,
    pub plan_source: PlanSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub original_shape: DatasetShape,
    pub cleaned_shape: DatasetShape,
    /// Plan text as returned by the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningReport>,
    /// Files written during the run
    pub outputs: Vec<String>,
}

impl RunReport {
    pub fn new(
        input_file: impl AsRef<Path>,
        plan_source: PlanSource,
        original_shape: DatasetShape,
        cleaned_shape: DatasetShape,
    ) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.as_ref().display().to_string(),
            plan_source,
            model: None,
            original_shape,
            cleaned_shape,
            plan: None,
            cleaning: None,
            outputs: Vec::new(),
        }
    }

    pub fn add_output(&mut self, path: impl AsRef<Path>) {
        self.outputs.push(path.as_ref().display().to_string());
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("Report saved: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_to_csv_string() {
        let df = df![
            "city" => [Some("Oslo"), None],
            "temp" => [Some(3.5), Some(-1.0)],
        ]
        .unwrap();
        let csv = to_csv_string(&df).unwrap();
        assert_eq!(csv, "city,temp\nOslo,3.5\n,-1.0\n");
    }

    #[test]
    fn test_write_csv_creates_directories() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("out.csv");
        let df = df!["a" => [1i64, 2]].unwrap();

        let written = write_csv(&df, &target).unwrap();
        assert_eq!(written, target);
        assert_eq!(fs::read_to_string(&target).unwrap(), "a\n1\n2\n");
    }

    #[test]
    fn test_cleaned_file_name() {
        assert_eq!(cleaned_file_name(Path::new("data/sales.csv")), "sales_cleaned.csv");
        assert_eq!(cleaned_file_name(Path::new("")), "data_cleaned.csv");
    }

    #[test]
    fn test_run_report_json() {
        let dir = tempdir().unwrap();
        let shape = DatasetShape { rows: 4, columns: 2 };
        let mut report = RunReport::new("in.csv", PlanSource::Fallback, shape, shape);
        report.add_output("outputs/in_cleaned.csv");

        let path = dir.path().join("report.json");
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["plan_source"], "fallback");
        assert_eq!(value["original_shape"]["rows"], 4);
        assert!(value.get("plan").is_none());
    }
}
