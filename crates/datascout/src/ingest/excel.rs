//! Spreadsheet loading through calamine.

use crate::error::{Result, ScoutError};
use crate::utils::is_missing_marker;
use calamine::{Data, DataType as _, Reader, open_workbook_auto};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Column type inferred from the cells under a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellColumn {
    Int,
    Float,
    Bool,
    Datetime,
    Text,
}

/// Load the first worksheet of a workbook; the first row is the header.
pub fn load_excel(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ScoutError::file_read(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ScoutError::file_read(path, "workbook has no worksheets"))?
        .map_err(|e| ScoutError::file_read(path, e))?;

    let rows: Vec<&[Data]> = range.rows().collect();
    let Some((header, body)) = rows.split_first() else {
        return Ok(DataFrame::empty());
    };
    debug!("Worksheet has {} data rows and {} columns", body.len(), header.len());

    let mut columns = Vec::with_capacity(header.len());
    for (idx, name) in header_names(header).into_iter().enumerate() {
        let cells: Vec<Option<&Data>> = body.iter().map(|row| row.get(idx)).collect();
        let series = column_series(&name, &cells).map_err(|e| ScoutError::file_read(path, e))?;
        columns.push(series.into_column());
    }

    DataFrame::new(columns).map_err(|e| ScoutError::file_read(path, e))
}

/// Column names from the header row.
///
/// Blank headers become `column_<n>`; repeated names get a `.1`, `.2`, ...
/// suffix so every column stays addressable.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(header.len());
    let mut repeats: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(header.len());
    for (idx, cell) in header.iter().enumerate() {
        let base = match cell.as_string() {
            Some(name) if !name.trim().is_empty() => name,
            _ => format!("column_{}", idx + 1),
        };
        let mut name = base.clone();
        while used.contains(&name) {
            let n = repeats.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{}.{}", base, n);
        }
        used.insert(name.clone());
        names.push(name);
    }
    names
}

/// Empty cells, error cells and text such as `NA` are missing.
fn is_missing(cell: &Data) -> bool {
    match cell {
        Data::Empty | Data::Error(_) => true,
        Data::String(s) => is_missing_marker(s),
        _ => false,
    }
}

fn infer_column(cells: &[Option<&Data>]) -> CellColumn {
    let (mut int, mut float, mut boolean, mut datetime) = (false, false, false, false);
    for cell in cells.iter().flatten().filter(|c| !is_missing(c)) {
        match cell {
            Data::Int(_) => int = true,
            Data::Float(_) => float = true,
            Data::Bool(_) => boolean = true,
            Data::DateTime(_) | Data::DateTimeIso(_) => datetime = true,
            _ => return CellColumn::Text,
        }
    }

    match (int || float, boolean, datetime) {
        (true, false, false) if float && !all_whole(cells) => CellColumn::Float,
        (true, false, false) => CellColumn::Int,
        (false, true, false) => CellColumn::Bool,
        (false, false, true) => CellColumn::Datetime,
        _ => CellColumn::Text,
    }
}

fn all_whole(cells: &[Option<&Data>]) -> bool {
    cells
        .iter()
        .flatten()
        .filter_map(|c| c.as_f64())
        .all(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
}

fn present<'a>(cell: &Option<&'a Data>) -> Option<&'a Data> {
    cell.filter(|c| !is_missing(c))
}

/// Text form of a cell in a mixed column.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => Some(
            cell.as_datetime()
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| cell.to_string()),
        ),
        _ => cell.as_string().or_else(|| Some(cell.to_string())),
    }
}

fn column_series(name: &str, cells: &[Option<&Data>]) -> PolarsResult<Series> {
    let series = match infer_column(cells) {
        CellColumn::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| present(c).and_then(|cell| cell.as_f64()).map(|f| f as i64))
                .collect();
            Series::new(name.into(), values)
        }
        CellColumn::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| present(c).and_then(|cell| cell.as_f64()))
                .collect();
            Series::new(name.into(), values)
        }
        CellColumn::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| present(c).and_then(|cell| cell.get_bool()))
                .collect();
            Series::new(name.into(), values)
        }
        CellColumn::Datetime => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| {
                    present(c)
                        .and_then(|cell| cell.as_datetime())
                        .map(|dt| dt.and_utc().timestamp_millis())
                })
                .collect();
            Series::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        CellColumn::Text => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|c| present(c).and_then(cell_text))
                .collect();
            Series::new(name.into(), values)
        }
    };
    Ok(series)
}
