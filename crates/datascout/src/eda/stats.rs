//! Descriptive statistics per column.

use crate::types::ColumnKind;
use crate::utils::{
    DtypeCategory, column_kind, format_number, get_dtype_category, mean, non_null_numeric,
    quantile_sorted, sample_std, value_frequencies,
};
use crate::config::DEFAULT_CATEGORICAL_MAX_DISTINCT;
use polars::prelude::*;
use serde::Serialize;

/// Summary of one column.
///
/// Numeric columns fill `mean` through `max`; every other column fills
/// `unique`, `top` and `freq`. `count` is the number of non-missing values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub dtype: String,
    pub kind: ColumnKind,
    pub count: usize,
    pub unique: Option<usize>,
    pub top: Option<String>,
    pub freq: Option<usize>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    fn empty(series: &Series, kind: ColumnKind) -> Self {
        Self {
            column: series.name().to_string(),
            dtype: series.dtype().to_string(),
            kind,
            count: series.len() - series.null_count(),
            unique: None,
            top: None,
            freq: None,
            mean: None,
            std: None,
            min: None,
            q25: None,
            q50: None,
            q75: None,
            max: None,
        }
    }
}

/// Statistics for every column, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsTable {
    pub rows: usize,
    pub columns: Vec<ColumnStats>,
}

impl StatsTable {
    pub fn get(&self, column: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// One row per column, one statistic per frame column.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let stat = |f: fn(&ColumnStats) -> Option<f64>| -> Vec<Option<f64>> {
            self.columns.iter().map(f).collect()
        };

        DataFrame::new(vec![
            Series::new(
                "column".into(),
                self.columns.iter().map(|c| c.column.clone()).collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new(
                "count".into(),
                self.columns.iter().map(|c| c.count as u64).collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new(
                "unique".into(),
                self.columns
                    .iter()
                    .map(|c| c.unique.map(|u| u as u64))
                    .collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new(
                "top".into(),
                self.columns.iter().map(|c| c.top.clone()).collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new(
                "freq".into(),
                self.columns
                    .iter()
                    .map(|c| c.freq.map(|f| f as u64))
                    .collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new("mean".into(), stat(|c| c.mean)).into_column(),
            Series::new("std".into(), stat(|c| c.std)).into_column(),
            Series::new("min".into(), stat(|c| c.min)).into_column(),
            Series::new("25%".into(), stat(|c| c.q25)).into_column(),
            Series::new("50%".into(), stat(|c| c.q50)).into_column(),
            Series::new("75%".into(), stat(|c| c.q75)).into_column(),
            Series::new("max".into(), stat(|c| c.max)).into_column(),
        ])
    }
}

impl std::fmt::Display for StatsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: Option<f64>| v.map(format_number).unwrap_or_else(|| "-".to_string());
        writeln!(f, "{} rows × {} columns", self.rows, self.columns.len())?;
        for c in &self.columns {
            match c.kind {
                ColumnKind::Numeric => writeln!(
                    f,
                    "  {} ({}): count={} mean={} std={} min={} 25%={} 50%={} 75%={} max={}",
                    c.column,
                    c.dtype,
                    c.count,
                    show(c.mean),
                    show(c.std),
                    show(c.min),
                    show(c.q25),
                    show(c.q50),
                    show(c.q75),
                    show(c.max)
                )?,
                _ => writeln!(
                    f,
                    "  {} ({}): count={} unique={} top={} freq={}",
                    c.column,
                    c.dtype,
                    c.count,
                    c.unique.unwrap_or(0),
                    c.top.as_deref().unwrap_or("-"),
                    c.freq.unwrap_or(0)
                )?,
            }
        }
        Ok(())
    }
}

/// Compute descriptive statistics for every column of `df`.
pub fn basic_stats(df: &DataFrame) -> PolarsResult<StatsTable> {
    basic_stats_with(df, DEFAULT_CATEGORICAL_MAX_DISTINCT)
}

/// [`basic_stats`] with a custom limit of distinct values for a text
/// column to count as categorical.
pub fn basic_stats_with(df: &DataFrame, categorical_max_distinct: usize) -> PolarsResult<StatsTable> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let stats = if get_dtype_category(series.dtype()) == DtypeCategory::Numeric {
            numeric_stats(series)?
        } else {
            let kind = column_kind(series, categorical_max_distinct);
            categorical_stats(series, kind)?
        };
        columns.push(stats);
    }
    Ok(StatsTable {
        rows: df.height(),
        columns,
    })
}

fn numeric_stats(series: &Series) -> PolarsResult<ColumnStats> {
    let mut stats = ColumnStats::empty(series, ColumnKind::Numeric);
    let mut values = non_null_numeric(series)?;
    // NaN produced by coercion is missing, not a value.
    stats.count = values.len();
    if values.is_empty() {
        return Ok(stats);
    }
    values.sort_by(|a, b| a.total_cmp(b));

    stats.mean = mean(&values);
    stats.std = sample_std(&values);
    stats.min = values.first().copied();
    stats.q25 = quantile_sorted(&values, 0.25);
    stats.q50 = quantile_sorted(&values, 0.5);
    stats.q75 = quantile_sorted(&values, 0.75);
    stats.max = values.last().copied();
    Ok(stats)
}

fn categorical_stats(series: &Series, kind: ColumnKind) -> PolarsResult<ColumnStats> {
    let mut stats = ColumnStats::empty(series, kind);
    let frequencies = value_frequencies(series)?;
    stats.unique = Some(frequencies.len());

    // First-encountered value wins a tie.
    let mut top: Option<&(String, usize)> = None;
    for entry in &frequencies {
        if top.is_none_or(|t| entry.1 > t.1) {
            top = Some(entry);
        }
    }
    if let Some((value, count)) = top {
        stats.top = Some(value.clone());
        stats.freq = Some(*count);
    }
    Ok(stats)
}
