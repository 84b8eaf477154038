//! Shared utilities for DataScout.
//!
//! This module contains common helper functions used across the ingestor,
//! the plan interpreter and the summary code.

use crate::types::ColumnKind;
use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Date or datetime types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    is_numeric_dtype(dtype) && !matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

/// Infer the scalar kind of a column.
///
/// Numeric dtypes are `Numeric`. String and boolean columns with at most
/// `categorical_max_distinct` distinct non-null values are `Categorical`;
/// everything else is `Text`.
pub fn column_kind(series: &Series, categorical_max_distinct: usize) -> ColumnKind {
    match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric => ColumnKind::Numeric,
        DtypeCategory::String | DtypeCategory::Boolean => {
            let distinct = render_values(series)
                .map(|values| {
                    let mut seen = std::collections::HashSet::new();
                    values.into_iter().flatten().filter(|v| seen.insert(v.clone())).count()
                })
                .unwrap_or(usize::MAX);
            if distinct <= categorical_max_distinct {
                ColumnKind::Categorical
            } else {
                ColumnKind::Text
            }
        }
        _ => ColumnKind::Text,
    }
}

// =============================================================================
// Value Parsing Utilities
// =============================================================================

/// Markers read as missing when loading delimited files.
pub const MISSING_MARKERS: [&str; 16] = [
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null", "-1.#IND",
];

/// Check if a string is one of the missing-value markers.
pub fn is_missing_marker(s: &str) -> bool {
    let trimmed = s.trim();
    MISSING_MARKERS.iter().any(|&marker| marker == trimmed)
}

/// Strictly parse a string as a finite number.
///
/// Only a trimmed decimal literal is accepted: no currency symbols, no
/// thousands separators. `NaN` parses to `None`, matching how coerced
/// values are stored as missing.
pub fn parse_numeric_strict(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_nan() => None,
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

/// Parse a string as an integer; integral floats such as `"3.0"` are accepted.
pub fn parse_integer_strict(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    parse_numeric_strict(trimmed)
        .filter(|v| v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

/// Parse the usual textual boolean spellings.
pub fn parse_boolean(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Format a float the way it is shown in prompts and tables.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        let s = format!("{:.6}", v);
        let s = s.trim_end_matches('0');
        s.trim_end_matches('.').to_string()
    }
}

// =============================================================================
// Series Access Utilities
// =============================================================================

/// Render every value of a Series as text (`None` for nulls).
pub fn render_values(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    let as_str = series.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Values of a numeric Series as `f64`, positions preserved, NaN as `None`.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let as_f64 = series.cast(&DataType::Float64)?;
    Ok(as_f64
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Rows where `series` has a value: not null, and not NaN for floats.
pub fn present_mask(series: &Series) -> PolarsResult<BooleanChunked> {
    if !series.dtype().is_float() {
        return Ok(series.is_not_null());
    }
    let mask: BooleanChunked = numeric_values(series)?
        .iter()
        .map(|v| v.is_some())
        .collect();
    Ok(mask.with_name(series.name().clone()))
}

/// Number of missing entries, counting NaN in float columns.
pub fn missing_count(series: &Series) -> PolarsResult<usize> {
    let present = present_mask(series)?;
    Ok(series.len() - present.into_iter().filter(|v| *v == Some(true)).count())
}

/// Non-null values of a numeric Series as `f64`.
pub fn non_null_numeric(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(numeric_values(series)?.into_iter().flatten().collect())
}

/// Up to `max` distinct values in order of first appearance; nulls show as `NaN`.
pub fn unique_samples(series: &Series, max: usize) -> PolarsResult<Vec<String>> {
    let mut samples: Vec<String> = Vec::with_capacity(max);
    for value in render_values(series)? {
        if samples.len() >= max {
            break;
        }
        let shown = value.unwrap_or_else(|| "NaN".to_string());
        if !samples.contains(&shown) {
            samples.push(shown);
        }
    }
    Ok(samples)
}

/// Count non-null values, keeping first-encountered order.
pub fn value_frequencies(series: &Series) -> PolarsResult<Vec<(String, usize)>> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let present = present_mask(series)?;
    for (value, keep) in render_values(series)?.into_iter().zip(present.into_iter()) {
        let (Some(value), Some(true)) = (value, keep) else {
            continue;
        };
        match index.get(&value) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(value.clone(), order.len());
                order.push((value, 1));
            }
        }
    }
    Ok(order)
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Median of non-null values (linear interpolation between the middle pair).
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Arithmetic mean of non-null values.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(&sorted, q)
}

/// [`quantile`] over values that are already sorted ascending.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Most frequent non-null value of a Series, rendered as text.
///
/// Ties resolve to the smallest value in the column's natural order
/// (numeric order for numbers, lexicographic for strings).
pub fn mode_value(series: &Series) -> PolarsResult<Option<String>> {
    let frequencies = value_frequencies(series)?;
    let Some(top) = frequencies.iter().map(|(_, c)| *c).max() else {
        return Ok(None);
    };
    let mut tied: Vec<&String> = frequencies
        .iter()
        .filter(|(_, c)| *c == top)
        .map(|(v, _)| v)
        .collect();

    if is_numeric_dtype(series.dtype()) {
        tied.sort_by(|a, b| {
            let x = a.parse::<f64>().unwrap_or(f64::NAN);
            let y = b.parse::<f64>().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        });
    } else {
        tied.sort();
    }
    Ok(tied.first().map(|v| (*v).clone()))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value (result is Float64).
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let filled: Vec<Option<f64>> = numeric_values(series)?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let filled: Vec<Option<String>> = render_values(series)?
        .into_iter()
        .map(|v| Some(v.unwrap_or_else(|| fill_value.to_string())))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill nulls of any Series with a value given as text, keeping the dtype
/// when the value can be cast back to it.
pub fn fill_nulls_with_text(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric => match parse_numeric_strict(fill_value) {
            Some(v) => {
                let filled = fill_numeric_nulls(series, v)?;
                if is_integer_dtype(series.dtype()) && v.fract() == 0.0 {
                    filled.cast(series.dtype())
                } else {
                    Ok(filled)
                }
            }
            None => Ok(series.clone()),
        },
        DtypeCategory::Boolean => match parse_boolean(fill_value) {
            Some(b) => {
                let filled: Vec<Option<bool>> = series
                    .bool()?
                    .into_iter()
                    .map(|v| Some(v.unwrap_or(b)))
                    .collect();
                Ok(Series::new(series.name().clone(), filled))
            }
            None => Ok(series.clone()),
        },
        DtypeCategory::String => fill_string_nulls(series, fill_value),
        _ => {
            let filled = fill_string_nulls(series, fill_value)?;
            Ok(filled.cast(series.dtype()).unwrap_or(filled))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
