//! The cleaning operations a plan can name.
//!
//! Each operation works on the interpreter's working copy and only writes to
//! it once every fallible computation has succeeded, so an error leaves the
//! frame exactly as it was before the step.

use crate::utils::{
    DtypeCategory, fill_nulls_with_text, fill_numeric_nulls, get_dtype_category, is_integer_dtype,
    mean, median, missing_count, mode_value, non_null_numeric, numeric_values, parse_boolean,
    parse_integer_strict, parse_numeric_strict, present_mask, render_values,
};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Result of running one operation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    Applied(String),
    Skipped(String),
}

fn series_of(df: &DataFrame, column: &str) -> PolarsResult<Series> {
    Ok(df.column(column)?.as_materialized_series().clone())
}

fn replace_column(df: &mut DataFrame, column: &str, series: Series) -> PolarsResult<()> {
    let series = series.with_name(column.into());
    df.replace(column, series)?;
    Ok(())
}

// =============================================================================
// handle_missing
// =============================================================================

/// Fill or drop missing values of one column.
///
/// `median` and `mean` need a numeric column, `mode` works on any column,
/// and every other strategy (including none) drops the rows where the
/// column is missing. NaN in a float column counts as missing.
pub(crate) fn handle_missing(
    df: &mut DataFrame,
    column: &str,
    strategy: Option<&str>,
) -> PolarsResult<Effect> {
    let series = series_of(df, column)?;
    let missing = missing_count(&series)?;

    match strategy {
        Some(stat @ ("median" | "mean")) => {
            if get_dtype_category(series.dtype()) != DtypeCategory::Numeric {
                return Ok(Effect::Skipped(format!(
                    "{} needs a numeric column, '{}' is {}",
                    stat,
                    column,
                    series.dtype()
                )));
            }
            let values = non_null_numeric(&series)?;
            let fill = if stat == "median" {
                median(&values)
            } else {
                mean(&values)
            };
            let Some(fill) = fill else {
                return Ok(Effect::Skipped(format!("'{}' has no values", column)));
            };
            if missing > 0 {
                replace_column(df, column, fill_numeric_nulls(&series, fill)?)?;
            }
            Ok(Effect::Applied(format!(
                "filled {} missing values with {} {}",
                missing, stat, fill
            )))
        }
        Some("mode") => {
            let Some(mode) = mode_value(&series)? else {
                return Ok(Effect::Skipped(format!("'{}' has no values", column)));
            };
            if missing > 0 {
                replace_column(df, column, fill_nulls_with_text(&series, &mode)?)?;
            }
            Ok(Effect::Applied(format!(
                "filled {} missing values with mode '{}'",
                missing, mode
            )))
        }
        _ => {
            let before = df.height();
            let mask = present_mask(&series)?;
            *df = df.filter(&mask)?;
            Ok(Effect::Applied(format!(
                "dropped {} rows with missing '{}'",
                before - df.height(),
                column
            )))
        }
    }
}

// =============================================================================
// change_type
// =============================================================================

/// Type targets understood by `change_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TargetType {
    /// Coercing numeric conversion: unparseable values become missing.
    Numeric,
    Integer,
    Float,
    Text,
    Boolean,
    Datetime,
}

impl TargetType {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "numeric" => Some(Self::Numeric),
            "int" | "int64" | "int32" | "integer" => Some(Self::Integer),
            "float" | "float64" | "float32" | "double" => Some(Self::Float),
            "str" | "string" | "object" | "category" | "text" => Some(Self::Text),
            "bool" | "boolean" => Some(Self::Boolean),
            "datetime" | "datetime64" | "datetime64[ns]" | "date" => Some(Self::Datetime),
            _ => None,
        }
    }
}

/// Convert a column to another type.
///
/// `numeric` coerces: anything that is not a plain number becomes missing.
/// All other targets are all-or-nothing: if a single non-missing value
/// cannot be converted the column keeps its original values.
pub(crate) fn change_type(df: &mut DataFrame, column: &str, target: TargetType) -> PolarsResult<Effect> {
    let series = series_of(df, column)?;

    let converted = match target {
        TargetType::Numeric => Some(to_numeric(&series)?),
        TargetType::Integer => cast_all(&series, |v| parse_integer_strict(v))?
            .map(|values: Vec<Option<i64>>| Series::new(series.name().clone(), values)),
        TargetType::Float => cast_all(&series, parse_numeric_strict)?
            .map(|values: Vec<Option<f64>>| Series::new(series.name().clone(), values)),
        TargetType::Text => Some(Series::new(series.name().clone(), render_values(&series)?)),
        TargetType::Boolean => to_boolean(&series)?,
        TargetType::Datetime => to_datetime(&series)?,
    };

    match converted {
        Some(new_series) => {
            let from = series.dtype().to_string();
            let to = new_series.dtype().to_string();
            let coerced = new_series.null_count().saturating_sub(series.null_count());
            replace_column(df, column, new_series)?;
            if coerced > 0 {
                Ok(Effect::Applied(format!(
                    "converted '{}' from {} to {} ({} values coerced to missing)",
                    column, from, to, coerced
                )))
            } else {
                Ok(Effect::Applied(format!(
                    "converted '{}' from {} to {}",
                    column, from, to
                )))
            }
        }
        None => Ok(Effect::Skipped(format!(
            "'{}' has values that cannot be converted to {:?}",
            column, target
        ))),
    }
}

fn to_numeric(series: &Series) -> PolarsResult<Series> {
    match get_dtype_category(series.dtype()) {
        DtypeCategory::Numeric => Ok(series.clone()),
        DtypeCategory::Boolean => series.cast(&DataType::Float64),
        _ => {
            let values: Vec<Option<f64>> = render_values(series)?
                .into_iter()
                .map(|v| v.and_then(|s| parse_numeric_strict(&s)))
                .collect();
            Ok(Series::new(series.name().clone(), values))
        }
    }
}

/// Convert every non-null value through `parse`, or give up.
fn cast_all<T>(series: &Series, parse: impl Fn(&str) -> Option<T>) -> PolarsResult<Option<Vec<Option<T>>>> {
    let rendered = match get_dtype_category(series.dtype()) {
        // Booleans render as "true"/"false"; numeric targets want 1/0.
        DtypeCategory::Boolean => series
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| if b { "1" } else { "0" }.to_string()))
            .collect(),
        _ => render_values(series)?,
    };

    let mut out = Vec::with_capacity(rendered.len());
    for value in rendered {
        match value {
            None => out.push(None),
            Some(text) => match parse(&text) {
                Some(v) => out.push(Some(v)),
                None => return Ok(None),
            },
        }
    }
    Ok(Some(out))
}

fn to_boolean(series: &Series) -> PolarsResult<Option<Series>> {
    let values = match get_dtype_category(series.dtype()) {
        DtypeCategory::Boolean => return Ok(Some(series.clone())),
        DtypeCategory::Numeric => numeric_values(series)?
            .into_iter()
            .map(|v| v.map(|x| x != 0.0))
            .collect(),
        _ => match cast_all(series, parse_boolean)? {
            Some(values) => values,
            None => return Ok(None),
        },
    };
    Ok(Some(Series::new(series.name().clone(), values)))
}

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d-%m-%Y"];

/// Parse a date or datetime string to milliseconds since the epoch.
fn parse_datetime_millis(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn to_datetime(series: &Series) -> PolarsResult<Option<Series>> {
    let target = DataType::Datetime(TimeUnit::Milliseconds, None);
    match series.dtype() {
        DataType::Datetime(_, _) => Ok(Some(series.clone())),
        DataType::Date => Ok(Some(series.cast(&target)?)),
        DataType::String => match cast_all(series, parse_datetime_millis)? {
            Some(millis) => {
                let raw = Series::new(series.name().clone(), millis);
                Ok(Some(raw.cast(&target)?))
            }
            None => Ok(None),
        },
        _ => Ok(None),
    }
}

// =============================================================================
// remove_duplicates
// =============================================================================

/// Drop exact duplicate rows, keeping the first occurrence in place.
pub(crate) fn remove_duplicates(df: &mut DataFrame) -> PolarsResult<Effect> {
    let before = df.height();
    if df.width() > 0 {
        *df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    }
    Ok(Effect::Applied(format!(
        "removed {} duplicate rows",
        before - df.height()
    )))
}

/// Drop rows where every column is missing.
pub(crate) fn drop_empty_rows(df: &mut DataFrame) -> PolarsResult<usize> {
    let before = df.height();
    if df.width() == 0 || before == 0 {
        return Ok(0);
    }

    let mut null_counts = Series::new("nulls".into(), vec![0u32; before]);
    for col in df.get_columns() {
        let null_int = col.as_materialized_series().is_null().cast(&DataType::UInt32)?;
        null_counts = (&null_counts + &null_int)?;
    }
    let mask = null_counts.lt(df.width() as u32)?;
    *df = df.filter(&mask)?;
    Ok(before - df.height())
}

// =============================================================================
// normalize_text
// =============================================================================

/// Lower-case and trim every value of a text column.
pub(crate) fn normalize_text(df: &mut DataFrame, column: &str) -> PolarsResult<Effect> {
    let series = series_of(df, column)?;
    if series.dtype() != &DataType::String {
        return Ok(Effect::Skipped(format!(
            "'{}' is {}, not text",
            column,
            series.dtype()
        )));
    }

    let mut changed = 0usize;
    let values: Vec<Option<String>> = series
        .str()?
        .into_iter()
        .map(|v| {
            v.map(|s| {
                let normalized = s.trim().to_lowercase();
                if normalized != s {
                    changed += 1;
                }
                normalized
            })
        })
        .collect();

    replace_column(df, column, Series::new(series.name().clone(), values))?;
    Ok(Effect::Applied(format!("normalized {} values", changed)))
}

// =============================================================================
// map_values
// =============================================================================

/// Replace values equal to a mapping key with the mapping's value.
pub(crate) fn map_values(
    df: &mut DataFrame,
    column: &str,
    mapping: &Map<String, Value>,
) -> PolarsResult<Effect> {
    let series = series_of(df, column)?;
    if mapping.is_empty() {
        return Ok(Effect::Skipped("mapping is empty".to_string()));
    }

    let (mapped, replaced) = match get_dtype_category(series.dtype()) {
        DtypeCategory::String => map_text(&series, mapping)?,
        DtypeCategory::Numeric => map_numeric(&series, mapping)?,
        DtypeCategory::Boolean => map_boolean(&series, mapping)?,
        _ => {
            return Ok(Effect::Skipped(format!(
                "values of type {} cannot be mapped",
                series.dtype()
            )));
        }
    };

    if replaced > 0 {
        replace_column(df, column, mapped)?;
    }
    Ok(Effect::Applied(format!("replaced {} values", replaced)))
}

fn map_text(series: &Series, mapping: &Map<String, Value>) -> PolarsResult<(Series, usize)> {
    let lookup: HashMap<&str, Option<String>> = mapping
        .iter()
        .filter_map(|(key, value)| {
            let replacement = match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                Value::Null => None,
                Value::Array(_) | Value::Object(_) => return None,
            };
            Some((key.as_str(), replacement))
        })
        .collect();

    let mut replaced = 0usize;
    let values: Vec<Option<String>> = series
        .str()?
        .into_iter()
        .map(|v| match v.and_then(|s| lookup.get(s)) {
            Some(replacement) => {
                replaced += 1;
                replacement.clone()
            }
            None => v.map(str::to_string),
        })
        .collect();

    Ok((Series::new(series.name().clone(), values), replaced))
}

fn map_numeric(series: &Series, mapping: &Map<String, Value>) -> PolarsResult<(Series, usize)> {
    let lookup: Vec<(f64, Option<f64>)> = mapping
        .iter()
        .filter_map(|(key, value)| {
            let key = parse_numeric_strict(key)?;
            let replacement = match value {
                Value::Number(n) => Some(n.as_f64()?),
                Value::Null => None,
                _ => return None,
            };
            Some((key, replacement))
        })
        .collect();

    let mut replaced = 0usize;
    let values: Vec<Option<f64>> = numeric_values(series)?
        .into_iter()
        .map(|v| {
            let hit = v.and_then(|x| lookup.iter().find(|(key, _)| *key == x));
            match hit {
                Some((_, replacement)) => {
                    replaced += 1;
                    *replacement
                }
                None => v,
            }
        })
        .collect();

    let all_integral = values.iter().flatten().all(|x| x.fract() == 0.0);
    let mapped = Series::new(series.name().clone(), values);
    let mapped = if is_integer_dtype(series.dtype()) && all_integral {
        mapped.cast(series.dtype())?
    } else {
        mapped
    };
    Ok((mapped, replaced))
}

fn map_boolean(series: &Series, mapping: &Map<String, Value>) -> PolarsResult<(Series, usize)> {
    let lookup: Vec<(bool, Option<bool>)> = mapping
        .iter()
        .filter_map(|(key, value)| {
            let key = parse_boolean(key)?;
            let replacement = match value {
                Value::Bool(b) => Some(*b),
                Value::Null => None,
                _ => return None,
            };
            Some((key, replacement))
        })
        .collect();

    let mut replaced = 0usize;
    let values: Vec<Option<bool>> = series
        .bool()?
        .into_iter()
        .map(|v| {
            let hit = v.and_then(|b| lookup.iter().find(|(key, _)| *key == b));
            match hit {
                Some((_, replacement)) => {
                    replaced += 1;
                    *replacement
                }
                None => v,
            }
        })
        .collect();

    Ok((Series::new(series.name().clone(), values), replaced))
}
