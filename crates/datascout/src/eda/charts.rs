//! Chart specifications for single columns.
//!
//! These are plain data: what to draw, not how. [`super::render`] turns them
//! into PNG files.

use crate::config::{DEFAULT_MAX_HISTOGRAM_BINS, DEFAULT_TOP_CATEGORIES};
use crate::utils::{is_numeric_dtype, non_null_numeric, quantile_sorted, value_frequencies};
use polars::prelude::*;
use serde::Serialize;

/// Bar direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One bar: a value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub label: String,
    pub count: usize,
}

/// Most frequent values of a column.
///
/// `bars` is in display order: ascending by count, so the most frequent
/// value ends up at the top of a horizontal chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarChartSpec {
    pub title: String,
    pub column: String,
    pub orientation: Orientation,
    pub bars: Vec<Bar>,
}

/// Half-open histogram bin `[start, end)`; the last bin also holds `end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Box-plot summary with Tukey whiskers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Smallest value within `q1 - 1.5 * IQR`.
    pub lower_whisker: f64,
    /// Largest value within `q3 + 1.5 * IQR`.
    pub upper_whisker: f64,
    /// Values outside the whiskers, ascending.
    pub outliers: Vec<f64>,
}

/// Distribution of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSpec {
    pub title: String,
    pub column: String,
    /// Number of non-missing values.
    pub count: usize,
    pub bins: Vec<HistogramBin>,
    pub box_summary: BoxSummary,
}

/// Bar chart of the ten most frequent values of `column`.
pub fn categorical_chart(df: &DataFrame, column: &str) -> Option<BarChartSpec> {
    categorical_chart_with(df, column, DEFAULT_TOP_CATEGORIES)
}

/// Bar chart of the `top_n` most frequent values of `column`.
///
/// Returns `None` when the column is absent or has no values. Equal counts
/// keep the order in which the values first appear.
pub fn categorical_chart_with(df: &DataFrame, column: &str, top_n: usize) -> Option<BarChartSpec> {
    let series = df.column(column).ok()?.as_materialized_series();
    let mut frequencies = value_frequencies(series).ok()?;
    if frequencies.is_empty() {
        return None;
    }

    // Stable sorts keep first-appearance order among equal counts.
    frequencies.sort_by(|a, b| b.1.cmp(&a.1));
    frequencies.truncate(top_n.max(1));
    frequencies.sort_by(|a, b| a.1.cmp(&b.1));

    Some(BarChartSpec {
        title: format!("Top {} Value Counts for {}", top_n, column),
        column: column.to_string(),
        orientation: Orientation::Horizontal,
        bars: frequencies
            .into_iter()
            .map(|(label, count)| Bar { label, count })
            .collect(),
    })
}

/// Histogram plus box summary of a numeric column.
pub fn numerical_chart(df: &DataFrame, column: &str) -> Option<HistogramSpec> {
    numerical_chart_with(df, column, DEFAULT_MAX_HISTOGRAM_BINS)
}

/// Histogram with at most `max_bins` bins plus box summary.
///
/// The bin count follows Sturges' rule. Returns `None` when the column is
/// absent, not numeric, or has no values.
pub fn numerical_chart_with(df: &DataFrame, column: &str, max_bins: usize) -> Option<HistogramSpec> {
    let series = df.column(column).ok()?.as_materialized_series();
    if !is_numeric_dtype(series.dtype()) {
        return None;
    }
    let mut values = non_null_numeric(series).ok()?;
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    Some(HistogramSpec {
        title: format!("Distribution of {}", column),
        column: column.to_string(),
        count: values.len(),
        bins: histogram_bins(&values, max_bins),
        box_summary: box_summary(&values)?,
    })
}

/// Sturges' rule: `ceil(log2(n)) + 1`.
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        (n as f64).log2().ceil() as usize + 1
    }
}

fn histogram_bins(sorted: &[f64], max_bins: usize) -> Vec<HistogramBin> {
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];

    if min == max {
        return vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            count: sorted.len(),
        }];
    }

    let n_bins = sturges_bins(sorted.len()).clamp(1, max_bins.max(1));
    let width = (max - min) / n_bins as f64;
    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == n_bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for &v in sorted {
        let idx = (((v - min) / width).floor() as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }
    bins
}

fn box_summary(sorted: &[f64]) -> Option<BoxSummary> {
    let q1 = quantile_sorted(sorted, 0.25)?;
    let median = quantile_sorted(sorted, 0.5)?;
    let q3 = quantile_sorted(sorted, 0.75)?;
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence)
        .collect();
    let outliers: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(BoxSummary {
        min: sorted[0],
        q1,
        median,
        q3,
        max: sorted[sorted.len() - 1],
        lower_whisker: inside.first().copied().unwrap_or(q1),
        upper_whisker: inside.last().copied().unwrap_or(q3),
        outliers,
    })
}
