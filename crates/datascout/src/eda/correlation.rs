//! Pairwise correlation of numeric columns.

use super::numeric_columns;
use crate::utils::numeric_values;
use polars::prelude::*;
use serde::Serialize;

/// Diverging color scale used for the heatmap (red for +1, blue for -1).
pub const HEATMAP_COLOR_SCALE: &str = "RdBu_r";

/// Annotated correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapSpec {
    pub title: String,
    /// Row and column labels, in frame order.
    pub columns: Vec<String>,
    /// `matrix[i][j]` is the Pearson correlation of columns `i` and `j`;
    /// `None` where it is undefined (fewer than two shared values or no
    /// variance).
    pub matrix: Vec<Vec<Option<f64>>>,
    pub color_scale: String,
    pub min: f64,
    pub max: f64,
}

impl HeatmapSpec {
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == row)?;
        let j = self.columns.iter().position(|c| c == col)?;
        self.matrix[i][j]
    }

    /// Cell text as shown on the chart.
    pub fn annotation(&self, i: usize, j: usize) -> String {
        match self.matrix.get(i).and_then(|row| row.get(j)).copied().flatten() {
            Some(r) => format!("{:.2}", r),
            None => "NaN".to_string(),
        }
    }
}

/// Correlation heatmap over the numeric columns of `df`.
///
/// Returns `None` when fewer than two numeric columns exist.
pub fn correlation_heatmap(df: &DataFrame) -> Option<HeatmapSpec> {
    let names = numeric_columns(df);
    if names.len() < 2 {
        return None;
    }

    let mut data: Vec<Vec<Option<f64>>> = Vec::with_capacity(names.len());
    for name in &names {
        let series = df.column(name).ok()?.as_materialized_series();
        data.push(numeric_values(series).ok()?);
    }

    let n = names.len();
    let mut matrix = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&data[i], &data[j]);
            let r = if i == j { r.map(|_| 1.0) } else { r };
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    Some(HeatmapSpec {
        title: "Correlation Heatmap".to_string(),
        columns: names,
        matrix,
        color_scale: HEATMAP_COLOR_SCALE.to_string(),
        min: -1.0,
        max: 1.0,
    })
}

/// Pearson correlation over the rows where both values are present.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}
