//! Summary statistics and chart specifications.
//!
//! Everything here reads a frame and produces plain data ([`StatsTable`],
//! [`BarChartSpec`], [`HistogramSpec`], [`HeatmapSpec`]). With the `render`
//! feature, [`render::ChartRenderer`] draws those specifications to PNG.

mod charts;
mod correlation;
mod stats;

#[cfg(feature = "render")]
pub mod render;

pub use charts::{
    Bar, BarChartSpec, BoxSummary, HistogramBin, HistogramSpec, Orientation, categorical_chart,
    categorical_chart_with, numerical_chart, numerical_chart_with, sturges_bins,
};
pub use correlation::{HEATMAP_COLOR_SCALE, HeatmapSpec, correlation_heatmap, pearson};
pub use stats::{ColumnStats, StatsTable, basic_stats, basic_stats_with};

use crate::utils::is_numeric_dtype;
use polars::prelude::*;

/// Names of the numeric columns, in frame order. Booleans are not numeric.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

/// Names of the text columns, in frame order.
pub fn categorical_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| matches!(c.dtype(), DataType::String))
        .map(|c| c.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_column_partition() {
        let df = df![
            "name" => ["a", "b"],
            "age" => [1i64, 2],
            "fare" => [1.5, 2.5],
            "alive" => [true, false],
        ]
        .unwrap();

        assert_eq!(numeric_columns(&df), vec!["age", "fare"]);
        assert_eq!(categorical_columns(&df), vec!["name"]);
    }

    #[test]
    fn test_empty_frame() {
        let df = DataFrame::empty();
        assert!(numeric_columns(&df).is_empty());
        assert!(categorical_columns(&df).is_empty());
    }
}
