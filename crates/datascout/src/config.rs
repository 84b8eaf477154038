//! Configuration types for a DataScout session.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic session setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rows of the dataset included in the cleaning prompt.
pub const DEFAULT_PROMPT_SAMPLE_ROWS: usize = 15;
/// Distinct sample values listed per column in the cleaning prompt.
pub const DEFAULT_PROMPT_UNIQUE_VALUES: usize = 5;
/// Rows of the cleaned dataset included when asking a free-form question.
pub const DEFAULT_QUESTION_SAMPLE_ROWS: usize = 10;
/// Bars shown in a categorical chart.
pub const DEFAULT_TOP_CATEGORIES: usize = 10;
/// Upper bound on histogram bins.
pub const DEFAULT_MAX_HISTOGRAM_BINS: usize = 50;
/// String columns with at most this many distinct values are categorical.
pub const DEFAULT_CATEGORICAL_MAX_DISTINCT: usize = 50;
/// CSV files larger than this are only partially read.
pub const DEFAULT_LARGE_FILE_THRESHOLD_MB: f64 = 100.0;
/// Number of rows read from a large CSV file.
pub const DEFAULT_LARGE_FILE_ROW_LIMIT: usize = 1_000_000;

/// Configuration for a DataScout session.
///
/// Use [`ScoutConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use datascout::ScoutConfig;
///
/// let config = ScoutConfig::builder()
///     .prompt_sample_rows(20)
///     .output_dir("reports")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Number of leading rows rendered as CSV in the cleaning prompt.
    /// Default: 15
    pub prompt_sample_rows: usize,

    /// Number of distinct sample values listed per column in the cleaning prompt.
    /// Default: 5
    pub prompt_unique_values: usize,

    /// Number of leading rows sent along with a free-form question.
    /// Default: 10
    pub question_sample_rows: usize,

    /// Number of most frequent values shown in a categorical chart.
    /// Default: 10
    pub top_categories: usize,

    /// Maximum number of histogram bins.
    /// Default: 50
    pub max_histogram_bins: usize,

    /// String columns with at most this many distinct values are treated as
    /// categorical rather than free text.
    /// Default: 50
    pub categorical_max_distinct: usize,

    /// CSV files above this size (in megabytes) are sampled.
    /// Default: 100.0
    pub large_file_threshold_mb: f64,

    /// Number of rows read from a CSV file above the size threshold.
    /// Default: 1,000,000
    pub large_file_row_limit: usize,

    /// Output directory for the cleaned CSV, statistics and charts.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// TrueType font used for chart text. When `None`, common system
    /// locations are searched.
    /// Default: None
    pub font_path: Option<PathBuf>,

    /// Whether to ask the language model for a cleaning plan.
    /// If false, the basic fallback cleaning is used.
    /// Default: true
    pub use_ai: bool,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            prompt_sample_rows: DEFAULT_PROMPT_SAMPLE_ROWS,
            prompt_unique_values: DEFAULT_PROMPT_UNIQUE_VALUES,
            question_sample_rows: DEFAULT_QUESTION_SAMPLE_ROWS,
            top_categories: DEFAULT_TOP_CATEGORIES,
            max_histogram_bins: DEFAULT_MAX_HISTOGRAM_BINS,
            categorical_max_distinct: DEFAULT_CATEGORICAL_MAX_DISTINCT,
            large_file_threshold_mb: DEFAULT_LARGE_FILE_THRESHOLD_MB,
            large_file_row_limit: DEFAULT_LARGE_FILE_ROW_LIMIT,
            output_dir: PathBuf::from("outputs"),
            font_path: None,
            use_ai: true,
        }
    }
}

impl ScoutConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ScoutConfigBuilder {
        ScoutConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let counts = [
            ("prompt_sample_rows", self.prompt_sample_rows),
            ("prompt_unique_values", self.prompt_unique_values),
            ("question_sample_rows", self.question_sample_rows),
            ("top_categories", self.top_categories),
            ("max_histogram_bins", self.max_histogram_bins),
            ("large_file_row_limit", self.large_file_row_limit),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigValidationError::ZeroCount(field.to_string()));
            }
        }

        if !self.large_file_threshold_mb.is_finite() || self.large_file_threshold_mb <= 0.0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "large_file_threshold_mb".to_string(),
                value: self.large_file_threshold_mb,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{0}': must be at least 1")]
    ZeroCount(String),

    #[error("Invalid threshold for '{field}': {value} (must be a positive number)")]
    InvalidThreshold { field: String, value: f64 },
}

impl From<ConfigValidationError> for crate::error::ScoutError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::ScoutError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`ScoutConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ScoutConfigBuilder {
    prompt_sample_rows: Option<usize>,
    prompt_unique_values: Option<usize>,
    question_sample_rows: Option<usize>,
    top_categories: Option<usize>,
    max_histogram_bins: Option<usize>,
    categorical_max_distinct: Option<usize>,
    large_file_threshold_mb: Option<f64>,
    large_file_row_limit: Option<usize>,
    output_dir: Option<PathBuf>,
    font_path: Option<PathBuf>,
    use_ai: Option<bool>,
}

impl ScoutConfigBuilder {
    /// Set how many leading rows go into the cleaning prompt.
    pub fn prompt_sample_rows(mut self, rows: usize) -> Self {
        self.prompt_sample_rows = Some(rows);
        self
    }

    /// Set how many distinct values per column go into the cleaning prompt.
    pub fn prompt_unique_values(mut self, values: usize) -> Self {
        self.prompt_unique_values = Some(values);
        self
    }

    /// Set how many leading rows accompany a free-form question.
    pub fn question_sample_rows(mut self, rows: usize) -> Self {
        self.question_sample_rows = Some(rows);
        self
    }

    /// Set the number of bars in a categorical chart.
    pub fn top_categories(mut self, n: usize) -> Self {
        self.top_categories = Some(n);
        self
    }

    /// Set the maximum number of histogram bins.
    pub fn max_histogram_bins(mut self, bins: usize) -> Self {
        self.max_histogram_bins = Some(bins);
        self
    }

    /// Set the distinct-value ceiling for categorical columns.
    pub fn categorical_max_distinct(mut self, n: usize) -> Self {
        self.categorical_max_distinct = Some(n);
        self
    }

    /// Set the size (MB) above which CSV files are sampled.
    pub fn large_file_threshold_mb(mut self, mb: f64) -> Self {
        self.large_file_threshold_mb = Some(mb);
        self
    }

    /// Set how many rows are read from a large CSV file.
    pub fn large_file_row_limit(mut self, rows: usize) -> Self {
        self.large_file_row_limit = Some(rows);
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set an explicit font file for chart rendering.
    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Enable or disable the language-model cleaning plan.
    pub fn use_ai(mut self, use_ai: bool) -> Self {
        self.use_ai = Some(use_ai);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ScoutConfig` or an error if validation fails.
    pub fn build(self) -> Result<ScoutConfig, ConfigValidationError> {
        let config = ScoutConfig {
            prompt_sample_rows: self.prompt_sample_rows.unwrap_or(DEFAULT_PROMPT_SAMPLE_ROWS),
            prompt_unique_values: self
                .prompt_unique_values
                .unwrap_or(DEFAULT_PROMPT_UNIQUE_VALUES),
            question_sample_rows: self
                .question_sample_rows
                .unwrap_or(DEFAULT_QUESTION_SAMPLE_ROWS),
            top_categories: self.top_categories.unwrap_or(DEFAULT_TOP_CATEGORIES),
            max_histogram_bins: self.max_histogram_bins.unwrap_or(DEFAULT_MAX_HISTOGRAM_BINS),
            categorical_max_distinct: self
                .categorical_max_distinct
                .unwrap_or(DEFAULT_CATEGORICAL_MAX_DISTINCT),
            large_file_threshold_mb: self
                .large_file_threshold_mb
                .unwrap_or(DEFAULT_LARGE_FILE_THRESHOLD_MB),
            large_file_row_limit: self
                .large_file_row_limit
                .unwrap_or(DEFAULT_LARGE_FILE_ROW_LIMIT),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("outputs")),
            font_path: self.font_path,
            use_ai: self.use_ai.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScoutConfig::default();
        assert_eq!(config.prompt_sample_rows, 15);
        assert_eq!(config.prompt_unique_values, 5);
        assert_eq!(config.question_sample_rows, 10);
        assert_eq!(config.top_categories, 10);
        assert_eq!(config.large_file_row_limit, 1_000_000);
        assert!(config.use_ai);
        assert!(config.font_path.is_none());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ScoutConfig::builder()
            .prompt_sample_rows(20)
            .top_categories(5)
            .output_dir("reports")
            .use_ai(false)
            .build()
            .unwrap();

        assert_eq!(config.prompt_sample_rows, 20);
        assert_eq!(config.top_categories, 5);
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert!(!config.use_ai);
    }

    #[test]
    fn test_validation_zero_count() {
        let result = ScoutConfig::builder().top_categories(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ZeroCount(field) if field == "top_categories"
        ));
    }

    #[test]
    fn test_validation_invalid_threshold() {
        let result = ScoutConfig::builder().large_file_threshold_mb(-1.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "prompt_sample_rows": 12,
            "prompt_unique_values": 3,
            "question_sample_rows": 8,
            "top_categories": 7,
            "max_histogram_bins": 30,
            "categorical_max_distinct": 20,
            "large_file_threshold_mb": 50.0,
            "large_file_row_limit": 5000,
            "output_dir": "custom_output",
            "font_path": null,
            "use_ai": false
        }"#;

        let config: ScoutConfig = serde_json::from_str(json).expect("valid config json");
        assert_eq!(config.prompt_sample_rows, 12);
        assert_eq!(config.top_categories, 7);
        assert_eq!(config.large_file_row_limit, 5000);
        assert_eq!(config.output_dir.to_str().unwrap(), "custom_output");
        assert!(!config.use_ai);
        assert!(config.validate().is_ok());
    }
}
