//! DataScout: LLM-assisted data exploration
//!
//! Load a tabular file, let a language model propose a cleaning plan, apply
//! it safely, then summarize and chart the result.
//!
//! # Overview
//!
//! - **File Ingestion**: CSV, spreadsheets, and text from PDF, DOCX and TXT documents
//! - **Plan Requests**: A JSON cleaning plan from the model, cached per dataset
//! - **Plan Interpretation**: Five whitelisted operations, unknown steps skipped
//! - **Summary & Visualization**: Descriptive statistics, bar charts,
//!   histograms and a correlation heatmap
//! - **Basic Fallback**: Works without a model by dropping empty and duplicate rows
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use datascout::ai::TogetherProvider;
//! use datascout::{ScoutConfig, Session, basic_stats, correlation_heatmap};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let provider = Arc::new(TogetherProvider::from_env()?);
//! let mut session = Session::new(ScoutConfig::default()).with_provider(provider);
//!
//! let df = session.load(Path::new("titanic.csv"))?.into_table()?;
//! let outcome = session.clean_with_ai(&df);
//! println!("{}", outcome.status_message());
//!
//! println!("{}", basic_stats(&outcome.data)?);
//! if let Some(heatmap) = correlation_heatmap(&outcome.data) {
//!     println!("{:?}", heatmap.columns);
//! }
//! ```
//!
//! # Cleaning plans
//!
//! A plan is a JSON object with a `cleaning_plan` array; each step names an
//! operation and its details:
//!
//! ```json
//! {"cleaning_plan": [
//!   {"operation": "handle_missing", "details": {"column": "Age", "strategy": "median"}},
//!   {"operation": "change_type", "details": {"column": "Fare", "new_type": "numeric"}},
//!   {"operation": "map_values", "details": {"column": "Sex", "mapping": {"m": "male"}}},
//!   {"operation": "remove_duplicates"}
//! ]}
//! ```
//!
//! [`PlanInterpreter`] can be used on its own with plans from any source.

pub mod ai;
pub mod config;
pub mod eda;
pub mod error;
pub mod export;
pub mod ingest;
pub mod interpreter;
pub mod planner;
pub mod session;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{ConfigValidationError, ScoutConfig, ScoutConfigBuilder};
pub use eda::{
    BarChartSpec, ColumnStats, HeatmapSpec, HistogramSpec, StatsTable, basic_stats,
    basic_stats_with, categorical_chart, categorical_columns, correlation_heatmap, numeric_columns,
    numerical_chart,
};
pub use error::{Result, ResultExt, ScoutError};
pub use export::{RunReport, write_csv};
pub use ingest::{Upload, load_file};
pub use interpreter::{PlanInterpreter, parse_plan};
pub use planner::{FAILURE_MARKER, PlanCache, PlanRequester, is_failure_response};
pub use session::{CleaningOutcome, Session, basic_cleaning};
pub use types::{
    CleaningPlan, CleaningReport, CleaningStep, ColumnKind, DatasetShape, Operation, PlanSource,
    StepOutcome, StepRecord,
};
