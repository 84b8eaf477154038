//! Plan interpreter: applies a JSON cleaning plan to a dataset.
//!
//! The interpreter is deliberately forgiving. It never returns an error and
//! never touches the caller's frame:
//!
//! - plan text that is not JSON leaves the data unchanged
//! - unknown operations, steps without an operation and steps naming a
//!   column that does not exist (at that point of the plan) are skipped
//! - a step that fails part-way is skipped and the next step still runs
//!
//! Steps run in order, each one seeing the output of the previous one.
//!
//! # Example
//!
//! ```rust,ignore
//! use datascout::PlanInterpreter;
//!
//! let plan = r#"{"cleaning_plan": [
//!     {"operation": "handle_missing", "details": {"column": "Age", "strategy": "median"}},
//!     {"operation": "remove_duplicates"}
//! ]}"#;
//! let (cleaned, report) = PlanInterpreter::new().apply_with_report(&df, plan);
//! println!("{} steps applied", report.applied_count());
//! ```

mod operations;
mod plan;

pub use plan::parse_plan;

pub(crate) use operations::{drop_empty_rows, remove_duplicates};

use crate::types::{CleaningReport, CleaningStep, DatasetShape, Operation};
use operations::{Effect, TargetType};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Applies cleaning plans.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanInterpreter;

impl PlanInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Apply `plan_text` to a copy of `df`.
    pub fn apply(&self, df: &DataFrame, plan_text: &str) -> DataFrame {
        self.apply_with_report(df, plan_text).0
    }

    /// Apply `plan_text` to a copy of `df` and describe what each step did.
    pub fn apply_with_report(&self, df: &DataFrame, plan_text: &str) -> (DataFrame, CleaningReport) {
        let mut working = df.clone();
        let mut report = CleaningReport::new(DatasetShape::of(df));

        let Some(plan) = parse_plan(plan_text) else {
            warn!("Cleaning plan is not valid JSON, data left unchanged");
            return (working, report);
        };
        report.plan_parsed = true;
        info!("Executing cleaning plan with {} steps", plan.len());

        for (index, step) in plan.steps.iter().enumerate() {
            match self.apply_step(&mut working, step) {
                Ok(Effect::Applied(description)) => {
                    debug!(step = index, "{}: {}", step.label(), description);
                    report.applied(index, step, description);
                }
                Ok(Effect::Skipped(reason)) => {
                    debug!(step = index, "Skipped {}: {}", step.label(), reason);
                    report.skipped(index, step, reason);
                }
                Err(e) => {
                    warn!(step = index, "Step {} failed and was skipped: {}", step.label(), e);
                    report.skipped(index, step, format!("failed: {}", e));
                }
            }
        }

        report.rows_after = working.height();
        report.columns_after = working.width();
        info!(
            "Cleaning plan done: {} applied, {} skipped, rows {} -> {}",
            report.applied_count(),
            report.skipped_count(),
            report.rows_before,
            report.rows_after
        );
        (working, report)
    }

    fn apply_step(&self, df: &mut DataFrame, step: &CleaningStep) -> PolarsResult<Effect> {
        let Some(operation) = step.kind() else {
            let reason = match &step.operation {
                Some(tag) => format!("unknown operation '{}'", tag),
                None => "step has no operation".to_string(),
            };
            return Ok(Effect::Skipped(reason));
        };

        if operation == Operation::RemoveDuplicates {
            return remove_duplicates(df);
        }

        let column = match step.column() {
            Some(column) if df.get_column_index(column).is_some() => column,
            Some(column) => {
                return Ok(Effect::Skipped(format!("column '{}' not found", column)));
            }
            None => return Ok(Effect::Skipped("no column given".to_string())),
        };

        match operation {
            Operation::HandleMissing => {
                operations::handle_missing(df, column, step.detail_str("strategy"))
            }
            Operation::ChangeType => match step.detail_str("new_type").map(TargetType::parse) {
                Some(Some(target)) => operations::change_type(df, column, target),
                Some(None) => Ok(Effect::Skipped(format!(
                    "unsupported type '{}'",
                    step.detail_str("new_type").unwrap_or_default()
                ))),
                None => Ok(Effect::Skipped("no new_type given".to_string())),
            },
            Operation::NormalizeText => operations::normalize_text(df, column),
            Operation::MapValues => match step.detail_object("mapping") {
                Some(mapping) => operations::map_values(df, column, mapping),
                None => Ok(Effect::Skipped("no mapping given".to_string())),
            },
            Operation::RemoveDuplicates => remove_duplicates(df),
        }
    }
}
