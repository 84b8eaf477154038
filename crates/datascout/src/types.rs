use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Dataset Types
// ============================================================================

/// Row and column count of a dataset, captured at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetShape {
    pub rows: usize,
    pub columns: usize,
}

impl DatasetShape {
    pub fn of(df: &polars::prelude::DataFrame) -> Self {
        Self {
            rows: df.height(),
            columns: df.width(),
        }
    }
}

impl std::fmt::Display for DatasetShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} rows × {} columns", self.rows, self.columns)
    }
}

/// Scalar kind inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Text,
}

// ============================================================================
// Cleaning Plan Types
// ============================================================================

/// The closed set of operations a cleaning plan may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    HandleMissing,
    ChangeType,
    RemoveDuplicates,
    NormalizeText,
    MapValues,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Self::HandleMissing,
        Self::ChangeType,
        Self::RemoveDuplicates,
        Self::NormalizeText,
        Self::MapValues,
    ];

    /// Look up an operation by its plan tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == tag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HandleMissing => "handle_missing",
            Self::ChangeType => "change_type",
            Self::RemoveDuplicates => "remove_duplicates",
            Self::NormalizeText => "normalize_text",
            Self::MapValues => "map_values",
        }
    }

    /// Whether the operation acts on a single named column.
    pub fn targets_column(&self) -> bool {
        !matches!(self, Self::RemoveDuplicates)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a cleaning plan as the model wrote it.
///
/// The operation is kept as raw text so that unknown tags survive parsing
/// and can be reported as skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl CleaningStep {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            details: Map::new(),
        }
    }

    /// Add a detail entry (builder style, mostly for tests).
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// The recognized operation, if any.
    pub fn kind(&self) -> Option<Operation> {
        self.operation.as_deref().and_then(Operation::from_tag)
    }

    /// A string-valued detail.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }

    /// The `column` detail.
    pub fn column(&self) -> Option<&str> {
        self.detail_str("column")
    }

    /// An object-valued detail.
    pub fn detail_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.details.get(key).and_then(Value::as_object)
    }

    /// Short label used in logs and reports.
    pub fn label(&self) -> String {
        let op = self.operation.as_deref().unwrap_or("<missing operation>");
        match self.column() {
            Some(col) => format!("{}({})", op, col),
            None => op.to_string(),
        }
    }
}

/// A parsed cleaning plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningPlan {
    #[serde(rename = "cleaning_plan", default)]
    pub steps: Vec<CleaningStep>,
}

impl CleaningPlan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

// ============================================================================
// Cleaning Report Types
// ============================================================================

/// What happened to a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    Skipped,
}

/// Report entry for one plan step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Position of the step in the plan (0-based).
    pub index: usize,
    /// Operation tag as written in the plan.
    pub operation: Option<String>,
    /// Target column, if the step named one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub outcome: StepOutcome,
    /// Human-readable description of what was done or why it was skipped.
    pub description: String,
}

/// Audit trail of a plan application.
///
/// The report is informational only. Two runs that produce the same data
/// also produce the same report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Whether the plan text parsed as JSON.
    pub plan_parsed: bool,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub steps: Vec<StepRecord>,
}

impl CleaningReport {
    pub fn new(shape: DatasetShape) -> Self {
        Self {
            plan_parsed: false,
            rows_before: shape.rows,
            rows_after: shape.rows,
            columns_before: shape.columns,
            columns_after: shape.columns,
            steps: Vec::new(),
        }
    }

    /// Record an applied step.
    pub fn applied(&mut self, index: usize, step: &CleaningStep, description: impl Into<String>) {
        self.push(index, step, StepOutcome::Applied, description.into());
    }

    /// Record a skipped step.
    pub fn skipped(&mut self, index: usize, step: &CleaningStep, reason: impl Into<String>) {
        self.push(index, step, StepOutcome::Skipped, reason.into());
    }

    fn push(&mut self, index: usize, step: &CleaningStep, outcome: StepOutcome, description: String) {
        self.steps.push(StepRecord {
            index,
            operation: step.operation.clone(),
            column: step.column().map(str::to_string),
            outcome,
            description,
        });
    }

    pub fn applied_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Applied)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Skipped)
            .count()
    }

    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

// ============================================================================
// Session Result Types
// ============================================================================

/// Where the cleaning of a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// A plan returned by the language model was interpreted.
    Model,
    /// The plan request failed (or no model is configured) and basic
    /// cleaning was applied instead.
    Fallback,
}

impl PlanSource {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Model => "AI cleaning plan",
            Self::Fallback => "basic cleaning",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_tags() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_tag(op.as_str()), Some(op));
        }
        assert_eq!(Operation::from_tag("drop_column"), None);
        assert_eq!(Operation::from_tag("HANDLE_MISSING"), None);
        assert!(!Operation::RemoveDuplicates.targets_column());
        assert!(Operation::MapValues.targets_column());
    }

    #[test]
    fn test_plan_deserialization() {
        let plan: CleaningPlan = serde_json::from_value(json!({
            "cleaning_plan": [
                {"operation": "handle_missing", "details": {"column": "Age", "strategy": "median"}},
                {"operation": "remove_duplicates"},
                {"details": {"column": "x"}}
            ]
        }))
        .unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.steps[0].kind(), Some(Operation::HandleMissing));
        assert_eq!(plan.steps[0].column(), Some("Age"));
        assert_eq!(plan.steps[0].detail_str("strategy"), Some("median"));
        assert!(plan.steps[1].details.is_empty());
        assert_eq!(plan.steps[2].kind(), None);
    }

    #[test]
    fn test_plan_missing_key_is_empty() {
        let plan: CleaningPlan = serde_json::from_value(json!({"notes": "nothing"})).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_step_label() {
        let step = CleaningStep::new("normalize_text").with_detail("column", "City");
        assert_eq!(step.label(), "normalize_text(City)");
        assert_eq!(CleaningStep::default().label(), "<missing operation>");
    }

    #[test]
    fn test_report_counts() {
        let mut report = CleaningReport::new(DatasetShape {
            rows: 10,
            columns: 3,
        });
        let step = CleaningStep::new("remove_duplicates");
        report.applied(0, &step, "removed 2 duplicate rows");
        report.skipped(1, &CleaningStep::new("explode"), "unknown operation");
        report.rows_after = 8;

        assert_eq!(report.applied_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.rows_removed(), 2);
        assert_eq!(report.steps[1].operation.as_deref(), Some("explode"));
    }

    #[test]
    fn test_shape_display() {
        let shape = DatasetShape {
            rows: 891,
            columns: 12,
        };
        assert_eq!(shape.to_string(), "891 rows × 12 columns");
    }
}
