//! Integration tests for DataScout.
//!
//! These tests drive loading, cleaning, statistics and charts end to end on
//! the CSV fixtures, with a scripted model standing in for the network.

use datascout::ai::AIProvider;
use datascout::utils::numeric_values;
use datascout::{
    PlanInterpreter, PlanSource, ScoutConfig, ScoutError, Session, StepOutcome, Upload,
    basic_stats, categorical_chart, categorical_columns, correlation_heatmap, is_failure_response,
    load_file, numeric_columns, numerical_chart, write_csv,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_table(filename: &str) -> DataFrame {
    load_file(&fixtures_path().join(filename), &ScoutConfig::default())
        .expect("Failed to load fixture")
        .into_table()
        .expect("Fixture is not a table")
}

fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

/// Provider that returns a fixed answer (or error) and counts calls.
struct MockProvider {
    answer: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Some(answer.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            answer: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AIProvider for MockProvider {
    fn complete(&self, prompt: &str, _json_mode: bool) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
            .clone()
            .ok_or_else(|| anyhow::anyhow!("error sending request: connection refused"))
    }

    fn name(&self) -> &str {
        "Mock"
    }

    fn model(&self) -> Option<&str> {
        Some("mock-model")
    }
}

const TITANIC_PLAN: &str = r#"{"cleaning_plan": [
    {"operation": "handle_missing", "details": {"column": "Age", "strategy": "median"}},
    {"operation": "handle_missing", "details": {"column": "Embarked", "strategy": "mode"}},
    {"operation": "remove_duplicates"}
]}"#;

// ============================================================================
// File Ingestion
// ============================================================================

#[test]
fn test_load_titanic_sample() {
    let df = load_table("titanic_sample.csv");

    assert_eq!(df.shape(), (14, 8));
    assert_eq!(df.column("Age").unwrap().null_count(), 2);
    assert_eq!(df.column("Embarked").unwrap().null_count(), 2);
    assert_eq!(df.column("Fare").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("Sex").unwrap().dtype(), &DataType::String);
}

#[test]
fn test_load_text_document() {
    let upload = load_file(&fixtures_path().join("notes.txt"), &ScoutConfig::default()).unwrap();
    match upload {
        Upload::Text(text) => assert!(text.starts_with("Quarterly notes")),
        Upload::Table(_) => panic!("text file loaded as a table"),
    }
}

#[test]
fn test_load_unsupported_type() {
    let err = load_file(&fixtures_path().join("data.parquet"), &ScoutConfig::default()).unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_FILE_TYPE");
}

// ============================================================================
// Session: Plan Requests and Fallback
// ============================================================================

#[test]
fn test_failed_plan_request_falls_back_to_basic_cleaning() {
    let df = load_table("titanic_sample.csv");
    let provider = MockProvider::unreachable();
    let mut session = Session::new(ScoutConfig::default()).with_provider(provider.clone());

    let outcome = session.clean_with_ai(&df);

    assert_eq!(outcome.source, PlanSource::Fallback);
    assert_eq!(outcome.data.height(), 12);
    assert_eq!(outcome.status_message(), "Cleaned: From 14 rows to 12 rows.");
    assert!(outcome.plan.is_none());
    assert_eq!(provider.calls(), 1);
}

#[test]
fn test_plan_is_requested_once_per_dataset() {
    let titanic = load_table("titanic_sample.csv");
    let messy = load_table("messy.csv");
    let provider = MockProvider::answering(TITANIC_PLAN);
    let mut session = Session::new(ScoutConfig::default()).with_provider(provider.clone());

    let first = session.clean_with_ai(&titanic);
    let second = session.clean_with_ai(&titanic);
    assert_eq!(provider.calls(), 1);
    assert!(first.data.equals_missing(&second.data));
    assert_eq!(second.plan.as_deref(), Some(TITANIC_PLAN));

    session.clean_with_ai(&messy);
    assert_eq!(provider.calls(), 2);

    let stats = session.cache_stats();
    assert_eq!((stats.hits, stats.misses), (1, 2));
}

#[test]
fn test_cleaning_prompt_describes_the_dataset() {
    let df = load_table("titanic_sample.csv");
    let provider = MockProvider::answering(TITANIC_PLAN);
    let mut session = Session::new(ScoutConfig::default()).with_provider(provider.clone());
    session.clean_with_ai(&df);

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("cleaning_plan"));
    assert!(prompts[0].contains("Embarked"));
    assert!(prompts[0].contains("handle_missing"));
}

#[test]
fn test_model_plan_cleans_titanic() {
    let df = load_table("titanic_sample.csv");
    let mut session =
        Session::new(ScoutConfig::default()).with_provider(MockProvider::answering(TITANIC_PLAN));

    let outcome = session.clean_with_ai(&df);
    let cleaned = &outcome.data;

    assert_eq!(outcome.source, PlanSource::Model);
    assert_eq!(cleaned.height(), 13);
    assert_eq!(cleaned.column("Age").unwrap().null_count(), 0);
    assert_eq!(cleaned.column("Embarked").unwrap().null_count(), 0);

    // Median of the twelve known ages
    let ages = numeric_values(cleaned.column("Age").unwrap().as_materialized_series()).unwrap();
    assert_eq!(ages[5], Some(26.5));
    assert_eq!(strings(cleaned, "Embarked")[5].as_deref(), Some("Q"));

    let report = outcome.report.unwrap();
    assert!(report.plan_parsed);
    assert_eq!(report.applied_count(), 3);
    assert_eq!(session.model_name().as_deref(), Some("mock-model"));
}

#[test]
fn test_ask_about_cleaned_data() {
    let df = load_table("messy.csv");
    let provider = MockProvider::answering("Two cities.");
    let mut session = Session::new(ScoutConfig::default()).with_provider(provider.clone());
    session.clean_with_ai(&df);

    let answer = session.ask("How many cities?").unwrap();
    assert_eq!(answer, "Two cities.");

    let prompts = provider.prompts.lock().unwrap();
    let question = prompts.last().unwrap();
    assert!(question.starts_with("Based on the data, answer: How many cities?\n\nData:\n"));
    assert!(question.contains("id,code,sex,city"));
}

#[test]
fn test_ask_rejects_empty_question() {
    let mut session =
        Session::new(ScoutConfig::default()).with_provider(MockProvider::answering("x"));
    session.clean_with_ai(&load_table("messy.csv"));
    assert!(matches!(session.ask(""), Err(ScoutError::InvalidInput(_))));
}

#[test]
fn test_ask_failure_is_a_sentinel() {
    let mut session = Session::new(ScoutConfig::default()).with_provider(MockProvider::unreachable());
    session.clean_with_ai(&load_table("messy.csv"));
    let answer = session.ask("Anything?").unwrap();
    assert!(is_failure_response(&answer));
}

// ============================================================================
// Plan Interpretation
// ============================================================================

#[test]
fn test_messy_plan() {
    let df = load_table("messy.csv");
    let plan = r#"{"cleaning_plan": [
        {"operation": "map_values", "details": {"column": "sex", "mapping": {"M": "male", "m": "male", "F": "female"}}},
        {"operation": "normalize_text", "details": {"column": "city"}},
        {"operation": "change_type", "details": {"column": "code", "new_type": "numeric"}},
        {"operation": "normalize_text", "details": {"column": "nonexistent"}},
        {"operation": "handle_missing", "details": {"column": "code", "strategy": "median"}}
    ]}"#;

    let (cleaned, report) = PlanInterpreter::new().apply_with_report(&df, plan);

    assert_eq!(
        strings(&cleaned, "sex"),
        vec![
            Some("male".to_string()),
            Some("female".to_string()),
            Some("male".to_string()),
            Some("female".to_string())
        ]
    );
    assert_eq!(
        strings(&cleaned, "city"),
        vec![
            Some("oslo".to_string()),
            Some("rome".to_string()),
            Some("oslo".to_string()),
            Some("rome".to_string())
        ]
    );
    let codes = numeric_values(cleaned.column("code").unwrap().as_materialized_series()).unwrap();
    assert_eq!(codes, vec![Some(10.0), Some(20.0), Some(20.0), Some(40.0)]);

    let outcomes: Vec<StepOutcome> = report.steps.iter().map(|s| s.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            StepOutcome::Applied,
            StepOutcome::Applied,
            StepOutcome::Applied,
            StepOutcome::Skipped,
            StepOutcome::Applied
        ]
    );
}

#[test]
fn test_invalid_plan_leaves_data_unchanged() {
    let df = load_table("titanic_sample.csv");
    let cleaned = PlanInterpreter::new().apply(&df, "{not json");
    assert!(cleaned.equals_missing(&df));
}

#[test]
fn test_remove_duplicates_is_idempotent() {
    let df = load_table("titanic_sample.csv");
    let plan = r#"{"cleaning_plan": [{"operation": "remove_duplicates"}]}"#;
    let interpreter = PlanInterpreter::new();

    let once = interpreter.apply(&df, plan);
    let twice = interpreter.apply(&once, plan);
    assert_eq!(once.height(), 13);
    assert!(once.equals_missing(&twice));
}

// ============================================================================
// Summary & Visualization
// ============================================================================

#[test]
fn test_stats_and_charts_on_cleaned_titanic() {
    let df = load_table("titanic_sample.csv");
    let mut session = Session::new(ScoutConfig::default());
    let cleaned = session.clean_with_ai(&df).data;

    let stats = basic_stats(&cleaned).unwrap();
    let sex = stats.get("Sex").unwrap();
    assert_eq!(sex.top.as_deref(), Some("female"));
    assert_eq!(sex.freq, Some(7));
    assert_eq!(stats.get("Fare").unwrap().count, 12);

    assert_eq!(categorical_columns(&cleaned), vec!["Name", "Sex", "Embarked"]);
    assert_eq!(
        numeric_columns(&cleaned),
        vec!["PassengerId", "Survived", "Pclass", "Age", "Fare"]
    );

    let bars = categorical_chart(&cleaned, "Sex").unwrap();
    let labels: Vec<(&str, usize)> = bars.bars.iter().map(|b| (b.label.as_str(), b.count)).collect();
    assert_eq!(labels, vec![("male", 5), ("female", 7)]);

    let histogram = numerical_chart(&cleaned, "Age").unwrap();
    assert_eq!(histogram.count, 11);
    assert_eq!(histogram.bins.iter().map(|b| b.count).sum::<usize>(), 11);

    let heatmap = correlation_heatmap(&cleaned).unwrap();
    assert_eq!(heatmap.columns.len(), 5);
    for i in 0..5 {
        assert_eq!(heatmap.matrix[i][i], Some(1.0));
    }
    let r = heatmap.get("Pclass", "Fare").unwrap();
    assert!(r < 0.0);
}

#[test]
fn test_cleaned_export_reloads() {
    let df = load_table("titanic_sample.csv");
    let cleaned = Session::new(ScoutConfig::default()).clean_with_ai(&df).data;
    let dir = tempfile::tempdir().unwrap();

    let path = write_csv(&cleaned, dir.path().join("titanic_sample_cleaned.csv")).unwrap();
    let reloaded = load_file(&path, &ScoutConfig::default())
        .unwrap()
        .into_table()
        .unwrap();

    assert_eq!(reloaded.shape(), cleaned.shape());
    assert_eq!(reloaded.get_column_names_str(), cleaned.get_column_names_str());
}
