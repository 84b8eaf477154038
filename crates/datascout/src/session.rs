//! A DataScout session: one dataset, one optional model, one plan cache.
//!
//! # Example
//!
//! ```rust,ignore
//! use datascout::{ScoutConfig, Session};
//! use std::path::Path;
//!
//! let mut session = Session::new(ScoutConfig::default()).with_provider(provider);
//! let df = session.load(Path::new("titanic.csv"))?.into_table()?;
//! let outcome = session.clean_with_ai(&df);
//! println!("{}", outcome.status_message());
//! let answer = session.ask("Which class had the highest survival rate?")?;
//! ```

use crate::ai::{AIProvider, prompt};
use crate::config::ScoutConfig;
use crate::error::{Result, ResultExt, ScoutError};
use crate::ingest::{Upload, load_file};
use crate::interpreter::{PlanInterpreter, drop_empty_rows, remove_duplicates};
use crate::planner::{CacheStats, PlanCache, PlanRequester, ask_model, is_failure_response};
use crate::types::{CleaningReport, DatasetShape, PlanSource};
use polars::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of cleaning a dataset.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub data: DataFrame,
    pub source: PlanSource,
    /// Plan text returned by the model, when one was used.
    pub plan: Option<String>,
    /// Per-step report, when a plan was interpreted.
    pub report: Option<CleaningReport>,
    pub original_shape: DatasetShape,
}

impl CleaningOutcome {
    pub fn cleaned_shape(&self) -> DatasetShape {
        DatasetShape::of(&self.data)
    }

    /// Rows before and after, e.g. `Cleaned: From 891 rows to 889 rows.`
    pub fn status_message(&self) -> String {
        format!(
            "Cleaned: From {} rows to {} rows.",
            self.original_shape.rows,
            self.data.height()
        )
    }
}

/// Drop rows where every column is missing, then duplicate rows.
///
/// Used whenever no usable cleaning plan is available.
pub fn basic_cleaning(df: &DataFrame) -> PolarsResult<DataFrame> {
    let mut cleaned = df.clone();
    let empty = drop_empty_rows(&mut cleaned)?;
    remove_duplicates(&mut cleaned)?;
    info!(
        "Basic cleaning removed {} empty and {} duplicate rows",
        empty,
        df.height() - empty - cleaned.height()
    );
    Ok(cleaned)
}

/// State of one interactive exploration.
pub struct Session {
    config: ScoutConfig,
    provider: Option<Arc<dyn AIProvider>>,
    cache: PlanCache,
    data: Option<DataFrame>,
    original_shape: Option<DatasetShape>,
}

impl Session {
    pub fn new(config: ScoutConfig) -> Self {
        Self {
            config,
            provider: None,
            cache: PlanCache::new(),
            data: None,
            original_shape: None,
        }
    }

    /// Attach the model used for plans and questions.
    pub fn with_provider(mut self, provider: Arc<dyn AIProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Model behind the provider, when it reports one.
    pub fn model_name(&self) -> Option<String> {
        self.provider.as_ref()?.model().map(str::to_string)
    }

    /// Current (cleaned, once cleaning has run) dataset.
    pub fn data(&self) -> Option<&DataFrame> {
        self.data.as_ref()
    }

    /// Shape of the dataset as loaded.
    pub fn original_shape(&self) -> Option<DatasetShape> {
        self.original_shape
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Load a file. Tables become the session dataset; documents replace it
    /// with nothing.
    pub fn load(&mut self, path: &Path) -> Result<Upload> {
        let upload = load_file(path, &self.config)?;
        match &upload {
            Upload::Table(df) => {
                self.original_shape = Some(DatasetShape::of(df));
                self.data = Some(df.clone());
            }
            Upload::Text(_) => {
                self.original_shape = None;
                self.data = None;
            }
        }
        Ok(upload)
    }

    /// Clean `df` with a model plan, or with [`basic_cleaning`] when the plan
    /// cannot be obtained. The cleaned frame becomes the session dataset.
    pub fn clean_with_ai(&mut self, df: &DataFrame) -> CleaningOutcome {
        let original_shape = DatasetShape::of(df);
        if self.original_shape.is_none() {
            self.original_shape = Some(original_shape);
        }

        let plan = match (&self.provider, self.config.use_ai) {
            (Some(provider), true) => {
                info!("Asking the model for a cleaning plan (once per dataset)");
                let requester = PlanRequester::new(Arc::clone(provider), &self.config);
                let answer = requester.request_plan(&mut self.cache, df);
                if is_failure_response(&answer) {
                    warn!("Failed to get a cleaning plan from the model, defaulting to basic cleaning");
                    None
                } else {
                    Some(answer)
                }
            }
            (None, true) => {
                info!("No model configured, using basic cleaning");
                None
            }
            (_, false) => None,
        };

        let outcome = match plan {
            Some(plan) => {
                info!("Executing the cleaning plan");
                let (data, report) = PlanInterpreter::new().apply_with_report(df, &plan);
                CleaningOutcome {
                    data,
                    source: PlanSource::Model,
                    plan: Some(plan),
                    report: Some(report),
                    original_shape,
                }
            }
            None => {
                let data = basic_cleaning(df).unwrap_or_else(|e| {
                    warn!("Basic cleaning failed, keeping the data as loaded: {}", e);
                    df.clone()
                });
                CleaningOutcome {
                    data,
                    source: PlanSource::Fallback,
                    plan: None,
                    report: None,
                    original_shape,
                }
            }
        };

        info!("{}", outcome.status_message());
        self.data = Some(outcome.data.clone());
        outcome
    }

    /// Ask a free-form question about the session dataset.
    ///
    /// Returns the model's answer, or a failure sentinel when the request
    /// fails.
    pub fn ask(&self, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ScoutError::InvalidInput("question is empty".to_string()));
        }
        let df = self.data.as_ref().ok_or(ScoutError::NoDataLoaded)?;
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| ScoutError::AiClientError("no model configured".to_string()))?;

        let prompt = prompt::question_prompt(df, question, self.config.question_sample_rows)
            .context("Failed to build the question prompt")?;
        info!(provider = provider.name(), "Asking the model a question");
        Ok(ask_model(provider.as_ref(), &prompt, false))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("cached_plans", &self.cache.len())
            .field("data", &self.data.as_ref().map(DatasetShape::of))
            .field("original_shape", &self.original_shape)
            .finish()
    }
}

static_assertions::assert_impl_all!(Session: Send);
