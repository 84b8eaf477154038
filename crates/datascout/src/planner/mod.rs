//! Plan requester: turns a dataset into a cleaning-plan request.
//!
//! The requester summarizes the dataset into a prompt, asks the provider for
//! a JSON plan and caches the answer per dataset for the lifetime of the
//! session. It never returns an error: every failure becomes a string
//! starting with [`FAILURE_MARKER`], which callers detect with
//! [`is_failure_response`].
//!
//! # Example
//!
//! ```rust,ignore
//! use datascout::planner::{PlanCache, PlanRequester, is_failure_response};
//!
//! let requester = PlanRequester::new(provider, &config);
//! let mut cache = PlanCache::new();
//! let plan = requester.request_plan(&mut cache, &df);
//! if is_failure_response(&plan) {
//!     // fall back to basic cleaning
//! }
//! ```

mod cache;

pub use cache::{CacheStats, DatasetKey, PlanCache};

use crate::ai::{AIProvider, prompt, scrub_secrets};
use crate::config::ScoutConfig;
use polars::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

/// Prefix of every failure string produced instead of a model answer.
pub const FAILURE_MARKER: &str = "❌";

/// Whether a model answer is a failure sentinel.
pub fn is_failure_response(text: &str) -> bool {
    text.starts_with(FAILURE_MARKER)
}

/// Build a failure sentinel from diagnostic text, with secrets scrubbed.
pub fn failure_response(diagnostic: impl std::fmt::Display) -> String {
    format!("{} {}", FAILURE_MARKER, scrub_secrets(&diagnostic.to_string()))
}

/// Send a prompt and convert any error into a failure sentinel.
pub fn ask_model(provider: &dyn AIProvider, prompt: &str, json_mode: bool) -> String {
    match provider.complete(prompt, json_mode) {
        Ok(answer) => answer,
        Err(e) => {
            let sentinel = failure_response(format!("Exception occurred: {}", e));
            warn!(provider = provider.name(), "Model request failed: {}", sentinel);
            sentinel
        }
    }
}

/// Requests cleaning plans from a provider.
#[derive(Clone)]
pub struct PlanRequester {
    provider: Arc<dyn AIProvider>,
    config: ScoutConfig,
}

impl PlanRequester {
    pub fn new(provider: Arc<dyn AIProvider>, config: &ScoutConfig) -> Self {
        Self {
            provider,
            config: config.clone(),
        }
    }

    pub fn provider(&self) -> &dyn AIProvider {
        self.provider.as_ref()
    }

    /// Return the plan text for `df`, asking the provider only when the
    /// cache has no plan for this dataset.
    ///
    /// Failure sentinels are returned but not cached, so a later call for
    /// the same dataset tries again.
    pub fn request_plan(&self, cache: &mut PlanCache, df: &DataFrame) -> String {
        let key = match DatasetKey::of(df) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("Could not fingerprint dataset, caching disabled: {}", e);
                None
            }
        };

        if let Some(plan) = key.as_ref().and_then(|k| cache.get(k)) {
            info!("Using cached cleaning plan");
            return plan.to_string();
        }

        let prompt = match prompt::cleaning_prompt(df, &self.config) {
            Ok(prompt) => prompt,
            Err(e) => return failure_response(format!("Could not build the cleaning prompt: {}", e)),
        };

        info!(
            provider = self.provider.name(),
            model = self.provider.model().unwrap_or("unknown"),
            "Requesting cleaning plan"
        );
        let answer = ask_model(self.provider.as_ref(), &prompt, true);

        match key {
            Some(key) if !is_failure_response(&answer) => cache.insert(key, answer.clone()),
            _ => {}
        }
        answer
    }
}

impl std::fmt::Debug for PlanRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanRequester")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Provider that replays scripted answers and records prompts.
    struct ScriptedProvider {
        answers: Mutex<Vec<anyhow::Result<String>>>,
        prompts: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedProvider {
        fn new(answers: Vec<anyhow::Result<String>>) -> Self {
            Self {
                answers: Mutex::new(answers),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl AIProvider for ScriptedProvider {
        fn complete(&self, prompt: &str, json_mode: bool) -> anyhow::Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), json_mode));
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                Err(anyhow!("no scripted answer left"))
            } else {
                answers.remove(0)
            }
        }

        fn name(&self) -> &str {
            "Scripted"
        }
    }

    fn frame() -> DataFrame {
        df!["a" => [Some(1i64), None, Some(3)]].unwrap()
    }

    #[test]
    fn test_failure_marker() {
        assert!(is_failure_response("❌ Failed to get a response: 500"));
        assert!(!is_failure_response("{\"cleaning_plan\": []}"));
        assert!(!is_failure_response(" ❌ leading space"));
        assert!(failure_response("boom").starts_with(FAILURE_MARKER));
    }

    #[test]
    fn test_failure_response_scrubs_secrets() {
        let sentinel = failure_response("401: invalid key sk-abcdefghijklmnopqrstuvwx");
        assert!(!sentinel.contains("sk-abcdefghijklmnopqrstuvwx"));
    }

    #[test]
    fn test_request_plan_uses_json_mode_and_caches() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            r#"{"cleaning_plan": []}"#.to_string(),
        )]));
        let requester = PlanRequester::new(provider.clone(), &ScoutConfig::default());
        let mut cache = PlanCache::new();

        let first = requester.request_plan(&mut cache, &frame());
        let second = requester.request_plan(&mut cache, &frame());

        assert_eq!(first, r#"{"cleaning_plan": []}"#);
        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
        assert!(provider.prompts.lock().unwrap()[0].1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(anyhow!("connection reset")),
            Ok(r#"{"cleaning_plan": []}"#.to_string()),
        ]));
        let requester = PlanRequester::new(provider.clone(), &ScoutConfig::default());
        let mut cache = PlanCache::new();

        let first = requester.request_plan(&mut cache, &frame());
        assert!(is_failure_response(&first));
        assert!(first.contains("connection reset"));
        assert!(cache.is_empty());

        let second = requester.request_plan(&mut cache, &frame());
        assert!(!is_failure_response(&second));
        assert_eq!(provider.calls(), 2);
    }

    #[test]
    fn test_different_datasets_are_requested_separately() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok("{}".to_string()),
            Ok("{}".to_string()),
        ]));
        let requester = PlanRequester::new(provider.clone(), &ScoutConfig::default());
        let mut cache = PlanCache::new();

        requester.request_plan(&mut cache, &frame());
        requester.request_plan(&mut cache, &df!["b" => [1i64]].unwrap());
        assert_eq!(provider.calls(), 2);
        assert_eq!(cache.len(), 2);
    }
}
