//! Language-model provider trait.
//!
//! This module defines the [`AIProvider`] trait that the plan requester and
//! the session talk to. Keeping the HTTP client behind a trait lets tests
//! drive the whole flow with a scripted provider and no network.
//!
//! # Example
//!
//! ```rust,ignore
//! use datascout::ai::{AIProvider, TogetherProvider};
//!
//! let provider = TogetherProvider::from_env()?;
//! let answer = provider.complete("Summarize this table: ...", false)?;
//! ```

use anyhow::Result;

/// A chat-completion backend.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a session can hold them behind an
/// `Arc` and be moved between threads.
///
/// # Error Handling
///
/// Implementations return transport, status and decoding problems as errors.
/// Callers turn them into the failure sentinel; they never reach the user as
/// a panic.
pub trait AIProvider: Send + Sync {
    /// Send a single user message and return the model's reply text.
    ///
    /// When `json_mode` is true the request asks the endpoint to constrain
    /// its output to a JSON object, and the prompt carries an instruction to
    /// answer with JSON only.
    fn complete(&self, prompt: &str, json_mode: bool) -> Result<String>;

    /// Get the provider name for logging and debugging.
    fn name(&self) -> &str;

    /// Get the model being used by this provider.
    ///
    /// Returns `None` if the provider doesn't expose model information.
    fn model(&self) -> Option<&str> {
        None
    }
}
