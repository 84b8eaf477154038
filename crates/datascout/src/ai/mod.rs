//! Language-model access for cleaning plans and questions.
//!
//! This module provides a trait-based abstraction over the chat-completion
//! backend, the prompts DataScout sends, and the secret handling around the
//! API key.
//!
//! # Feature Flag
//!
//! The concrete HTTP provider requires the `ai` feature flag. The
//! [`AIProvider`] trait, prompts and secret helpers are always available so
//! that custom or scripted providers can be plugged in.
//!
//! ```toml
//! # Enable AI support (default)
//! datascout = { version = "0.1", features = ["ai"] }
//!
//! # Disable AI support; cleaning always uses the basic fallback
//! datascout = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use datascout::ai::TogetherProvider;
//! use datascout::Session;
//! use std::sync::Arc;
//!
//! let provider = Arc::new(TogetherProvider::from_env()?);
//! let mut session = Session::new(config).with_provider(provider);
//! ```

// Provider trait is always available (for custom implementations)
mod provider;
pub use provider::AIProvider;

pub mod prompt;
pub mod secret;

pub use secret::{SecretString, scrub_secrets};

// Concrete provider requires the "ai" feature
#[cfg(feature = "ai")]
mod together;

#[cfg(feature = "ai")]
pub use together::{JSON_ONLY_INSTRUCTION, TogetherConfig, TogetherConfigBuilder, TogetherProvider};
