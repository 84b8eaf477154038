//! Together AI provider implementation.
//!
//! This module provides the [`TogetherProvider`] which implements the
//! [`AIProvider`] trait for the Together chat-completions API
//! (<https://api.together.xyz/>). The endpoint is OpenAI-compatible, so any
//! compatible server can be targeted through [`TogetherConfig::base_url`].

use super::AIProvider;
use super::secret::{SecretString, scrub_known};
use anyhow::{Result, anyhow};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Together API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.together.xyz/v1/chat/completions";

/// Default model used for cleaning plans and questions.
const DEFAULT_MODEL: &str = "meta-llama/Llama-4-Maverick-17B-128E-Instruct-FP8";

/// Default timeout for API requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default temperature for model responses (low for repeatable plans).
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default max tokens for responses.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Instruction appended to prompts sent in JSON mode.
pub const JSON_ONLY_INSTRUCTION: &str = "\n\nIMPORTANT: Please provide the response in a valid JSON format only, without any explanatory text before or after the JSON block.";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

/// Configuration for the Together provider.
#[derive(Debug, Clone)]
pub struct TogetherConfig {
    /// The model to use.
    pub model: String,
    /// Temperature for response generation (0.0 - 2.0).
    pub temperature: f32,
    /// Maximum tokens in the response.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Base URL for the API (useful for proxies or compatible servers).
    pub base_url: String,
}

impl Default for TogetherConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl TogetherConfig {
    /// Create a new configuration builder.
    pub fn builder() -> TogetherConfigBuilder {
        TogetherConfigBuilder::default()
    }
}

/// Builder for [`TogetherConfig`].
#[derive(Default)]
pub struct TogetherConfigBuilder {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
    base_url: Option<String>,
}

impl TogetherConfigBuilder {
    /// Set the model to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature (0.0 - 2.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Set a custom base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> TogetherConfig {
        TogetherConfig {
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_secs: self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

/// Together AI provider.
///
/// # Example
///
/// ```rust,ignore
/// use datascout::ai::{TogetherProvider, TogetherConfig};
///
/// // Key from TOGETHER_API_KEY
/// let provider = TogetherProvider::from_env()?;
///
/// // With custom configuration
/// let config = TogetherConfig::builder()
///     .timeout_secs(120)
///     .build();
/// let provider = TogetherProvider::with_config("your-api-key", config)?;
/// ```
pub struct TogetherProvider {
    api_key: SecretString,
    config: TogetherConfig,
    client: Client,
}

impl std::fmt::Debug for TogetherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TogetherProvider")
            .field("api_key", &self.api_key)
            .field("config", &self.config)
            .finish()
    }
}

impl TogetherProvider {
    /// Create a new provider with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<SecretString>) -> Result<Self> {
        Self::with_config(api_key, TogetherConfig::default())
    }

    /// Create a provider with the key from `TOGETHER_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let key = SecretString::from_env()
            .ok_or_else(|| anyhow!("{} is not set", super::secret::API_KEY_ENV))?;
        Self::new(key)
    }

    /// Create a new provider with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_config(api_key: impl Into<SecretString>, config: TogetherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            api_key: api_key.into(),
            config,
            client,
        })
    }

    pub fn config(&self) -> &TogetherConfig {
        &self.config
    }

    fn build_request(&self, prompt: &str, json_mode: bool) -> ChatRequest {
        let content = if json_mode {
            format!("{}{}", prompt, JSON_ONLY_INSTRUCTION)
        } else {
            prompt.to_string()
        };

        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: Some(content),
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    fn call_api(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.config.base_url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose()),
            )
            .header("Content-Type", "application/json")
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("Together API Error {}: {}", status, body));
        }

        let result: ChatResponse = response.json()?;
        extract_content(result)
    }
}

fn extract_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .and_then(|choice| choice.message)
        .and_then(|msg| msg.content)
        .ok_or_else(|| anyhow!("No response content from Together API"))
}

impl AIProvider for TogetherProvider {
    fn complete(&self, prompt: &str, json_mode: bool) -> Result<String> {
        let request = self.build_request(prompt, json_mode);
        debug!(
            model = %self.config.model,
            json_mode,
            prompt_chars = prompt.len(),
            "Sending chat completion request"
        );

        // Errors can echo request headers, so they are scrubbed before leaving.
        self.call_api(&request)
            .map_err(|e| anyhow!(scrub_known(&e.to_string(), &self.api_key)))
    }

    fn name(&self) -> &str {
        "Together"
    }

    fn model(&self) -> Option<&str> {
        Some(&self.config.model)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Response parsing tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_valid_response_structure() {
        let json = r#"{
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "{\"cleaning_plan\": []}"
                }
            }]
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let content = extract_content(response).unwrap();
        assert_eq!(content, r#"{"cleaning_plan": []}"#);
    }

    #[test]
    fn test_parse_response_with_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(extract_content(response).is_err());
    }

    #[test]
    fn test_parse_response_with_null_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": null}"#).unwrap();
        assert!(response.choices.is_none());
        assert!(extract_content(response).is_err());
    }

    #[test]
    fn test_parse_response_null_content() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(extract_content(response).is_err());
    }

    #[test]
    fn test_parse_malformed_json() {
        let json = r#"{"choices": [{"message": "not an object"}]}"#;
        let result: std::result::Result<ChatResponse, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    // -------------------------------------------------------------------------
    // Request building tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_json_mode_request() {
        let provider = TogetherProvider::new("test-key").unwrap();
        let request = provider.build_request("Plan please", true);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "user");
        let content = value["messages"][0]["content"].as_str().unwrap();
        assert!(content.starts_with("Plan please"));
        assert!(content.ends_with("without any explanatory text before or after the JSON block."));
        assert_eq!(value["max_tokens"], 1024);
    }

    #[test]
    fn test_plain_request_has_no_response_format() {
        let provider = TogetherProvider::new("test-key").unwrap();
        let request = provider.build_request("What is the mean age?", false);
        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][0]["content"], "What is the mean age?");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let provider = TogetherProvider::new("super-secret-key-value").unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("super-secret-key-value"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        let config = TogetherConfig::builder()
            .base_url("http://127.0.0.1:9/v1/chat/completions")
            .timeout_secs(2)
            .build();
        let provider = TogetherProvider::with_config("test-key", config).unwrap();
        assert!(provider.complete("hello", false).is_err());
    }

    // -------------------------------------------------------------------------
    // Config builder tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_config_builder_defaults() {
        let config = TogetherConfig::builder().build();

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_builder_custom() {
        let config = TogetherConfig::builder()
            .model("mistralai/Mixtral-8x7B-Instruct-v0.1")
            .temperature(0.0)
            .max_tokens(512)
            .timeout_secs(5)
            .base_url("http://localhost:8080/v1/chat/completions")
            .build();

        assert_eq!(config.model, "mistralai/Mixtral-8x7B-Instruct-v0.1");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.timeout_secs, 5);
        assert!(config.base_url.starts_with("http://localhost"));
    }
}
