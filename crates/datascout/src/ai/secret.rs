//! API-key handling.
//!
//! The key lives in a [`SecretString`] whose `Debug` and `Display` never show
//! the value, and every diagnostic string that may echo a request passes
//! through [`scrub_secrets`] before it is logged or shown.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Environment variable holding the language-model API key.
pub const API_KEY_ENV: &str = "TOGETHER_API_KEY";

const REDACTED: &str = "[REDACTED]";

/// Patterns for common API-key formats.
static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // OpenAI-style keys, including sk-proj- and sk-test- variants
        r"sk-[a-zA-Z0-9\-_]{20,}",
        // Together keys are 64 hex characters
        r"\b[a-f0-9]{64}\b",
        // Google API keys
        r"AIza[0-9A-Za-z\-_]{35}",
        // GitHub tokens
        r"ghp_[a-zA-Z0-9]{36}",
        r"Bearer\s+[^\s]{20,}",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Sensitive text that refuses to print itself.
///
/// Use [`SecretString::expose`] at the single point where the raw value is
/// needed (the `Authorization` header).
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Read the key from [`API_KEY_ENV`]. Empty values count as absent.
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .map(Self::new)
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString({})", REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Replace anything that looks like an API key with `[REDACTED]`.
pub fn scrub_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in SECRET_PATTERNS.iter() {
        result = pattern.replace_all(&result, REDACTED).into_owned();
    }
    result
}

/// [`scrub_secrets`], additionally removing one known secret verbatim.
pub fn scrub_known(text: &str, secret: &SecretString) -> String {
    let scrubbed = if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret.expose(), REDACTED)
    };
    scrub_secrets(&scrubbed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = SecretString::new("tok-very-secret");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(secret.expose(), "tok-very-secret");
    }

    #[test]
    fn test_empty_secret() {
        assert!(SecretString::new("   ").is_empty());
        assert!(!SecretString::from("abc").is_empty());
    }

    #[test]
    fn test_scrub_known_patterns() {
        let text = "401 Unauthorized: Bearer abcdefghijklmnopqrstuvwxyz123456 rejected";
        let scrubbed = scrub_secrets(text);
        assert!(!scrubbed.contains("abcdefghijklmnopqrstuvwxyz123456"));
        assert!(scrubbed.contains("[REDACTED]"));

        let openai = scrub_secrets("key sk-proj-aaaaaaaaaaaaaaaaaaaaaaaa was invalid");
        assert_eq!(openai, "key [REDACTED] was invalid");

        let hex = "a".repeat(64);
        assert_eq!(scrub_secrets(&format!("key={}", hex)), "key=[REDACTED]");
    }

    #[test]
    fn test_scrub_leaves_plain_text() {
        let text = "Request timed out after 60s";
        assert_eq!(scrub_secrets(text), text);
    }

    #[test]
    fn test_scrub_known_secret() {
        let secret = SecretString::new("short-key");
        let scrubbed = scrub_known("invalid api key: short-key", &secret);
        assert_eq!(scrubbed, "invalid api key: [REDACTED]");
    }
}
