//! Settings for the text-generation backend.
//!
//! - `LLM_ENDPOINT`: completion URL (default: local Ollama `/api/generate`)
//! - `LLM_MODEL`: model name sent with each request (default: `llama3`)
//! - `LLM_API_KEY`: optional bearer token
//! - `LLM_TIMEOUT_SECS`: per-request timeout (default: 60)
//! - `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`, `LLM_TOP_P`: sampling defaults

use std::env;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "llama3".to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
            max_tokens: 4096,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env::var("LLM_ENDPOINT").unwrap_or(defaults.endpoint),
            model: env::var("LLM_MODEL").unwrap_or(defaults.model),
            api_key: env::var("LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout: env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_tokens: env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
            temperature: env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.temperature),
            top_p: env::var("LLM_TOP_P")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.top_p),
        }
    }
}
