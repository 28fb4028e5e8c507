//! Text-generation client used by the content and grading endpoints.
//!
//! Handlers talk to an [`LlmProvider`] stored in the application state, so
//! the HTTP backend can be swapped for a scripted provider in tests.
//!
//! Model output is untrusted text. [`parse`] holds the extraction and repair
//! helpers, and [`retry::first_valid`] runs prompt cascades until one output
//! passes validation.

use std::fmt;
use std::sync::Arc;

use lms_config::LlmConfig;

pub mod http;
pub mod parse;
pub mod retry;
#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;

pub use http::HttpLlmProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use scripted::ScriptedLlm;

/// Sampling settings sent with a single generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

impl GenerationOptions {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug)]
pub enum LlmError {
    /// The request never produced a response (connect, timeout, body read).
    Transport(String),
    /// The backend answered with a non-success status.
    Status { status: u16, body: String },
    /// The backend answered but the generated text was blank.
    Empty,
    /// The response body did not contain generated text where expected.
    Malformed(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::Transport(msg) => write!(f, "LLM transport error: {}", msg),
            LlmError::Status { status, body } => {
                write!(f, "LLM backend returned {}: {}", status, body)
            }
            LlmError::Empty => write!(f, "LLM returned an empty response"),
            LlmError::Malformed(msg) => write!(f, "Malformed LLM response: {}", msg),
        }
    }
}

impl std::error::Error for LlmError {}

#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn provider_type(&self) -> &'static str;

    /// Options used when a caller has no task-specific settings.
    fn default_options(&self) -> GenerationOptions {
        GenerationOptions::default()
    }

    async fn generate(&self, prompt: &str, options: &GenerationOptions)
    -> Result<String, LlmError>;
}

pub type SharedLlm = Arc<dyn LlmProvider>;
