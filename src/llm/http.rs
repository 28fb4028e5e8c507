use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use lms_config::LlmConfig;

use super::{GenerationOptions, LlmError, LlmProvider};

/// Provider for completion endpoints that accept `{model, prompt, stream, options}`.
///
/// Ollama's `/api/generate` is the default target. Bedrock-style `generation`,
/// `completion` and OpenAI-style `choices[0].text` bodies are also understood.
pub struct HttpLlmProvider {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
}

impl HttpLlmProvider {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait::async_trait]
impl LlmProvider for HttpLlmProvider {
    fn provider_type(&self) -> &'static str {
        "http"
    }

    fn default_options(&self) -> GenerationOptions {
        GenerationOptions::from_config(&self.config)
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            temperature = options.temperature,
            "Sending generation request"
        );

        let mut request = self.client.post(&self.config.endpoint).json(&GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: RequestOptions {
                num_predict: options.max_tokens,
                temperature: options.temperature,
                top_p: options.top_p,
            },
        });
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "LLM backend returned an error status");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        let text = extract_text(&body)
            .ok_or_else(|| LlmError::Malformed("no generated text field".to_string()))?;

        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(text.to_string())
    }
}

/// Reads generated text from the known response shapes.
pub(crate) fn extract_text(body: &Value) -> Option<&str> {
    ["response", "generation", "completion"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .or_else(|| body.pointer("/choices/0/text").and_then(Value::as_str))
}
