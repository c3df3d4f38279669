//! HTTP client for chat completion APIs.

use crate::llm::CompletionModel;
use crate::otel::{llm_span, record_llm_metrics};
use crate::types::{AgentError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::Instrument;

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
    Cerebras,
}

impl LlmProvider {
    /// Infer the provider from a model name.
    ///
    /// - `claude-*`, `anthropic*` → Anthropic
    /// - `cerebras:*`, `llama*`, `qwen*` → Cerebras
    /// - anything else → OpenAI
    pub fn from_model(model: &str) -> Self {
        if model.starts_with("claude") || model.starts_with("anthropic") {
            Self::Anthropic
        } else if model.starts_with("cerebras") || model.starts_with("llama") || model.starts_with("qwen") {
            Self::Cerebras
        } else {
            Self::OpenAI
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::OpenAI => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Cerebras => "CEREBRAS_API_KEY",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Cerebras => "cerebras",
        }
    }
}

/// OpenAI-compatible chat completion response.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Anthropic Messages API response.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

/// Strip a markdown code fence from an LLM reply.
///
/// Handles:
/// - ```json ... ```
/// - ```sql ... ```
/// - ``` ... ```
///
/// Text without a leading fence is returned trimmed.
pub fn strip_markdown(text: &str) -> String {
    let text = text.trim();

    if text.starts_with("```") {
        let start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
        let end = text.rfind("```").filter(|&i| i >= start).unwrap_or(text.len());
        return text[start..end].trim().to_string();
    }

    text.to_string()
}

/// Chat completion client for OpenAI, Anthropic and Cerebras.
#[derive(Debug, Clone)]
pub struct LlmClient {
    api_key: String,
    model: String,
    provider: LlmProvider,
    client: Client,
}

impl LlmClient {
    /// Create new client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Provider API key
    /// * `model` - Model name (e.g., "gpt-4-turbo", "claude-3-5-sonnet-20241022")
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `AgentError::HttpError` if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let provider = LlmProvider::from_model(&model);
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            model,
            provider,
            client,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Call the configured provider.
    pub async fn call_llm(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let span = llm_span(&self.model, self.provider.as_str());

        async {
            let text = match self.provider {
                LlmProvider::OpenAI => {
                    self.call_openai_compatible(
                        "https://api.openai.com/v1/chat/completions",
                        &self.model,
                        system_prompt,
                        user_prompt,
                    )
                    .await?
                }
                LlmProvider::Cerebras => {
                    self.call_openai_compatible(
                        "https://api.cerebras.ai/v1/chat/completions",
                        self.model.strip_prefix("cerebras:").unwrap_or(&self.model),
                        system_prompt,
                        user_prompt,
                    )
                    .await?
                }
                LlmProvider::Anthropic => self.call_anthropic(system_prompt, user_prompt).await?,
            };

            tracing::debug!(chars = text.len(), "LLM reply received");
            Ok(text)
        }
        .instrument(span)
        .await
    }

    /// Call an OpenAI-compatible chat completions endpoint.
    async fn call_openai_compatible(
        &self,
        url: &str,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_prompt}
                ],
                "temperature": 0
            }))
            .send()
            .await
            .map_err(|e| AgentError::llm(format!("{} API error: {}", self.provider.as_str(), e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::llm(format!("Failed to read response: {}", e)))?;
        record_llm_metrics(status.as_u16(), body.len());

        if !status.is_success() {
            return Err(AgentError::llm(format!(
                "{} API error {}: {}",
                self.provider.as_str(),
                status,
                body
            )));
        }

        let parsed: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            AgentError::llm(format!("Failed to parse {} response: {}", self.provider.as_str(), e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AgentError::llm(format!("No response from {}", self.provider.as_str())))
    }

    /// Call Anthropic Messages API.
    async fn call_anthropic(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "max_tokens": 4096,
                "system": system_prompt,
                "messages": [
                    {"role": "user", "content": user_prompt}
                ],
                "temperature": 0
            }))
            .send()
            .await
            .map_err(|e| AgentError::llm(format!("Anthropic API error: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgentError::llm(format!("Failed to read response: {}", e)))?;
        record_llm_metrics(status.as_u16(), body.len());

        if !status.is_success() {
            return Err(AgentError::llm(format!("Anthropic API error {}: {}", status, body)));
        }

        let parsed: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| AgentError::llm(format!("Failed to parse Anthropic response: {}", e)))?;

        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| AgentError::llm("No response from Anthropic"))
    }
}

#[async_trait]
impl CompletionModel for LlmClient {
    async fn complete(&self, system_prompt: &str, user_input: &str) -> Result<String> {
        self.call_llm(system_prompt, user_input).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
