//! Provider-neutral chat completion interface.

use ragbot_core::AppResult;
use serde::{Deserialize, Serialize};

/// A single-turn completion: prompt text plus optional sampling settings.
///
/// Unset fields are left to the provider's defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub prompt: String,

    /// Target model; providers send it as-is, so aliases are resolved beforehand
    pub model: String,

    /// Sampling temperature, 0.0 to 2.0
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Text produced by a provider along with its accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,

    /// Model the provider reports having used
    pub model: String,

    pub usage: LlmUsage,

    /// Provider's stop reason, e.g. `STOP` or `MAX_TOKENS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token counts for one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,

    #[serde(default)]
    pub completion_tokens: u32,

    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Usage whose total is the sum of both counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for chat-model providers.
///
/// Abstracts the hosted provider so the answering pipeline can be exercised
/// with scripted clients.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider label used in logs, e.g. `gemini`.
    fn provider_name(&self) -> &str;

    /// Canonical model identifier requests should target.
    fn model_name(&self) -> &str;

    /// Send one request and wait for the whole answer.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}
