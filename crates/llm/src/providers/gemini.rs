//! Gemini chat provider implementation.
//!
//! Talks to Google's Generative Language API (`generateContent`).
//! API reference: https://ai.google.dev/api/generate-content

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use ragbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default API base URL
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini API request format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Error envelope returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Gemini chat client.
pub struct GeminiClient {
    /// Base URL for the Generative Language API
    base_url: String,

    /// API key, sent as `x-goog-api-key`
    api_key: String,

    /// Canonical model identifier
    model: String,

    /// HTTP client
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client against the public endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_GEMINI_URL, api_key, model)
    }

    /// Create a new Gemini client with a custom base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Convert LlmRequest to Gemini format.
    fn to_gemini_request(&self, request: &LlmRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: request.temperature.map(|temperature| GenerationConfig {
                temperature: Some(temperature),
            }),
        }
    }

    /// Convert Gemini response to LlmResponse.
    fn convert_response(&self, response: GeminiResponse, model: &str) -> AppResult<LlmResponse> {
        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(AppError::Llm(format!("Gemini returned no answer: {}", reason)));
        };

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = response
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: response.model_version.unwrap_or_else(|| model.to_string()),
            usage,
            finish_reason: candidate.finish_reason,
        })
    }

    /// Turn a non-2xx response body into an error message.
    fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => match envelope.error.status {
                Some(code) => format!(
                    "Gemini API error ({}, {}): {}",
                    status, code, envelope.error.message
                ),
                None => format!("Gemini API error ({}): {}", status, envelope.error.message),
            },
            Err(_) => format!("Gemini API error ({}): {}", status, body),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let model = if request.model.trim().is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };

        tracing::info!("Sending completion request to Gemini (model: {})", model);
        tracing::debug!("Prompt length: {} chars", request.prompt.len());

        let gemini_request = self.to_gemini_request(request);
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = Self::describe_error(status, &error_text);
            tracing::warn!("{}", message);
            return Err(AppError::Llm(message));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Gemini response: {}", e)))?;

        let converted = self.convert_response(gemini_response, model)?;

        tracing::info!(
            "Received completion from Gemini ({} tokens)",
            converted.usage.total_tokens
        );

        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Start a stub API server answering every generateContent call.
    async fn spawn_stub(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/v1beta/models/*rest",
            post(move |headers: HeaderMap, Json(request): Json<Value>| {
                let body = body.clone();
                async move {
                    let authorized = headers
                        .get("x-goog-api-key")
                        .map(|v| v == "test-key")
                        .unwrap_or(false);
                    if !authorized || request["contents"][0]["parts"][0]["text"].is_null() {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "bad request"}})));
                    }
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_gemini_client_creation() {
        let client = GeminiClient::new("key", "gemini-pro");
        assert_eq!(client.provider_name(), "gemini");
        assert_eq!(client.model_name(), "gemini-pro");
        assert_eq!(client.base_url, DEFAULT_GEMINI_URL);
    }

    #[test]
    fn test_gemini_request_conversion() {
        let client = GeminiClient::new("key", "gemini-pro");
        let request = LlmRequest::new("Hello", "gemini-pro").with_temperature(0.5);

        let body = serde_json::to_value(client.to_gemini_request(&request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
        assert_eq!(body["generationConfig"]["temperature"], 0.5);

        let plain = serde_json::to_value(
            client.to_gemini_request(&LlmRequest::new("Hello", "gemini-pro")),
        )
        .unwrap();
        assert!(plain.get("generationConfig").is_none());
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let client = GeminiClient::new("key", "gemini-pro");
        let response: GeminiResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();

        let err = client.convert_response(response, "gemini-pro").unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_complete_against_stub() {
        let base_url = spawn_stub(
            StatusCode::OK,
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Paris"}, {"text": " is the capital."}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5, "totalTokenCount": 17}
            }),
        )
        .await;

        let client = GeminiClient::with_base_url(base_url, "test-key", "gemini-pro");
        let response = client
            .complete(&LlmRequest::new("Capital of France?", "gemini-pro"))
            .await
            .unwrap();

        assert_eq!(response.content, "Paris is the capital.");
        assert_eq!(response.usage.total_tokens, 17);
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    }

    #[tokio::test]
    async fn test_quota_error_message_is_preserved() {
        let base_url = spawn_stub(
            StatusCode::TOO_MANY_REQUESTS,
            json!({
                "error": {
                    "code": 429,
                    "message": "You exceeded your current quota, please check your plan and billing details.",
                    "status": "RESOURCE_EXHAUSTED"
                }
            }),
        )
        .await;

        let client = GeminiClient::with_base_url(base_url, "test-key", "gemini-pro");
        let err = client
            .complete(&LlmRequest::new("Hi", "gemini-pro"))
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("RESOURCE_EXHAUSTED"));
        assert!(message.to_lowercase().contains("quota"));
    }
}
