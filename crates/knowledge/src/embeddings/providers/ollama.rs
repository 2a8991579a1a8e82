//! Embeddings served by a local Ollama daemon (`nomic-embed-text`, `all-minilm`, ...).
//!
//! The vector width is taken from the model's answer to a sample request made
//! on connect. Transport failures and 5xx answers are retried with doubling
//! delays; 4xx answers such as an unknown model fail immediately.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use ragbot_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const EMBEDDINGS_PATH: &str = "/api/embeddings";

const ATTEMPTS: u32 = 3;
const FIRST_DELAY_MS: u64 = 200;
const TIMEOUT_SECS: u64 = 30;

const SAMPLE_TEXT: &str = "dimension check";

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    http: Client,
    url: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedBody<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedReply {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

/// Outcome of one HTTP attempt.
enum Attempt {
    Done(Vec<f32>),
    Retry(String),
    Fail(String),
}

impl OllamaProvider {
    /// Connect and measure the model; a configured width that disagrees with it is rejected.
    pub async fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Embedding(format!("Cannot build Ollama HTTP client: {}", e)))?;

        let base = config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');

        let mut provider = Self {
            http,
            url: format!("{}{}", base, EMBEDDINGS_PATH),
            model: config.model.clone(),
            dimensions: 0,
        };

        let width = provider.detect_dimensions(base).await?;
        match config.dimensions {
            Some(expected) if expected != width => Err(AppError::Embedding(format!(
                "Ollama model '{}' produces {}-dimensional vectors, expected {}",
                provider.model, width, expected
            ))),
            _ => {
                provider.dimensions = width;
                Ok(provider)
            }
        }
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn detect_dimensions(&self, base: &str) -> AppResult<usize> {
        debug!("Checking Ollama at {}", base);

        let vector = self.embed_text(SAMPLE_TEXT).await.map_err(|e| {
            AppError::Embedding(format!(
                "Ollama not available at {} ({}). Start Ollama and run: ollama pull {}",
                base, e, self.model
            ))
        })?;

        if vector.is_empty() {
            return Err(AppError::Embedding(format!(
                "Ollama model '{}' returned an empty embedding",
                self.model
            )));
        }

        debug!("Ollama model '{}' yields {} dimensions", self.model, vector.len());
        Ok(vector.len())
    }

    async fn embed_text(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut delay = Duration::from_millis(FIRST_DELAY_MS);

        for attempt in 1..=ATTEMPTS {
            let reason = match self.attempt(text).await {
                Attempt::Done(vector) => return self.check_width(vector),
                Attempt::Fail(reason) => return Err(AppError::Embedding(reason)),
                Attempt::Retry(reason) => reason,
            };

            if attempt == ATTEMPTS {
                return Err(AppError::Embedding(reason));
            }

            warn!(
                "Ollama embedding attempt {}/{} failed: {}; next try in {:?}",
                attempt, ATTEMPTS, reason, delay
            );
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        Err(AppError::Embedding("Ollama embedding was not attempted".to_string()))
    }

    async fn attempt(&self, text: &str) -> Attempt {
        let sent = self
            .http
            .post(&self.url)
            .json(&EmbedBody {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(format!("request to Ollama failed: {}", e)),
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<EmbedReply>().await {
                Ok(reply) => Attempt::Done(reply.embedding),
                Err(e) => Attempt::Fail(format!("unreadable Ollama reply: {}", e)),
            };
        }

        let raw = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorReply>(&raw)
            .map(|reply| reply.error)
            .unwrap_or(raw);
        let reason = format!("Ollama answered {}: {}", status, detail);

        if status.is_server_error() {
            Attempt::Retry(reason)
        } else {
            Attempt::Fail(reason)
        }
    }

    fn check_width(&self, vector: Vec<f32>) -> AppResult<Vec<f32>> {
        if self.dimensions != 0 && vector.len() != self.dimensions {
            return Err(AppError::Embedding(format!(
                "Ollama returned {} dimensions where {} were expected",
                vector.len(),
                self.dimensions
            )));
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // One prompt per request on this endpoint
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            let vector = if text.trim().is_empty() {
                vec![0.0; self.dimensions]
            } else {
                self.embed_text(text).await?
            };
            vectors.push(vector);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Start a stub Ollama server that embeds every prompt as `[len, 1, 0]`.
    async fn spawn_stub(model: &'static str) -> String {
        let app = Router::new().route(
            "/api/embeddings",
            post(move |Json(request): Json<Value>| async move {
                if request["model"] != model {
                    return (
                        StatusCode::NOT_FOUND,
                        Json(json!({"error": format!("model '{}' not found", request["model"])})),
                    );
                }
                let len = request["prompt"].as_str().map(|p| p.len()).unwrap_or(0);
                (StatusCode::OK, Json(json!({"embedding": [len as f32, 1.0, 0.0]})))
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(endpoint: String, model: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            model: model.to_string(),
            endpoint: Some(endpoint),
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_dimensions_detected_on_connect() {
        let endpoint = spawn_stub("all-minilm").await;
        let provider = OllamaProvider::new(&config(endpoint, "all-minilm"))
            .await
            .unwrap();

        assert_eq!(provider.dimensions(), 3);
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "all-minilm");
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let endpoint = spawn_stub("all-minilm").await;
        let provider = OllamaProvider::new(&config(endpoint, "all-minilm"))
            .await
            .unwrap();

        let texts = vec!["abc".to_string(), "  ".to_string(), "abcdef".to_string()];
        let embeddings = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(embeddings[0], vec![3.0, 1.0, 0.0]);
        assert_eq!(embeddings[1], vec![0.0, 0.0, 0.0]);
        assert_eq!(embeddings[2], vec![6.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let endpoint = spawn_stub("all-minilm").await;
        let mut config = config(endpoint, "all-minilm");
        config.dimensions = Some(768);

        let err = OllamaProvider::new(&config).await.unwrap_err();
        assert!(err.to_string().contains("expected 768"));
        assert!(err.to_string().contains("3-dimensional"));
    }

    #[tokio::test]
    async fn test_unknown_model_fails_without_retry() {
        let endpoint = spawn_stub("all-minilm").await;
        let err = OllamaProvider::new(&config(endpoint, "missing-model"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("ollama pull missing-model"));
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("not found"));
    }
}
