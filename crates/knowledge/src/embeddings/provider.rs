//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{FastEmbedProvider, OllamaProvider, TrigramProvider};
use ragbot_core::{AppError, AppResult};
use std::sync::Arc;

/// Dimensions used by the trigram provider unless configured otherwise.
const DEFAULT_TRIGRAM_DIMENSIONS: usize = 384;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "fastembed", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// Local model providers may download weights on first use, and the Ollama
/// provider queries its server, so construction is async.
pub async fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    match config.provider.as_str() {
        "fastembed" => {
            let provider = FastEmbedProvider::new(config).await?;
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let provider = OllamaProvider::new(config).await?;
            Ok(Arc::new(provider))
        }

        "trigram" => {
            let dimensions = config.dimensions.unwrap_or(DEFAULT_TRIGRAM_DIMENSIONS);
            Ok(Arc::new(TrigramProvider::new(dimensions)))
        }

        _ => Err(AppError::Embedding(format!(
            "Unknown embedding provider: '{}'. Supported providers: fastembed, ollama, trigram",
            config.provider
        ))),
    }
}
