//! Embedding configuration types.

use ragbot_core::{AppConfig, AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "fastembed", "ollama", "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions; `None` lets the provider decide
    #[serde(default)]
    pub dimensions: Option<usize>,

    /// Base URL for HTTP providers
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Maximum batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    64
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "fastembed".to_string(),
            model: ragbot_core::config::DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: None,
            endpoint: None,
            batch_size: default_batch_size(),
        }
    }
}

impl EmbeddingConfig {
    /// Build the embedding settings from application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            provider: config.embedding_provider.trim().to_lowercase(),
            model: config.embedding_model.clone(),
            endpoint: config.embedding_endpoint.clone(),
            ..Self::default()
        }
    }

    /// Offline hashing embeddings, used by tests and air-gapped setups.
    pub fn trigram() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: Some(384),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.model.trim().is_empty() {
            return Err(AppError::Embedding(
                "Embedding model must not be empty".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(AppError::Embedding(
                "Embedding batch size must be positive".to_string(),
            ));
        }
        if self.dimensions == Some(0) {
            return Err(AppError::Embedding(
                "Embedding dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
