//! Local sentence embeddings via fastembed (ONNX runtime).
//!
//! Model weights are downloaded into the fastembed cache on first use.
//! Inference is CPU-bound and runs on the blocking thread pool.

use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use ragbot_core::{AppError, AppResult};
use std::sync::Arc;

/// Model names accepted in configuration, with the fastembed model and its dimensions.
const SUPPORTED_MODELS: &[(&str, EmbeddingModel, usize)] = &[
    ("all-minilm-l6-v2", EmbeddingModel::AllMiniLML6V2, 384),
    ("all-minilm-l12-v2", EmbeddingModel::AllMiniLML12V2, 384),
    ("bge-small-en-v1.5", EmbeddingModel::BGESmallENV15, 384),
    ("bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15, 768),
    ("nomic-embed-text-v1.5", EmbeddingModel::NomicEmbedTextV15, 768),
];

/// Resolve a configured model name ("sentence-transformers/all-MiniLM-L6-v2",
/// "BAAI/bge-small-en-v1.5", ...) to a fastembed model.
///
/// The organisation prefix is optional and matching ignores case.
pub fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    let name = name.trim().to_lowercase();
    let short = name.rsplit('/').next().unwrap_or(name.as_str());

    SUPPORTED_MODELS
        .iter()
        .find(|(alias, _, _)| *alias == short)
        .map(|(_, model, dims)| (model.clone(), *dims))
}

/// fastembed-backed provider.
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimensions: usize,
    batch_size: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl FastEmbedProvider {
    /// Load the configured model, downloading it if needed.
    pub async fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let (model, dimensions) = resolve_model(&config.model).ok_or_else(|| {
            AppError::Embedding(format!(
                "Unsupported fastembed model '{}'. Supported: {}",
                config.model,
                SUPPORTED_MODELS
                    .iter()
                    .map(|(alias, _, _)| *alias)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

        if let Some(expected) = config.dimensions {
            if expected != dimensions {
                return Err(AppError::Embedding(format!(
                    "Model '{}' produces {} dimensions, expected {}",
                    config.model, dimensions, expected
                )));
            }
        }

        tracing::info!("Loading embedding model '{}'", config.model);

        let embedding = tokio::task::spawn_blocking(move || {
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(false))
        })
        .await
        .map_err(|e| AppError::Embedding(format!("Embedding model load aborted: {}", e)))?
        .map_err(|e| {
            AppError::Embedding(format!(
                "Failed to load embedding model '{}': {}",
                config.model, e
            ))
        })?;

        Ok(Self {
            model: Arc::new(embedding),
            model_name: config.model.clone(),
            dimensions,
            batch_size: config.batch_size,
        })
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn provider_name(&self) -> &str {
        "fastembed"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        let batch_size = self.batch_size;

        tokio::task::spawn_blocking(move || model.embed(texts, Some(batch_size)))
            .await
            .map_err(|e| AppError::Embedding(format!("Embedding task aborted: {}", e)))?
            .map_err(|e| AppError::Embedding(format!("Failed to embed texts: {}", e)))
    }
}
