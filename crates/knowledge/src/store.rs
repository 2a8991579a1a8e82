//! Vector store: an embedding provider bound to one index collection.

use crate::embeddings::EmbeddingProvider;
use crate::lancedb_index::LanceDbIndex;
use crate::memory_index::InMemoryIndex;
use crate::types::KnowledgeChunk;
use crate::vector_index::VectorIndex;
use ragbot_core::{AppConfig, AppError, AppResult};
use std::path::PathBuf;
use std::sync::Arc;

/// Vector index backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    LanceDb,
    Memory,
}

impl StoreBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "lancedb" => Some(Self::LanceDb),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Where and how the collection is stored.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub path: PathBuf,
    pub collection: String,
}

impl StoreSettings {
    pub fn from_app_config(config: &AppConfig, collection: &str) -> AppResult<Self> {
        let backend = StoreBackend::parse(&config.vector_store).ok_or_else(|| {
            AppError::Config(format!(
                "Unknown vector store '{}'. Supported: lancedb, memory",
                config.vector_store
            ))
        })?;

        Ok(Self {
            backend,
            path: config.vector_db_path.clone(),
            collection: collection.to_string(),
        })
    }

    /// Non-persistent settings, used by tests and `VECTOR_STORE=memory`.
    pub fn in_memory(collection: &str) -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: PathBuf::new(),
            collection: collection.to_string(),
        }
    }
}

/// Collection handle that embeds on insert and on query.
pub struct VectorStore {
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl VectorStore {
    /// Open (or create) the collection described by `settings`.
    pub async fn open(
        settings: &StoreSettings,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        let dimensions = embedder.dimensions();
        let index: Arc<dyn VectorIndex> = match settings.backend {
            StoreBackend::LanceDb => Arc::new(
                LanceDbIndex::open(&settings.path, &settings.collection, dimensions).await?,
            ),
            StoreBackend::Memory => Arc::new(InMemoryIndex::new(dimensions)),
        };

        tracing::debug!(
            "Opened collection '{}' ({} backend, {} dimensions)",
            settings.collection,
            index.backend_name(),
            dimensions
        );

        Ok(Self {
            collection: settings.collection.clone(),
            embedder,
            index,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Embed and insert chunks; returns how many were stored.
    pub async fn add_documents(&self, mut chunks: Vec<KnowledgeChunk>) -> AppResult<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = Some(embedding);
        }

        self.index.upsert_chunks(&chunks).await?;
        Ok(chunks.len())
    }

    /// Top-k chunks for a query, most similar first, with cosine scores.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        self.index.search(&query_embedding, k).await
    }

    pub async fn count(&self) -> AppResult<usize> {
        self.index.count().await
    }

    /// Delete every chunk in the collection.
    pub async fn clear(&self) -> AppResult<()> {
        self.index.reset().await
    }
}
