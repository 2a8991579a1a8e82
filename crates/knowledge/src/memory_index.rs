//! In-memory vector index.
//!
//! Chunks live in a `Vec` behind a `tokio::sync::RwLock` and are scored by
//! brute-force cosine similarity. Nothing is persisted; suited to tests and
//! throwaway sessions (`VECTOR_STORE=memory`).

use crate::types::KnowledgeChunk;
use crate::vector_index::{cosine_similarity, VectorIndex};
use ragbot_core::{AppError, AppResult};
use tokio::sync::RwLock;

#[derive(Debug)]
pub struct InMemoryIndex {
    dimensions: usize,
    chunks: RwLock<Vec<KnowledgeChunk>>,
}

impl InMemoryIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            chunks: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn upsert_chunks(&self, chunks: &[KnowledgeChunk]) -> AppResult<()> {
        for chunk in chunks {
            let len = chunk.embedding.as_ref().map(Vec::len).ok_or_else(|| {
                AppError::VectorStore(format!("Chunk {} missing embedding", chunk.id))
            })?;
            if len != self.dimensions {
                return Err(AppError::VectorStore(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.dimensions, len
                )));
            }
        }

        let mut stored = self.chunks.write().await;
        for chunk in chunks {
            match stored.iter_mut().find(|c| c.id == chunk.id) {
                Some(existing) => *existing = chunk.clone(),
                None => stored.push(chunk.clone()),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
        let stored = self.chunks.read().await;

        let mut scored: Vec<(KnowledgeChunk, f32)> = stored
            .iter()
            .map(|chunk| {
                let score = chunk
                    .embedding
                    .as_deref()
                    .map(|e| cosine_similarity(query_embedding, e))
                    .unwrap_or(0.0);
                (chunk.clone(), score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.chunks.read().await.len())
    }

    async fn reset(&self) -> AppResult<()> {
        self.chunks.write().await.clear();
        Ok(())
    }
}
