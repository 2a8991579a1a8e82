//! Vector index abstraction for knowledge chunks.
//!
//! Defines a trait for backend-agnostic vector storage and retrieval.

use crate::types::KnowledgeChunk;
use ragbot_core::AppResult;

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Inserting chunks with embeddings
/// - Searching for similar vectors (top-k)
/// - Counting stored chunks
/// - Deleting every chunk
///
/// Methods take `&self`; backends synchronise internally.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Short backend name for logs ("lancedb", "memory").
    fn backend_name(&self) -> &str;

    /// Insert chunks; every chunk must carry an embedding.
    async fn upsert_chunks(&self, chunks: &[KnowledgeChunk]) -> AppResult<()>;

    /// Search for the top-k most similar chunks to the query embedding.
    ///
    /// Returns chunks ordered by descending cosine similarity.
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>>;

    /// Number of stored chunks.
    async fn count(&self) -> AppResult<usize>;

    /// Remove every chunk.
    async fn reset(&self) -> AppResult<()>;
}

/// Calculate cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
