//! Character-based document splitting using the text-splitter crate.

use crate::types::{Document, KnowledgeChunk};
use ragbot_core::{AppError, AppResult};
use serde_json::Value;
use sha2::{Digest, Sha256};
use text_splitter::{ChunkConfig, TextSplitter};

/// Maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Characters shared between neighbouring chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Splits documents into overlapping chunks that inherit document metadata.
pub struct DocumentSplitter {
    inner: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl DocumentSplitter {
    /// Create a splitter with the given capacity and overlap (in characters).
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| AppError::Config(format!("Invalid chunk configuration: {}", e)))?;

        Ok(Self {
            inner: TextSplitter::new(config),
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split documents into chunks.
    ///
    /// Each chunk carries the document's metadata plus `chunk_index` (running
    /// across all documents), `start_index` (byte offset in the document text)
    /// and `content_hash`. Whitespace-only chunks are dropped.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<KnowledgeChunk> {
        let mut chunks = Vec::new();

        for document in documents {
            for (start, text) in self.inner.chunk_indices(&document.page_content) {
                if text.trim().is_empty() {
                    continue;
                }

                let mut metadata = document.metadata.clone();
                metadata.insert("chunk_index".to_string(), Value::from(chunks.len()));
                metadata.insert("start_index".to_string(), Value::from(start));
                metadata.insert("content_hash".to_string(), Value::from(content_hash(text)));

                chunks.push(KnowledgeChunk {
                    id: uuid::Uuid::new_v4().to_string(),
                    text: text.to_string(),
                    embedding: None,
                    metadata,
                });
            }
        }

        tracing::debug!(
            "Split {} document(s) into {} chunks (size {}, overlap {})",
            documents.len(),
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        chunks
    }
}

/// SHA-256 hex digest of chunk text.
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
