//! LanceDB-backed vector index implementation.
//!
//! One table per collection with columns `id`, `text`, `embedding`
//! (fixed-size float list), `source` and `metadata` (JSON text).

use crate::types::{KnowledgeChunk, Metadata};
use crate::vector_index::{cosine_similarity, VectorIndex};
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use ragbot_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// LanceDB-backed vector index for knowledge chunks.
pub struct LanceDbIndex {
    table: Table,
    embedding_dim: usize,
}

impl LanceDbIndex {
    /// Create or open a LanceDB table at the specified path.
    ///
    /// # Arguments
    /// * `db_path` - Directory path for the LanceDB database
    /// * `table_name` - Name of the table (the collection name)
    /// * `embedding_dim` - Dimension of embedding vectors (e.g., 384)
    ///
    /// An existing table built for a different dimension is rejected.
    pub async fn open(db_path: &Path, table_name: &str, embedding_dim: usize) -> AppResult<Self> {
        std::fs::create_dir_all(db_path).map_err(|e| {
            AppError::VectorStore(format!(
                "Failed to create vector store directory {}: {}",
                db_path.display(),
                e
            ))
        })?;

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::VectorStore(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::VectorStore(format!("Failed to list tables: {}", e)))?;

        let table = if table_names.iter().any(|name| name == table_name) {
            let table = conn
                .open_table(table_name)
                .execute()
                .await
                .map_err(|e| AppError::VectorStore(format!("Failed to open table: {}", e)))?;

            let schema = table
                .schema()
                .await
                .map_err(|e| AppError::VectorStore(format!("Failed to read schema: {}", e)))?;
            match stored_dimension(&schema) {
                Some(dim) if dim == embedding_dim => {}
                Some(dim) => {
                    return Err(AppError::VectorStore(format!(
                        "Collection '{}' holds {}-dimensional embeddings but the embedding model produces {}; clear the collection or switch models",
                        table_name, dim, embedding_dim
                    )))
                }
                None => {
                    return Err(AppError::VectorStore(format!(
                        "Collection '{}' has no embedding column",
                        table_name
                    )))
                }
            }

            tracing::debug!("Opened LanceDB table '{}' at {:?}", table_name, db_path);
            table
        } else {
            let schema = Self::create_schema(embedding_dim);
            let empty_batch = RecordBatch::new_empty(schema.clone());

            let table = conn
                .create_table(
                    table_name,
                    RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
                )
                .execute()
                .await
                .map_err(|e| AppError::VectorStore(format!("Failed to create table: {}", e)))?;

            tracing::info!("Created LanceDB table '{}' at {:?}", table_name, db_path);
            table
        };

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    fn create_schema(embedding_dim: usize) -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
            Field::new("source", DataType::Utf8, true),
            Field::new("metadata", DataType::Utf8, false),
        ]))
    }

    /// Convert chunks to a single Arrow RecordBatch.
    fn chunks_to_batch(&self, chunks: &[KnowledgeChunk]) -> AppResult<RecordBatch> {
        let mut flat = Vec::with_capacity(chunks.len() * self.embedding_dim);
        let mut metadata_json = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            let embedding = chunk.embedding.as_ref().ok_or_else(|| {
                AppError::VectorStore(format!("Chunk {} missing embedding", chunk.id))
            })?;
            if embedding.len() != self.embedding_dim {
                return Err(AppError::VectorStore(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    self.embedding_dim,
                    embedding.len()
                )));
            }
            flat.extend_from_slice(embedding);
            metadata_json.push(serde_json::to_string(&chunk.metadata)?);
        }

        let ids = StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()));
        let texts = StringArray::from_iter_values(chunks.iter().map(|c| c.text.as_str()));
        let sources: StringArray = chunks.iter().map(|c| c.source()).collect();
        let metadata = StringArray::from_iter_values(metadata_json.iter().map(String::as_str));

        let embeddings = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(Float32Array::from(flat)),
            None,
        )
        .map_err(|e| AppError::VectorStore(format!("Failed to build embedding column: {}", e)))?;

        RecordBatch::try_new(
            Self::create_schema(self.embedding_dim),
            vec![
                Arc::new(ids),
                Arc::new(texts),
                Arc::new(embeddings),
                Arc::new(sources),
                Arc::new(metadata),
            ],
        )
        .map_err(|e| AppError::VectorStore(format!("Failed to create RecordBatch: {}", e)))
    }

    /// Convert one Arrow row back into a chunk.
    fn batch_to_chunk(batch: &RecordBatch, row: usize) -> AppResult<KnowledgeChunk> {
        let id = string_column(batch, "id")?.value(row).to_string();
        let text = string_column(batch, "text")?.value(row).to_string();

        let embeddings = batch
            .column_by_name("embedding")
            .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
            .ok_or_else(|| AppError::VectorStore("Invalid embedding column".to_string()))?;
        let values = embeddings.value(row);
        let embedding = values
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| AppError::VectorStore("Invalid embedding values".to_string()))?
            .values()
            .to_vec();

        let metadata: Metadata = serde_json::from_str(string_column(batch, "metadata")?.value(row))?;

        Ok(KnowledgeChunk {
            id,
            text,
            embedding: Some(embedding),
            metadata,
        })
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| AppError::VectorStore(format!("Invalid {} column", name)))
}

fn stored_dimension(schema: &Schema) -> Option<usize> {
    match schema.field_with_name("embedding").ok()?.data_type() {
        DataType::FixedSizeList(_, size) => Some(*size as usize),
        _ => None,
    }
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    fn backend_name(&self) -> &str {
        "lancedb"
    }

    async fn upsert_chunks(&self, chunks: &[KnowledgeChunk]) -> AppResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let batch = self.chunks_to_batch(chunks)?;
        let schema = batch.schema();

        self.table
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .map_err(|e| AppError::VectorStore(format!("Failed to add chunks: {}", e)))?;

        tracing::debug!("Inserted {} chunks into LanceDB", chunks.len());
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
        if query_embedding.len() != self.embedding_dim {
            return Err(AppError::VectorStore(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                query_embedding.len()
            )));
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .nearest_to(query_embedding.to_vec())
            .map_err(|e| AppError::VectorStore(format!("Failed to create query: {}", e)))?
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| AppError::VectorStore(format!("Failed to execute search: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::VectorStore(format!("Failed to collect results: {}", e)))?;

        let mut results = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                let chunk = Self::batch_to_chunk(batch, row).map_err(|e| {
                    AppError::VectorStore(format!("Unreadable row {} in search results: {}", row, e))
                })?;
                let score = chunk
                    .embedding
                    .as_deref()
                    .map(|e| cosine_similarity(query_embedding, e))
                    .unwrap_or(0.0);
                results.push((chunk, score));
            }
        }

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        Ok(results)
    }

    async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| AppError::VectorStore(format!("Failed to count rows: {}", e)))
    }

    async fn reset(&self) -> AppResult<()> {
        if self.count().await? > 0 {
            self.table
                .delete("id IS NOT NULL")
                .await
                .map_err(|e| AppError::VectorStore(format!("Failed to clear table: {}", e)))?;
        }

        tracing::info!("Cleared LanceDB table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn chunk(id: &str, source: &str, embedding: Vec<f32>) -> KnowledgeChunk {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), Value::from(source));
        metadata.insert("page".to_string(), Value::from(2));
        KnowledgeChunk {
            id: id.to_string(),
            text: format!("passage {}", id),
            embedding: Some(embedding),
            metadata,
        }
    }

    #[tokio::test]
    async fn test_insert_search_and_count() {
        let temp = TempDir::new().unwrap();
        let index = LanceDbIndex::open(temp.path(), "rag_collection", 3)
            .await
            .unwrap();

        index
            .upsert_chunks(&[
                chunk("a", "a.pdf", vec![1.0, 0.0, 0.0]),
                chunk("b", "b.txt", vec![0.0, 1.0, 0.0]),
                chunk("c", "c.txt", vec![0.9, 0.1, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 3);

        let results = index.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.id, "a");
        assert_eq!(results[1].0.id, "c");
        assert_eq!(results[0].0.source(), Some("a.pdf"));
        assert_eq!(results[0].0.metadata["page"], Value::from(2));
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let temp = TempDir::new().unwrap();
        {
            let index = LanceDbIndex::open(temp.path(), "rag_collection", 3)
                .await
                .unwrap();
            index
                .upsert_chunks(&[chunk("a", "a.txt", vec![1.0, 0.0, 0.0])])
                .await
                .unwrap();
        }

        let reopened = LanceDbIndex::open(temp.path(), "rag_collection", 3)
            .await
            .unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reopen_with_other_dimension_rejected() {
        let temp = TempDir::new().unwrap();
        LanceDbIndex::open(temp.path(), "rag_collection", 3)
            .await
            .unwrap();

        let err = LanceDbIndex::open(temp.path(), "rag_collection", 4)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("3-dimensional"));
    }

    #[tokio::test]
    async fn test_reset_empties_table() {
        let temp = TempDir::new().unwrap();
        let index = LanceDbIndex::open(temp.path(), "rag_collection", 3)
            .await
            .unwrap();
        index
            .upsert_chunks(&[chunk("a", "a.txt", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        index.reset().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_fails_on_corrupt_metadata() {
        let temp = TempDir::new().unwrap();
        let index = LanceDbIndex::open(temp.path(), "rag_collection", 3)
            .await
            .unwrap();
        index
            .upsert_chunks(&[chunk("good", "a.txt", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        let valid = index
            .chunks_to_batch(&[chunk("bad", "b.txt", vec![0.9, 0.1, 0.0])])
            .unwrap();
        let mut columns = valid.columns().to_vec();
        columns[4] = Arc::new(StringArray::from(vec!["{not json"]));
        let corrupt = RecordBatch::try_new(valid.schema(), columns).unwrap();
        index
            .table
            .add(RecordBatchIterator::new(vec![Ok(corrupt)], valid.schema()))
            .execute()
            .await
            .unwrap();

        let err = index.search(&[1.0, 0.0, 0.0], 2).await.unwrap_err();
        assert!(matches!(err, AppError::VectorStore(_)));
        assert!(err.to_string().contains("Unreadable row"));
    }

    #[tokio::test]
    async fn test_missing_embedding_rejected() {
        let temp = TempDir::new().unwrap();
        let index = LanceDbIndex::open(temp.path(), "rag_collection", 3)
            .await
            .unwrap();

        let mut bare = chunk("a", "a.txt", vec![]);
        bare.embedding = None;
        assert!(index.upsert_chunks(&[bare]).await.is_err());
    }
}
