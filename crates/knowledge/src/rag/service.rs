//! Retrieval-augmentation service.
//!
//! Owns the embedding provider, the collection handle and the optional chat
//! client. Every public operation returns a plain result structure; domain
//! failures are reported through `success: false` and a message, never raised.

use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::loader::{has_text, load_document};
use crate::rag::prompt::{build_context, QaPrompt};
use crate::splitter::{DocumentSplitter, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::store::{StoreSettings, VectorStore};
use crate::types::{
    ClearResult, CollectionStats, FileType, IndexResult, QueryResult, SourceAttribution,
    COLLECTION_NAME,
};
use ragbot_core::{AppConfig, AppError, AppResult};
use ragbot_llm::{create_client, LlmClient, LlmRequest};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const NOT_INDEXED_MESSAGE: &str =
    "No documents have been indexed yet. Please upload documents first.";

pub const LLM_NOT_CONFIGURED_MESSAGE: &str = "Language model is not configured.";

pub const NO_RELEVANT_DOCUMENTS_MESSAGE: &str = "No relevant documents found for your query.";

pub const QUOTA_EXCEEDED_MESSAGE: &str = "Google Gemini quota has been exceeded for the configured key. Please review your Google AI Studio usage or provide a different API key.";

/// Rank-derived score for the source at 0-based position `rank`.
///
/// Not clamped: ranks past 10 go negative.
pub fn relevance_score(rank: usize) -> f64 {
    1.0 - rank as f64 * 0.1
}

/// Document indexing and question answering over one collection.
pub struct RagService {
    settings: StoreSettings,
    embedder: Arc<dyn EmbeddingProvider>,

    /// Collection handle. The lock only guards swapping the handle: index,
    /// query and stats hold the read side, clear holds the write side while
    /// it empties and re-opens the collection.
    store: RwLock<Option<VectorStore>>,

    /// Chat client, or the reason it could not be built.
    chat: Result<Arc<dyn LlmClient>, String>,
    temperature: f32,
    splitter: DocumentSplitter,
    prompt: QaPrompt,
}

impl RagService {
    /// Build the service from application configuration.
    ///
    /// Fails if the embedding model or the vector store cannot be set up.
    /// A missing credential or unsupported chat provider does not fail:
    /// the error is recorded and queries report it.
    pub async fn new(config: &AppConfig) -> AppResult<Self> {
        let embedder = create_provider(&EmbeddingConfig::from_app_config(config)).await?;
        let settings = StoreSettings::from_app_config(config, COLLECTION_NAME)?;

        let chat = create_client(
            &config.llm_provider,
            config.llm_model.as_deref(),
            config.api_key.as_deref(),
        );
        if let Err(e) = &chat {
            tracing::warn!("LLM initialization failed: {}", e);
        }

        Self::with_components(settings, embedder, chat, config.temperature).await
    }

    /// Build the service from already constructed collaborators.
    pub async fn with_components(
        settings: StoreSettings,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Result<Arc<dyn LlmClient>, String>,
        temperature: f32,
    ) -> AppResult<Self> {
        let store = VectorStore::open(&settings, Arc::clone(&embedder)).await?;

        tracing::info!(
            "RAG service ready: collection '{}', embeddings {} ({}), chat model {}",
            settings.collection,
            embedder.provider_name(),
            embedder.model_name(),
            chat.as_ref()
                .map(|c| c.model_name().to_string())
                .unwrap_or_else(|_| "unavailable".to_string())
        );

        Ok(Self {
            settings,
            embedder,
            store: RwLock::new(Some(store)),
            chat,
            temperature,
            splitter: DocumentSplitter::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)?,
            prompt: QaPrompt::new()?,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.settings.collection
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    /// Chat model answering questions, if one is configured.
    pub fn chat_model(&self) -> Option<&str> {
        self.chat.as_ref().ok().map(|c| c.model_name())
    }

    /// Load, split and insert one document.
    pub async fn index_document(&self, path: &Path, file_type: FileType) -> IndexResult {
        match self.try_index(path, file_type).await {
            Ok(chunks) => {
                tracing::info!("Indexed {} chunks from {}", chunks, path.display());
                IndexResult {
                    success: true,
                    message: format!(
                        "Successfully indexed {} chunks from {}",
                        chunks,
                        path.display()
                    ),
                    chunks,
                }
            }
            Err(e) => {
                tracing::warn!("Indexing {} failed: {}", path.display(), e);
                IndexResult {
                    success: false,
                    message: format!("Error indexing document: {}", e),
                    chunks: 0,
                }
            }
        }
    }

    async fn try_index(&self, path: &Path, file_type: FileType) -> AppResult<usize> {
        let documents = load_document(path, file_type).await?;
        if !has_text(&documents) {
            return Err(AppError::Loader(format!(
                "No text content could be extracted from {}",
                path.display()
            )));
        }

        let chunks = self.splitter.split_documents(&documents);

        self.ensure_store().await?;
        let guard = self.store.read().await;
        let store = guard
            .as_ref()
            .ok_or_else(|| AppError::VectorStore("Vector store is not available".to_string()))?;

        tracing::debug!("Inserting {} chunks into '{}'", chunks.len(), store.collection());
        store.add_documents(chunks).await
    }

    /// Re-open the collection if a previous clear left no handle.
    async fn ensure_store(&self) -> AppResult<()> {
        if self.store.read().await.is_some() {
            return Ok(());
        }

        let mut guard = self.store.write().await;
        if guard.is_none() {
            *guard = Some(VectorStore::open(&self.settings, Arc::clone(&self.embedder)).await?);
        }
        Ok(())
    }

    /// Answer a question from the top-k retrieved chunks.
    pub async fn query(&self, question: &str, k: usize) -> QueryResult {
        tracing::info!("Query (k={}): {}", k, question);

        let guard = self.store.read().await;
        let Some(store) = guard.as_ref() else {
            return QueryResult::failure(NOT_INDEXED_MESSAGE);
        };

        match store.count().await {
            Ok(0) => return QueryResult::failure(NOT_INDEXED_MESSAGE),
            Ok(_) => {}
            Err(e) => return query_error(&e),
        }

        let chat = match &self.chat {
            Ok(chat) => chat,
            Err(reason) if reason.trim().is_empty() => {
                return QueryResult::failure(LLM_NOT_CONFIGURED_MESSAGE)
            }
            Err(reason) => return QueryResult::failure(reason.clone()),
        };

        match self.answer(store, chat.as_ref(), question, k).await {
            Ok(result) => result,
            Err(e) => query_error(&e),
        }
    }

    async fn answer(
        &self,
        store: &VectorStore,
        chat: &dyn LlmClient,
        question: &str,
        k: usize,
    ) -> AppResult<QueryResult> {
        let hits = store.similarity_search(question, k).await?;
        if hits.is_empty() {
            return Ok(QueryResult {
                answer: NO_RELEVANT_DOCUMENTS_MESSAGE.to_string(),
                sources: Vec::new(),
                success: true,
            });
        }

        for (rank, (chunk, score)) in hits.iter().enumerate() {
            tracing::debug!(
                "Rank {}: cosine {:.4}, source {:?}",
                rank + 1,
                score,
                chunk.source()
            );
        }

        let context = build_context(hits.iter().map(|(chunk, _)| chunk.text.as_str()));
        let prompt = self.prompt.render(&context, question)?;
        let request = LlmRequest::new(prompt, chat.model_name()).with_temperature(self.temperature);

        let response = chat.complete(&request).await?;
        tracing::debug!(
            "{} used {} prompt + {} completion tokens",
            response.model,
            response.usage.prompt_tokens,
            response.usage.completion_tokens
        );

        let sources = hits
            .into_iter()
            .enumerate()
            .map(|(rank, (chunk, _))| SourceAttribution {
                id: rank + 1,
                content: chunk.text,
                metadata: chunk.metadata,
                relevance_score: relevance_score(rank),
            })
            .collect::<Vec<_>>();

        tracing::info!("Answered with {} sources", sources.len());

        Ok(QueryResult {
            answer: response.content,
            sources,
            success: true,
        })
    }

    /// Number of stored chunks and the embedding model in use.
    pub async fn get_stats(&self) -> CollectionStats {
        let guard = self.store.read().await;
        let Some(store) = guard.as_ref() else {
            return CollectionStats {
                total_documents: 0,
                collection_name: self.settings.collection.clone(),
                embedding_model: None,
                error: None,
            };
        };

        match store.count().await {
            Ok(total) => CollectionStats {
                total_documents: total,
                collection_name: self.settings.collection.clone(),
                embedding_model: Some(self.embedder.model_name().to_string()),
                error: None,
            },
            Err(e) => CollectionStats {
                total_documents: 0,
                collection_name: self.settings.collection.clone(),
                embedding_model: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Delete every chunk, then re-open the collection.
    pub async fn clear_collection(&self) -> ClearResult {
        let mut guard = self.store.write().await;

        if let Some(store) = guard.take() {
            if let Err(e) = store.clear().await {
                *guard = Some(store);
                return clear_error(&e);
            }
        }

        match VectorStore::open(&self.settings, Arc::clone(&self.embedder)).await {
            Ok(store) => {
                *guard = Some(store);
                tracing::info!("Cleared collection '{}'", self.settings.collection);
                ClearResult {
                    success: true,
                    message: "Collection cleared successfully".to_string(),
                }
            }
            Err(e) => clear_error(&e),
        }
    }
}

fn query_error(err: &AppError) -> QueryResult {
    let text = err.to_string();
    tracing::warn!("Query failed: {}", text);

    if text.to_lowercase().contains("quota") {
        QueryResult::failure(QUOTA_EXCEEDED_MESSAGE)
    } else {
        QueryResult::failure(format!("Error processing query: {}", text))
    }
}

fn clear_error(err: &AppError) -> ClearResult {
    tracing::warn!("Clearing collection failed: {}", err);
    ClearResult {
        success: false,
        message: format!("Error clearing collection: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use ragbot_llm::{LlmResponse, LlmUsage};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Chat client returning a fixed reply (or error) and recording requests.
    struct ScriptedLlm {
        reply: Result<String, String>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl ScriptedLlm {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        fn model_name(&self) -> &str {
            "scripted-model"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(LlmResponse {
                    content: text.clone(),
                    model: "scripted-model".to_string(),
                    usage: LlmUsage::new(10, 5),
                    finish_reason: Some("STOP".to_string()),
                }),
                Err(message) => Err(AppError::Llm(message.clone())),
            }
        }
    }

    async fn service(chat: Result<Arc<dyn LlmClient>, String>) -> RagService {
        RagService::with_components(
            StoreSettings::in_memory(COLLECTION_NAME),
            Arc::new(TrigramProvider::new(384)),
            chat,
            0.7,
        )
        .await
        .unwrap()
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const PASSAGES: &str = "Ownership means each value in Rust has a single owner.\n\n\
        Borrowing lets functions use a value through references without taking ownership.\n\n\
        Lifetimes describe how long references stay valid.";

    #[tokio::test]
    async fn test_index_2500_chars_yields_three_chunks() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "long.txt", &"a".repeat(2500));
        let service = service(Ok(ScriptedLlm::answering("ok"))).await;

        let result = service.index_document(&path, FileType::Txt).await;

        assert!(result.success);
        assert_eq!(result.chunks, 3);
        assert_eq!(
            result.message,
            format!("Successfully indexed 3 chunks from {}", path.display())
        );
        assert_eq!(service.get_stats().await.total_documents, 3);
    }

    #[tokio::test]
    async fn test_index_pdf_keeps_page_metadata() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("guide.pdf");
        std::fs::write(
            &path,
            crate::loader::pdf_bytes(&["Ownership rules", "Lifetimes explained"]),
        )
        .unwrap();
        let service = service(Ok(ScriptedLlm::answering("ok"))).await;

        let result = service.index_document(&path, FileType::Pdf).await;

        assert!(result.success, "{}", result.message);
        assert_eq!(result.chunks, 2);

        let guard = service.store.read().await;
        let hits = guard
            .as_ref()
            .unwrap()
            .similarity_search("Ownership", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        let mut pages: Vec<u64> = hits
            .iter()
            .map(|(chunk, _)| chunk.metadata["page"].as_u64().unwrap())
            .collect();
        pages.sort();
        assert_eq!(pages, vec![0, 1]);
        for (chunk, _) in &hits {
            assert_eq!(chunk.source(), Some(path.to_string_lossy().as_ref()));
        }
    }

    #[tokio::test]
    async fn test_index_missing_file_reports_failure() {
        let temp = TempDir::new().unwrap();
        let service = service(Ok(ScriptedLlm::answering("ok"))).await;

        let result = service
            .index_document(&temp.path().join("absent.txt"), FileType::Txt)
            .await;

        assert!(!result.success);
        assert_eq!(result.chunks, 0);
        assert!(result.message.starts_with("Error indexing document: "));
    }

    #[tokio::test]
    async fn test_index_empty_document_is_failure() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "blank.txt", "   \n\n  ");
        let service = service(Ok(ScriptedLlm::answering("ok"))).await;

        let result = service.index_document(&path, FileType::Txt).await;

        assert!(!result.success);
        assert!(result.message.contains("No text content"));
        assert_eq!(service.get_stats().await.total_documents, 0);
    }

    #[tokio::test]
    async fn test_query_before_indexing() {
        let llm = ScriptedLlm::answering("unused");
        let service = service(Ok(llm.clone())).await;

        for k in [0, 1, 4, 20] {
            let result = service.query("What is ownership?", k).await;
            assert!(!result.success);
            assert_eq!(result.answer, NOT_INDEXED_MESSAGE);
            assert!(result.sources.is_empty());
        }
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_without_chat_client_reports_reason() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "rust.txt", PASSAGES);
        let service = service(Err("GOOGLE_API_KEY is required to use Gemini.".to_string())).await;
        assert!(service.index_document(&path, FileType::Txt).await.success);

        let result = service.query("What is borrowing?", 4).await;

        assert!(!result.success);
        assert_eq!(result.answer, "GOOGLE_API_KEY is required to use Gemini.");
        assert!(result.sources.is_empty());
        assert!(service.chat_model().is_none());
    }

    #[tokio::test]
    async fn test_query_without_chat_client_falls_back_to_generic_message() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "rust.txt", PASSAGES);
        let service = service(Err(String::new())).await;
        service.index_document(&path, FileType::Txt).await;

        let result = service.query("What is borrowing?", 4).await;

        assert!(!result.success);
        assert_eq!(result.answer, LLM_NOT_CONFIGURED_MESSAGE);
    }

    #[tokio::test]
    async fn test_query_answers_with_ranked_sources() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "rust.txt", &"a".repeat(2500));
        let llm = ScriptedLlm::answering("A value has one owner.");
        let service = service(Ok(llm.clone())).await;
        service.index_document(&path, FileType::Txt).await;

        let result = service.query("What is ownership?", 2).await;

        assert!(result.success);
        assert_eq!(result.answer, "A value has one owner.");
        assert_eq!(result.sources.len(), 2);
        for (i, source) in result.sources.iter().enumerate() {
            assert_eq!(source.id, i + 1);
            assert_eq!(source.relevance_score, 1.0 - i as f64 * 0.1);
            assert_eq!(
                source.metadata["source"],
                serde_json::Value::from(path.to_string_lossy().into_owned())
            );
        }

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "scripted-model");
        assert_eq!(calls[0].temperature, Some(0.7));
        assert!(calls[0].prompt.contains("Question: What is ownership?"));
        let expected_context = format!(
            "{}\n\n{}",
            result.sources[0].content, result.sources[1].content
        );
        assert!(calls[0].prompt.contains(&expected_context));
    }

    #[tokio::test]
    async fn test_sources_capped_by_collection_size() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "rust.txt", PASSAGES);
        let service = service(Ok(ScriptedLlm::answering("answer"))).await;
        let indexed = service.index_document(&path, FileType::Txt).await;

        let result = service.query("borrowing references", 10).await;

        assert!(result.success);
        assert_eq!(result.sources.len(), indexed.chunks);
        assert!(result.sources[0].content.contains("Borrowing"));
    }

    #[tokio::test]
    async fn test_relevance_score_goes_negative_past_ten() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "long.txt", &"a".repeat(10_000));
        let service = service(Ok(ScriptedLlm::answering("answer"))).await;
        let indexed = service.index_document(&path, FileType::Txt).await;
        assert!(indexed.chunks >= 12);

        let result = service.query("anything", 12).await;

        assert_eq!(result.sources.len(), 12);
        assert!(result.sources[11].relevance_score < 0.0);
        assert_eq!(result.sources[11].relevance_score, relevance_score(11));
    }

    #[tokio::test]
    async fn test_zero_k_finds_nothing_but_succeeds() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "rust.txt", PASSAGES);
        let llm = ScriptedLlm::answering("unused");
        let service = service(Ok(llm.clone())).await;
        service.index_document(&path, FileType::Txt).await;

        let result = service.query("ownership", 0).await;

        assert!(result.success);
        assert_eq!(result.answer, NO_RELEVANT_DOCUMENTS_MESSAGE);
        assert!(result.sources.is_empty());
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_quota_error_gets_guidance_message() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "rust.txt", PASSAGES);
        let service = service(Ok(ScriptedLlm::failing(
            "Gemini API error (429 Too Many Requests): You exceeded your current QUOTA",
        )))
        .await;
        service.index_document(&path, FileType::Txt).await;

        let result = service.query("ownership", 4).await;

        assert!(!result.success);
        assert_eq!(result.answer, QUOTA_EXCEEDED_MESSAGE);
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_other_errors_are_reported() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "rust.txt", PASSAGES);
        let service = service(Ok(ScriptedLlm::failing("connection reset"))).await;
        service.index_document(&path, FileType::Txt).await;

        let result = service.query("ownership", 4).await;

        assert!(!result.success);
        assert_eq!(
            result.answer,
            "Error processing query: LLM error: connection reset"
        );
    }

    #[tokio::test]
    async fn test_clear_then_stats() {
        let temp = TempDir::new().unwrap();
        let path = write_file(&temp, "rust.txt", PASSAGES);
        let service = service(Ok(ScriptedLlm::answering("ok"))).await;
        service.index_document(&path, FileType::Txt).await;
        assert!(service.get_stats().await.total_documents > 0);

        let cleared = service.clear_collection().await;
        assert!(cleared.success);
        assert_eq!(cleared.message, "Collection cleared successfully");

        let stats = service.get_stats().await;
        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.collection_name, "rag_collection");
        assert_eq!(stats.embedding_model.as_deref(), Some("trigram-v1"));

        let result = service.query("ownership", 4).await;
        assert_eq!(result.answer, NOT_INDEXED_MESSAGE);
    }

    #[tokio::test]
    async fn test_new_from_config_with_lancedb_and_no_credentials() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            embedding_provider: "trigram".to_string(),
            vector_store: "lancedb".to_string(),
            vector_db_path: temp.path().join("vector_db"),
            api_key: None,
            ..AppConfig::default()
        };

        let service = RagService::new(&config).await.unwrap();
        let path = write_file(&temp, "rust.txt", PASSAGES);
        assert!(service.index_document(&path, FileType::Txt).await.success);

        let result = service.query("ownership", 4).await;
        assert!(!result.success);
        assert!(result.answer.contains("GOOGLE_API_KEY"));

        assert!(service.clear_collection().await.success);
        assert_eq!(service.get_stats().await.total_documents, 0);

        // Collection stays usable after clear
        assert!(service.index_document(&path, FileType::Txt).await.success);
        assert!(service.get_stats().await.total_documents > 0);
    }
}
