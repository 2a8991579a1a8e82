//! Retrieval-augmented answering over the indexed collection.

pub mod prompt;
pub mod service;

pub use prompt::{build_context, QaPrompt};
pub use service::{
    relevance_score, RagService, LLM_NOT_CONFIGURED_MESSAGE, NOT_INDEXED_MESSAGE,
    NO_RELEVANT_DOCUMENTS_MESSAGE, QUOTA_EXCEEDED_MESSAGE,
};
