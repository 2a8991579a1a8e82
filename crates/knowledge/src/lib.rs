//! Document knowledge base and retrieval-augmented answering.
//!
//! Documents are loaded ([`loader`]), split into overlapping character
//! chunks ([`splitter`]), embedded ([`embeddings`]) and stored in a vector
//! index ([`store`]). [`rag::RagService`] ties these together with a chat
//! model to answer questions from the indexed text.

pub mod embeddings;
pub mod lancedb_index;
pub mod loader;
pub mod memory_index;
pub mod rag;
pub mod splitter;
pub mod store;
pub mod types;
pub mod vector_index;

// Re-export commonly used types
pub use rag::RagService;
pub use store::{StoreBackend, StoreSettings, VectorStore};
pub use types::{
    ClearResult, CollectionStats, Document, FileType, IndexResult, KnowledgeChunk, Metadata,
    QueryResult, SourceAttribution, COLLECTION_NAME,
};
