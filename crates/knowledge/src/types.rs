//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Free-form metadata attached to documents and chunks.
pub type Metadata = Map<String, Value>;

/// Name of the single collection every document is indexed into.
pub const COLLECTION_NAME: &str = "rag_collection";

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Txt,
}

impl FileType {
    /// Parse from a bare extension ("pdf", "TXT").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Detect from the text after the last `.` of a file name.
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::parse(ext)
    }

    /// Detect from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(Self::from_filename)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
        }
    }
}

/// A loaded document (a whole text file, or one PDF page).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Extracted text
    pub page_content: String,

    /// `source` is always set; `page` is set for PDF pages
    pub metadata: Metadata,
}

impl Document {
    pub fn new(page_content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }
}

/// A chunk of text stored in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Chunk text
    pub text: String,

    /// Embedding vector (absent until embedded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Metadata inherited from the document plus chunk position fields
    pub metadata: Metadata,
}

impl KnowledgeChunk {
    /// Path of the document this chunk was split from.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }
}

/// Outcome of indexing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexResult {
    pub success: bool,
    pub message: String,
    pub chunks: usize,
}

/// A retrieved passage cited in an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttribution {
    /// 1-based rank
    pub id: usize,

    /// Chunk text
    pub content: String,

    /// Chunk metadata
    pub metadata: Metadata,

    /// Rank-derived score: `1.0 - rank * 0.1`
    pub relevance_score: f64,
}

/// Answer to a question with its cited passages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<SourceAttribution>,
    pub success: bool,
}

impl QueryResult {
    /// Unsuccessful result carrying a human-readable explanation.
    pub fn failure(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            success: false,
        }
    }
}

/// Collection statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total_documents: usize,
    pub collection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of clearing the collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearResult {
    pub success: bool,
    pub message: String,
}
