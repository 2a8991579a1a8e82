//! Embedding provider implementations.

pub mod fastembed;
pub mod ollama;
pub mod trigram;

pub use self::fastembed::FastEmbedProvider;
pub use self::ollama::OllamaProvider;
pub use self::trigram::TrigramProvider;
