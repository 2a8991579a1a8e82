//! Embedding engine for the knowledge base.
//!
//! Provides provider-agnostic embedding generation. The provider is chosen
//! once at startup from [`EmbeddingConfig`] and shared by indexing and
//! retrieval, so chunks and queries always land in the same vector space.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
