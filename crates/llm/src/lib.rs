//! Chat-model integration crate for Ragbot.
//!
//! This crate provides a provider-agnostic abstraction for asking a hosted
//! Large Language Model to synthesize an answer. The rest of the backend only
//! sees the [`LlmClient`] trait.
//!
//! # Providers
//! - **Gemini**: Google's hosted models via the Generative Language API
//!
//! # Example
//! ```no_run
//! use ragbot_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("google", Some("gemini-1.5-flash"), Some("api-key"))?;
//! let request = LlmRequest::new("Hello, world!", client.model_name());
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::GeminiClient;
pub use types::{resolve_model_alias, ProviderType, DEFAULT_GEMINI_MODEL};
