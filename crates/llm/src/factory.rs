//! LLM provider factory.
//!
//! Resolves the configured provider, credential and model alias into a ready
//! client. Failures come back as plain strings because callers record them
//! and keep running without a chat model.

use crate::client::LlmClient;
use crate::providers::GeminiClient;
use crate::types::{resolve_model_alias, ProviderType, DEFAULT_GEMINI_MODEL};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("google" or "gemini"; empty means "google")
/// * `model` - Requested model name, resolved through the alias table
/// * `api_key` - API key for the provider
///
/// # Errors
/// Returns a human-readable message if the provider is unsupported or the
/// API key is missing.
pub fn create_client(
    provider: &str,
    model: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider = if provider.trim().is_empty() {
        "google"
    } else {
        provider
    };

    match ProviderType::parse(provider) {
        Some(ProviderType::Gemini) => {
            let api_key = api_key
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| "GOOGLE_API_KEY is required to use Gemini.".to_string())?;

            let requested = model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_GEMINI_MODEL);
            let model_name = resolve_model_alias(requested);

            tracing::info!(
                "Using Gemini chat model '{}' (requested '{}')",
                model_name,
                requested
            );

            Ok(Arc::new(GeminiClient::new(api_key, model_name)))
        }
        None => Err("LLM_PROVIDER must be set to 'google' for Gemini models.".to_string()),
    }
}
