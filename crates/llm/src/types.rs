//! Provider identification and model-name aliasing.

/// Model used when no chat model is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

/// Short model names mapped to the versioned identifiers the API accepts.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("gemini-1.5-pro", "gemini-1.5-pro-latest"),
    ("gemini-1.5-flash", "gemini-1.5-flash-latest"),
    ("gemini-1.5-flash-001", "gemini-1.5-flash-latest"),
    ("gemini-1.5-pro-001", "gemini-1.5-pro-latest"),
    ("gemini-2.5-pro", "gemini-2.5-pro"),
    ("gemini-2.5-pro-001", "gemini-2.5-pro"),
];

/// Resolve a requested model name through the alias table.
///
/// Unmapped names are returned unchanged (trimmed).
pub fn resolve_model_alias(requested: &str) -> String {
    let requested = requested.trim();
    MODEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == requested)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| requested.to_string())
}

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" | "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
        }
    }
}
