//! Question-answering prompt rendered with Handlebars.

use handlebars::Handlebars;
use ragbot_core::{AppError, AppResult};
use serde::Serialize;

const TEMPLATE_NAME: &str = "qa";

/// Instruction prompt: answer from the context only, admit ignorance otherwise.
const QA_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

Context:
{{context}}

Question: {{question}}

Answer:";

#[derive(Serialize)]
struct PromptVars<'a> {
    context: &'a str,
    question: &'a str,
}

/// Compiled QA prompt template.
pub struct QaPrompt {
    registry: Handlebars<'static>,
}

impl QaPrompt {
    pub fn new() -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Plain text prompt, no HTML escaping
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);

        registry
            .register_template_string(TEMPLATE_NAME, QA_TEMPLATE)
            .map_err(|e| AppError::Other(format!("Failed to register prompt template: {}", e)))?;

        Ok(Self { registry })
    }

    /// Render the prompt for a context block and a question.
    pub fn render(&self, context: &str, question: &str) -> AppResult<String> {
        self.registry
            .render(TEMPLATE_NAME, &PromptVars { context, question })
            .map_err(|e| AppError::Other(format!("Failed to render prompt: {}", e)))
    }
}

/// Join retrieved passages, in retrieval order, separated by blank lines.
pub fn build_context<'a>(passages: impl IntoIterator<Item = &'a str>) -> String {
    passages.into_iter().collect::<Vec<_>>().join("\n\n")
}
