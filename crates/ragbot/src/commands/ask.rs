//! Ask command handler.
//!
//! Answers a question from the indexed collection.

use clap::Args;
use ragbot_core::{config::AppConfig, AppError, AppResult};
use ragbot_knowledge::{QueryResult, RagService};

/// Ask a question about the indexed documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve
    #[arg(short, long, default_value_t = 4)]
    pub k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let service = RagService::new(config).await?;
        let result = service.query(&self.question, self.k).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print!("{}", render_text(&result));
        }

        if result.success {
            Ok(())
        } else {
            Err(AppError::Other(result.answer))
        }
    }
}

/// Human-readable answer followed by a numbered source list.
fn render_text(result: &QueryResult) -> String {
    let mut out = format!("{}\n", result.answer);

    if !result.sources.is_empty() {
        out.push_str("\nSources:\n");
        for source in &result.sources {
            let origin = source
                .metadata
                .get("source")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            let page = source
                .metadata
                .get("page")
                .and_then(|v| v.as_u64())
                .map(|p| format!(", page {}", p + 1))
                .unwrap_or_default();
            out.push_str(&format!(
                "  [{}] {}{} (relevance {:.1})\n",
                source.id, origin, page, source.relevance_score
            ));
        }
    }

    out
}
