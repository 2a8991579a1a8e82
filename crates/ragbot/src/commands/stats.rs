//! Stats command handler.

use clap::Args;
use ragbot_core::{config::AppConfig, AppError, AppResult};
use ragbot_knowledge::RagService;

/// Show collection statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let service = RagService::new(config).await?;
        let stats = service.get_stats().await;

        if let Some(err) = &stats.error {
            return Err(AppError::VectorStore(err.clone()));
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Collection:      {}", stats.collection_name);
            println!("Chunks:          {}", stats.total_documents);
            if let Some(model) = &stats.embedding_model {
                println!("Embedding model: {}", model);
            }
        }

        Ok(())
    }
}
