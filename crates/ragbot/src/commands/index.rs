//! Index command handler.
//!
//! Indexes one local PDF or text file into the collection.

use clap::Args;
use ragbot_core::{config::AppConfig, AppError, AppResult};
use ragbot_knowledge::{FileType, RagService};
use std::path::PathBuf;

/// Index a PDF or text file
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// File to index (.pdf or .txt)
    pub file: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing index command for {}", self.file.display());

        let file_type = FileType::from_path(&self.file).ok_or_else(|| {
            AppError::Loader("Only PDF and TXT files are supported".to_string())
        })?;

        let service = RagService::new(config).await?;
        let result = service.index_document(&self.file, file_type).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{}", result.message);
        }

        if result.success {
            Ok(())
        } else {
            Err(AppError::Other(result.message))
        }
    }
}
