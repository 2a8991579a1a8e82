//! Clear command handler.
//!
//! Deletes every chunk in the collection after confirmation.

use clap::Args;
use ragbot_core::{config::AppConfig, AppError, AppResult};
use ragbot_knowledge::RagService;
use std::io::{BufRead, Write};

/// Delete all indexed documents
#[derive(Args, Debug)]
pub struct ClearCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ClearCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clear command");

        if !self.yes && !confirm("Delete every indexed document?")? {
            println!("Aborted");
            return Ok(());
        }

        let service = RagService::new(config).await?;
        let result = service.clear_collection().await;
        println!("{}", result.message);

        if result.success {
            Ok(())
        } else {
            Err(AppError::VectorStore(result.message))
        }
    }
}

fn confirm(question: &str) -> AppResult<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
