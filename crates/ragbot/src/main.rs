//! Ragbot CLI
//!
//! Entry point for the document Q&A backend. `serve` runs the HTTP API;
//! the remaining commands operate on the collection directly.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ClearCommand, IndexCommand, ServeCommand, StatsCommand};
use ragbot_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Ragbot - question answering over your PDF and text documents
#[derive(Parser, Debug)]
#[command(name = "ragbot")]
#[command(about = "Question answering over your PDF and text documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "RAGBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Index a PDF or text file
    Index(IndexCommand),

    /// Ask a question about the indexed documents
    Ask(AskCommand),

    /// Show collection statistics
    Stats(StatsCommand),

    /// Delete all indexed documents
    Clear(ClearCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let (host, port) = match &cli.command {
        Commands::Serve(cmd) => (cmd.host.clone(), cmd.port),
        _ => (None, None),
    };

    let config = AppConfig::load(cli.config)?.with_overrides(
        host,
        port,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(
        config.log_level.as_deref(),
        config.log_format,
        config.no_color,
    )?;

    tracing::info!("Ragbot starting");
    tracing::debug!("Embeddings: {} ({})", config.embedding_provider, config.embedding_model);
    tracing::debug!("Vector store: {} at {:?}", config.vector_store, config.vector_db_path);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Index(_) => "index",
        Commands::Ask(_) => "ask",
        Commands::Stats(_) => "stats",
        Commands::Clear(_) => "clear",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Clear(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
