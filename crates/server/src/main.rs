//! Sage
//!
//! Main entry point for the Sage chat backend.
//! Serves the grounded chat and conversation API, and offers the same
//! pipeline from the command line.

mod api;
mod commands;
mod error;
mod state;

#[cfg(test)]
mod tests;

use clap::{Parser, Subcommand};
use commands::{AskCommand, SearchCommand, ServeCommand};
use sage_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Sage - answers grounded in a curated knowledge base
#[derive(Parser, Debug)]
#[command(name = "sage")]
#[command(about = "Retrieval-grounded chat backend", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "SAGE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "SAGE_CONFIG")]
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

    /// Completion model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),

    /// Ask a single question
    Ask(AskCommand),

    /// Search the knowledge base without generating an answer
    Search(SearchCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from file and environment
    let config = AppConfig::load_with(cli.workspace.clone(), cli.config)?;

    let bind = match &cli.command {
        Commands::Serve(cmd) => cmd.bind.clone(),
        _ => None,
    };

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        bind,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Sage starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Completion model: {}", config.completion.model);
    tracing::debug!("Embedding model: {}", config.embedding.model);

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
