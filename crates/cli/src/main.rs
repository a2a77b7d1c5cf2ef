//! Helpdesk CLI
//!
//! Main entry point for the `helpdesk` command-line tool: runs the HTTP
//! service, builds the index, evaluates retrieval interactively, and talks
//! to a running server as a thin client.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, ConsoleCommand, EvalCommand, FeedbackCommand, FilesCommand, IngestCommand,
    MetricsCommand, ReindexCommand, ServeCommand,
};
use helpdesk_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Helpdesk - document retrieval with feedback-driven metrics
#[derive(Parser, Debug)]
#[command(name = "helpdesk")]
#[command(about = "Document retrieval helpdesk with feedback-driven metrics", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "HELPDESK_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "HELPDESK_CONFIG")]
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

    /// Base URL of the server used by client commands
    #[arg(short, long, global = true, env = "HELPDESK_SERVER")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP service
    Serve(ServeCommand),

    /// Rebuild the index from the raw documents
    Ingest(IngestCommand),

    /// Interactive retrieval evaluation
    Eval(EvalCommand),

    /// List indexed files on the server
    Files(FilesCommand),

    /// Ask the server a question
    Ask(AskCommand),

    /// Tell the server which file answers a question
    Feedback(FeedbackCommand),

    /// Show retrieval metrics from logged feedback
    Metrics(MetricsCommand),

    /// Rebuild the server index and list files again
    Reindex(ReindexCommand),

    /// Interactive client session
    Console(ConsoleCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration from defaults, config file, and environment
    let config = AppConfig::load_from(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(None, cli.server, cli.log_level, cli.verbose, cli.no_color);

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Helpdesk CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Data directory: {:?}", config.data_dir());

    let command_name = match &cli.command {
        Commands::Serve(_) => "serve",
        Commands::Ingest(_) => "ingest",
        Commands::Eval(_) => "eval",
        Commands::Files(_) => "files",
        Commands::Ask(_) => "ask",
        Commands::Feedback(_) => "feedback",
        Commands::Metrics(_) => "metrics",
        Commands::Reindex(_) => "reindex",
        Commands::Console(_) => "console",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Eval(cmd) => cmd.execute(&config).await,
        Commands::Files(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Feedback(cmd) => cmd.execute(&config).await,
        Commands::Metrics(cmd) => cmd.execute(&config).await,
        Commands::Reindex(cmd) => cmd.execute(&config).await,
        Commands::Console(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
