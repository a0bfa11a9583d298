//! plandesk CLI: the main entry point.
//!
//! Commands:
//! - `serve`     : Start the HTTP API (`/ask`, `/run`)
//! - `ask`       : Answer one benefits question from the terminal
//! - `recommend` : Recommend a plan from preferences and a plans file
//! - `init`      : Write a default config file
//! - `doctor`    : Diagnose configuration and backends

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "plandesk",
    about = "plandesk: employee benefits assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.plandesk/config.toml)
    #[arg(short, long, global = true, env = "PLANDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Use an in-memory chat history instead of the configured store
        #[arg(long)]
        offline: bool,
    },

    /// Answer a single benefits question
    Ask {
        /// The question text
        question: String,

        /// User whose chat history is used (random when omitted)
        #[arg(short, long)]
        user: Option<uuid::Uuid>,

        /// Use an in-memory chat history instead of the configured store
        #[arg(long)]
        offline: bool,
    },

    /// Recommend a plan
    Recommend {
        /// Free-text description of what the employee wants
        #[arg(short, long)]
        preferences: String,

        /// JSON file holding an array of plans
        #[arg(long)]
        plans: PathBuf,
    },

    /// Write a default configuration file
    Init,

    /// Diagnose configuration and backends
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { port, offline } => commands::serve::run(config_path, port, offline).await?,
        Commands::Ask {
            question,
            user,
            offline,
        } => commands::ask::run(config_path, question, user, offline).await?,
        Commands::Recommend { preferences, plans } => {
            commands::recommend::run(config_path, preferences, &plans).await?
        }
        Commands::Init => commands::init::run(config_path)?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
