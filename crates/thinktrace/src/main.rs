mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use thinktrace::config::DEFAULT_CONFIG_FILE;

// ============================================================================
// CLI Types
// ============================================================================

/// Thinktrace - durable tracker for branching, revisable reasoning sessions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: String,

    /// Sessions directory (overrides config file)
    #[arg(long, global = true)]
    sessions_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a new reasoning session with its first thought
    Start {
        /// Content of the initial thought
        thought: String,

        /// Advisory number of steps the reasoning is expected to take
        #[arg(short, long)]
        estimated_steps: Option<u32>,

        /// Opaque context, as JSON (plain text is stored as a string)
        #[arg(long)]
        context: Option<String>,

        /// Metadata entry, repeatable (values are parsed as JSON when possible)
        #[arg(short, long = "meta", value_name = "KEY=VALUE")]
        metadata: Vec<String>,
    },

    /// Append a thought to a session
    Think {
        /// Session to append to
        session_id: String,

        /// Content of the thought
        content: String,

        /// Mark this thought as a revision of thought N
        #[arg(long, value_name = "N")]
        revises: Option<u32>,

        /// Fork from thought N
        #[arg(long, value_name = "N")]
        branch_from: Option<u32>,

        /// Branch this thought belongs to
        #[arg(long)]
        branch_id: Option<String>,

        /// Signal that more thoughts are needed than estimated
        #[arg(long)]
        more: bool,
    },

    /// Record a session's conclusion
    Complete {
        /// Session to complete
        session_id: String,

        /// The conclusion reached
        conclusion: String,

        /// Record the conclusion as unsuccessful
        #[arg(long)]
        failed: bool,
    },

    /// Print a full session
    Show {
        /// Session to print
        session_id: String,
    },

    /// Print analytics for a session
    Analyze {
        /// Session to analyze
        session_id: String,
    },

    /// List all sessions
    List,
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let registry = commands::open_registry(&cli.config, cli.sessions_dir.as_deref()).await?;

    let result = match cli.command {
        Commands::Start {
            thought,
            estimated_steps,
            context,
            metadata,
        } => commands::start::run(&registry, thought, estimated_steps, context, metadata).await,
        Commands::Think {
            session_id,
            content,
            revises,
            branch_from,
            branch_id,
            more,
        } => {
            commands::think::run(
                &registry,
                &session_id,
                content,
                revises,
                branch_from,
                branch_id,
                more,
            )
            .await
        }
        Commands::Complete {
            session_id,
            conclusion,
            failed,
        } => commands::complete::run(&registry, &session_id, conclusion, !failed).await,
        Commands::Show { session_id } => commands::inspect::show(&registry, &session_id).await,
        Commands::Analyze { session_id } => {
            commands::inspect::analyze(&registry, &session_id).await
        }
        Commands::List => commands::inspect::list(&registry).await,
    };

    registry.shutdown().await;
    result
}

// ============================================================================
// Initialization
// ============================================================================

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
