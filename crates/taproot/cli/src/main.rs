//! Taproot CLI - Command-line interface for the stack lifecycle
//!
//! This CLI gives app authors a terminal interface to:
//! - Synthesize an app into stack documents
//! - Plan a stack and review the pending changes
//! - Deploy a stack after an interactive approval
//! - Destroy a stack and its provisioned resources

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use taproot_project::{Project, ProjectOptions};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod render;

use commands::Request;
use config::CliConfig;
use error::{CliError, CliResult};

/// Taproot CLI application
#[derive(Parser)]
#[command(name = "taproot")]
#[command(about = "Taproot - synthesize, plan, and deploy infrastructure stacks", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TAPROOT_CONFIG")]
    config: Option<PathBuf>,

    /// App directory holding the synthesizable program
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Command that synthesizes the app into stack documents
    #[arg(short, long, env = "TAPROOT_SYNTH_COMMAND")]
    synth_command: Option<String>,

    /// Directory the synth command writes stacks into
    #[arg(long, env = "TAPROOT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Provisioning engine binary
    #[arg(long, env = "TAPROOT_ENGINE")]
    engine: Option<String>,

    /// Skip the interactive approval prompt
    #[arg(long)]
    auto_approve: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Synthesize the app into stack documents
    Synth,

    /// Synthesize and show the execution plan for a stack
    Diff {
        /// Stack to plan; optional when the app has exactly one
        stack: Option<String>,
    },

    /// Plan and apply a stack
    Deploy {
        /// Stack to deploy
        stack: String,
    },

    /// Plan and tear down a stack's resources
    Destroy {
        /// Stack to destroy
        stack: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    if let Err(err) = execute(cli).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    // Load config; flags win over file values
    let config = CliConfig::load(cli.config.as_deref(), &cli.dir)?;
    let synth_command = cli
        .synth_command
        .or(config.synth_command)
        .ok_or(CliError::MissingSynthCommand)?;
    let auto_approve = cli.auto_approve || config.auto_approve;

    // Route every progress update through a channel so the command
    // loop can interleave rendering with the approval prompt.
    let (update_tx, updates) = mpsc::unbounded_channel();
    let mut options = ProjectOptions::new(synth_command, &cli.dir)
        .auto_approve(auto_approve)
        .on_update(move |update| {
            let _ = update_tx.send(update);
        });
    if let Some(dir) = cli.output_dir.or(config.output_dir) {
        options = options.output_dir(dir);
    }
    if let Some(engine) = cli.engine.or(config.engine) {
        options = options.engine(engine);
    }
    let project = Arc::new(Project::new(options));

    // Execute command
    let request = match cli.command {
        Commands::Synth => Request::Synth,
        Commands::Diff { stack } => Request::Diff(stack),
        Commands::Deploy { stack } => Request::Deploy(stack),
        Commands::Destroy { stack } => Request::Destroy(stack),
    };
    commands::run(project, updates, request, auto_approve).await
}
