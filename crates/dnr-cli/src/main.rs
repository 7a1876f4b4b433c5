//! dnr CLI
//!
//! Drives the rule-set synchronization engine against file-backed state.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::EngineContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        println!("{} Declarative rule synchronization", "dnr".green().bold());
        println!();
        println!("Run {} for available commands.", "dnr --help".cyan());
        return Ok(());
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let ctx = EngineContext::open(&cli.state_dir, cli.config.as_deref())?;
        execute_command(&ctx, command).await
    })
}

/// Logs go to stderr; `DNR_LOG` overrides the level chosen by `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DNR_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

async fn execute_command(ctx: &EngineContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Converge { name, etag } => commands::run_converge(ctx, name, etag).await,
        Commands::Check { name, json } => commands::run_check(ctx, name, json).await,
        Commands::Status { json } => commands::run_status(ctx, json).await,
        Commands::Rules { name } => commands::run_rules(ctx, name).await,
    }
}
