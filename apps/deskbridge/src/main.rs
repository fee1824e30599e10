//! deskbridge: keeps support-desk users in line with billing customers.
//!
//! - `serve` receives billing webhooks and reconciles each customer
//! - `replay` reconciles stored webhook bodies
//! - `sync` walks every billing customer
//! - `sweep-identities` removes redundant phone identities of one user

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod error;
mod logging;
mod shutdown;

use config::AppConfig;
use error::AppResult;

/// Billing to support-desk directory reconciliation
#[derive(Parser)]
#[command(name = "deskbridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the billing webhook endpoint
    Serve(commands::serve::ServeArgs),

    /// Reconcile stored webhook bodies
    Replay(commands::replay::ReplayArgs),

    /// Reconcile every billing customer
    Sync(commands::sync::SyncArgs),

    /// Find (and optionally delete) redundant phone identities of one user
    SweepIdentities(commands::sweep::SweepArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        e.print();
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = AppConfig::from_env()?;
    logging::init_logging(&config.rust_log, config.log_format);

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::Replay(args) => commands::replay::execute(args, config).await,
        Commands::Sync(args) => commands::sync::execute(args, config).await,
        Commands::SweepIdentities(args) => commands::sweep::execute(args, config).await,
    }
}
