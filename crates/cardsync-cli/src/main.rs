//! cardsync CLI - offline-first card catalog from the terminal
//!
//! Every change lands in the local database first and is queued for Supabase;
//! the queue drains whenever the CLI finds the network and a session.

mod auth;
mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::GlobalArgs;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::favorite::run_favorite;
use crate::commands::list::run_list;
use crate::commands::queue::run_queue;
use crate::commands::sync::{run_sync, run_sync_status};
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "cardsync=warn,cardsync_core=warn";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let global = GlobalArgs {
        config_path: cli.config,
        db_path: cli.db_path,
        offline: cli.offline,
    };

    match cli.command {
        Commands::Add {
            name,
            stats,
            favorite,
        } => run_add(&name, &stats, favorite, &global).await?,
        Commands::List { pending, json } => run_list(pending, json, &global).await?,
        Commands::Edit { id, name, stats } => {
            run_edit(&id, name.as_deref(), &stats, &global).await?;
        }
        Commands::Favorite { id } => run_favorite(&id, &global).await?,
        Commands::Delete { id } => run_delete(&id, &global).await?,
        Commands::Sync { command } => match command {
            None => run_sync(&global).await?,
            Some(SyncCommands::Status { json }) => run_sync_status(json, &global).await?,
        },
        Commands::Queue { command } => run_queue(command, &global).await?,
        Commands::Auth { command } => run_auth(command, &global).await?,
        Commands::Config { command } => run_config(command, &global)?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
