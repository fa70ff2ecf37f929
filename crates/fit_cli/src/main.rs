//! FitSync CLI - inspect the offline sync store of a FitSync workspace
//!
//! Usage: fitsync [--root <dir>] [--json] <command>

mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fit_common::{FitError, EXIT_ERROR};
use fit_config::Config;
use fit_sync::{DeadLetter, SyncAction, SyncConfig};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "fitsync",
    version = "0.1.0",
    about = "FitSync offline queue inspection"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose/debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pending and dead-lettered action counts
    Status,

    /// List pending actions in drain order
    Queue,

    /// List actions that ran out of retries
    DeadLetters,

    /// Delete one dead-letter record
    Purge {
        /// Id of the dead-lettered action
        id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let root = match cli.root.clone() {
        Some(root) => root,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    let result = match Config::load(&root) {
        Ok(config) => {
            fit_common::telemetry::init_tracing(
                cli.verbose || config.logging.verbose,
                config.logging.json,
            );
            tracing::debug!("fitsync started in {}", root.display());
            run(&cli, &config).await
        }
        Err(e) => {
            fit_common::telemetry::init_tracing(cli.verbose, false);
            Err(e.into())
        }
    };

    if let Err(e) = result {
        if cli.json {
            print_json_error(&e, error_code(&e));
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Commands::Status => cmd_status(config, cli.json).await,
        Commands::Queue => cmd_queue(&config.store_dir(), cli.json).await,
        Commands::DeadLetters => cmd_dead_letters(&config.store_dir(), cli.json).await,
        Commands::Purge { id } => cmd_purge(&config.store_dir(), id, cli.json).await,
    }
}

//
// Helper functions
//

fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<FitError>()
        .map(FitError::exit_code)
        .unwrap_or(EXIT_ERROR)
}

fn error_code(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<FitError>() {
        Some(FitError::ConfigError(_)) => "CONFIG_ERROR",
        Some(FitError::NotFound(_)) => "NOT_FOUND",
        Some(FitError::StorageError(_)) => "STORAGE_ERROR",
        Some(FitError::ValidationError(_)) => "INVALID_INPUT",
        _ => "ERROR",
    }
}

/// Print error as JSON for tool integration
fn print_json_error(error: &anyhow::Error, code: &str) {
    let json_error = json!({
        "success": false,
        "error": {
            "code": code,
            "message": format!("{:#}", error),
        }
    });

    match serde_json::to_string_pretty(&json_error) {
        Ok(text) => println!("{}", text),
        Err(_) => eprintln!("Error: {:#}", error),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

//
// Command implementations
//

async fn cmd_status(config: &Config, json: bool) -> Result<()> {
    let sync = SyncConfig::from_settings(&config.sync)
        .map_err(|e| FitError::ConfigError(e.to_string()))?;

    let store_dir = config.store_dir();
    let (pending, dead) = match store::open(&store_dir)? {
        Some(store) => (
            store::pending(&store).await?.len(),
            store::dead_letters(&store).await?.len(),
        ),
        None => (0, 0),
    };

    if json {
        return print_json(&json!({
            "store": store_dir,
            "pendingActions": pending,
            "deadLetters": dead,
            "maxRetries": sync.max_retries,
            "conflictPolicy": sync.conflict_policy,
        }));
    }

    println!("Store:         {}", store_dir.display());
    println!("Pending:       {}", pending);
    println!("Dead letters:  {}", dead);
    println!("Max retries:   {}", sync.max_retries);
    Ok(())
}

async fn cmd_queue(store_dir: &Path, json: bool) -> Result<()> {
    let actions: Vec<SyncAction> = match store::open(store_dir)? {
        Some(store) => store::pending(&store).await?,
        None => Vec::new(),
    };

    if json {
        return print_json(&actions);
    }

    if actions.is_empty() {
        eprintln!("Queue is empty");
        return Ok(());
    }

    for action in &actions {
        println!(
            "{}  {:<6}  {:<16}  retries={}  queued {}",
            action.id,
            action.action_type,
            action.table,
            action.retry_count,
            format_millis(action.timestamp)
        );
    }
    eprintln!("{} pending actions", actions.len());
    Ok(())
}

async fn cmd_dead_letters(store_dir: &Path, json: bool) -> Result<()> {
    let letters: Vec<DeadLetter> = match store::open(store_dir)? {
        Some(store) => store::dead_letters(&store).await?,
        None => Vec::new(),
    };

    if json {
        return print_json(&letters);
    }

    if letters.is_empty() {
        eprintln!("No dead letters");
        return Ok(());
    }

    for letter in &letters {
        println!(
            "{}  {:<6}  {:<16}  {}",
            letter.action.id, letter.action.action_type, letter.action.table, letter.error
        );
    }
    Ok(())
}

async fn cmd_purge(store_dir: &Path, id: &str, json: bool) -> Result<()> {
    let id = id.trim();
    if id.is_empty() {
        let err = FitError::ValidationError("purge needs a non-empty action id".to_string());
        return Err(err.into());
    }

    let store = store::open(store_dir)?
        .ok_or_else(|| FitError::NotFound(format!("dead letter {}", id)))?;
    let letter = store::purge(&store, id).await?;
    tracing::info!("Purged dead letter {}", id);

    if json {
        return print_json(&json!({
            "success": true,
            "purged": letter.action,
        }));
    }

    eprintln!("✓ Purged dead letter {} ({} on {})", id, letter.action.action_type, letter.action.table);
    Ok(())
}
