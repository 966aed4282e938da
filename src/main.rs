//! Zabbix Backup/Restore Tool
//!
//! Dumps every table of a MySQL database into per-table gzip files and
//! restores such a backup folder concurrently.

// zabbixtool/src/main.rs
mod backup;
mod config;
mod db;
mod restore;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::{BackupConfig, ConnectionSettings, FileConfig, RestoreConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "zabbixtool", about = "Zabbix database backup and restore tool")]
struct Cli {
    /// Optional JSON file supplying defaults for any flag below
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dump schema and per-table data into a timestamped backup folder
    Backup(BackupArgs),
    /// Restore a backup folder into the target database
    Restore(RestoreArgs),
}

#[derive(Args)]
struct ConnectionArgs {
    /// Mysql host
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Mysql port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Mysql user
    #[arg(short = 'u', long)]
    user: Option<String>,

    /// Mysql password
    #[arg(short = 'P', long)]
    password: Option<String>,

    /// Mysql database
    #[arg(short = 'd', long)]
    database: Option<String>,
}

#[derive(Args)]
struct BackupArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Root folder under which a timestamped backup directory is created
    #[arg(short = 'r', long)]
    backup_root: PathBuf,

    /// Keep only the newest N backups under the root (0 keeps all)
    #[arg(short = 'n', long)]
    number_backups: Option<usize>,
}

#[derive(Args)]
struct RestoreArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Backup folder produced by the backup subcommand
    #[arg(short = 'b', long)]
    backup_folder: PathBuf,

    /// Number of workers for data restore
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Hide the progress bar
    #[arg(long)]
    hide_progress: bool,
}

/// Main entry point for the backup/restore tool
#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => FileConfig::default(),
    };

    match cli.command {
        Command::Backup(args) => {
            println!("🚀 Starting Backup Process...");
            let backup_config = BackupConfig {
                connection: resolve_connection(args.connection, &file_config),
                backup_root: args.backup_root,
                number_backups: args
                    .number_backups
                    .or(file_config.number_backups)
                    .unwrap_or(0),
            };
            backup::run_backup_flow(&backup_config)
                .await
                .context("Backup process failed")?;
        }
        Command::Restore(args) => {
            println!("🔄 Starting Restore Process...");
            let restore_config = RestoreConfig {
                connection: resolve_connection(args.connection, &file_config),
                backup_folder: args.backup_folder,
                workers: args
                    .workers
                    .or(file_config.workers)
                    .unwrap_or_else(config::default_workers),
                hide_progress: args.hide_progress,
            };
            println!(
                "Restore target: {}:{}/{}, Backup folder: {}",
                restore_config.connection.host,
                restore_config.connection.port,
                restore_config.connection.database,
                restore_config.backup_folder.display()
            );
            restore::run_restore_flow(&restore_config)
                .await
                .context("Restore process failed")?;
        }
    }
    Ok(())
}

/// Merges CLI connection flags over config-file values over built-in defaults.
fn resolve_connection(args: ConnectionArgs, file: &FileConfig) -> ConnectionSettings {
    ConnectionSettings::resolve(
        args.host.or_else(|| file.host.clone()),
        args.port.or(file.port),
        args.user.or_else(|| file.user.clone()),
        args.password.or_else(|| file.password.clone()),
        args.database.or_else(|| file.database.clone()),
    )
}
