// zabbixtool/src/backup/mod.rs
pub(crate) mod db_dump;

use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::{BackupConfig, DATA_DIR, DATA_SUFFIX, SCHEMA_FILE};
use crate::db::{ConnectionFactory, MySqlFactory};

/// Public entry point for the backup process.
///
/// Creates `<root>/<timestamp>/data/`, dumps every table into a per-table
/// gzip file, dumps the schema, then prunes old backups if retention is set.
pub async fn run_backup_flow(config: &BackupConfig) -> Result<()> {
    let timestamp = Local::now().format("%d-%m-%Y-%H-%M").to_string();
    let backup_dir = config.backup_root.join(&timestamp);
    let data_dir = backup_dir.join(DATA_DIR);
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create backup directory {}", data_dir.display()))?;
    println!("📂 Backup directory created at: {}", backup_dir.display());

    let factory = MySqlFactory::new(config.connection.clone());
    let mut conn = factory.connect().await?;
    let tables = db_dump::list_tables(&mut conn).await?;
    println!("📋 {} tables to dump", tables.len());

    // A single table's dump failure must not abort the rest of the backup.
    for table in &tables {
        let dest = data_dir.join(format!("{}{}", table, DATA_SUFFIX));
        if let Err(e) = db_dump::dump_table(&config.connection, table, &dest) {
            eprintln!("Error: {:#} on {} table", e, table);
        }
    }

    db_dump::dump_schema(&config.connection, &backup_dir.join(SCHEMA_FILE))?;
    println!("✓ Schema dumped");

    if config.number_backups > 0 {
        prune_old_backups(&config.backup_root, config.number_backups)
            .context("Failed to prune old backups")?;
    }
    Ok(())
}

/// Removes the oldest backup directories under `root` until at most `keep`
/// remain, ordered by modification time.
fn prune_old_backups(root: &Path, keep: usize) -> Result<()> {
    let mut backups: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(root)
        .with_context(|| format!("Failed to read backup root {}", root.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let modified = entry.metadata()?.modified()?;
            backups.push((modified, entry.path()));
        }
    }

    backups.sort();
    let excess = backups.len().saturating_sub(keep);
    for (_, path) in backups.into_iter().take(excess) {
        println!("🗑 Removing old backup {}", path.display());
        fs::remove_dir_all(&path)
            .with_context(|| format!("Failed to remove old backup {}", path.display()))?;
    }
    Ok(())
}
