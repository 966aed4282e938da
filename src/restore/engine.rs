// zabbixtool/src/restore/engine.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver};
use tokio::sync::Mutex;

use crate::config::{RestoreConfig, DATA_DIR, SCHEMA_FILE};
use crate::db::{ConnectionFactory, SqlExecutor};
use crate::restore::discovery::{self, DiscoveryError, RestoreTask};
use crate::restore::progress::ProgressTracker;
use crate::restore::reader::SqlLines;
use crate::restore::schema;

type TaskQueue = Arc<Mutex<Receiver<RestoreTask>>>;

/// Runs a full restore: schema first, then the data artifacts fanned out
/// over a fixed pool of workers.
///
/// Returns `Ok` once every discovered file has been fully consumed, no
/// matter how many individual statements inside them failed. Only schema
/// failures, connection setup failures, and directory-walk failures abort.
pub async fn restore_backup<F>(config: &RestoreConfig, factory: &F) -> Result<()>
where
    F: ConnectionFactory,
{
    let data_dir = config.backup_folder.join(DATA_DIR);
    let total_files = discovery::count_data_files(&data_dir)
        .with_context(|| format!("Failed to enumerate data directory {}", data_dir.display()))?;
    let progress = ProgressTracker::new(total_files as u64 + 1, config.hide_progress);

    let mut schema_conn = factory
        .connect()
        .await
        .context("Failed to open schema restore connection")?;
    let schema_path = config.backup_folder.join(SCHEMA_FILE);
    schema::restore_schema(&schema_path, &mut schema_conn)
        .await
        .context("Schema restore failed")?;
    progress.advance();

    // At least one worker, or dispatch would block on the first send.
    let worker_count = config.workers.max(1);
    println!("🚀 Starting {} workers", worker_count);
    // Capacity 1: dispatch is backpressured by worker throughput, at most one
    // undequeued task sits in the channel.
    let (tx, rx) = mpsc::channel::<RestoreTask>(1);
    let queue: TaskQueue = Arc::new(Mutex::new(rx));

    // All worker connections are established before the first enqueue, so a
    // connect failure aborts the run before any data is touched.
    let mut workers = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let conn = factory
            .connect()
            .await
            .context("Failed to open worker connection")?;
        workers.push(tokio::spawn(run_worker(
            Arc::clone(&queue),
            conn,
            progress.clone(),
        )));
    }

    println!("Restoring...");
    for item in discovery::data_files(&data_dir) {
        match item {
            Ok(task) => {
                if tx.send(task).await.is_err() {
                    break;
                }
            }
            Err(DiscoveryError::Open { path, source }) => {
                eprintln!("❌ Skipping unreadable file {}: {}", path.display(), source);
                progress.advance();
            }
            Err(e @ DiscoveryError::Walk(_)) => {
                drop(tx);
                return Err(e).context("Data directory walk failed");
            }
        }
    }
    drop(tx);

    for worker in workers {
        worker.await.context("Restore worker panicked")?;
    }
    progress.finish();
    Ok(())
}

/// Worker loop: dequeue one file at a time until the queue is closed and
/// drained. Each worker holds its dedicated connection for the whole run.
async fn run_worker<E: SqlExecutor>(queue: TaskQueue, mut conn: E, progress: ProgressTracker) {
    loop {
        let task = queue.lock().await.recv().await;
        let Some(task) = task else {
            break;
        };
        restore_data_file(task, &mut conn).await;
        progress.advance();
    }
}

/// Executes every non-empty line of one data artifact as a statement.
///
/// A failing statement is logged and the file continues: one malformed or
/// constraint-violating row must not abort the table's restore. A decode or
/// read failure abandons just this file.
async fn restore_data_file<E: SqlExecutor>(task: RestoreTask, conn: &mut E) {
    let RestoreTask { path, file } = task;
    for line in SqlLines::new(file) {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("❌ Abandoning {}: {}", path.display(), e);
                return;
            }
        };
        if line.is_empty() {
            continue;
        }
        if let Err(e) = conn.execute(&line).await {
            eprintln!("Error: {:#} [{}]", e, line);
        }
    }
}
