// zabbixtool/src/restore/mod.rs
pub(crate) mod discovery;
pub(crate) mod engine;
pub(crate) mod progress;
pub(crate) mod reader;
pub(crate) mod schema;

use anyhow::Result;

use crate::config::RestoreConfig;
use crate::db::MySqlFactory;

/// Public entry point for the restore process.
pub async fn run_restore_flow(config: &RestoreConfig) -> Result<()> {
    let factory = MySqlFactory::new(config.connection.clone());
    engine::restore_backup(config, &factory).await
}
