// zabbixtool/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Schema artifact name at the root of a backup folder.
pub const SCHEMA_FILE: &str = "zabbix.schema.sql.gz";

/// Subdirectory of a backup folder holding the per-table data artifacts.
pub const DATA_DIR: &str = "data";

/// Suffix of a per-table data artifact (`<table>.data.sql.gz`).
pub const DATA_SUFFIX: &str = ".data.sql.gz";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3306;
const DEFAULT_USER: &str = "root";
const DEFAULT_DATABASE: &str = "zabbix";

/// Optional defaults loaded from a JSON config file. Every field may be
/// overridden by the corresponding CLI flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub workers: Option<usize>,
    pub number_backups: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                path.display()
            )
        })
    }
}

/// Connection parameters for one MySQL server, built once at startup.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectionSettings {
    /// Fills unset values with the tool's built-in defaults.
    pub fn resolve(
        host: Option<String>,
        port: Option<u16>,
        user: Option<String>,
        password: Option<String>,
        database: Option<String>,
    ) -> Self {
        ConnectionSettings {
            host: host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: port.unwrap_or(DEFAULT_PORT),
            user: user.unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: password.unwrap_or_default(),
            database: database.unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub connection: ConnectionSettings,
    pub backup_root: PathBuf,
    /// Newest backups to keep under the root; 0 disables pruning.
    pub number_backups: usize,
}

#[derive(Debug, Clone)]
pub struct RestoreConfig {
    pub connection: ConnectionSettings,
    pub backup_folder: PathBuf,
    pub workers: usize,
    pub hide_progress: bool,
}

/// Default restore worker count, derived from available parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_connection_defaults() {
        let settings = ConnectionSettings::resolve(None, None, None, None, None);
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 3306);
        assert_eq!(settings.user, "root");
        assert_eq!(settings.password, "");
        assert_eq!(settings.database, "zabbix");
    }

    #[test]
    fn test_resolve_connection_overrides() {
        let settings = ConnectionSettings::resolve(
            Some("db.example.com".to_string()),
            Some(3307),
            Some("zabbix".to_string()),
            Some("secret".to_string()),
            Some("zabbix_prod".to_string()),
        );
        assert_eq!(settings.host, "db.example.com");
        assert_eq!(settings.port, 3307);
        assert_eq!(settings.user, "zabbix");
        assert_eq!(settings.password, "secret");
        assert_eq!(settings.database, "zabbix_prod");
    }

    #[test]
    fn test_load_file_config() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            r#"{{"host": "10.0.0.5", "workers": 4, "password": "pw"}}"#
        )?;
        let config = FileConfig::load(file.path())?;
        assert_eq!(config.host.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.workers, Some(4));
        assert_eq!(config.password.as_deref(), Some("pw"));
        assert_eq!(config.port, None);
        Ok(())
    }

    #[test]
    fn test_load_file_config_rejects_invalid_json() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "not json")?;
        assert!(FileConfig::load(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_default_workers_is_positive() {
        assert!(default_workers() >= 1);
    }
}
