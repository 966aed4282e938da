// zabbixtool/src/backup/db_dump.rs
use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use sqlx::{MySqlConnection, Row};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use which::which;

use crate::config::ConnectionSettings;

/// Finds the mysqldump executable in the system PATH.
fn find_mysqldump_executable() -> Result<PathBuf> {
    which("mysqldump").context(
        "mysqldump executable not found in PATH. Please ensure MySQL client tools are installed and in your PATH.",
    )
}

/// Lists every table of the configured database.
pub async fn list_tables(conn: &mut MySqlConnection) -> Result<Vec<String>> {
    let rows = sqlx::query("SHOW TABLES")
        .fetch_all(conn)
        .await
        .context("Failed to list tables")?;

    let mut tables = Vec::with_capacity(rows.len());
    for row in rows {
        let table: String = row.try_get(0).context("Failed to read table name")?;
        if table.is_empty() {
            anyhow::bail!("can't fetch table name");
        }
        tables.push(table);
    }
    Ok(tables)
}

/// Dumps one table's rows as single-line INSERT statements, gzip-compressed.
///
/// `--extended-insert=FALSE` keeps one row per line, which is what the
/// restore path relies on.
pub fn dump_table(settings: &ConnectionSettings, table: &str, dest: &Path) -> Result<()> {
    let mut cmd = dump_command(settings)?;
    cmd.arg("--no-create-info")
        .arg("--extended-insert=FALSE")
        .arg("--tables")
        .arg(table)
        .arg(&settings.database);
    stream_dump(cmd, dest).with_context(|| format!("Failed to dump table {}", table))
}

/// Dumps the schema (DDL and routines, no data), gzip-compressed.
pub fn dump_schema(settings: &ConnectionSettings, dest: &Path) -> Result<()> {
    let mut cmd = dump_command(settings)?;
    cmd.arg("--routines").arg("--no-data").arg(&settings.database);
    stream_dump(cmd, dest).context("Failed to dump schema")
}

fn dump_command(settings: &ConnectionSettings) -> Result<Command> {
    let mysqldump = find_mysqldump_executable()?;
    let mut cmd = Command::new(mysqldump);
    cmd.arg(format!("--host={}", settings.host))
        .arg(format!("--port={}", settings.port))
        .arg(format!("--user={}", settings.user))
        .arg("--opt")
        // Password goes through the environment, never argv.
        .env("MYSQL_PWD", &settings.password);
    Ok(cmd)
}

/// Spawns the dump command and streams its stdout through a gzip encoder
/// into `dest`.
///
/// stderr is drained on its own thread while stdout is being copied; a child
/// that fills the stderr pipe buffer would otherwise block mid-dump and keep
/// stdout from ever reaching EOF.
fn stream_dump(mut cmd: Command, dest: &Path) -> Result<()> {
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to start mysqldump")?;

    let mut stdout = child
        .stdout
        .take()
        .context("mysqldump stdout was not captured")?;
    let mut stderr = child
        .stderr
        .take()
        .context("mysqldump stderr was not captured")?;
    let stderr_drain = std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf);
        buf
    });

    let dest_file = File::create(dest)
        .with_context(|| format!("Failed to create dump file {}", dest.display()))?;
    let mut encoder = GzEncoder::new(dest_file, Compression::default());
    io::copy(&mut stdout, &mut encoder)
        .with_context(|| format!("Failed to write dump to {}", dest.display()))?;
    let dest_file = encoder
        .finish()
        .with_context(|| format!("Failed to finish gzip stream for {}", dest.display()))?;
    dest_file
        .sync_all()
        .with_context(|| format!("Failed to sync dump file {}", dest.display()))?;

    let stderr_text = stderr_drain.join().unwrap_or_default();
    let status = child.wait().context("Failed to wait for mysqldump")?;
    if !status.success() {
        anyhow::bail!("mysqldump exited with {}: {}", status, stderr_text.trim());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    fn shell(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    fn decompress(path: &Path) -> String {
        let mut text = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        text
    }

    #[test]
    fn test_stream_dump_writes_gzipped_stdout() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let dest = dir.path().join("t.data.sql.gz");
        stream_dump(shell("printf 'INSERT INTO t VALUES(1);\\n'"), &dest)?;
        assert_eq!(decompress(&dest), "INSERT INTO t VALUES(1);\n");
        Ok(())
    }

    #[test]
    fn test_stream_dump_survives_large_stderr_output() -> Result<()> {
        // A child filling the stderr pipe buffer while stdout is still open
        // must not wedge the copy loop.
        let dir = tempfile::tempdir()?;
        let dest = dir.path().join("t.data.sql.gz");
        stream_dump(shell("head -c 1000000 /dev/zero >&2; echo done"), &dest)?;
        assert_eq!(decompress(&dest), "done\n");
        Ok(())
    }

    #[test]
    fn test_stream_dump_reports_stderr_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("t.data.sql.gz");
        let err = stream_dump(shell("echo access denied >&2; exit 2"), &dest).unwrap_err();
        assert!(format!("{err:#}").contains("access denied"));
    }
}
