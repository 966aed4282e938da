// zabbixtool/src/restore/schema.rs
use anyhow::{Context, Result};
use std::path::Path;

use crate::db::SqlExecutor;
use crate::restore::reader::{ReadError, SqlLines};

/// Dump comment marker; mysqldump writes `--` comments, matched on the first
/// character as the dump format never starts a statement with `-`.
const COMMENT_MARKER: char = '-';

/// Folds schema dump lines into complete `;`-terminated statements.
///
/// Blank lines and comment lines are skipped, everything else is appended
/// verbatim to the pending statement. A trailing fragment without a
/// terminator is dropped; that is accepted dump behavior, not corrected here.
pub struct Statements<I> {
    lines: I,
    pending: String,
}

impl<I> Statements<I>
where
    I: Iterator<Item = Result<String, ReadError>>,
{
    pub fn new(lines: I) -> Self {
        Statements {
            lines,
            pending: String::new(),
        }
    }
}

impl<I> Iterator for Statements<I>
where
    I: Iterator<Item = Result<String, ReadError>>,
{
    type Item = Result<String, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }
            self.pending.push_str(&line);
            if self.pending.ends_with(';') {
                return Some(Ok(std::mem::take(&mut self.pending)));
            }
        }
    }
}

/// Applies the schema artifact statement by statement.
///
/// Schema failures are fatal: the data load referentially depends on the
/// schema, so the first statement that cannot be read or executed aborts the
/// whole restore.
pub async fn restore_schema<E: SqlExecutor>(path: &Path, conn: &mut E) -> Result<()> {
    let lines = SqlLines::open(path)
        .with_context(|| format!("Failed to open schema artifact {}", path.display()))?;

    for statement in Statements::new(lines) {
        let statement = statement
            .with_context(|| format!("Failed to read schema artifact {}", path.display()))?;
        conn.execute(&statement)
            .await
            .with_context(|| format!("Schema statement failed: {}", statement))?;
    }
    Ok(())
}
