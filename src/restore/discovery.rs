// zabbixtool/src/restore/discovery.rs
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// One open data artifact queued for a worker. Ownership of the handle moves
/// to the consuming worker at dequeue time.
pub struct RestoreTask {
    pub path: PathBuf,
    pub file: File,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The data directory itself cannot be walked. Fatal for the run.
    #[error("failed to walk data directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A single file could not be opened. The run logs and skips it.
    #[error("failed to open {}: {}", path.display(), source)]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Walks the data directory and yields one open handle per regular file, in
/// filesystem traversal order. The root itself is excluded and no sorting is
/// applied; callers must not depend on table-name ordering.
pub fn data_files(dir: &Path) -> impl Iterator<Item = Result<RestoreTask, DiscoveryError>> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Err(e) => Some(Err(DiscoveryError::Walk(e))),
            Ok(entry) => {
                if !entry.file_type().is_file() {
                    return None;
                }
                let path = entry.into_path();
                Some(match File::open(&path) {
                    Ok(file) => Ok(RestoreTask { path, file }),
                    Err(source) => Err(DiscoveryError::Open { path, source }),
                })
            }
        })
}

/// Counts the regular files a walk of `dir` would yield, for sizing the
/// progress bar before dispatch starts.
pub fn count_data_files(dir: &Path) -> Result<usize, DiscoveryError> {
    let mut count = 0;
    for entry in WalkDir::new(dir).min_depth(1) {
        if entry?.file_type().is_file() {
            count += 1;
        }
    }
    Ok(count)
}
