// zabbixtool/src/restore/reader.rs
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("invalid gzip stream: {0}")]
    Decode(#[source] io::Error),

    #[error("read failed: {0}")]
    Io(#[source] io::Error),
}

/// Lazy line iterator over a gzip-compressed SQL dump.
///
/// Yields each decoded line with its terminator stripped. Empty lines are
/// yielded as-is; filtering them is up to the caller. Errors end the stream
/// for the caller in practice, but the iterator itself only reports them.
pub struct SqlLines<R: Read> {
    lines: Lines<BufReader<GzDecoder<R>>>,
}

impl<R: Read> SqlLines<R> {
    pub fn new(raw: R) -> Self {
        SqlLines {
            lines: BufReader::new(GzDecoder::new(raw)).lines(),
        }
    }
}

impl SqlLines<File> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> Iterator for SqlLines<R> {
    type Item = Result<String, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.lines.next()?.map_err(classify))
    }
}

// flate2 reports a corrupt gzip stream through io::Error with an
// InvalidInput/InvalidData kind and a truncated one as UnexpectedEof; both
// mean the archive itself is bad. Everything else is a plain read failure.
fn classify(e: io::Error) -> ReadError {
    match e.kind() {
        io::ErrorKind::InvalidInput
        | io::ErrorKind::InvalidData
        | io::ErrorKind::UnexpectedEof => ReadError::Decode(e),
        _ => ReadError::Io(e),
    }
}
