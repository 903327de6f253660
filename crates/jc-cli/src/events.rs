//! JSON-lines event input, read in bounded chunks.

use anyhow::Result;
use jc_core::Event;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Default number of events held in memory at once.
pub const DEFAULT_CHUNK_SIZE: usize = 65_536;

/// Iterator over consecutive chunks of at most `chunk_size` events.
///
/// Blank lines are skipped. A malformed line ends the iteration with an error
/// naming the file and line.
pub struct EventChunks<R> {
    lines: std::io::Lines<R>,
    path: PathBuf,
    lineno: usize,
    chunk_size: usize,
    done: bool,
}

impl EventChunks<std::io::BufReader<std::fs::File>> {
    /// Open `path` for chunked reading.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("cannot open events {}: {e}", path.display()))?;
        Self::new(std::io::BufReader::new(file), path, chunk_size)
    }
}

impl<R: BufRead> EventChunks<R> {
    pub fn new(reader: R, path: &Path, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            anyhow::bail!("chunk size must be >= 1");
        }
        Ok(Self { lines: reader.lines(), path: path.to_path_buf(), lineno: 0, chunk_size, done: false })
    }

    fn next_chunk(&mut self) -> Result<Vec<Event>> {
        let mut chunk = Vec::with_capacity(self.chunk_size.min(DEFAULT_CHUNK_SIZE));
        while chunk.len() < self.chunk_size {
            let Some(line) = self.lines.next() else {
                self.done = true;
                break;
            };
            self.lineno += 1;
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let event: Event = serde_json::from_str(line).map_err(|e| {
                anyhow::anyhow!("{}:{}: invalid event: {e}", self.path.display(), self.lineno)
            })?;
            chunk.push(event);
        }
        Ok(chunk)
    }
}

impl<R: BufRead> Iterator for EventChunks<R> {
    type Item = Result<Vec<Event>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_chunk() {
            Ok(chunk) if chunk.is_empty() => None,
            Ok(chunk) => Some(Ok(chunk)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
