use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::error::ImportError;

/// Whole contents of one device log, read before any parsing starts.
#[derive(Clone, Debug)]
pub struct RawLog {
    pub name: String,
    pub path: PathBuf,
    pub text: String,
    pub size_bytes: u64,
}

impl RawLog {
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        let text = text.into();
        Self {
            path: PathBuf::from(&name),
            size_bytes: text.len() as u64,
            name,
            text,
        }
    }

    /// Read a file fully. Invalid UTF-8 is replaced rather than refused.
    pub fn read(path: &Path) -> Result<Self, ImportError> {
        let bytes = std::fs::read(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            path: path.to_path_buf(),
            size_bytes: bytes.len() as u64,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// Something that hands out raw logs one at a time.
pub trait LogSource {
    fn next_log(&mut self) -> Option<Result<RawLog, ImportError>>;

    /// Logs still to come, for progress reporting.
    fn remaining(&self) -> usize;
}

/// Reads files from disk in the order given.
pub struct FileSource {
    paths: VecDeque<PathBuf>,
}

impl FileSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
}

impl LogSource for FileSource {
    fn next_log(&mut self) -> Option<Result<RawLog, ImportError>> {
        let path = self.paths.pop_front()?;
        Some(RawLog::read(&path))
    }

    fn remaining(&self) -> usize {
        self.paths.len()
    }
}

/// In-memory source useful for tests and piping text from elsewhere.
pub struct ManualSource {
    queue: VecDeque<RawLog>,
}

impl ManualSource {
    pub fn new(logs: impl IntoIterator<Item = RawLog>) -> Self {
        Self {
            queue: logs.into_iter().collect(),
        }
    }
}

impl LogSource for ManualSource {
    fn next_log(&mut self) -> Option<Result<RawLog, ImportError>> {
        self.queue.pop_front().map(Ok)
    }

    fn remaining(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_source_reads_in_order_and_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.txt");
        std::fs::File::create(&first).unwrap().write_all(b"abc").unwrap();
        let missing = dir.path().join("gone.txt");

        let mut source = FileSource::new(vec![first.clone(), missing]);
        assert_eq!(source.remaining(), 2);
        let log = source.next_log().unwrap().unwrap();
        assert_eq!(log.name, "a.txt");
        assert_eq!(log.size_bytes, 3);
        assert_eq!(log.path, first);
        assert!(matches!(source.next_log(), Some(Err(ImportError::Io { .. }))));
        assert!(source.next_log().is_none());
    }

    #[test]
    fn manual_source_drains_queue() {
        let mut source = ManualSource::new(vec![RawLog::from_text("x.txt", "hello")]);
        assert_eq!(source.remaining(), 1);
        assert_eq!(source.next_log().unwrap().unwrap().size_bytes, 5);
        assert_eq!(source.remaining(), 0);
    }
}
