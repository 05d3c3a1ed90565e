//! Destinations for lines that could not be decoded.

use b3_core::{models::ParseFailure, ports::MalformedRecordSink};
use std::{
    fs::File,
    io::{self, BufWriter, Write as _},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::{Level, event};

/// Appends one diagnostic per line to a text file.
///
/// The file is created (truncating any previous contents) on the first
/// failure, so a clean run leaves no file behind.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileSink {
    /// A sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(None),
        }
    }

    /// The file diagnostics are written to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MalformedRecordSink for FileSink {
    fn record(&self, failure: &ParseFailure) -> io::Result<()> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(BufWriter::new(File::create(&self.path)?));
        }
        if let Some(writer) = guard.as_mut() {
            writeln!(writer, "{failure}")?;
            writer.flush()?;
        }
        Ok(())
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    failures: Mutex<Vec<ParseFailure>>,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything recorded so far, in arrival order.
    pub fn failures(&self) -> Vec<ParseFailure> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The number of diagnostics recorded.
    pub fn len(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MalformedRecordSink for MemorySink {
    fn record(&self, failure: &ParseFailure) -> io::Result<()> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure.clone());
        Ok(())
    }
}

/// Emits each diagnostic as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MalformedRecordSink for TracingSink {
    fn record(&self, failure: &ParseFailure) -> io::Result<()> {
        event!(
            Level::WARN,
            line = failure.line_number,
            cause = %failure.cause,
            raw = failure.raw_line,
            "skipped malformed line"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use b3_core::models::DecodeError;

    fn failure(line_number: u64) -> ParseFailure {
        ParseFailure {
            line_number,
            raw_line: "a;b;c".into(),
            cause: DecodeError::InsufficientColumns {
                expected: 9,
                found: 3,
            },
        }
    }

    #[test]
    fn file_sink_appends_one_line_per_failure() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("errors.log"));
        assert!(!sink.path().exists());

        sink.record(&failure(2)).unwrap();
        sink.record(&failure(7)).unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("line 2: "));
        assert!(lines[1].ends_with("| a;b;c"));
    }

    #[test]
    fn file_sink_reports_unwritable_paths() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("missing").join("errors.log"));
        assert!(sink.record(&failure(1)).is_err());
    }

    #[test]
    fn memory_sink_keeps_arrival_order() {
        let sink = MemorySink::new();
        sink.record(&failure(3)).unwrap();
        sink.record(&failure(1)).unwrap();
        let lines: Vec<_> = sink.failures().iter().map(|f| f.line_number).collect();
        assert_eq!(lines, vec![3, 1]);
    }
}
