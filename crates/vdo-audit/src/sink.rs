//! Audit persistence sinks
//!
//! A sink exposes append and ordered read only. The log layer above owns
//! sequencing and hash chaining; sinks store what they are given.

use crate::entry::AuditEntry;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink-level failures
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Underlying I/O failure
    #[error("audit sink io error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized or parsed
    #[error("audit record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only persistence for audit entries
pub trait AuditSink: Send {
    /// Persist one entry. Must not reorder or drop records.
    fn append(&mut self, entry: &AuditEntry) -> Result<(), SinkError>;

    /// Read every stored entry in append order.
    fn read_all(&self) -> Result<Vec<AuditEntry>, SinkError>;
}

/// In-memory sink for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Vec<AuditEntry>,
}

impl MemorySink {
    /// Create an empty sink
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for MemorySink {
    fn append(&mut self, entry: &AuditEntry) -> Result<(), SinkError> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<AuditEntry>, SinkError> {
        Ok(self.entries.clone())
    }
}

/// File sink: one serde_json record per line, flushed per append
pub struct JsonlSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Open (or create) a JSONL audit file in append mode
    ///
    /// # Errors
    /// Propagates the underlying open failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Path backing this sink
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for JsonlSink {
    fn append(&mut self, entry: &AuditEntry) -> Result<(), SinkError> {
        let line = serde_json::to_string(entry)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        // Flushed per entry: a crash must not lose acknowledged records.
        self.writer.flush()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<AuditEntry>, SinkError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }
}
