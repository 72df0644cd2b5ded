//! Serialized audit writer
//!
//! Adapted single-writer design: all appends pass through one mutex-guarded
//! critical section that assigns the sequence number, chains the hash, and
//! writes through to the sink before returning.

use crate::entry::{compute_hash, AuditEntry, AuditEventType, GENESIS_HASH};
use crate::sink::{AuditSink, MemorySink, SinkError};
use chrono::Utc;
use parking_lot::Mutex;
use vdo_domain::{EntryId, SessionId};

/// Audit-layer failures
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The sink rejected a write; the execution is no longer auditable
    #[error("audit sink unavailable: {0}")]
    SinkUnavailable(#[from] SinkError),

    /// The stored chain does not verify
    #[error("audit chain integrity violation at seq {seq}")]
    IntegrityViolation { seq: u64 },
}

/// Receipt for an accepted append
#[derive(Debug, Clone, Copy)]
pub struct AuditReceipt {
    pub entry_id: EntryId,
    pub seq: u64,
}

struct Inner {
    next_seq: u64,
    prev_hash: [u8; 32],
    sink: Box<dyn AuditSink>,
}

/// Append-only audit log with a single serialized writer path
pub struct AuditLog {
    inner: Mutex<Inner>,
}

impl AuditLog {
    /// Create a log over a sink
    #[must_use]
    pub fn new(sink: Box<dyn AuditSink>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_seq: 0,
                prev_hash: GENESIS_HASH,
                sink,
            }),
        }
    }

    /// Create a log over an in-memory sink
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySink::new()))
    }

    /// Append one event.
    ///
    /// Sequence assignment, hash chaining, and the sink write happen inside
    /// a single critical section, so interleaved concurrent appends still
    /// observe strictly increasing sequence numbers in causal order.
    ///
    /// # Errors
    /// `AuditError::SinkUnavailable` if the sink rejects the write. This is
    /// fatal to the calling workflow.
    pub fn append(
        &self,
        session_id: SessionId,
        event_type: AuditEventType,
        payload: serde_json::Value,
        success: bool,
    ) -> Result<AuditReceipt, AuditError> {
        let mut inner = self.inner.lock();

        let mut entry = AuditEntry {
            seq: inner.next_seq,
            entry_id: EntryId::new(),
            session_id,
            timestamp: Utc::now(),
            event_type,
            payload,
            success,
            prev_hash: inner.prev_hash,
            hash: GENESIS_HASH,
        };
        entry.hash = compute_hash(&entry);

        inner.sink.append(&entry)?;
        inner.next_seq += 1;
        inner.prev_hash = entry.hash;

        tracing::trace!(seq = entry.seq, event = %event_type, "audit entry appended");

        Ok(AuditReceipt {
            entry_id: entry.entry_id,
            seq: entry.seq,
        })
    }

    /// Read one session's entries, ordered by sequence number.
    ///
    /// # Errors
    /// `AuditError::SinkUnavailable` if the sink cannot be read.
    pub fn read_session(&self, session_id: SessionId) -> Result<Vec<AuditEntry>, AuditError> {
        let inner = self.inner.lock();
        let mut entries: Vec<AuditEntry> = inner
            .sink
            .read_all()?
            .into_iter()
            .filter(|e| e.session_id == session_id)
            .collect();
        entries.sort_by_key(|e| e.seq);
        Ok(entries)
    }

    /// Verify the full stored hash chain.
    ///
    /// # Errors
    /// `AuditError::IntegrityViolation` naming the first bad sequence number.
    pub fn verify_chain(&self) -> Result<(), AuditError> {
        let inner = self.inner.lock();
        verify_entries(&inner.sink.read_all()?)
    }

    /// Sequence number the next append will receive
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.inner.lock().next_seq
    }
}

/// Verify a contiguous entry sequence against its hash chain.
///
/// # Errors
/// `AuditError::IntegrityViolation` at the first entry whose `prev_hash`
/// or recomputed hash does not match.
pub fn verify_entries(entries: &[AuditEntry]) -> Result<(), AuditError> {
    let mut prev = GENESIS_HASH;
    for entry in entries {
        if entry.prev_hash != prev {
            return Err(AuditError::IntegrityViolation { seq: entry.seq });
        }
        if compute_hash(entry) != entry.hash {
            return Err(AuditError::IntegrityViolation { seq: entry.seq });
        }
        prev = entry.hash;
    }
    Ok(())
}
