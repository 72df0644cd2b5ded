//! Audit entry and hash chain

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vdo_domain::{EntryId, SessionId};

/// Chain hash of the entry preceding the first one
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// Kind of audited event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    SessionStarted,
    StateTransition,
    CategorizationRecorded,
    ConsultationOpened,
    ConsultationResolved,
    AgentTaskFinished,
    CoordinationSummary,
    ArtifactValidated,
    ArtifactRejected,
    WorkflowCompleted,
    WorkflowFailed,
}

impl AuditEventType {
    /// Stable snake_case label, also used in the hash preimage
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStarted => "session_started",
            Self::StateTransition => "state_transition",
            Self::CategorizationRecorded => "categorization_recorded",
            Self::ConsultationOpened => "consultation_opened",
            Self::ConsultationResolved => "consultation_resolved",
            Self::AgentTaskFinished => "agent_task_finished",
            Self::CoordinationSummary => "coordination_summary",
            Self::ArtifactValidated => "artifact_validated",
            Self::ArtifactRejected => "artifact_rejected",
            Self::WorkflowCompleted => "workflow_completed",
            Self::WorkflowFailed => "workflow_failed",
        }
    }
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable audit record
///
/// Ordering is defined by `seq`, assigned by the log's single writer path;
/// wall-clock timestamps are informational and must not be used to order
/// causally related entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Monotonic sequence number within the log
    pub seq: u64,
    pub entry_id: EntryId,
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub payload: serde_json::Value,
    pub success: bool,
    /// Hash of the preceding entry ([`GENESIS_HASH`] for the first)
    pub prev_hash: [u8; 32],
    /// SHA-256 over this entry's fields and `prev_hash`
    pub hash: [u8; 32],
}

/// Compute the chain hash for an entry.
///
/// The preimage covers every field except `hash` itself. The payload is
/// hashed through its canonical serde_json rendering (object keys sorted).
#[must_use]
pub fn compute_hash(entry: &AuditEntry) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(entry.seq.to_le_bytes());
    hasher.update(entry.entry_id.0.as_bytes());
    hasher.update(entry.session_id.0.as_bytes());
    hasher.update(entry.timestamp.timestamp_micros().to_le_bytes());
    hasher.update(entry.event_type.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(entry.payload.to_string().as_bytes());
    hasher.update([0]);
    hasher.update([u8::from(entry.success)]);
    hasher.update(entry.prev_hash);
    hasher.finalize().into()
}
