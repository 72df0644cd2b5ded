//! Workflow session record
//!
//! # Ownership
//!
//! A [`WorkflowSession`] is exclusively owned and mutated by the
//! orchestrator that created it. Other components read the fields they need
//! and append to the audit log; they never write the session.

use crate::ids::{ProtocolId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    AwaitingConsultation,
    Completed,
    Failed,
}

/// Terminal outcome recorded on the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum TerminalResult {
    Completed { protocol_id: ProtocolId },
    Failed { kind: String },
}

/// Per-execution session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSession {
    pub session_id: SessionId,
    /// Reference to the input requirements specification
    pub input_reference: String,
    pub started_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub terminal_result: Option<TerminalResult>,
}

impl WorkflowSession {
    /// Create a running session for an input reference
    #[must_use]
    pub fn new(input_reference: impl Into<String>) -> Self {
        Self {
            session_id: SessionId::new(),
            input_reference: input_reference.into(),
            started_at: Utc::now(),
            status: SessionStatus::Running,
            terminal_result: None,
        }
    }

    /// Mark the session as blocked on human consultation
    pub fn mark_awaiting_consultation(&mut self) {
        self.status = SessionStatus::AwaitingConsultation;
    }

    /// Resume after a consultation resolved
    pub fn mark_running(&mut self) {
        self.status = SessionStatus::Running;
    }

    /// Archive with a validated artifact
    pub fn mark_completed(&mut self, protocol_id: ProtocolId) {
        self.status = SessionStatus::Completed;
        self.terminal_result = Some(TerminalResult::Completed { protocol_id });
    }

    /// Archive with a failure kind
    pub fn mark_failed(&mut self, kind: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.terminal_result = Some(TerminalResult::Failed { kind: kind.into() });
    }

    /// Whether the session reached a terminal status
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, SessionStatus::Completed | SessionStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_running() {
        let session = WorkflowSession::new("URS-042");
        assert_eq!(session.status, SessionStatus::Running);
        assert!(session.terminal_result.is_none());
        assert!(!session.is_terminal());
    }

    #[test]
    fn completed_session_records_protocol() {
        let mut session = WorkflowSession::new("URS-042");
        let protocol_id = ProtocolId::new();
        session.mark_completed(protocol_id);

        assert!(session.is_terminal());
        assert_eq!(
            session.terminal_result,
            Some(TerminalResult::Completed { protocol_id })
        );
    }

    #[test]
    fn failed_session_records_kind() {
        let mut session = WorkflowSession::new("URS-042");
        session.mark_failed("zero_success_aggregate");

        assert_eq!(session.status, SessionStatus::Failed);
        assert_eq!(
            session.terminal_result,
            Some(TerminalResult::Failed {
                kind: "zero_success_aggregate".to_string()
            })
        );
    }

    #[test]
    fn consultation_suspension_round_trip() {
        let mut session = WorkflowSession::new("URS-042");
        session.mark_awaiting_consultation();
        assert_eq!(session.status, SessionStatus::AwaitingConsultation);
        session.mark_running();
        assert_eq!(session.status, SessionStatus::Running);
    }
}
