//! Workflow error taxonomy
//!
//! Kinds that reach the caller. Two taxonomy members never appear here by
//! design: a single specialist task failure is absorbed into the
//! coordinator's partial aggregate, and a consultation timeout is recovered
//! via the fixed conservative default (both always audited).

use crate::state::IllegalTransition;
use vdo_audit::AuditError;
use vdo_domain::ConsultationId;
use vdo_engine::{ConsultError, EngineError, ReasoningError};

/// Unrecoverable workflow failures
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Reasoning collaborator failed; never retried with a relaxed schema
    #[error("reasoning failure: {0}")]
    Reasoning(#[from] ReasoningError),

    /// Structured output failed validation and no retry was authorized
    #[error("schema validation failure: {0}")]
    SchemaValidation(String),

    /// Workflow cancelled while a consultation was open
    #[error("consultation {0} cancelled by workflow")]
    ConsultationCancelled(ConsultationId),

    /// Reviewer resolved a consultation without answering the question
    #[error("consultation {consultation_id} aborted by {responder_role}")]
    ConsultationAborted {
        consultation_id: ConsultationId,
        responder_role: String,
    },

    /// No specialist produced usable output
    #[error("zero successful specialist results out of {expected}")]
    ZeroSuccessAggregate { expected: usize },

    /// Invalid configuration or missing required session key
    #[error("fatal configuration error: {0}")]
    FatalConfiguration(String),

    /// Whole-workflow deadline elapsed
    #[error("workflow deadline exceeded while {stage}")]
    DeadlineExceeded { stage: &'static str },

    /// Audit sink unavailable; the execution is no longer auditable
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// State machine misuse (programming error)
    #[error(transparent)]
    IllegalTransition(#[from] IllegalTransition),
}

impl WorkflowError {
    /// Stable failure-kind label for the caller-visible report
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reasoning(_) => "reasoning_failure",
            Self::SchemaValidation(_) => "schema_validation_failure",
            Self::ConsultationCancelled(_) => "consultation_cancelled",
            Self::ConsultationAborted { .. } => "consultation_aborted",
            Self::ZeroSuccessAggregate { .. } => "zero_success_aggregate",
            Self::FatalConfiguration(_) => "fatal_configuration_error",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::Audit(_) => "audit_unavailable",
            Self::IllegalTransition(_) => "illegal_transition",
        }
    }
}

impl From<EngineError> for WorkflowError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Reasoning(e) => Self::Reasoning(e),
            EngineError::SchemaValidation(detail) => Self::SchemaValidation(detail),
            EngineError::Consultation(e) => e.into(),
            EngineError::Audit(e) => Self::Audit(e),
        }
    }
}

impl From<ConsultError> for WorkflowError {
    fn from(err: ConsultError) -> Self {
        match err {
            ConsultError::Cancelled(id) => Self::ConsultationCancelled(id),
            ConsultError::Audit(e) => Self::Audit(e),
            // Correlation misuse from the human-interface side; a workflow
            // awaiting resolution never raises these itself.
            other @ (ConsultError::UnknownConsultation(_)
            | ConsultError::AlreadyResolved(_)) => Self::FatalConfiguration(other.to_string()),
        }
    }
}
