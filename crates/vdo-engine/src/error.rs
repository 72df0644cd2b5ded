//! Engine error types

use crate::consult::ConsultError;
use crate::reasoning::ReasoningError;
use vdo_audit::AuditError;

/// Failures raised by engine components
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Reasoning collaborator failed; never retried with a relaxed schema
    #[error("reasoning failure: {0}")]
    Reasoning(#[from] ReasoningError),

    /// Structured output failed validation; never truncated or padded to fit
    #[error("schema validation failure: {0}")]
    SchemaValidation(String),

    /// Consultation protocol failure (cancellation, stale correlation id)
    #[error(transparent)]
    Consultation(#[from] ConsultError),

    /// Audit write failed; the execution is no longer auditable
    #[error(transparent)]
    Audit(#[from] AuditError),
}
