//! VDO Domain Model
//!
//! Typed building blocks shared by every workflow component:
//!
//! - [`ValidationCategory`]: closed regulatory taxonomy driving generation bounds
//! - [`WorkflowSession`]: per-execution session record, single-writer
//! - [`CategorizationResult`]: validated categorization determination
//! - [`ConsultationRequest`] / [`ConsultationResponse`]: human escalation protocol
//! - [`AgentTask`] / [`AgentResult`] / [`AgentAggregate`]: specialist fan-out payloads
//! - [`ValidationProtocol`]: the generated document artifact
//!
//! Validation in this crate is deliberately strict: a confidence outside
//! `[0, 1]` or a test-case count outside the category bounds is a hard
//! [`DomainError`], never a clamped or truncated value.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod artifact;
mod categorization;
mod category;
mod consultation;
mod error;
mod ids;
mod session;
mod task;

// Re-exports
pub use artifact::{ProtocolPayload, TestCase, TestCasePayload, ValidationProtocol};
pub use categorization::{CategorizationPayload, CategorizationResult, CategoryScore};
pub use category::{CardinalityBounds, ValidationCategory};
pub use consultation::{
    ConsultationDecision, ConsultationOutcome, ConsultationReason, ConsultationRequest,
    ConsultationResponse, ResolutionBranch, Urgency,
};
pub use error::DomainError;
pub use ids::{ConsultationId, EntryId, ProtocolId, SessionId, TaskId};
pub use session::{SessionStatus, TerminalResult, WorkflowSession};
pub use task::{AgentAggregate, AgentResult, AgentStatus, AgentTask, Specialty};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
