//! Human consultation protocol types
//!
//! A consultation is a correlated request/response exchange with a human
//! reviewer. Every request reaches exactly one terminal resolution: a
//! matched response, the fixed timeout default, or cancellation.

use crate::category::ValidationCategory;
use crate::ids::{ConsultationId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a consultation was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationReason {
    /// Automated confidence below threshold, or near-equal category scores
    LowConfidence,
    /// Reasoning output failed structural validation during categorization
    SchemaValidationFailed,
    /// Generated artifact failed cardinality validation
    ArtifactValidationFailed,
}

impl ConsultationReason {
    /// The fixed conservative resolution applied when the consultation
    /// times out.
    ///
    /// This is a pre-declared policy table, never derived from the failed
    /// automated result: category questions fall back to the
    /// highest-scrutiny category; a rejected artifact is never accepted or
    /// regenerated without an explicit reviewer decision.
    #[inline]
    #[must_use]
    pub fn conservative_default(&self) -> ConsultationDecision {
        match self {
            Self::LowConfidence | Self::SchemaValidationFailed => {
                ConsultationDecision::AssignCategory(ValidationCategory::CONSERVATIVE_DEFAULT)
            }
            Self::ArtifactValidationFailed => ConsultationDecision::Abort,
        }
    }

    /// Snake_case label used in audit payloads
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowConfidence => "low_confidence",
            Self::SchemaValidationFailed => "schema_validation_failed",
            Self::ArtifactValidationFailed => "artifact_validation_failed",
        }
    }
}

impl std::fmt::Display for ConsultationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer-facing urgency of a consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Routine,
    Elevated,
    Critical,
}

/// An open request for human review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationRequest {
    pub consultation_id: ConsultationId,
    pub session_id: SessionId,
    pub reason: ConsultationReason,
    pub urgency: Urgency,
    /// Expertise tags the responder should hold
    pub required_expertise: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// Wall-clock budget before the conservative default applies
    pub timeout: Duration,
}

impl ConsultationRequest {
    /// Create a new request with a fresh correlation id
    #[must_use]
    pub fn new(
        session_id: SessionId,
        reason: ConsultationReason,
        urgency: Urgency,
        timeout: Duration,
    ) -> Self {
        Self {
            consultation_id: ConsultationId::new(),
            session_id,
            reason,
            urgency,
            required_expertise: Vec::new(),
            created_at: Utc::now(),
            timeout,
        }
    }

    /// With required expertise tags
    #[must_use]
    pub fn with_expertise(mut self, expertise: Vec<String>) -> Self {
        self.required_expertise = expertise;
        self
    }
}

/// A reviewer's decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "category")]
pub enum ConsultationDecision {
    /// Authoritative category assignment
    AssignCategory(ValidationCategory),
    /// Authorize one regeneration of a rejected artifact
    ApproveRetry,
    /// Abort the workflow
    Abort,
}

/// A response correlated to an open request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationResponse {
    /// Must match an open request
    pub consultation_id: ConsultationId,
    pub decision: ConsultationDecision,
    pub rationale: String,
    pub responder_role: String,
    pub responded_at: DateTime<Utc>,
}

/// Which branch terminated the consultation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionBranch {
    Response,
    Timeout,
    Cancellation,
}

/// Terminal resolution of a consultation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationOutcome {
    pub consultation_id: ConsultationId,
    pub branch: ResolutionBranch,
    /// The effective decision; for a timeout this is the conservative
    /// default, for a cancellation there is none.
    pub decision: Option<ConsultationDecision>,
    pub responder_role: Option<String>,
    pub rationale: Option<String>,
    /// Elapsed wait before resolution
    pub waited_ms: u64,
}
