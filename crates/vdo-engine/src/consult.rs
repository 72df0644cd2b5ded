//! Consultation manager
//!
//! Correlated human escalation. Each request suspends the calling step
//! until a response with the matching `consultation_id` arrives, the
//! request's timeout elapses, or the workflow is cancelled.
//!
//! # Invariant
//!
//! Every opened request reaches exactly one terminal resolution, and that
//! resolution is audited before `request` returns; a cancelled workflow
//! never leaves a consultation dangling.

use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vdo_audit::{AuditError, AuditEventType, AuditLog};
use vdo_domain::{
    ConsultationId, ConsultationOutcome, ConsultationRequest, ConsultationResponse,
    ResolutionBranch,
};

/// Consultation protocol failures
#[derive(Debug, thiserror::Error)]
pub enum ConsultError {
    /// No open request with this correlation id
    #[error("no open consultation with id {0}")]
    UnknownConsultation(ConsultationId),

    /// The request reached its terminal resolution before the response landed
    #[error("consultation {0} already resolved")]
    AlreadyResolved(ConsultationId),

    /// The workflow was cancelled while the request was open
    #[error("consultation {0} cancelled by workflow")]
    Cancelled(ConsultationId),

    /// Audit write failed
    #[error(transparent)]
    Audit(#[from] AuditError),
}

struct PendingConsultation {
    request: ConsultationRequest,
    responder: oneshot::Sender<ConsultationResponse>,
}

/// Correlated request/response escalation to a human reviewer
pub struct ConsultationManager {
    audit: Arc<AuditLog>,
    pending: DashMap<ConsultationId, PendingConsultation>,
}

impl ConsultationManager {
    /// Create a manager writing through the given audit log
    #[must_use]
    pub fn new(audit: Arc<AuditLog>) -> Self {
        Self {
            audit,
            pending: DashMap::new(),
        }
    }

    /// Open a request and suspend until its terminal resolution.
    ///
    /// On timeout the outcome carries the reason's fixed conservative
    /// default decision. On cancellation the terminal audit entry is
    /// written before the error propagates.
    ///
    /// # Errors
    /// - `ConsultError::Cancelled` when the workflow token fires first
    /// - `ConsultError::Audit` when the trail cannot be written
    pub async fn request(
        &self,
        request: ConsultationRequest,
        cancel: &CancellationToken,
    ) -> Result<ConsultationOutcome, ConsultError> {
        let consultation_id = request.consultation_id;
        let session_id = request.session_id;
        let reason = request.reason;
        let timeout = request.timeout;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(
            consultation_id,
            PendingConsultation {
                request: request.clone(),
                responder: tx,
            },
        );

        let opened = self.audit.append(
            session_id,
            AuditEventType::ConsultationOpened,
            json!({
                "consultation_id": consultation_id,
                "reason": reason,
                "urgency": request.urgency,
                "required_expertise": request.required_expertise,
                "timeout_ms": timeout.as_millis() as u64,
            }),
            true,
        );
        if let Err(err) = opened {
            // An unauditable consultation must not stay registered.
            self.pending.remove(&consultation_id);
            return Err(err.into());
        }
        tracing::info!(%consultation_id, %reason, "consultation opened");

        let started = Instant::now();
        let (branch, decision, responder_role, rationale) = tokio::select! {
            response = rx => match response {
                Ok(resp) => (
                    ResolutionBranch::Response,
                    Some(resp.decision),
                    Some(resp.responder_role),
                    Some(resp.rationale),
                ),
                // Sender dropped without a response: resolve as cancellation.
                Err(_) => (ResolutionBranch::Cancellation, None, None, None),
            },
            () = tokio::time::sleep(timeout) => (
                ResolutionBranch::Timeout,
                Some(reason.conservative_default()),
                None,
                None,
            ),
            () = cancel.cancelled() => (ResolutionBranch::Cancellation, None, None, None),
        };
        let waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.pending.remove(&consultation_id);

        let outcome = ConsultationOutcome {
            consultation_id,
            branch,
            decision,
            responder_role,
            rationale,
            waited_ms,
        };
        self.audit.append(
            session_id,
            AuditEventType::ConsultationResolved,
            json!({
                "consultation_id": consultation_id,
                "branch": branch,
                "decision": outcome.decision,
                "waited_ms": waited_ms,
            }),
            branch != ResolutionBranch::Cancellation,
        )?;
        tracing::info!(%consultation_id, ?branch, waited_ms, "consultation resolved");

        if branch == ResolutionBranch::Cancellation {
            Err(ConsultError::Cancelled(consultation_id))
        } else {
            Ok(outcome)
        }
    }

    /// Deliver a reviewer response to the matching open request.
    ///
    /// # Errors
    /// - `ConsultError::UnknownConsultation` for an id that was never opened
    ///   or is already fully resolved
    /// - `ConsultError::AlreadyResolved` when the request resolved between
    ///   lookup and delivery
    pub fn submit_response(&self, response: ConsultationResponse) -> Result<(), ConsultError> {
        let id = response.consultation_id;
        match self.pending.remove(&id) {
            Some((_, pending)) => pending
                .responder
                .send(response)
                .map_err(|_| ConsultError::AlreadyResolved(id)),
            None => Err(ConsultError::UnknownConsultation(id)),
        }
    }

    /// Requests currently awaiting a reviewer, for the human interface
    #[must_use]
    pub fn open_requests(&self) -> Vec<ConsultationRequest> {
        self.pending.iter().map(|e| e.value().request.clone()).collect()
    }

    /// Number of requests currently open
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.pending.len()
    }
}
