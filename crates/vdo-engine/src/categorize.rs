//! Categorization step
//!
//! One reasoning call, strictly validated. A below-threshold or ambiguous
//! determination is never accepted and never downgraded to a "safe"
//! category: it escalates, and the consultation outcome is authoritative.

use crate::error::EngineError;
use crate::reasoning::{ReasoningCapability, ReasoningRequest};
use crate::schema;
use serde_json::json;
use std::sync::Arc;
use vdo_audit::{AuditEventType, AuditLog};
use vdo_domain::{
    CategorizationPayload, CategorizationResult, ConsultationReason, WorkflowSession,
};

/// Escalation routing produced by the step
#[derive(Debug, Clone)]
pub struct Escalation {
    pub reason: ConsultationReason,
    /// Diagnostic detail for the reviewer
    pub detail: String,
    /// The low-confidence result, when one parsed
    pub result: Option<CategorizationResult>,
}

/// Outcome of one categorization invocation
#[derive(Debug, Clone)]
pub enum CategorizationDecision {
    /// Confidence met the threshold; the category is authoritative
    Accepted(CategorizationResult),
    /// Validation failed or confidence was insufficient; consult a human
    Escalate(Escalation),
}

/// The categorization step
pub struct CategorizationStep {
    reasoning: Arc<dyn ReasoningCapability>,
    audit: Arc<AuditLog>,
    confidence_threshold: f64,
    ambiguity_margin: f64,
}

impl CategorizationStep {
    /// Create the step
    #[must_use]
    pub fn new(
        reasoning: Arc<dyn ReasoningCapability>,
        audit: Arc<AuditLog>,
        confidence_threshold: f64,
        ambiguity_margin: f64,
    ) -> Self {
        Self {
            reasoning,
            audit,
            confidence_threshold,
            ambiguity_margin,
        }
    }

    /// Invoke the reasoning capability once and decide accept vs escalate.
    ///
    /// Appends exactly one audit entry recording category, confidence, and
    /// the decision.
    ///
    /// # Errors
    /// - `EngineError::Reasoning` when the collaborator itself fails
    /// - `EngineError::Audit` when the trail cannot be written
    pub async fn evaluate(
        &self,
        session: &WorkflowSession,
    ) -> Result<CategorizationDecision, EngineError> {
        let request = ReasoningRequest::new(
            categorization_prompt(&session.input_reference),
            schema::categorization_schema(),
        );
        let raw = self.reasoning.complete(request).await?;

        if let Err(detail) = schema::validate_categorization(&raw) {
            return self.escalate_schema_failure(session, detail);
        }
        let payload: CategorizationPayload = match serde_json::from_value(raw) {
            Ok(payload) => payload,
            Err(err) => return self.escalate_schema_failure(session, err.to_string()),
        };
        let result = match payload.into_result() {
            Ok(result) => result,
            Err(err) => return self.escalate_schema_failure(session, err.to_string()),
        };

        let confident = result.confidence >= self.confidence_threshold;
        let ambiguous = result.is_ambiguous(self.ambiguity_margin);
        let accepted = confident && !ambiguous;

        self.audit.append(
            session.session_id,
            AuditEventType::CategorizationRecorded,
            json!({
                "category": result.category,
                "confidence": result.confidence,
                "evidence_count": result.evidence_count,
                "threshold": self.confidence_threshold,
                "ambiguous": ambiguous,
                "decision": if accepted { "accept" } else { "escalate" },
            }),
            true,
        )?;

        if accepted {
            tracing::info!(
                category = %result.category,
                confidence = result.confidence,
                "categorization accepted"
            );
            Ok(CategorizationDecision::Accepted(result))
        } else {
            tracing::warn!(
                category = %result.category,
                confidence = result.confidence,
                threshold = self.confidence_threshold,
                ambiguous,
                "categorization below threshold, escalating"
            );
            let detail = if ambiguous {
                format!(
                    "near-equal category scores: top {:.2}, runner-up {:.2}",
                    result.confidence,
                    result.runner_up_confidence.unwrap_or_default()
                )
            } else {
                format!(
                    "confidence {:.2} below threshold {:.2}",
                    result.confidence, self.confidence_threshold
                )
            };
            Ok(CategorizationDecision::Escalate(Escalation {
                reason: ConsultationReason::LowConfidence,
                detail,
                result: Some(result),
            }))
        }
    }

    fn escalate_schema_failure(
        &self,
        session: &WorkflowSession,
        detail: String,
    ) -> Result<CategorizationDecision, EngineError> {
        self.audit.append(
            session.session_id,
            AuditEventType::CategorizationRecorded,
            json!({
                "decision": "escalate",
                "error": detail.clone(),
            }),
            false,
        )?;
        tracing::error!(error = %detail, "categorization output failed schema validation");
        Ok(CategorizationDecision::Escalate(Escalation {
            reason: ConsultationReason::SchemaValidationFailed,
            detail,
            result: None,
        }))
    }
}

fn categorization_prompt(input_reference: &str) -> String {
    format!(
        "Categorize the computerized system described by requirement set \
         {input_reference} into exactly one validation category: \
         infrastructure_software, non_configured_product, configured_product, \
         or custom_application. Respond with a JSON object matching the \
         provided schema, including your confidence and the evidence count."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::MockReasoningCapability;
    use vdo_domain::ValidationCategory;

    fn step(mock: MockReasoningCapability, threshold: f64) -> (CategorizationStep, Arc<AuditLog>) {
        let audit = Arc::new(AuditLog::in_memory());
        (
            CategorizationStep::new(Arc::new(mock), Arc::clone(&audit), threshold, 0.10),
            audit,
        )
    }

    fn session() -> WorkflowSession {
        WorkflowSession::new("URS-042")
    }

    #[tokio::test]
    async fn high_confidence_is_accepted() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| {
            Ok(json!({
                "category": "configured_product",
                "confidence": 0.93,
                "rationale": "configured vendor product",
                "evidence_count": 5,
            }))
        });
        let (step, audit) = step(mock, 0.8);
        let session = session();

        let decision = step.evaluate(&session).await.unwrap();
        let result = match decision {
            CategorizationDecision::Accepted(result) => result,
            CategorizationDecision::Escalate(_) => panic!("expected acceptance"),
        };
        assert_eq!(result.category, ValidationCategory::ConfiguredProduct);

        let entries = audit.read_session(session.session_id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload["decision"], "accept");
    }

    #[tokio::test]
    async fn low_confidence_escalates() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| {
            Ok(json!({
                "category": "non_configured_product",
                "confidence": 0.55,
                "rationale": "unclear configuration surface",
                "evidence_count": 2,
            }))
        });
        let (step, audit) = step(mock, 0.8);
        let session = session();

        let decision = step.evaluate(&session).await.unwrap();
        let escalation = match decision {
            CategorizationDecision::Escalate(escalation) => escalation,
            CategorizationDecision::Accepted(_) => panic!("expected escalation"),
        };
        assert_eq!(escalation.reason, ConsultationReason::LowConfidence);
        assert!(escalation.result.is_some());

        let entries = audit.read_session(session.session_id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload["decision"], "escalate");
        assert_eq!(entries[0].payload["confidence"], 0.55);
    }

    #[tokio::test]
    async fn near_equal_scores_escalate_even_above_threshold() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| {
            Ok(json!({
                "category": "configured_product",
                "confidence": 0.86,
                "rationale": "could be configured or custom",
                "evidence_count": 4,
                "alternatives": [
                    {"category": "custom_application", "confidence": 0.81},
                ],
            }))
        });
        let (step, _audit) = step(mock, 0.8);

        let decision = step.evaluate(&session()).await.unwrap();
        assert!(matches!(
            decision,
            CategorizationDecision::Escalate(Escalation {
                reason: ConsultationReason::LowConfidence,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn missing_confidence_escalates_as_schema_failure() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| {
            Ok(json!({
                "category": "configured_product",
                "rationale": "no confidence reported",
                "evidence_count": 1,
            }))
        });
        let (step, audit) = step(mock, 0.8);
        let session = session();

        let decision = step.evaluate(&session).await.unwrap();
        let escalation = match decision {
            CategorizationDecision::Escalate(escalation) => escalation,
            CategorizationDecision::Accepted(_) => panic!("expected escalation"),
        };
        assert_eq!(escalation.reason, ConsultationReason::SchemaValidationFailed);
        assert!(escalation.result.is_none());

        let entries = audit.read_session(session.session_id).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].success);
    }

    #[tokio::test]
    async fn out_of_range_confidence_is_never_clamped() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| {
            Ok(json!({
                "category": "configured_product",
                "confidence": 1.7,
                "rationale": "overconfident",
                "evidence_count": 1,
            }))
        });
        let (step, _audit) = step(mock, 0.8);

        let decision = step.evaluate(&session()).await.unwrap();
        assert!(matches!(
            decision,
            CategorizationDecision::Escalate(Escalation {
                reason: ConsultationReason::SchemaValidationFailed,
                result: None,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn reasoning_failure_surfaces_as_error() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| {
            Err(crate::reasoning::ReasoningError::Unavailable(
                "provider offline".to_string(),
            ))
        });
        let (step, audit) = step(mock, 0.8);
        let session = session();

        let err = step.evaluate(&session).await.unwrap_err();
        assert!(matches!(err, EngineError::Reasoning(_)));
        // No determination happened, so no categorization entry either.
        assert!(audit.read_session(session.session_id).unwrap().is_empty());
    }
}
