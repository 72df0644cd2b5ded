//! Document generation step
//!
//! Produces the validation protocol from the accepted category and the
//! specialist aggregate. Cardinality is validated against the category
//! bounds; an out-of-range artifact is rejected outright, never truncated
//! or padded to fit.

use crate::error::EngineError;
use crate::reasoning::{ReasoningCapability, ReasoningRequest};
use crate::schema;
use serde_json::json;
use std::sync::Arc;
use vdo_audit::{AuditEventType, AuditLog};
use vdo_domain::{
    AgentAggregate, ProtocolPayload, ValidationCategory, ValidationProtocol, WorkflowSession,
};

/// The generation step
pub struct GenerationStep {
    reasoning: Arc<dyn ReasoningCapability>,
    audit: Arc<AuditLog>,
}

impl GenerationStep {
    /// Create the step
    #[must_use]
    pub fn new(reasoning: Arc<dyn ReasoningCapability>, audit: Arc<AuditLog>) -> Self {
        Self { reasoning, audit }
    }

    /// Generate and validate a protocol.
    ///
    /// A partial aggregate is allowed: generation then proceeds with the
    /// `reduced_context` flag set on the artifact, an explicit and audited
    /// degradation.
    ///
    /// # Errors
    /// - `EngineError::Reasoning` when the collaborator fails
    /// - `EngineError::SchemaValidation` when the output is structurally
    ///   invalid or out of cardinality bounds
    /// - `EngineError::Audit` when the trail cannot be written
    pub async fn generate(
        &self,
        session: &WorkflowSession,
        category: ValidationCategory,
        aggregate: &AgentAggregate,
    ) -> Result<ValidationProtocol, EngineError> {
        let reduced_context = aggregate.partial;
        let request = ReasoningRequest::new(
            generation_prompt(&session.input_reference, category, aggregate),
            schema::protocol_schema(),
        );
        let raw = self.reasoning.complete(request).await?;

        if let Err(detail) = schema::validate_protocol(&raw) {
            return self.reject(session, category, detail);
        }
        let payload: ProtocolPayload = match serde_json::from_value(raw) {
            Ok(payload) => payload,
            Err(err) => return self.reject(session, category, err.to_string()),
        };

        let protocol = ValidationProtocol::from_payload(category, payload, reduced_context);
        if let Err(err) = protocol.validate() {
            return self.reject(session, category, err.to_string());
        }

        self.audit.append(
            session.session_id,
            AuditEventType::ArtifactValidated,
            json!({
                "protocol_id": protocol.protocol_id,
                "category": category,
                "item_count": protocol.item_count(),
                "reduced_context": reduced_context,
            }),
            true,
        )?;
        tracing::info!(
            protocol_id = %protocol.protocol_id,
            item_count = protocol.item_count(),
            reduced_context,
            "protocol validated"
        );
        Ok(protocol)
    }

    /// Audit the rejection, then raise the step error.
    fn reject(
        &self,
        session: &WorkflowSession,
        category: ValidationCategory,
        detail: String,
    ) -> Result<ValidationProtocol, EngineError> {
        self.audit.append(
            session.session_id,
            AuditEventType::ArtifactRejected,
            json!({
                "category": category,
                "error": detail.clone(),
            }),
            false,
        )?;
        tracing::error!(error = %detail, "generated artifact rejected");
        Err(EngineError::SchemaValidation(detail))
    }
}

fn generation_prompt(
    input_reference: &str,
    category: ValidationCategory,
    aggregate: &AgentAggregate,
) -> String {
    let bounds = category.bounds();
    let mut prompt = format!(
        "Produce a validation test protocol for requirement set {input_reference}, \
         categorized as {category}. Provide between {} and {} test cases as a JSON \
         object matching the provided schema.\n\nSpecialist findings:\n",
        bounds.min, bounds.max
    );
    for result in aggregate.successes() {
        if let Some(output) = &result.output {
            prompt.push_str(&format!("\n## {}\n{output}\n", result.specialty));
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::MockReasoningCapability;
    use vdo_domain::{AgentResult, AgentTask, Specialty};

    fn aggregate(partial: bool) -> AgentAggregate {
        let task = AgentTask::new(Specialty::RiskAssessment, json!({}));
        let expected = if partial { 2 } else { 1 };
        AgentAggregate::from_results(
            expected,
            vec![AgentResult::success(
                task.task_id,
                task.specialty,
                json!({"risks": ["data migration"]}),
                10,
            )],
        )
    }

    fn cases(count: usize) -> serde_json::Value {
        json!({
            "test_cases": (0..count)
                .map(|i| json!({
                    "title": format!("Verify requirement {i}"),
                    "objective": "Confirm behavior",
                    "expected_result": "Matches specification",
                }))
                .collect::<Vec<_>>(),
        })
    }

    fn step(mock: MockReasoningCapability) -> (GenerationStep, Arc<AuditLog>) {
        let audit = Arc::new(AuditLog::in_memory());
        (
            GenerationStep::new(Arc::new(mock), Arc::clone(&audit)),
            audit,
        )
    }

    #[tokio::test]
    async fn valid_protocol_is_returned() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| Ok(cases(7)));
        let (step, audit) = step(mock);
        let session = WorkflowSession::new("URS-042");

        let protocol = step
            .generate(&session, ValidationCategory::NonConfiguredProduct, &aggregate(false))
            .await
            .unwrap();

        assert_eq!(protocol.item_count(), 7);
        assert!(!protocol.reduced_context);

        let entries = audit.read_session(session.session_id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, AuditEventType::ArtifactValidated);
    }

    #[tokio::test]
    async fn under_bounds_output_is_rejected_not_padded() {
        // Category requires [5, 10]; the model produced 2.
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| Ok(cases(2)));
        let (step, audit) = step(mock);
        let session = WorkflowSession::new("URS-042");

        let err = step
            .generate(&session, ValidationCategory::NonConfiguredProduct, &aggregate(false))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::SchemaValidation(_)));
        assert!(err.to_string().contains("got 2"));

        let entries = audit.read_session(session.session_id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, AuditEventType::ArtifactRejected);
        assert!(!entries[0].success);
    }

    #[tokio::test]
    async fn over_bounds_output_is_rejected_not_truncated() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| Ok(cases(11)));
        let (step, _audit) = step(mock);
        let session = WorkflowSession::new("URS-042");

        let err = step
            .generate(&session, ValidationCategory::NonConfiguredProduct, &aggregate(false))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SchemaValidation(_)));
    }

    #[tokio::test]
    async fn partial_aggregate_sets_reduced_context() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete().returning(|_| Ok(cases(6)));
        let (step, audit) = step(mock);
        let session = WorkflowSession::new("URS-042");

        let protocol = step
            .generate(&session, ValidationCategory::NonConfiguredProduct, &aggregate(true))
            .await
            .unwrap();

        assert!(protocol.reduced_context);
        let entries = audit.read_session(session.session_id).unwrap();
        assert_eq!(entries[0].payload["reduced_context"], true);
    }

    #[tokio::test]
    async fn malformed_output_is_rejected() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete()
            .returning(|_| Ok(json!({"cases": "not a protocol"})));
        let (step, audit) = step(mock);
        let session = WorkflowSession::new("URS-042");

        let err = step
            .generate(&session, ValidationCategory::ConfiguredProduct, &aggregate(false))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SchemaValidation(_)));
        assert_eq!(
            audit.read_session(session.session_id).unwrap()[0].event_type,
            AuditEventType::ArtifactRejected
        );
    }

    #[tokio::test]
    async fn prompt_includes_specialist_findings_and_bounds() {
        let mut mock = MockReasoningCapability::new();
        mock.expect_complete()
            .withf(|request: &ReasoningRequest| {
                request.prompt.contains("between 5 and 10")
                    && request.prompt.contains("risk_assessment")
                    && request.prompt.contains("data migration")
            })
            .returning(|_| Ok(cases(6)));
        let (step, _audit) = step(mock);
        let session = WorkflowSession::new("URS-042");

        step.generate(&session, ValidationCategory::NonConfiguredProduct, &aggregate(false))
            .await
            .unwrap();
    }
}
