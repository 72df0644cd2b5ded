//! Workflow orchestrator
//!
//! The single task that owns the [`WorkflowSession`] and drives the state
//! machine: categorization, consultation, specialist coordination, document
//! generation, and finalization. Suspension happens in exactly two places
//! (the coordinator join and consultation resolution), and a workflow-level
//! deadline propagates to both.

use crate::config::WorkflowConfig;
use crate::context::SessionContext;
use crate::error::WorkflowError;
use crate::state::{validate_transition, WorkflowState};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vdo_audit::{AuditEventType, AuditLog};
use vdo_domain::{
    AgentAggregate, ConsultationDecision, ConsultationReason, ConsultationRequest, SessionId,
    Urgency, ValidationCategory, ValidationProtocol, WorkflowSession,
};
use vdo_engine::{
    plan_for_category, AgentCoordinator, CategorizationDecision, CategorizationStep,
    ConsultationManager, ContextRetrieval, EngineError, Escalation, GenerationStep,
    ReasoningCapability, ReasoningSpecialist, SpecialistExecutor,
};

/// Workflow input
#[derive(Debug, Clone)]
pub struct WorkflowInput {
    /// Reference to the requirements specification to validate
    pub input_reference: String,
}

impl WorkflowInput {
    /// Create an input
    #[must_use]
    pub fn new(input_reference: impl Into<String>) -> Self {
        Self {
            input_reference: input_reference.into(),
        }
    }
}

/// Terminal status surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStatus {
    Completed,
    Failed,
}

/// Caller-visible failure summary
#[derive(Debug, Clone)]
pub struct FailureReport {
    /// Stable failure-kind label from the error taxonomy
    pub kind: &'static str,
    /// Full diagnostic detail
    pub detail: String,
}

/// Terminal result of one workflow run
#[derive(Debug)]
pub struct WorkflowOutcome {
    pub session_id: SessionId,
    pub status: WorkflowStatus,
    /// Present only when the run completed
    pub artifact: Option<ValidationProtocol>,
    /// Present only when the run failed
    pub failure: Option<FailureReport>,
    /// Inclusive audit sequence range written for this session
    pub audit_entries: (u64, u64),
}

/// The top-level workflow state machine
pub struct WorkflowOrchestrator {
    config: WorkflowConfig,
    audit: Arc<AuditLog>,
    consultations: Arc<ConsultationManager>,
    categorization: CategorizationStep,
    coordinator: AgentCoordinator,
    generation: GenerationStep,
}

impl WorkflowOrchestrator {
    /// Create an orchestrator over the external collaborators.
    ///
    /// # Errors
    /// `WorkflowError::FatalConfiguration` when the configuration is
    /// invalid; nothing runs with a bad threshold.
    pub fn new(
        config: WorkflowConfig,
        reasoning: Arc<dyn ReasoningCapability>,
        retrieval: Arc<dyn ContextRetrieval>,
        audit: Arc<AuditLog>,
    ) -> Result<Self, WorkflowError> {
        let executor: Arc<dyn SpecialistExecutor> = Arc::new(ReasoningSpecialist::new(
            Arc::clone(&reasoning),
            retrieval,
        ));
        Self::with_specialist_executor(config, reasoning, executor, audit)
    }

    /// Create an orchestrator with a custom specialist executor.
    ///
    /// # Errors
    /// `WorkflowError::FatalConfiguration` when the configuration is invalid.
    pub fn with_specialist_executor(
        config: WorkflowConfig,
        reasoning: Arc<dyn ReasoningCapability>,
        executor: Arc<dyn SpecialistExecutor>,
        audit: Arc<AuditLog>,
    ) -> Result<Self, WorkflowError> {
        config.validate()?;
        let consultations = Arc::new(ConsultationManager::new(Arc::clone(&audit)));
        let categorization = CategorizationStep::new(
            Arc::clone(&reasoning),
            Arc::clone(&audit),
            config.confidence_threshold,
            config.ambiguity_margin,
        );
        let coordinator = AgentCoordinator::new(executor, Arc::clone(&audit))
            .with_config(config.coordinator_config());
        let generation = GenerationStep::new(reasoning, Arc::clone(&audit));
        Ok(Self {
            config,
            audit,
            consultations,
            categorization,
            coordinator,
            generation,
        })
    }

    /// The consultation manager, for wiring up a human interface
    #[must_use]
    pub fn consultations(&self) -> Arc<ConsultationManager> {
        Arc::clone(&self.consultations)
    }

    /// The audit log this orchestrator writes through
    #[must_use]
    pub fn audit(&self) -> Arc<AuditLog> {
        Arc::clone(&self.audit)
    }

    /// Run one workflow to its terminal state.
    ///
    /// Never panics on workflow-level failures: every error path ends in a
    /// `Failed` outcome carrying the originating error kind and the audit
    /// entry range for post-hoc inspection.
    pub async fn run(&self, input: WorkflowInput) -> WorkflowOutcome {
        let mut session = WorkflowSession::new(input.input_reference);
        let mut state = WorkflowState::Initialized;
        let session_id = session.session_id;
        let first_seq = self.audit.next_seq();
        tracing::info!(%session_id, input = %session.input_reference, "workflow started");

        let cancel = CancellationToken::new();
        let watchdog = self.config.workflow_deadline().map(|deadline| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                tracing::warn!("workflow deadline elapsed, cancelling");
                cancel.cancel();
            })
        });

        let result = self.drive(&mut session, &mut state, &cancel).await;
        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }

        let last_seq = self.audit.next_seq().saturating_sub(1);
        match result {
            Ok(protocol) => {
                tracing::info!(%session_id, protocol_id = %protocol.protocol_id, "workflow completed");
                WorkflowOutcome {
                    session_id,
                    status: WorkflowStatus::Completed,
                    artifact: Some(protocol),
                    failure: None,
                    audit_entries: (first_seq, last_seq),
                }
            }
            Err(err) => {
                let report = self.fail(&mut session, &mut state, &err);
                let last_seq = self.audit.next_seq().saturating_sub(1);
                WorkflowOutcome {
                    session_id,
                    status: WorkflowStatus::Failed,
                    artifact: None,
                    failure: Some(report),
                    audit_entries: (first_seq, last_seq),
                }
            }
        }
    }

    /// Drive the state machine to a validated artifact.
    async fn drive(
        &self,
        session: &mut WorkflowSession,
        state: &mut WorkflowState,
        cancel: &CancellationToken,
    ) -> Result<ValidationProtocol, WorkflowError> {
        let mut context = SessionContext::new();
        self.audit.append(
            session.session_id,
            AuditEventType::SessionStarted,
            json!({"input_reference": session.input_reference}),
            true,
        )?;

        // Categorizing, possibly via Consulting.
        self.transition(session, state, WorkflowState::Categorizing)?;
        let category = match self.categorization.evaluate(session).await.map_err(WorkflowError::from)? {
            CategorizationDecision::Accepted(result) => {
                let category = result.category;
                context.set(
                    "categorization",
                    serde_json::to_value(&result)
                        .map_err(|e| WorkflowError::FatalConfiguration(e.to_string()))?,
                );
                category
            }
            CategorizationDecision::Escalate(escalation) => {
                self.resolve_category(session, state, &mut context, escalation, cancel)
                    .await?
            }
        };
        context.set("category", json!(category));

        // Coordinating: fixed specialist plan, bounded fan-out.
        self.transition(session, state, WorkflowState::Coordinating)?;
        let tasks = plan_for_category(category, &session.input_reference);
        let expected = tasks.len();
        let aggregate = self
            .coordinator
            .run(session.session_id, tasks, cancel)
            .await
            .map_err(WorkflowError::from)?;
        if cancel.is_cancelled() {
            return Err(WorkflowError::DeadlineExceeded {
                stage: "coordinating specialists",
            });
        }
        if aggregate.is_total_failure() {
            return Err(WorkflowError::ZeroSuccessAggregate { expected });
        }
        context.set(
            "specialist_aggregate",
            serde_json::to_value(&aggregate)
                .map_err(|e| WorkflowError::FatalConfiguration(e.to_string()))?,
        );

        // Generating, possibly via Consulting on a rejected artifact.
        self.transition(session, state, WorkflowState::Generating)?;
        let aggregate: AgentAggregate =
            serde_json::from_value(context.require("specialist_aggregate")?.clone())
                .map_err(|e| WorkflowError::FatalConfiguration(e.to_string()))?;
        let protocol = self
            .generate_with_escalation(session, state, category, &aggregate, cancel)
            .await?;
        context.set("artifact", json!({"protocol_id": protocol.protocol_id}));

        // Finalizing: flush the trail, then the terminal transition.
        self.transition(session, state, WorkflowState::Finalizing)?;
        self.audit.append(
            session.session_id,
            AuditEventType::WorkflowCompleted,
            json!({
                "protocol_id": protocol.protocol_id,
                "category": protocol.category,
                "item_count": protocol.item_count(),
                "reduced_context": protocol.reduced_context,
            }),
            true,
        )?;
        self.transition(session, state, WorkflowState::Completed)?;
        session.mark_completed(protocol.protocol_id);
        Ok(protocol)
    }

    /// Resolve an escalated categorization through consultation.
    ///
    /// The consultation outcome is authoritative: an assigned category (or
    /// the conservative timeout default) continues the workflow; anything
    /// else fails it. The automated low-confidence category is never used.
    async fn resolve_category(
        &self,
        session: &mut WorkflowSession,
        state: &mut WorkflowState,
        context: &mut SessionContext,
        escalation: Escalation,
        cancel: &CancellationToken,
    ) -> Result<ValidationCategory, WorkflowError> {
        self.transition(session, state, WorkflowState::Consulting)?;
        session.mark_awaiting_consultation();

        let request = ConsultationRequest::new(
            session.session_id,
            escalation.reason,
            match escalation.reason {
                ConsultationReason::SchemaValidationFailed => Urgency::Critical,
                _ => Urgency::Elevated,
            },
            self.config.consultation_timeout(),
        )
        .with_expertise(vec!["quality_assurance".to_string()]);

        let outcome = self.consultations.request(request, cancel).await;
        session.mark_running();
        let outcome = outcome.map_err(WorkflowError::from)?;

        // Return to the invoking state with the authoritative resolution.
        self.transition(session, state, WorkflowState::Categorizing)?;
        context.set(
            "consultation_outcome",
            serde_json::to_value(&outcome)
                .map_err(|e| WorkflowError::FatalConfiguration(e.to_string()))?,
        );

        match outcome.decision {
            Some(ConsultationDecision::AssignCategory(category)) => {
                tracing::info!(%category, detail = %escalation.detail, "category assigned by consultation");
                Ok(category)
            }
            _ => Err(WorkflowError::ConsultationAborted {
                consultation_id: outcome.consultation_id,
                responder_role: outcome
                    .responder_role
                    .unwrap_or_else(|| "unknown".to_string()),
            }),
        }
    }

    /// Generate the protocol, escalating a rejected artifact to a human.
    ///
    /// Only an explicit `ApproveRetry` authorizes regeneration, bounded by
    /// `max_generation_retries`; a timeout or abort fails with the original
    /// validation cause. The rejected artifact is never accepted.
    async fn generate_with_escalation(
        &self,
        session: &mut WorkflowSession,
        state: &mut WorkflowState,
        category: ValidationCategory,
        aggregate: &AgentAggregate,
        cancel: &CancellationToken,
    ) -> Result<ValidationProtocol, WorkflowError> {
        let mut attempts: u32 = 0;
        loop {
            match self.generation.generate(session, category, aggregate).await {
                Ok(protocol) => return Ok(protocol),
                Err(EngineError::SchemaValidation(detail)) => {
                    if attempts >= self.config.max_generation_retries {
                        return Err(WorkflowError::SchemaValidation(detail));
                    }
                    let approved = self
                        .consult_rejected_artifact(session, state, &detail, cancel)
                        .await?;
                    if !approved {
                        return Err(WorkflowError::SchemaValidation(detail));
                    }
                    attempts += 1;
                    tracing::info!(attempts, "regeneration authorized by reviewer");
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Ask a reviewer what to do with a rejected artifact.
    ///
    /// Returns whether a retry was explicitly approved. The timeout default
    /// for this reason is abort: a failed artifact is never accepted or
    /// regenerated without a human decision.
    async fn consult_rejected_artifact(
        &self,
        session: &mut WorkflowSession,
        state: &mut WorkflowState,
        detail: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, WorkflowError> {
        self.transition(session, state, WorkflowState::Consulting)?;
        session.mark_awaiting_consultation();

        let request = ConsultationRequest::new(
            session.session_id,
            ConsultationReason::ArtifactValidationFailed,
            Urgency::Critical,
            self.config.consultation_timeout(),
        )
        .with_expertise(vec!["quality_assurance".to_string(), "validation_lead".to_string()]);

        tracing::warn!(error = %detail, "artifact rejected, consulting reviewer");
        let outcome = self.consultations.request(request, cancel).await;
        session.mark_running();
        let outcome = outcome.map_err(WorkflowError::from)?;

        self.transition(session, state, WorkflowState::Generating)?;
        Ok(matches!(
            outcome.decision,
            Some(ConsultationDecision::ApproveRetry)
        ))
    }

    /// Validated state transition, audited.
    fn transition(
        &self,
        session: &WorkflowSession,
        state: &mut WorkflowState,
        to: WorkflowState,
    ) -> Result<(), WorkflowError> {
        validate_transition(*state, to)?;
        self.audit.append(
            session.session_id,
            AuditEventType::StateTransition,
            json!({"from": *state, "to": to}),
            true,
        )?;
        tracing::debug!(from = %*state, to = %to, "workflow transition");
        *state = to;
        Ok(())
    }

    /// Record the terminal failure and build the caller report.
    fn fail(
        &self,
        session: &mut WorkflowSession,
        state: &mut WorkflowState,
        err: &WorkflowError,
    ) -> FailureReport {
        tracing::error!(kind = err.kind(), error = %err, "workflow failed");
        session.mark_failed(err.kind());

        // Best effort: the failure entry must be attempted even when the
        // original error was the audit sink itself.
        if !state.is_terminal() {
            if let Err(audit_err) = self.transition(session, state, WorkflowState::Failed) {
                tracing::error!(error = %audit_err, "failed-state transition not audited");
                *state = WorkflowState::Failed;
            }
        }
        let appended = self.audit.append(
            session.session_id,
            AuditEventType::WorkflowFailed,
            json!({
                "kind": err.kind(),
                "detail": err.to_string(),
            }),
            false,
        );
        if let Err(audit_err) = appended {
            tracing::error!(error = %audit_err, "workflow failure entry not audited");
        }

        FailureReport {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}
