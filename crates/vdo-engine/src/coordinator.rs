//! Parallel agent coordinator
//!
//! Fans out a fixed, known-at-call-time set of independent specialist tasks
//! over a bounded worker pool, each task under its own deadline.
//!
//! # Policy
//!
//! One task's failure or timeout never cancels the others. The coordinator
//! returns only after every launched task has a terminal result or the
//! overall deadline/cancellation elapsed; even then, in-flight tasks get a
//! grace period and anything still unreported is recorded as timed out
//! rather than dropped.

use crate::error::EngineError;
use crate::reasoning::{ReasoningCapability, ReasoningError, ReasoningRequest};
use crate::retrieval::{ContextRetrieval, RetrievalError, RetrievalFilters};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use vdo_audit::{AuditEventType, AuditLog};
use vdo_domain::{AgentAggregate, AgentResult, AgentTask, SessionId, Specialty, TaskId};

/// Default worker pool size, small to respect external rate limits
pub const DEFAULT_POOL_SIZE: usize = 3;

/// Specialist task failures, absorbed into the aggregate
#[derive(Debug, thiserror::Error)]
pub enum SpecialistError {
    /// Retrieval collaborator failed
    #[error("retrieval failure: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Reasoning collaborator failed
    #[error("reasoning failure: {0}")]
    Reasoning(#[from] ReasoningError),

    /// Anything else a specialist implementation reports
    #[error("{0}")]
    Other(String),
}

/// Executes one specialist task to a raw output payload
#[async_trait::async_trait]
pub trait SpecialistExecutor: Send + Sync {
    /// Run the task to completion
    async fn execute(&self, task: &AgentTask) -> Result<serde_json::Value, SpecialistError>;
}

/// Coordinator tuning
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Concurrent worker bound
    pub pool_size: usize,
    /// Per-task deadline
    pub task_timeout: Duration,
    /// Overall fan-out deadline
    pub overall_timeout: Duration,
    /// Time in-flight tasks get to report after a deadline or cancellation
    pub cancellation_grace: Duration,
}

impl CoordinatorConfig {
    /// With worker pool size
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// With per-task deadline
    #[must_use]
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// With overall deadline
    #[must_use]
    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            task_timeout: Duration::from_secs(60),
            overall_timeout: Duration::from_secs(300),
            cancellation_grace: Duration::from_secs(5),
        }
    }
}

/// Bounded fan-out over specialist tasks
pub struct AgentCoordinator {
    executor: Arc<dyn SpecialistExecutor>,
    audit: Arc<AuditLog>,
    config: CoordinatorConfig,
}

impl AgentCoordinator {
    /// Create a coordinator with default tuning
    #[must_use]
    pub fn new(executor: Arc<dyn SpecialistExecutor>, audit: Arc<AuditLog>) -> Self {
        Self {
            executor,
            audit,
            config: CoordinatorConfig::default(),
        }
    }

    /// With custom tuning
    #[must_use]
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Run every task to a terminal state and return the full aggregate.
    ///
    /// The aggregate may contain partial failures; a zero-success aggregate
    /// is the caller's fatal condition to raise, not this method's.
    ///
    /// # Errors
    /// `EngineError::Audit` only; task failures are data, not errors.
    pub async fn run(
        &self,
        session_id: SessionId,
        tasks: Vec<AgentTask>,
        cancel: &CancellationToken,
    ) -> Result<AgentAggregate, EngineError> {
        let expected = tasks.len();
        let launched: Vec<(TaskId, Specialty)> =
            tasks.iter().map(|t| (t.task_id, t.specialty)).collect();
        tracing::info!(tasks = expected, pool = self.config.pool_size, "specialist fan-out");

        let semaphore = Arc::new(Semaphore::new(self.config.pool_size));
        let mut pool = JoinSet::new();
        let run_started = Instant::now();

        for task in tasks {
            let semaphore = Arc::clone(&semaphore);
            let executor = Arc::clone(&self.executor);
            let task_timeout = self.config.task_timeout;
            pool.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return AgentResult::failed(task.task_id, task.specialty, "worker pool closed", 0)
                    }
                };
                let started = Instant::now();
                let outcome = tokio::time::timeout(task_timeout, executor.execute(&task)).await;
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                match outcome {
                    Ok(Ok(output)) => {
                        AgentResult::success(task.task_id, task.specialty, output, elapsed_ms)
                    }
                    Ok(Err(err)) => {
                        AgentResult::failed(task.task_id, task.specialty, err.to_string(), elapsed_ms)
                    }
                    Err(_) => AgentResult::timed_out(task.task_id, task.specialty, elapsed_ms),
                }
            });
        }

        let mut results: Vec<AgentResult> = Vec::with_capacity(expected);
        let deadline = tokio::time::sleep(self.config.overall_timeout);
        tokio::pin!(deadline);
        let mut interrupted = false;

        while results.len() < expected && !interrupted {
            tokio::select! {
                joined = pool.join_next() => match joined {
                    Some(Ok(result)) => self.record(session_id, result, &mut results)?,
                    Some(Err(join_err)) => {
                        tracing::warn!(error = %join_err, "specialist worker aborted");
                    }
                    None => break,
                },
                () = &mut deadline => {
                    tracing::warn!("coordinator overall deadline elapsed");
                    interrupted = true;
                }
                () = cancel.cancelled() => {
                    tracing::warn!("coordination cancelled by workflow");
                    interrupted = true;
                }
            }
        }

        if interrupted {
            // Grace period: let in-flight tasks report a terminal state so
            // the aggregate records them instead of dropping them.
            let grace = tokio::time::sleep(self.config.cancellation_grace);
            tokio::pin!(grace);
            while results.len() < expected {
                tokio::select! {
                    joined = pool.join_next() => match joined {
                        Some(Ok(result)) => self.record(session_id, result, &mut results)?,
                        Some(Err(join_err)) => {
                            tracing::warn!(error = %join_err, "specialist worker aborted");
                        }
                        None => break,
                    },
                    () = &mut grace => break,
                }
            }
            pool.abort_all();

            let overall_ms = u64::try_from(run_started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let reported: HashSet<TaskId> = results.iter().map(|r| r.task_id).collect();
            for (task_id, specialty) in &launched {
                if !reported.contains(task_id) {
                    self.record(
                        session_id,
                        AgentResult::timed_out(*task_id, *specialty, overall_ms),
                        &mut results,
                    )?;
                }
            }
        }

        let aggregate = AgentAggregate::from_results(expected, results);
        self.audit.append(
            session_id,
            AuditEventType::CoordinationSummary,
            json!({
                "expected": expected,
                "completed": aggregate.total(),
                "successes": aggregate.success_count(),
                "partial": aggregate.partial,
                "interrupted": interrupted,
            }),
            !aggregate.is_total_failure(),
        )?;
        tracing::info!(
            successes = aggregate.success_count(),
            total = aggregate.total(),
            partial = aggregate.partial,
            "specialist coordination finished"
        );
        Ok(aggregate)
    }

    fn record(
        &self,
        session_id: SessionId,
        result: AgentResult,
        results: &mut Vec<AgentResult>,
    ) -> Result<(), EngineError> {
        self.audit.append(
            session_id,
            AuditEventType::AgentTaskFinished,
            json!({
                "task_id": result.task_id,
                "specialty": result.specialty,
                "status": result.status,
                "elapsed_ms": result.elapsed_ms,
                "error": result.error.clone(),
            }),
            result.is_success(),
        )?;
        results.push(result);
        Ok(())
    }
}

/// Default specialist: retrieval-augmented reasoning per specialty
pub struct ReasoningSpecialist {
    reasoning: Arc<dyn ReasoningCapability>,
    retrieval: Arc<dyn ContextRetrieval>,
}

impl ReasoningSpecialist {
    /// Create the default specialist executor
    #[must_use]
    pub fn new(
        reasoning: Arc<dyn ReasoningCapability>,
        retrieval: Arc<dyn ContextRetrieval>,
    ) -> Self {
        Self {
            reasoning,
            retrieval,
        }
    }
}

#[async_trait::async_trait]
impl SpecialistExecutor for ReasoningSpecialist {
    async fn execute(&self, task: &AgentTask) -> Result<serde_json::Value, SpecialistError> {
        let topic = task
            .input_payload
            .get("input_reference")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let filters = RetrievalFilters {
            specialty: Some(task.specialty),
            limit: Some(8),
        };
        let snippets = self.retrieval.query(&topic, &filters).await?;

        let mut prompt = format!(
            "You are the {} specialist for the validation effort on {topic}.\n\
             Analyze the requirement context below and report findings relevant \
             to your specialty as a JSON object.\n",
            task.specialty
        );
        for snippet in &snippets {
            prompt.push_str(&format!("\n[{}] {}", snippet.source, snippet.content));
        }

        let request = ReasoningRequest::new(prompt, json!({"type": "object"}));
        let output = self.reasoning.complete(request).await?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vdo_domain::AgentStatus;

    /// Scripted executor: behavior keyed by specialty
    struct TestExecutor {
        fail: Option<Specialty>,
        hang: Option<Specialty>,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TestExecutor {
        fn ok() -> Self {
            Self {
                fail: None,
                hang: None,
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        fn failing(specialty: Specialty) -> Self {
            Self {
                fail: Some(specialty),
                ..Self::ok()
            }
        }

        fn hanging(specialty: Specialty) -> Self {
            Self {
                hang: Some(specialty),
                ..Self::ok()
            }
        }
    }

    #[async_trait::async_trait]
    impl SpecialistExecutor for TestExecutor {
        async fn execute(&self, task: &AgentTask) -> Result<serde_json::Value, SpecialistError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let outcome = if self.hang == Some(task.specialty) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hung task should be timed out");
            } else if self.fail == Some(task.specialty) {
                Err(SpecialistError::Other("specialist rejected input".to_string()))
            } else {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(json!({"findings": [task.specialty.as_str()]}))
            };

            self.active.fetch_sub(1, Ordering::SeqCst);
            outcome
        }
    }

    fn tasks(specialties: &[Specialty]) -> Vec<AgentTask> {
        specialties
            .iter()
            .map(|s| AgentTask::new(*s, json!({"input_reference": "URS-042"})))
            .collect()
    }

    fn coordinator(executor: TestExecutor) -> (AgentCoordinator, Arc<AuditLog>) {
        let audit = Arc::new(AuditLog::in_memory());
        let coordinator = AgentCoordinator::new(Arc::new(executor), Arc::clone(&audit))
            .with_config(
                CoordinatorConfig::default()
                    .with_task_timeout(Duration::from_secs(2))
                    .with_overall_timeout(Duration::from_secs(60)),
            );
        (coordinator, audit)
    }

    #[tokio::test(start_paused = true)]
    async fn all_tasks_succeed() {
        let (coordinator, audit) = coordinator(TestExecutor::ok());
        let session = SessionId::new();
        let cancel = CancellationToken::new();

        let aggregate = coordinator
            .run(
                session,
                tasks(&[Specialty::RiskAssessment, Specialty::DataIntegrity]),
                &cancel,
            )
            .await
            .unwrap();

        assert!(!aggregate.partial);
        assert_eq!(aggregate.success_count(), 2);

        // One entry per task plus the summary.
        let entries = audit.read_session(session).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[2].event_type,
            AuditEventType::CoordinationSummary
        );
    }

    #[tokio::test(start_paused = true)]
    async fn one_timeout_does_not_block_the_others() {
        // Scenario: A and C succeed, B times out.
        let (coordinator, _audit) = coordinator(TestExecutor::hanging(Specialty::DataIntegrity));
        let session = SessionId::new();
        let cancel = CancellationToken::new();

        let aggregate = coordinator
            .run(
                session,
                tasks(&[
                    Specialty::RiskAssessment,
                    Specialty::DataIntegrity,
                    Specialty::FunctionalCoverage,
                ]),
                &cancel,
            )
            .await
            .unwrap();

        assert!(aggregate.partial);
        assert_eq!(aggregate.success_count(), 2);
        assert_eq!(aggregate.total(), 3);
        let timed_out: Vec<&AgentResult> = aggregate
            .results
            .values()
            .filter(|r| r.status == AgentStatus::TimedOut)
            .collect();
        assert_eq!(timed_out.len(), 1);
        assert_eq!(timed_out[0].specialty, Specialty::DataIntegrity);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_block_the_others() {
        let (coordinator, audit) = coordinator(TestExecutor::failing(Specialty::RiskAssessment));
        let session = SessionId::new();
        let cancel = CancellationToken::new();

        let aggregate = coordinator
            .run(
                session,
                tasks(&[Specialty::RiskAssessment, Specialty::FunctionalCoverage]),
                &cancel,
            )
            .await
            .unwrap();

        assert!(aggregate.partial);
        assert_eq!(aggregate.success_count(), 1);

        let entries = audit.read_session(session).unwrap();
        let failed_entry = entries
            .iter()
            .find(|e| e.event_type == AuditEventType::AgentTaskFinished && !e.success)
            .unwrap();
        assert_eq!(failed_entry.payload["status"], "failed");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_success_aggregate_is_flagged_not_hidden() {
        let (coordinator, audit) = coordinator(TestExecutor::failing(Specialty::RiskAssessment));
        let session = SessionId::new();
        let cancel = CancellationToken::new();

        let aggregate = coordinator
            .run(session, tasks(&[Specialty::RiskAssessment]), &cancel)
            .await
            .unwrap();

        assert!(aggregate.is_total_failure());

        let entries = audit.read_session(session).unwrap();
        let summary = entries.last().unwrap();
        assert_eq!(summary.event_type, AuditEventType::CoordinationSummary);
        assert!(!summary.success);
    }

    #[tokio::test]
    async fn pool_size_bounds_concurrency() {
        let audit = Arc::new(AuditLog::in_memory());
        let executor = Arc::new(TestExecutor::ok());
        let coordinator = AgentCoordinator::new(
            Arc::clone(&executor) as Arc<dyn SpecialistExecutor>,
            Arc::clone(&audit),
        )
        .with_config(CoordinatorConfig::default().with_pool_size(2));
        let session = SessionId::new();
        let cancel = CancellationToken::new();

        let many: Vec<AgentTask> = (0..6)
            .map(|_| AgentTask::new(Specialty::RiskAssessment, json!({"input_reference": "URS-042"})))
            .collect();
        let aggregate = coordinator.run(session, many, &cancel).await.unwrap();

        assert_eq!(aggregate.success_count(), 6);
        assert!(executor.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_records_unreported_tasks_as_timed_out() {
        let (coordinator, audit) = coordinator(TestExecutor::hanging(Specialty::RiskAssessment));
        let session = SessionId::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let aggregate = coordinator
            .run(session, tasks(&[Specialty::RiskAssessment]), &cancel)
            .await
            .unwrap();

        // The hung task is recorded, not dropped.
        assert_eq!(aggregate.total(), 1);
        assert!(aggregate.is_total_failure());
        let entries = audit.read_session(session).unwrap();
        assert!(entries
            .iter()
            .any(|e| e.event_type == AuditEventType::AgentTaskFinished
                && e.payload["status"] == "timed_out"));
    }
}
