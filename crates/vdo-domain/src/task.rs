//! Specialist task fan-out payloads
//!
//! Tasks and results relate one-to-one by `task_id`. Results are collected
//! into an [`AgentAggregate`] keyed by task id; insertion order is
//! irrelevant, partial failure is explicit.

use crate::ids::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Specialist reasoning domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    RiskAssessment,
    DataIntegrity,
    FunctionalCoverage,
    RegulatoryTraceability,
}

impl Specialty {
    /// Snake_case label used in prompts and audit payloads
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RiskAssessment => "risk_assessment",
            Self::DataIntegrity => "data_integrity",
            Self::FunctionalCoverage => "functional_coverage",
            Self::RegulatoryTraceability => "regulatory_traceability",
        }
    }
}

impl std::fmt::Display for Specialty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independent specialist task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTask {
    pub task_id: TaskId,
    pub specialty: Specialty,
    /// Immutable input payload, passed by value to the worker
    pub input_payload: serde_json::Value,
}

impl AgentTask {
    /// Create a task with a fresh id
    #[must_use]
    pub fn new(specialty: Specialty, input_payload: serde_json::Value) -> Self {
        Self {
            task_id: TaskId::new(),
            specialty,
            input_payload,
        }
    }
}

/// Terminal state of a specialist task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Success,
    Failed,
    TimedOut,
}

/// Terminal result of one specialist task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub task_id: TaskId,
    pub specialty: Specialty,
    pub status: AgentStatus,
    /// Present when status is `Success`
    pub output: Option<serde_json::Value>,
    /// Present when status is `Failed` or `TimedOut`
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl AgentResult {
    /// Successful completion
    #[must_use]
    pub fn success(
        task_id: TaskId,
        specialty: Specialty,
        output: serde_json::Value,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            task_id,
            specialty,
            status: AgentStatus::Success,
            output: Some(output),
            error: None,
            elapsed_ms,
        }
    }

    /// Local failure of one task
    #[must_use]
    pub fn failed(
        task_id: TaskId,
        specialty: Specialty,
        error: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            task_id,
            specialty,
            status: AgentStatus::Failed,
            output: None,
            error: Some(error.into()),
            elapsed_ms,
        }
    }

    /// Per-task deadline elapsed
    #[must_use]
    pub fn timed_out(task_id: TaskId, specialty: Specialty, elapsed_ms: u64) -> Self {
        Self {
            task_id,
            specialty,
            status: AgentStatus::TimedOut,
            output: None,
            error: Some("per-task timeout elapsed".to_string()),
            elapsed_ms,
        }
    }

    /// Whether the task reached `Success`
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == AgentStatus::Success
    }
}

/// Aggregate of all task results for one coordinator run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentAggregate {
    /// Results keyed by task id
    pub results: BTreeMap<TaskId, AgentResult>,
    /// Set when any task did not reach `Success`
    pub partial: bool,
}

impl AgentAggregate {
    /// Build from the full result set of `expected` launched tasks.
    ///
    /// `partial` is set when fewer than `expected` tasks succeeded.
    #[must_use]
    pub fn from_results(expected: usize, results: impl IntoIterator<Item = AgentResult>) -> Self {
        let results: BTreeMap<TaskId, AgentResult> =
            results.into_iter().map(|r| (r.task_id, r)).collect();
        let partial = results.values().filter(|r| r.is_success()).count() < expected;
        Self { results, partial }
    }

    /// Successful results, in task-id order
    pub fn successes(&self) -> impl Iterator<Item = &AgentResult> {
        self.results.values().filter(|r| r.is_success())
    }

    /// Number of successful results
    #[inline]
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    /// Total number of terminal results
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// No task produced usable output
    #[inline]
    #[must_use]
    pub fn is_total_failure(&self) -> bool {
        self.success_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task(specialty: Specialty) -> AgentTask {
        AgentTask::new(specialty, json!({"input": "spec-001"}))
    }

    #[test]
    fn aggregate_flags_partial_success() {
        let a = task(Specialty::RiskAssessment);
        let b = task(Specialty::DataIntegrity);
        let c = task(Specialty::FunctionalCoverage);

        let aggregate = AgentAggregate::from_results(
            3,
            vec![
                AgentResult::success(a.task_id, a.specialty, json!({"ok": true}), 12),
                AgentResult::timed_out(b.task_id, b.specialty, 2000),
                AgentResult::success(c.task_id, c.specialty, json!({"ok": true}), 40),
            ],
        );

        assert!(aggregate.partial);
        assert_eq!(aggregate.success_count(), 2);
        assert_eq!(aggregate.total(), 3);
        assert!(!aggregate.is_total_failure());
    }

    #[test]
    fn aggregate_full_success_is_not_partial() {
        let a = task(Specialty::RiskAssessment);
        let aggregate = AgentAggregate::from_results(
            1,
            vec![AgentResult::success(a.task_id, a.specialty, json!({}), 5)],
        );
        assert!(!aggregate.partial);
    }

    #[test]
    fn aggregate_zero_success_is_total_failure() {
        let a = task(Specialty::RiskAssessment);
        let aggregate = AgentAggregate::from_results(
            1,
            vec![AgentResult::failed(a.task_id, a.specialty, "boom", 8)],
        );
        assert!(aggregate.is_total_failure());
        assert!(aggregate.partial);
    }

    #[test]
    fn aggregate_missing_results_count_as_partial() {
        // A coordinator-level timeout may record fewer results than launched.
        let a = task(Specialty::RiskAssessment);
        let aggregate = AgentAggregate::from_results(
            2,
            vec![AgentResult::success(a.task_id, a.specialty, json!({}), 5)],
        );
        assert!(aggregate.partial);
    }
}
