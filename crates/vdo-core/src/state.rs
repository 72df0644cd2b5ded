//! Workflow state machine
//!
//! `Consulting` is a sub-state entered from `Categorizing` and `Generating`;
//! it always returns to the state that invoked it, never forward. `Failed`
//! is reachable from every non-terminal state.

use serde::{Deserialize, Serialize};

/// States of one workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Initialized,
    Categorizing,
    Consulting,
    Coordinating,
    Generating,
    Finalizing,
    Completed,
    Failed,
}

impl WorkflowState {
    /// Snake_case label used in audit payloads
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Categorizing => "categorizing",
            Self::Consulting => "consulting",
            Self::Coordinating => "coordinating",
            Self::Generating => "generating",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether this state ends the workflow
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempted transition outside the state machine
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("illegal state transition: {from} -> {to}")]
pub struct IllegalTransition {
    pub from: WorkflowState,
    pub to: WorkflowState,
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: WorkflowState) -> Vec<WorkflowState> {
    use WorkflowState::*;
    match from {
        Initialized => vec![Categorizing, Failed],
        Categorizing => vec![Consulting, Coordinating, Failed],
        Consulting => vec![Categorizing, Generating, Failed],
        Coordinating => vec![Generating, Failed],
        Generating => vec![Consulting, Finalizing, Failed],
        Finalizing => vec![Completed, Failed],
        Completed | Failed => vec![],
    }
}

/// Validate a state transition
///
/// # Errors
/// `IllegalTransition` when `to` is not reachable from `from`.
pub fn validate_transition(
    from: WorkflowState,
    to: WorkflowState,
) -> Result<(), IllegalTransition> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

fn allowed(from: WorkflowState, to: WorkflowState) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
