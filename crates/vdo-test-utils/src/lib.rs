//! Testing utilities for the VDO workspace
//!
//! Shared stubs for the external collaborators, consultation responders,
//! and payload builders.

#![allow(missing_docs)]

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use vdo_domain::{ConsultationDecision, ConsultationResponse};
use vdo_engine::{
    ConsultationManager, ContextRetrieval, ReasoningCapability, ReasoningError, ReasoningRequest,
    RetrievalError, RetrievalFilters, Snippet,
};

/// Reasoning stub that pops canned responses in order
#[derive(Default)]
pub struct ScriptedReasoning {
    responses: Mutex<VecDeque<Result<Value, ReasoningError>>>,
}

impl ScriptedReasoning {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, value: Value) {
        self.responses.lock().push_back(Ok(value));
    }

    pub fn push_err(&self, err: ReasoningError) {
        self.responses.lock().push_back(Err(err));
    }

    /// Responses not yet consumed
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait::async_trait]
impl ReasoningCapability for ScriptedReasoning {
    async fn complete(&self, _request: ReasoningRequest) -> Result<Value, ReasoningError> {
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(ReasoningError::Unavailable(
                "scripted reasoning exhausted".to_string(),
            ))
        })
    }
}

/// Retrieval stub returning a fixed snippet list
pub struct StaticRetrieval {
    snippets: Vec<Snippet>,
}

impl StaticRetrieval {
    #[must_use]
    pub fn new(snippets: Vec<Snippet>) -> Self {
        Self { snippets }
    }

    /// A small canned snippet set
    #[must_use]
    pub fn canned() -> Self {
        Self::new(vec![
            Snippet {
                source: "URS-042 §3.1".to_string(),
                content: "The system shall record batch release decisions.".to_string(),
                relevance: 0.92,
            },
            Snippet {
                source: "URS-042 §4.2".to_string(),
                content: "Configured workflows route approvals by role.".to_string(),
                relevance: 0.81,
            },
        ])
    }
}

#[async_trait::async_trait]
impl ContextRetrieval for StaticRetrieval {
    async fn query(
        &self,
        _topic: &str,
        filters: &RetrievalFilters,
    ) -> Result<Vec<Snippet>, RetrievalError> {
        let mut snippets = self.snippets.clone();
        if let Some(limit) = filters.limit {
            snippets.truncate(limit);
        }
        Ok(snippets)
    }
}

/// Well-formed categorization payload
#[must_use]
pub fn categorization_payload(category: &str, confidence: f64) -> Value {
    json!({
        "category": category,
        "confidence": confidence,
        "rationale": "derived from requirement phrasing and vendor documentation",
        "evidence_count": 4,
    })
}

/// Well-formed protocol payload with `count` test cases
#[must_use]
pub fn protocol_payload(count: usize) -> Value {
    json!({
        "test_cases": (0..count)
            .map(|i| json!({
                "title": format!("Verify requirement R-{:02}", i + 1),
                "objective": "Confirm the configured behavior against the requirement",
                "expected_result": "Observed behavior matches the specification",
            }))
            .collect::<Vec<_>>(),
    })
}

/// Generic specialist finding payload
#[must_use]
pub fn specialist_payload(specialty: &str) -> Value {
    json!({
        "specialty": specialty,
        "findings": ["requirement coverage reviewed"],
    })
}

/// Answer the next consultation that opens on `manager` with `decision`.
///
/// Polls until a request appears, submits once, then exits.
pub fn respond_to_next_consultation(
    manager: Arc<ConsultationManager>,
    decision: ConsultationDecision,
    responder_role: &str,
) -> tokio::task::JoinHandle<()> {
    let responder_role = responder_role.to_string();
    tokio::spawn(async move {
        for _ in 0..10_000 {
            if let Some(request) = manager.open_requests().into_iter().next() {
                let _ = manager.submit_response(ConsultationResponse {
                    consultation_id: request.consultation_id,
                    decision,
                    rationale: "reviewed by test responder".to_string(),
                    responder_role: responder_role.clone(),
                    responded_at: Utc::now(),
                });
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
}

/// Answer every consultation that opens on `manager` with `decision`.
///
/// Runs until aborted; abort the handle when the test is done.
pub fn auto_responder(
    manager: Arc<ConsultationManager>,
    decision: ConsultationDecision,
    responder_role: &str,
) -> tokio::task::JoinHandle<()> {
    let responder_role = responder_role.to_string();
    tokio::spawn(async move {
        loop {
            for request in manager.open_requests() {
                let _ = manager.submit_response(ConsultationResponse {
                    consultation_id: request.consultation_id,
                    decision,
                    rationale: "reviewed by test responder".to_string(),
                    responder_role: responder_role.clone(),
                    responded_at: Utc::now(),
                });
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
}

/// Initialize test tracing from `RUST_LOG`, once
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
