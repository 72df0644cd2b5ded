//! Generated validation protocol artifact
//!
//! [`ProtocolPayload`] is the raw structured shape requested from the
//! reasoning capability; [`ValidationProtocol`] is the validated artifact.
//! Cardinality validation is strict: an out-of-bounds test-case count is a
//! hard failure, never truncated or padded to fit.

use crate::category::ValidationCategory;
use crate::error::DomainError;
use crate::ids::ProtocolId;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Raw test case as produced by the reasoning capability
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TestCasePayload {
    pub title: String,
    pub objective: String,
    pub expected_result: String,
}

/// Raw structured response requested from the reasoning capability
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ProtocolPayload {
    pub test_cases: Vec<TestCasePayload>,
}

/// One validation test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Stable case identifier within the protocol ("TC-001", ...)
    pub case_id: String,
    pub title: String,
    pub objective: String,
    pub expected_result: String,
}

/// The generated document artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationProtocol {
    pub protocol_id: ProtocolId,
    pub category: ValidationCategory,
    pub test_cases: Vec<TestCase>,
    /// Set when generation proceeded from a partial specialist aggregate
    pub reduced_context: bool,
    pub generated_at: DateTime<Utc>,
}

impl ValidationProtocol {
    /// Assemble a protocol from a raw payload, assigning case identifiers.
    ///
    /// Assembly does not validate cardinality; call [`Self::validate`]
    /// before treating the protocol as an accepted artifact.
    #[must_use]
    pub fn from_payload(
        category: ValidationCategory,
        payload: ProtocolPayload,
        reduced_context: bool,
    ) -> Self {
        let test_cases = payload
            .test_cases
            .into_iter()
            .enumerate()
            .map(|(i, tc)| TestCase {
                case_id: format!("TC-{:03}", i + 1),
                title: tc.title,
                objective: tc.objective,
                expected_result: tc.expected_result,
            })
            .collect();

        Self {
            protocol_id: ProtocolId::new(),
            category,
            test_cases,
            reduced_context,
            generated_at: Utc::now(),
        }
    }

    /// Number of test cases
    #[inline]
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.test_cases.len()
    }

    /// Validate cardinality against the category bounds.
    ///
    /// # Errors
    /// `DomainError::CardinalityOutOfBounds` when the count falls outside
    /// the category's declared `[min, max]` range.
    pub fn validate(&self) -> Result<(), DomainError> {
        let bounds = self.category.bounds();
        let count = self.item_count();
        if bounds.contains(count) {
            Ok(())
        } else {
            Err(DomainError::CardinalityOutOfBounds {
                category: self.category,
                count,
                min: bounds.min,
                max: bounds.max,
            })
        }
    }
}
