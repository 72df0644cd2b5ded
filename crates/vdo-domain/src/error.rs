//! Hard validation failures of the data model
//!
//! These are never recovered by substituting a default value; callers either
//! escalate to a human or fail the workflow.

use crate::category::ValidationCategory;

/// Domain validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// Category string not in the fixed taxonomy
    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    /// Confidence missing, non-finite, or outside [0, 1]
    #[error("confidence out of range: {0}")]
    ConfidenceOutOfRange(f64),

    /// Required field empty in a structured payload
    #[error("empty field in payload: {0}")]
    EmptyField(&'static str),

    /// Generated test-case count outside the category bounds
    #[error(
        "cardinality out of bounds for {category}: got {count}, expected [{min}, {max}]"
    )]
    CardinalityOutOfBounds {
        category: ValidationCategory,
        count: usize,
        min: usize,
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = DomainError::CardinalityOutOfBounds {
            category: ValidationCategory::NonConfiguredProduct,
            count: 2,
            min: 5,
            max: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("non_configured_product"));
        assert!(msg.contains("got 2"));
        assert!(msg.contains("[5, 10]"));
    }
}
