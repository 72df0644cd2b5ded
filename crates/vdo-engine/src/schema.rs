//! Compiled response schemas
//!
//! The two reasoning calls each declare the structure they expect back.
//! Raw output is checked against the compiled JSON Schema before
//! deserialization, so a malformed response is rejected with the full
//! validator diagnostics instead of a bare parse error.

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use schemars::schema_for;
use serde_json::Value;
use vdo_domain::{CategorizationPayload, ProtocolPayload};

static CATEGORIZATION_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::to_value(schema_for!(CategorizationPayload))
        .expect("categorization schema serializes")
});

static CATEGORIZATION_VALIDATOR: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::compile(&CATEGORIZATION_SCHEMA).expect("categorization schema compiles")
});

static PROTOCOL_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::to_value(schema_for!(ProtocolPayload)).expect("protocol schema serializes")
});

static PROTOCOL_VALIDATOR: Lazy<JSONSchema> =
    Lazy::new(|| JSONSchema::compile(&PROTOCOL_SCHEMA).expect("protocol schema compiles"));

/// Schema sent with categorization requests
#[must_use]
pub fn categorization_schema() -> Value {
    CATEGORIZATION_SCHEMA.clone()
}

/// Schema sent with generation requests
#[must_use]
pub fn protocol_schema() -> Value {
    PROTOCOL_SCHEMA.clone()
}

/// Validate raw categorization output against the compiled schema
pub(crate) fn validate_categorization(raw: &Value) -> Result<(), String> {
    run_validator(&CATEGORIZATION_VALIDATOR, raw)
}

/// Validate raw protocol output against the compiled schema
pub(crate) fn validate_protocol(raw: &Value) -> Result<(), String> {
    run_validator(&PROTOCOL_VALIDATOR, raw)
}

fn run_validator(validator: &JSONSchema, raw: &Value) -> Result<(), String> {
    validator.validate(raw).map_err(|errors| {
        errors
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_categorization_passes() {
        let raw = json!({
            "category": "configured_product",
            "confidence": 0.9,
            "rationale": "configured vendor product",
            "evidence_count": 3,
        });
        assert!(validate_categorization(&raw).is_ok());
    }

    #[test]
    fn missing_confidence_fails_with_diagnostics() {
        let raw = json!({
            "category": "configured_product",
            "rationale": "configured vendor product",
            "evidence_count": 3,
        });
        let err = validate_categorization(&raw).unwrap_err();
        assert!(err.contains("confidence"), "{err}");
    }

    #[test]
    fn string_confidence_fails() {
        let raw = json!({
            "category": "configured_product",
            "confidence": "0.9",
            "rationale": "configured vendor product",
            "evidence_count": 3,
        });
        assert!(validate_categorization(&raw).is_err());
    }

    #[test]
    fn valid_protocol_passes() {
        let raw = json!({
            "test_cases": [
                {"title": "t", "objective": "o", "expected_result": "r"},
            ],
        });
        assert!(validate_protocol(&raw).is_ok());
    }

    #[test]
    fn protocol_without_test_cases_fails() {
        assert!(validate_protocol(&json!({})).is_err());
    }
}
