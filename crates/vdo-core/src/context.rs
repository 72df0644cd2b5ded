//! Session context
//!
//! Key/value store of intermediate results, confined to the single
//! orchestrator task that drives the state machine. Reading a missing
//! required key is a fatal configuration error, never a defaulted value.

use crate::error::WorkflowError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Per-execution intermediate results
#[derive(Debug, Default)]
pub struct SessionContext {
    values: BTreeMap<String, Value>,
}

impl SessionContext {
    /// Create an empty context
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a key, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Read a value, if present
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether a key is present
    #[inline]
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Read a required value.
    ///
    /// # Errors
    /// `WorkflowError::FatalConfiguration` when the key is absent.
    pub fn require(&self, key: &str) -> Result<&Value, WorkflowError> {
        self.values.get(key).ok_or_else(|| {
            WorkflowError::FatalConfiguration(format!("missing required session key: {key}"))
        })
    }

    /// Keys currently stored, in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
