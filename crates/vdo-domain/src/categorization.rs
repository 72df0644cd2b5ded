//! Categorization determination
//!
//! [`CategorizationPayload`] is the raw structured shape requested from the
//! reasoning capability; [`CategorizationResult`] is the validated
//! determination the workflow acts on. Conversion is strict: an unknown
//! category or an out-of-range confidence is a [`DomainError`], never a
//! silently substituted value.

use crate::category::ValidationCategory;
use crate::error::DomainError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Raw structured response requested from the reasoning capability
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CategorizationPayload {
    /// Predicted category name (canonical or GAMP alias)
    pub category: String,
    /// Scalar confidence in [0, 1]
    pub confidence: f64,
    /// Free-text justification
    pub rationale: String,
    /// Number of evidence passages the determination rests on
    pub evidence_count: u32,
    /// Scores for runner-up categories, if the model reports them
    #[serde(default)]
    pub alternatives: Vec<CategoryScore>,
}

/// Score for one alternative category
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryScore {
    pub category: String,
    pub confidence: f64,
}

impl CategorizationPayload {
    /// Validate and convert into a [`CategorizationResult`].
    ///
    /// # Errors
    /// - `DomainError::UnknownCategory` for a category outside the taxonomy
    /// - `DomainError::ConfidenceOutOfRange` for a non-finite or out-of-[0,1]
    ///   confidence
    /// - `DomainError::EmptyField` for a blank rationale
    pub fn into_result(self) -> Result<CategorizationResult, DomainError> {
        let category: ValidationCategory = self.category.parse()?;
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(DomainError::ConfidenceOutOfRange(self.confidence));
        }
        if self.rationale.trim().is_empty() {
            return Err(DomainError::EmptyField("rationale"));
        }

        // Runner-up score among parseable alternatives, excluding the
        // predicted category itself.
        let runner_up = self
            .alternatives
            .iter()
            .filter(|alt| {
                alt.category
                    .parse::<ValidationCategory>()
                    .map(|c| c != category)
                    .unwrap_or(false)
            })
            .map(|alt| alt.confidence)
            .fold(None, |best: Option<f64>, c| {
                Some(best.map_or(c, |b| b.max(c)))
            });

        Ok(CategorizationResult {
            category,
            confidence: self.confidence,
            rationale: self.rationale,
            evidence_count: self.evidence_count,
            runner_up_confidence: runner_up,
        })
    }
}

/// Validated categorization determination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizationResult {
    /// The predicted category
    pub category: ValidationCategory,
    /// Confidence, guaranteed finite and within [0, 1]
    pub confidence: f64,
    /// Free-text justification
    pub rationale: String,
    /// Number of evidence passages
    pub evidence_count: u32,
    /// Best confidence reported for any other category
    pub runner_up_confidence: Option<f64>,
}

impl CategorizationResult {
    /// Whether the determination is ambiguous: the runner-up score is within
    /// `margin` of the top score.
    #[inline]
    #[must_use]
    pub fn is_ambiguous(&self, margin: f64) -> bool {
        self.runner_up_confidence
            .is_some_and(|r| (self.confidence - r) < margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(category: &str, confidence: f64) -> CategorizationPayload {
        CategorizationPayload {
            category: category.to_string(),
            confidence,
            rationale: "vendor-supplied product, configured workflows".to_string(),
            evidence_count: 4,
            alternatives: vec![],
        }
    }

    #[test]
    fn converts_valid_payload() {
        let result = payload("configured_product", 0.91).into_result().unwrap();
        assert_eq!(result.category, ValidationCategory::ConfiguredProduct);
        assert!((result.confidence - 0.91).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        for bad in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
            let err = payload("category_4", bad).into_result().unwrap_err();
            assert!(matches!(err, DomainError::ConfidenceOutOfRange(_)), "{bad}");
        }
    }

    #[test]
    fn rejects_blank_rationale() {
        let mut p = payload("category_4", 0.9);
        p.rationale = "  ".to_string();
        assert!(matches!(
            p.into_result(),
            Err(DomainError::EmptyField("rationale"))
        ));
    }

    #[test]
    fn rejects_unknown_category() {
        let err = payload("firmware", 0.9).into_result().unwrap_err();
        assert!(matches!(err, DomainError::UnknownCategory(_)));
    }

    #[test]
    fn ambiguity_uses_runner_up_margin() {
        let mut p = payload("configured_product", 0.80);
        p.alternatives = vec![
            CategoryScore {
                category: "custom_application".to_string(),
                confidence: 0.74,
            },
            CategoryScore {
                // Same as predicted: must not count as a runner-up
                category: "configured_product".to_string(),
                confidence: 0.80,
            },
        ];
        let result = p.into_result().unwrap();
        assert!(result.is_ambiguous(0.10));
        assert!(!result.is_ambiguous(0.05));
    }

    #[test]
    fn unambiguous_without_alternatives() {
        let result = payload("category_5", 0.95).into_result().unwrap();
        assert!(!result.is_ambiguous(0.10));
    }
}
